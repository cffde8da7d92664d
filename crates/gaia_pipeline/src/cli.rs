use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Subcommand;
use gaia_core::{ArticleKind, PublishPolicy, Result, Settings, Topic};
use gaia_inference::GenerationClient;
use gaia_site::{ArticlePublisher, SiteIndexer};

use crate::history;
use crate::scheduler::BatchScheduler;
use crate::topics::{self, TopicPool};

/// A duration such as `90`, `30s`, `5m` or `1h15m30s`. Bare numbers are
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_number = false;

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num: u64 = current_number
                .parse()
                .map_err(|_| format!("Expected a number before '{}' in {:?}", c, s))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = num
                .checked_mul(unit)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(|| format!("Duration is too large: {}", s))?;
            current_number.clear();
            has_number = true;
        }

        if !current_number.is_empty() {
            let seconds = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(seconds)
                .ok_or_else(|| format!("Duration is too large: {}", s))?;
            has_number = true;
        }

        if !has_number {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum PipelineCommands {
    /// Generate articles for topics sampled from the pool
    Bulk {
        /// Number of articles to generate
        #[arg(long, short = 'n')]
        count: usize,
        /// Topics per backend request
        #[arg(long)]
        batch_size: Option<usize>,
        /// Pause between batches (e.g. 5s, 1m)
        #[arg(long)]
        pacing: Option<HumanDuration>,
        /// Seed for topic sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate one article for a single topic
    Single {
        #[arg(long)]
        topic: String,
        #[arg(long, value_enum, default_value_t)]
        kind: ArticleKind,
    },
    /// Regenerate an article for every topic in the pool
    Regenerate {
        #[arg(long, default_value_t = 2)]
        batch_size: usize,
        /// Keep earlier articles of a topic (add) or remove them (replace)
        #[arg(long, value_enum, default_value_t)]
        policy: PublishPolicy,
    },
    /// Rebuild index.html and sitemap.xml from the published articles
    RebuildIndex,
    /// Ask the backend for new topics and append them to the pool
    Topics {
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// Show published article totals and recent runs
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

impl PipelineCommands {
    /// Whether the command talks to the generation backend.
    pub fn needs_backend(&self) -> bool {
        !matches!(self, PipelineCommands::RebuildIndex | PipelineCommands::Stats { .. })
    }
}

/// Everything a command needs, built once at startup.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub settings: Settings,
    pub client: GenerationClient,
    pub topics_file: PathBuf,
}

impl PipelineContext {
    fn scheduler(&self, publisher: ArticlePublisher, batch: &gaia_core::BatchSettings) -> BatchScheduler {
        BatchScheduler::new(
            self.client.clone(),
            publisher,
            SiteIndexer::new(&self.settings.site),
            batch,
        )
        .with_history(self.settings.site.history_file.clone())
    }

    fn publisher(&self) -> ArticlePublisher {
        ArticlePublisher::new(&self.settings.site, &self.settings.affiliate)
    }
}

pub async fn handle_command(command: PipelineCommands, ctx: &PipelineContext) -> Result<()> {
    match command {
        PipelineCommands::Bulk {
            count,
            batch_size,
            pacing,
            seed,
        } => {
            let pool = TopicPool::load(&ctx.topics_file)?;
            let mut batch = ctx.settings.batch.clone();
            if let Some(size) = batch_size {
                batch.batch_size = size.max(1);
            }
            if let Some(HumanDuration(pacing)) = pacing {
                batch.pacing = pacing;
            }
            let mut scheduler = ctx.scheduler(ctx.publisher(), &batch);
            if let Some(seed) = seed {
                scheduler = scheduler.with_seed(seed);
            }
            let summary = scheduler.run_bulk(&pool, count).await?;
            println!("{}", summary);
        }
        PipelineCommands::Single { topic, kind } => {
            let scheduler = ctx.scheduler(ctx.publisher(), &ctx.settings.batch);
            match scheduler.run_single(&Topic::new(topic.trim()), kind).await? {
                Some(article) => println!("📝 {} - {}", article.title, article.path.display()),
                None => println!("No article was generated"),
            }
        }
        PipelineCommands::Regenerate { batch_size, policy } => {
            let pool = TopicPool::load(&ctx.topics_file)?;
            let mut batch = ctx.settings.batch.clone();
            batch.batch_size = batch_size.max(1);
            let mut scheduler = ctx.scheduler(ctx.publisher().with_policy(policy), &batch);
            let summary = scheduler.run_regenerate(&pool).await?;
            println!("{}", summary);
        }
        PipelineCommands::RebuildIndex => {
            let report = SiteIndexer::new(&ctx.settings.site).rebuild()?;
            println!(
                "🗂️ Indexed {} articles into {} and {}",
                report.entries.len(),
                report.index_path.display(),
                report.sitemap_path.display()
            );
        }
        PipelineCommands::Topics { count } => {
            let ideas = topics::discover_topics(&ctx.client, count).await?;
            let added = TopicPool::append_new(&ctx.topics_file, &ideas)?;
            println!("💡 Added {} new topics to {}", added, ctx.topics_file.display());
            for idea in &ideas {
                println!("  - {}", idea);
            }
        }
        PipelineCommands::Stats { limit } => {
            let articles = SiteIndexer::new(&ctx.settings.site).scan()?;
            println!("Total published articles: {}", articles.len());
            let rows = history::read_history(&ctx.settings.site.history_file, limit)?;
            if rows.is_empty() {
                println!("No execution history found.");
            } else {
                println!("{:<25} {:<10} {:<15}", "Timestamp", "Count", "Mode");
                for row in rows {
                    println!("{:<25} {:<10} {:<15}", row.timestamp, row.count, row.mode);
                }
            }
        }
    }
    Ok(())
}
