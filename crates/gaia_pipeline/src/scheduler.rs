use std::path::PathBuf;

use gaia_core::{ArticleKind, BatchSettings, Error, PublishedArticle, Result, RunMode, RunSummary, Topic};
use gaia_inference::{prompts, GenerationClient};
use gaia_site::{ArticlePublisher, IndexReport, SiteIndexer};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::history;
use crate::logging::Logger;
use crate::parser;
use crate::topics::TopicPool;

/// Drives batches of topics through generation, parsing and publishing.
///
/// A run never stops on a failed batch: every batch advances the processed
/// count, so the loop always terminates, and the outcome is reported in a
/// [`RunSummary`].
pub struct BatchScheduler {
    client: GenerationClient,
    publisher: ArticlePublisher,
    indexer: SiteIndexer,
    batch: BatchSettings,
    rng: StdRng,
    history_file: Option<PathBuf>,
}

impl BatchScheduler {
    pub fn new(client: GenerationClient, publisher: ArticlePublisher, indexer: SiteIndexer, batch: &BatchSettings) -> Self {
        Self {
            client,
            publisher,
            indexer,
            batch: batch.clone(),
            rng: StdRng::from_entropy(),
            history_file: None,
        }
    }

    /// Makes topic sampling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Records every publishing run in the CSV history at `path`.
    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    pub fn batch_settings(&self) -> &BatchSettings {
        &self.batch
    }

    /// Generates `requested` articles from topics sampled out of `pool`.
    pub async fn run_bulk(&mut self, pool: &TopicPool, requested: usize) -> Result<RunSummary> {
        let batch_size = self.batch.batch_size.max(1);
        if requested == 0 {
            return Err(Error::Config("Requested article count must be at least 1".to_string()));
        }
        if pool.is_empty() {
            return Err(Error::TopicPool("Topic pool is empty".to_string()));
        }
        let first_batch = batch_size.min(requested);
        if pool.len() < first_batch {
            return Err(Error::TopicPool(format!(
                "Topic pool holds {} topics but a batch needs {}",
                pool.len(),
                first_batch
            )));
        }

        let logger = Logger::new().with_prefix("[bulk]");
        logger.info(&format!(
            "🚀 Generating {} articles in batches of {} from {} topics",
            requested,
            batch_size,
            pool.len()
        ));

        let mut summary = RunSummary::new(RunMode::Bulk, requested);
        let mut batch_no = 0;
        while summary.processed < requested {
            let remaining = requested - summary.processed;
            let count = batch_size.min(remaining);
            batch_no += 1;
            let planned = batch_no - 1 + remaining.div_ceil(batch_size);
            let batch_logger = logger.clone().with_prefix(format!("[batch {}/{}]", batch_no, planned));

            let topics = match pool.sample(count, &mut self.rng) {
                Ok(topics) => topics,
                Err(e) => {
                    batch_logger.error(&format!("❌ {}", e));
                    break;
                }
            };
            self.process_batch(&topics, &batch_logger, &mut summary).await;
            self.refresh_index(&batch_logger);

            if summary.processed < requested {
                self.pace(&batch_logger).await;
            }
        }

        self.finish(&logger, &summary);
        Ok(summary)
    }

    /// Regenerates every topic of `pool` in file order, one chunk per batch.
    pub async fn run_regenerate(&mut self, pool: &TopicPool) -> Result<RunSummary> {
        if pool.is_empty() {
            return Err(Error::TopicPool("Topic pool is empty".to_string()));
        }
        let batch_size = self.batch.batch_size.max(1);
        let logger = Logger::new().with_prefix("[regenerate]");
        logger.info(&format!(
            "♻️ Regenerating {} topics in batches of {} (policy: {:?})",
            pool.len(),
            batch_size,
            self.publisher.policy()
        ));

        let mut summary = RunSummary::new(RunMode::Regenerate, pool.len());
        let chunks: Vec<&[Topic]> = pool.topics().chunks(batch_size).collect();
        let total = chunks.len();
        for (i, topics) in chunks.into_iter().enumerate() {
            let batch_logger = logger.clone().with_prefix(format!("[batch {}/{}]", i + 1, total));
            self.process_batch(topics, &batch_logger, &mut summary).await;
            self.refresh_index(&batch_logger);
            if i + 1 < total {
                self.pace(&batch_logger).await;
            }
        }

        self.finish(&logger, &summary);
        Ok(summary)
    }

    /// Writes one free-form article. `Ok(None)` means the backend gave up.
    pub async fn run_single(&self, topic: &Topic, kind: ArticleKind) -> Result<Option<PublishedArticle>> {
        let logger = Logger::new().with_prefix("[single]");
        logger.info(&format!("🖋️ Generating {:?} for topic: {}", kind, topic));

        let prompt = match kind {
            ArticleKind::Article => prompts::single_article(topic),
            ArticleKind::News => prompts::news_summary(topic),
        };
        let Some(text) = self.client.generate(&prompt, false).await else {
            logger.error("❌ Backend returned nothing, no article published");
            return Ok(None);
        };

        let title = parser::extract_heading_title(&text).unwrap_or_else(|| topic.to_string());
        let body = parser::strip_title_heading(&text);
        let article = self.publisher.publish(topic.as_str(), &title, &body)?;

        let mut summary = RunSummary::new(RunMode::Single, 1);
        summary.processed = 1;
        summary.published = 1;
        self.refresh_index(&logger);
        self.finish(&logger, &summary);
        Ok(Some(article))
    }

    pub fn rebuild_index(&self) -> Result<IndexReport> {
        self.indexer.rebuild()
    }

    /// Generates, parses and publishes one batch. The caller refreshes the
    /// index afterwards, whatever the outcome.
    async fn process_batch(&self, topics: &[Topic], logger: &Logger, summary: &mut RunSummary) {
        let names: Vec<&str> = topics.iter().map(Topic::as_str).collect();
        logger.info(&format!("📦 Requesting {} articles: {}", topics.len(), names.join(", ")));

        let prompt = prompts::bulk_articles(topics);
        let Some(raw) = self.client.generate(&prompt, true).await else {
            logger.error("❌ Generation failed, skipping batch");
            summary.failed_batches += 1;
            summary.processed += topics.len();
            return;
        };
        logger.debug(&format!("Received {} bytes", raw.len()));

        let mut records = match parser::try_parse_articles(&raw) {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                logger.error("❌ Response contained no articles, skipping batch");
                summary.failed_batches += 1;
                summary.processed += topics.len();
                return;
            }
            Err(e) => {
                logger.error(&format!("❌ {}, skipping batch", e));
                summary.failed_batches += 1;
                summary.processed += topics.len();
                return;
            }
        };
        if records.len() > topics.len() {
            logger.warn(&format!(
                "⚠️ Received {} articles for {} topics, discarding the extra ones",
                records.len(),
                topics.len()
            ));
            records.truncate(topics.len());
        }

        for record in &records {
            match self.publisher.publish_record(record) {
                Ok(article) => {
                    summary.published += 1;
                    logger.info(&format!("✅ Published {} ({})", article.title, article.filename));
                }
                Err(e) => {
                    summary.failed_articles += 1;
                    logger.error(&format!("❌ Failed to publish {}: {}", record.title, e));
                }
            }
        }
        summary.processed += records.len();
    }

    fn refresh_index(&self, logger: &Logger) {
        if let Err(e) = self.indexer.rebuild() {
            logger.warn(&format!("⚠️ Index rebuild failed: {}", e));
        }
    }

    async fn pace(&self, logger: &Logger) {
        if self.batch.pacing.is_zero() {
            return;
        }
        logger.info(&format!("⏳ Waiting {}s before the next batch", self.batch.pacing.as_secs()));
        tokio::time::sleep(self.batch.pacing).await;
    }

    fn finish(&self, logger: &Logger, summary: &RunSummary) {
        logger.info(&format!("🏁 {}", summary));
        if let Some(path) = &self.history_file {
            if let Err(e) = history::append_history(path, summary.published, summary.mode) {
                logger.warn(&format!("⚠️ Could not update history {}: {}", path.display(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use gaia_core::{AffiliateSettings, GenerationBackend, GenerationRequest, GenerationSettings, PublishPolicy, SiteSettings};
    use gaia_inference::RetryPolicy;
    use gaia_site::naming;
    use tempfile::TempDir;

    /// Replays scripted replies, then answers every prompt with one record per
    /// listed topic.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<String>>>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedBackend {
        fn with_script(replies: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Vec::len).collect()
        }
    }

    fn records_for(topics: &[String]) -> String {
        let records: Vec<_> = topics
            .iter()
            .map(|t| serde_json::json!({"topic": t, "title": format!("{} review", t), "content": "## Summary\nGood."}))
            .collect();
        serde_json::to_string(&records).unwrap()
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            let topics = prompts::topics_in_prompt(&request.prompt);
            self.batches.lock().unwrap().push(topics.clone());
            if let Some(reply) = self.script.lock().unwrap().pop_front() {
                return reply;
            }
            if request.structured {
                Ok(records_for(&topics))
            } else {
                Ok("# 電気ケトルの選び方\n\n## 容量\n1Lで十分です。".to_string())
            }
        }
    }

    struct Fixture {
        dir: TempDir,
        backend: std::sync::Arc<ScriptedBackend>,
    }

    impl Fixture {
        fn new(script: Vec<Result<String>>) -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                backend: std::sync::Arc::new(ScriptedBackend::with_script(script)),
            }
        }

        fn site(&self) -> SiteSettings {
            SiteSettings::new(self.dir.path().join("docs"), "https://example.com/").unwrap()
        }

        fn scheduler(&self, batch_size: usize, policy: PublishPolicy) -> BatchScheduler {
            self.paced_scheduler(batch_size, policy, Duration::ZERO)
        }

        fn paced_scheduler(&self, batch_size: usize, policy: PublishPolicy, pacing: Duration) -> BatchScheduler {
            let client = GenerationClient::new(self.backend.clone(), &GenerationSettings::default())
                .with_retry(RetryPolicy::new(1, Duration::ZERO));
            let site = self.site();
            let publisher = ArticlePublisher::new(&site, &AffiliateSettings::default()).with_policy(policy);
            let batch = BatchSettings {
                batch_size,
                pacing,
            };
            BatchScheduler::new(client, publisher, SiteIndexer::new(&site), &batch)
                .with_seed(42)
                .with_history(self.history_path())
        }

        fn history_path(&self) -> PathBuf {
            self.dir.path().join("logs").join("history.csv")
        }

        fn article_files(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(self.dir.path().join("docs"))
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|name| naming::is_article_filename(name))
                .collect();
            names.sort();
            names
        }
    }

    fn pool(size: usize) -> TopicPool {
        TopicPool::from_lines(&(1..=size).map(|i| format!("topic {}", i)).collect::<Vec<_>>().join("\n"))
    }

    fn backend_error() -> Result<String> {
        Err(Error::Backend {
            status: 400,
            message: "bad request".to_string(),
        })
    }

    #[tokio::test]
    async fn test_bulk_run_end_to_end() {
        let fixture = Fixture::new(Vec::new());
        let mut scheduler = fixture.scheduler(3, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(10), 5).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![3, 2]);
        assert_eq!(summary.requested, 5);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.published, 5);
        assert_eq!(summary.failed_batches, 0);

        let files = fixture.article_files();
        assert_eq!(files.len(), 5);
        let index = fs::read_to_string(fixture.dir.path().join("docs").join("index.html")).unwrap();
        assert_eq!(index.matches("<li>").count(), 5);
        for file in &files {
            assert!(index.contains(file.as_str()));
        }
        let history = fs::read_to_string(fixture.history_path()).unwrap();
        assert!(history.ends_with(",5,Bulk\n"));
    }

    #[tokio::test]
    async fn test_batch_topics_are_distinct() {
        let fixture = Fixture::new(Vec::new());
        let mut scheduler = fixture.scheduler(4, PublishPolicy::Add);
        scheduler.run_bulk(&pool(4), 4).await.unwrap();

        let batches = fixture.backend.batches.lock().unwrap().clone();
        let mut topics = batches[0].clone();
        topics.sort();
        topics.dedup();
        assert_eq!(topics.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_generation_advances_processed() {
        let fixture = Fixture::new(vec![backend_error()]);
        let mut scheduler = fixture.scheduler(2, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(6), 4).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![2, 2]);
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(fixture.article_files().len(), 2);
    }

    #[tokio::test]
    async fn test_index_is_rebuilt_even_when_every_batch_fails() {
        let fixture = Fixture::new(vec![backend_error(), Ok("no json here".to_string())]);
        let mut scheduler = fixture.scheduler(2, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(4), 4).await.unwrap();

        assert_eq!(summary.failed_batches, 2);
        assert_eq!(summary.published, 0);
        let docs = fixture.dir.path().join("docs");
        let index = fs::read_to_string(docs.join("index.html")).unwrap();
        assert_eq!(index.matches("<li>").count(), 0);
        assert!(docs.join("sitemap.xml").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_pauses_between_batches_only() {
        let pacing = Duration::from_secs(30);
        let fixture = Fixture::new(Vec::new());
        let mut scheduler = fixture.paced_scheduler(2, PublishPolicy::Add, pacing);

        let started = tokio::time::Instant::now();
        scheduler.run_bulk(&pool(6), 5).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![2, 2, 1]);
        assert_eq!(started.elapsed(), pacing * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_pauses_between_batches_only() {
        let pacing = Duration::from_secs(7);
        let fixture = Fixture::new(vec![backend_error()]);
        let mut scheduler = fixture.paced_scheduler(3, PublishPolicy::Add, pacing);

        let started = tokio::time::Instant::now();
        scheduler.run_regenerate(&pool(7)).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![3, 3, 1]);
        assert_eq!(started.elapsed(), pacing * 2);
    }

    #[tokio::test]
    async fn test_unparsable_and_empty_batches_do_not_halt() {
        let fixture = Fixture::new(vec![Ok("I could not do that.".to_string()), Ok("[]".to_string())]);
        let mut scheduler = fixture.scheduler(2, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(6), 6).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![2, 2, 2]);
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.failed_batches, 2);
    }

    #[tokio::test]
    async fn test_extra_records_are_discarded() {
        let extra: Vec<String> = (1..=5).map(|i| format!("bonus {}", i)).collect();
        let fixture = Fixture::new(vec![Ok(records_for(&extra))]);
        let mut scheduler = fixture.scheduler(3, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(5), 3).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.published, 3);
        assert_eq!(fixture.article_files().len(), 3);
    }

    #[tokio::test]
    async fn test_short_batches_continue_until_requested() {
        let one = vec!["topic 1".to_string()];
        let fixture = Fixture::new(vec![Ok(records_for(&one))]);
        let mut scheduler = fixture.scheduler(3, PublishPolicy::Add);

        let summary = scheduler.run_bulk(&pool(5), 3).await.unwrap();

        assert_eq!(fixture.backend.batch_sizes(), vec![3, 2]);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.published, 3);
    }

    #[tokio::test]
    async fn test_preconditions_are_checked_before_any_request() {
        let fixture = Fixture::new(Vec::new());
        let mut scheduler = fixture.scheduler(3, PublishPolicy::Add);

        assert!(matches!(scheduler.run_bulk(&pool(5), 0).await, Err(Error::Config(_))));
        assert!(matches!(scheduler.run_bulk(&pool(0), 2).await, Err(Error::TopicPool(_))));
        assert!(matches!(scheduler.run_bulk(&pool(2), 5).await, Err(Error::TopicPool(_))));
        assert!(fixture.backend.batch_sizes().is_empty());

        // A pool smaller than the batch is fine when fewer articles are requested.
        let summary = scheduler.run_bulk(&pool(2), 2).await.unwrap();
        assert_eq!(summary.published, 2);
    }

    #[tokio::test]
    async fn test_regenerate_walks_pool_in_order() {
        let fixture = Fixture::new(Vec::new());
        let mut scheduler = fixture.scheduler(2, PublishPolicy::Replace);

        let summary = scheduler.run_regenerate(&pool(5)).await.unwrap();
        assert_eq!(fixture.backend.batch_sizes(), vec![2, 2, 1]);
        assert_eq!(fixture.backend.batches.lock().unwrap()[0], vec!["topic 1", "topic 2"]);
        assert_eq!(summary.published, 5);

        let first_run = fixture.article_files();
        scheduler.run_regenerate(&pool(5)).await.unwrap();
        let second_run = fixture.article_files();
        assert_eq!(second_run.len(), 5);
        assert!(second_run.iter().all(|name| !first_run.contains(name)));
    }

    #[tokio::test]
    async fn test_single_article_uses_heading_as_title() {
        let fixture = Fixture::new(Vec::new());
        let scheduler = fixture.scheduler(3, PublishPolicy::Add);

        let article = scheduler
            .run_single(&Topic::new("電気ケトル"), ArticleKind::Article)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(article.title, "電気ケトルの選び方");
        let html = fs::read_to_string(&article.path).unwrap();
        assert_eq!(html.matches("<h1>").count(), 1);
        assert!(html.contains("<h2>容量</h2>"));
        let index = scheduler.rebuild_index().unwrap();
        assert_eq!(index.entries.len(), 1);
        assert!(fs::read_to_string(fixture.history_path()).unwrap().ends_with(",1,Single\n"));
    }

    #[tokio::test]
    async fn test_single_article_backend_failure_publishes_nothing() {
        let fixture = Fixture::new(vec![backend_error()]);
        let scheduler = fixture.scheduler(3, PublishPolicy::Add);

        let article = scheduler.run_single(&Topic::new("kettle"), ArticleKind::News).await.unwrap();
        assert!(article.is_none());
        assert!(!fixture.history_path().exists());
    }
}
