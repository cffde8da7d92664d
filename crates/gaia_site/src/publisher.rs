use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Utc};
use gaia_core::{AffiliateSettings, ArticleRecord, Error, PublishPolicy, PublishedArticle, Result, SiteSettings};

use crate::affiliate::AffiliateInjector;
use crate::naming;
use crate::render::{self, ArticlePage};
use crate::shortcodes;

/// Turns article records into pages in the output directory.
///
/// Publishing never rewrites an existing file: every call creates a new
/// artifact with a fresh timestamped name.
#[derive(Debug, Clone)]
pub struct ArticlePublisher {
    site: SiteSettings,
    affiliate: AffiliateInjector,
    policy: PublishPolicy,
}

impl ArticlePublisher {
    pub fn new(site: &SiteSettings, affiliate: &AffiliateSettings) -> Self {
        Self {
            site: site.clone(),
            affiliate: AffiliateInjector::new(affiliate),
            policy: PublishPolicy::Add,
        }
    }

    pub fn with_policy(mut self, policy: PublishPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }

    pub fn output_dir(&self) -> &Path {
        &self.site.output_dir
    }

    pub fn publish_record(&self, record: &ArticleRecord) -> Result<PublishedArticle> {
        self.publish(&record.topic, &record.title, &record.content)
    }

    pub fn publish(&self, topic: &str, title: &str, content: &str) -> Result<PublishedArticle> {
        self.publish_at(topic, title, content, Utc::now())
    }

    fn publish_at(&self, topic: &str, title: &str, content: &str, now: DateTime<Utc>) -> Result<PublishedArticle> {
        fs::create_dir_all(&self.site.output_dir)?;

        let markdown = format!("{}\n\n{}\n", shortcodes::expand(content), self.affiliate.render(topic));
        let body_html = render::markdown_to_html(&markdown);

        let mut instant = now;
        let (filename, path) = loop {
            let filename = naming::article_filename(&instant);
            let path = self.site.output_dir.join(&filename);
            let canonical_url = self.site.page_url(&filename);
            let page = ArticlePage {
                title,
                topic,
                canonical_url: &canonical_url,
                site_name: &self.site.site_name,
                locale: &self.site.locale,
                body_html: &body_html,
                year: instant.year(),
            }
            .render();

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(page.as_bytes()).and_then(|_| file.sync_all()) {
                        drop(file);
                        let _ = fs::remove_file(&path);
                        return Err(Error::Publish(format!("Failed to write {}: {}", path.display(), e)));
                    }
                    break (filename, path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("{} already exists, advancing timestamp", filename);
                    instant = instant + Duration::microseconds(1);
                }
                Err(e) => {
                    return Err(Error::Publish(format!("Failed to create {}: {}", path.display(), e)));
                }
            }
        };

        tracing::info!("📝 Article saved to: {}", path.display());

        if self.policy == PublishPolicy::Replace {
            let removed = self.remove_previous(topic, &filename, |path| fs::remove_file(path));
            if removed > 0 {
                tracing::info!("🗑️ Replaced {} earlier article(s) for topic {}", removed, topic);
            }
        }

        Ok(PublishedArticle {
            filename,
            path,
            title: title.to_string(),
            topic: topic.to_string(),
            created_at: instant,
        })
    }

    /// Deletes earlier artifacts whose topic meta equals `topic` and returns
    /// how many went away. The new page is already on disk at this point, so
    /// cleanup failures are logged and never fail the publish.
    fn remove_previous<F>(&self, topic: &str, keep: &str, mut remove: F) -> usize
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let paths = match self.article_paths() {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("⚠️ Could not list earlier articles for {}: {}", topic, e);
                return 0;
            }
        };

        let mut removed = 0;
        for path in paths {
            let is_kept = path.file_name().and_then(|n| n.to_str()) == Some(keep);
            if is_kept {
                continue;
            }
            let document = match fs::read_to_string(&path) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("⚠️ Could not read {}: {}", path.display(), e);
                    continue;
                }
            };
            if render::page_topic(&document).as_deref() != Some(topic.trim()) {
                continue;
            }
            match remove(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("⚠️ Could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }

    fn article_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.site.output_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_str().is_some_and(naming::is_article_filename) {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }
}
