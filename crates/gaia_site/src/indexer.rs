use std::fs;
use std::path::{Path, PathBuf};

use gaia_core::{Result, SiteSettings};

use crate::naming;
use crate::render::{self, IndexEntry};

pub const INDEX_FILE: &str = "index.html";
pub const SITEMAP_FILE: &str = "sitemap.xml";

#[derive(Debug, Clone)]
pub struct IndexReport {
    pub index_path: PathBuf,
    pub sitemap_path: PathBuf,
    pub entries: Vec<IndexEntry>,
}

/// Rebuilds `index.html` and `sitemap.xml` from the artifacts on disk.
///
/// Nothing is cached between calls; titles are read back from each page, so
/// the index always matches the directory contents.
#[derive(Debug, Clone)]
pub struct SiteIndexer {
    site: SiteSettings,
}

impl SiteIndexer {
    pub fn new(site: &SiteSettings) -> Self {
        Self { site: site.clone() }
    }

    /// Published artifacts, newest first.
    pub fn scan(&self) -> Result<Vec<IndexEntry>> {
        let dir = &self.site.output_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut filenames = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if naming::is_article_filename(name) {
                    filenames.push(name.to_string());
                }
            }
        }
        filenames.sort_unstable_by(|a, b| b.cmp(a));

        Ok(filenames
            .into_iter()
            .map(|filename| {
                let title = fs::read_to_string(dir.join(&filename))
                    .ok()
                    .and_then(|document| render::page_title(&document))
                    .unwrap_or_else(|| filename.clone());
                IndexEntry {
                    date: naming::date_from_filename(&filename),
                    filename,
                    title,
                }
            })
            .collect())
    }

    pub fn rebuild(&self) -> Result<IndexReport> {
        let entries = self.scan()?;
        fs::create_dir_all(&self.site.output_dir)?;

        let index_path = self.site.output_dir.join(INDEX_FILE);
        write_replacing(&index_path, &render::index_page(&self.site.site_name, &entries))?;

        let page_urls: Vec<_> = entries
            .iter()
            .map(|entry| (self.site.page_url(&entry.filename), entry.date))
            .collect();
        let sitemap_path = self.site.output_dir.join(SITEMAP_FILE);
        write_replacing(&sitemap_path, &render::sitemap(self.site.site_url.as_str(), &page_urls))?;

        tracing::info!("🗂️ Updated {} and {} ({} articles)", INDEX_FILE, SITEMAP_FILE, entries.len());
        Ok(IndexReport {
            index_path,
            sitemap_path,
            entries,
        })
    }
}

/// Writes through a sibling temporary file so readers never see a partial
/// document.
fn write_replacing(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
