//! Run configuration.
//!
//! Everything is read once at startup into [`Settings`] and handed to the
//! components by reference. Values come from the process environment (after
//! `.env` has been loaded by the binary) and may be overridden by CLI flags.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SITE_URL: &str = "https://example.github.io/gaia/";

#[derive(Debug, Clone)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub affiliate: AffiliateSettings,
    pub site: SiteSettings,
    pub batch: BatchSettings,
}

#[derive(Clone)]
pub struct GenerationSettings {
    pub api_key: Option<String>,
    pub model_name: String,
    pub base_url: String,
    pub single_timeout: Duration,
    pub bulk_timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl std::fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("single_timeout", &self.single_timeout)
            .field("bulk_timeout", &self.bulk_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            single_timeout: Duration::from_secs(120),
            bulk_timeout: Duration::from_secs(300),
            max_attempts: 5,
            retry_delay: Duration::from_secs(10),
        }
    }
}

/// How the outbound retailer links are presented on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LinkStyle {
    #[default]
    Card,
    List,
}

impl FromStr for LinkStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(LinkStyle::Card),
            "list" => Ok(LinkStyle::List),
            other => Err(Error::Config(format!("Unknown link style: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AffiliateSettings {
    pub amazon_tag: String,
    pub rakuten_id: String,
    pub style: LinkStyle,
}

impl Default for AffiliateSettings {
    fn default() -> Self {
        Self {
            amazon_tag: "no_tag".to_string(),
            rakuten_id: "no_id".to_string(),
            style: LinkStyle::Card,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub output_dir: PathBuf,
    /// Public base URL of the site, always ending in `/`.
    pub site_url: Url,
    pub site_name: String,
    pub locale: String,
    pub history_file: PathBuf,
}

impl SiteSettings {
    pub fn new(output_dir: impl Into<PathBuf>, site_url: &str) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.into(),
            site_url: parse_site_url(site_url)?,
            site_name: "Gaia Blog".to_string(),
            locale: "ja_JP".to_string(),
            history_file: PathBuf::from("logs/history.csv"),
        })
    }

    /// Absolute URL of a file in the output directory.
    pub fn page_url(&self, filename: &str) -> String {
        self.site_url
            .join(filename)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", self.site_url, filename))
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub pacing: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            pacing: Duration::from_secs(5),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = GenerationSettings::default();
        let generation = GenerationSettings {
            api_key: get("GEMINI_API_KEY"),
            model_name: get("GEMINI_MODEL_NAME").unwrap_or(defaults.model_name),
            base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            single_timeout: secs(&get, "GAIA_SINGLE_TIMEOUT_SECS", defaults.single_timeout)?,
            bulk_timeout: secs(&get, "GAIA_BULK_TIMEOUT_SECS", defaults.bulk_timeout)?,
            max_attempts: number(&get, "GAIA_RETRY_ATTEMPTS", defaults.max_attempts)?,
            retry_delay: secs(&get, "GAIA_RETRY_DELAY_SECS", defaults.retry_delay)?,
        };
        if generation.max_attempts == 0 {
            return Err(Error::Config("GAIA_RETRY_ATTEMPTS must be at least 1".to_string()));
        }

        let affiliate_defaults = AffiliateSettings::default();
        let affiliate = AffiliateSettings {
            amazon_tag: get("AMAZON_TAG").unwrap_or(affiliate_defaults.amazon_tag),
            rakuten_id: get("RAKUTEN_ID").unwrap_or(affiliate_defaults.rakuten_id),
            style: match get("GAIA_LINK_STYLE") {
                Some(style) => style.parse()?,
                None => affiliate_defaults.style,
            },
        };

        let mut site = SiteSettings::new(
            get("GAIA_OUTPUT_DIR").unwrap_or_else(|| "docs".to_string()),
            &get("GAIA_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
        )?;
        if let Some(name) = get("GAIA_SITE_NAME") {
            site.site_name = name;
        }
        if let Some(history) = get("GAIA_HISTORY_FILE") {
            site.history_file = PathBuf::from(history);
        }

        let batch_defaults = BatchSettings::default();
        let batch = BatchSettings {
            batch_size: number(&get, "GAIA_BATCH_SIZE", batch_defaults.batch_size)?,
            pacing: secs(&get, "GAIA_PACING_SECS", batch_defaults.pacing)?,
        };
        if batch.batch_size == 0 {
            return Err(Error::Config("GAIA_BATCH_SIZE must be at least 1".to_string()));
        }

        Ok(Self {
            generation,
            affiliate,
            site,
            batch,
        })
    }
}

fn number<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got {:?}", key, raw))),
        None => Ok(default),
    }
}

fn secs<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    number(get, key, default.as_secs()).map(Duration::from_secs)
}

fn parse_site_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::Config(format!("Invalid site URL {:?}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
