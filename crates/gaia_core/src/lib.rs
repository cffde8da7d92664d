pub mod config;
pub mod error;
pub mod generation;
pub mod types;

pub use config::{AffiliateSettings, BatchSettings, GenerationSettings, LinkStyle, Settings, SiteSettings};
pub use error::{Error, Result};
pub use generation::GenerationBackend;
pub use types::{
    ArticleKind, ArticleRecord, GenerationRequest, PublishPolicy, PublishedArticle, RequestKind, RunMode,
    RunSummary, Topic, UNTITLED,
};
