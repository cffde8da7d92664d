pub mod affiliate;
pub mod indexer;
pub mod naming;
pub mod publisher;
pub mod render;
pub mod shortcodes;

pub use affiliate::{AffiliateInjector, Retailer};
pub use indexer::{IndexReport, SiteIndexer};
pub use publisher::ArticlePublisher;
pub use render::IndexEntry;

pub mod prelude {
    pub use super::indexer::SiteIndexer;
    pub use super::publisher::ArticlePublisher;
    pub use gaia_core::{Error, PublishedArticle, Result};
}
