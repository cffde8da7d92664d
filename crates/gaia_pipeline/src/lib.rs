pub mod cli;
pub mod history;
pub mod logging;
pub mod parser;
pub mod scheduler;
pub mod topics;

pub use cli::{handle_command, HumanDuration, PipelineCommands, PipelineContext};
pub use logging::{init_logging, Logger};
pub use parser::{extract_heading_title, parse_articles, try_parse_articles};
pub use scheduler::BatchScheduler;
pub use topics::{normalize_topic, TopicPool};

pub mod prelude {
    pub use super::scheduler::BatchScheduler;
    pub use super::topics::TopicPool;
    pub use gaia_core::{Error, Result, RunSummary};
}
