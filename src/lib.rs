pub mod adapters;
pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{OpenAiNarrator, SnapshotOracle};
pub use analysis::{NarrativeService, TokenSink};
pub use config::ChartConfig;
pub use core::report::format_as_plain_text;
pub use core::{ChartEngine, EngineOptions};
pub use domain::model::{Astrolabe, BirthDate, BirthSpec, Gender, LunarDate};
pub use utils::error::{ChartError, Result};
