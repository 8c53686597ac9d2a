// Adapters layer: concrete implementations of the domain ports and of the
// narrative service.

pub mod openai;
pub mod snapshot;

pub use openai::OpenAiNarrator;
pub use snapshot::{SnapshotDocument, SnapshotOracle};
