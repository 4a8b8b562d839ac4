pub mod checkpoint;
pub mod collector;
pub mod error;
pub mod extract;
pub mod status;

pub use checkpoint::{Checkpoint, CheckpointProgress};
pub use collector::{CollectOptions, Collector, CustomQueryResult, HaltReason, RunSummary};
pub use error::CollectError;
pub use extract::{unique_channel_ids, ChannelFetch, Extractor, SearchEnd, SearchOutcome};
pub use status::{ExtractionStatus, StatusHandle};

#[cfg(test)]
pub(crate) mod testing;
