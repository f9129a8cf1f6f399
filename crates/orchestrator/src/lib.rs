//! Batch order submission engine
//!
//! - `DraftStore`: ordered drafts, re-validated on every edit
//! - `OrderValidator`: structural field checks
//! - `BatchOrchestrator`: snapshots the valid drafts and drives one run at a
//!   time through an `OrderSubmitter`, sequentially or with bounded fan-out
//! - `ProgressReporter`: tear-free live view of a run

pub mod executor;
pub mod orchestrator;
pub mod progress;
pub mod run;
pub mod store;
pub mod validator;


// Re-export main types
pub use executor::{Attempt, OrderSubmitter, SubmissionExecutor};
pub use orchestrator::{
    BatchOrchestrator, BatchOrchestratorBuilder, BuilderError, OrchestratorConfig,
    OrchestratorError, RunHandle, DEFAULT_MAX_IN_FLIGHT,
};
pub use progress::{ProgressPublisher, ProgressReporter};
pub use run::{execute, RunPlan};
pub use store::{DraftStore, StoreError, StoreSummary};
pub use validator::{OrderValidator, ValidationError};
