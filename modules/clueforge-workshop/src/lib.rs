//! The asynchronous half of clueforge: model-backed collaborators, the
//! per-candidate state machine, and the batch scheduler that fans
//! candidates out.

pub mod batch;
pub mod error;
pub mod lifecycle;
pub mod llm;
pub mod pool;
pub mod pool_loader;
pub mod publication;
pub mod report;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::{BatchOutcome, BatchScheduler, BatchStats, RejectedInput};
pub use error::CollaboratorError;
pub use lifecycle::{transition_allowed, ClueLifecycle};
pub use llm::LlmWorkshop;
pub use pool::{PoolEntry, PoolStats, WordPool};
pub use report::RunReport;
pub use traits::{Draw, GenerativeCollaborator, WordSupply};
