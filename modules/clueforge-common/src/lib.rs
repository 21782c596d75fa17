pub mod config;
pub mod enumeration;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::{BatchPlan, Config, MechanismFilter, PipelinePolicy, RefereeMode};
pub use enumeration::Enumeration;
pub use error::ClueError;
pub use normalize::{letters_only, normalize};
pub use types::*;
