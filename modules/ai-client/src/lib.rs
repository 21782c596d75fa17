pub mod error;
pub mod gateway;
pub mod schema;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use gateway::Gateway;
pub use schema::StructuredOutput;
pub use traits::{ChatModel, Completion, Message, MessageRole};
pub use util::{extract_json, strip_code_blocks, truncate_to_char_boundary};
