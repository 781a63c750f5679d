pub mod domain;
pub mod ports;
pub mod prompt;

pub use domain::{Conversation, Message, Role};
pub use ports::{ChatCompletionService, ConversationStore, PortError, PortResult};
