pub mod manager;
pub mod memory_monitor;
pub mod persistence;
pub mod pronoun;
pub mod session;
pub mod sweeper;

pub use manager::ContextManager;
pub use session::{ConversationContext, ConversationEntry, ReferenceType, ResolvedReference};
