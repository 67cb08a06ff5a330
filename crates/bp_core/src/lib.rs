pub mod models;
pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::LanguageModel;
pub use storage::PostStorage;
pub use types::{Candidate, ChatMessage, NewPost, Post, Role};
