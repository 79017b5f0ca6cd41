mod candidate;
mod chat;
mod question;

pub use candidate::{Candidate, ProfileField};
pub use chat::{ChatMessage, MessageRole};
pub use question::{Difficulty, Question};
