//! Knowledge and transcript storage implementations for Casewise.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::{FileKnowledge, FileTranscript};
pub use in_memory::{InMemoryKnowledge, InMemoryTranscript};
