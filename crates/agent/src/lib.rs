//! The conversation orchestrator at the heart of Casewise.
//!
//! One user turn flows through these steps:
//!
//! 1. **Resolve** the credential pool (empty pool ends the turn right away)
//! 2. **Compose** the system instruction from persona, session and learned facts
//! 3. **Attempt** each (credential, model) pair in cascade order until one answers
//! 4. **Execute** any tool calls and send their results back for a continuation
//! 5. **Reply** with the answer, or with a fixed message when nothing worked

pub mod orchestrator;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{
    ATTEMPT_TIMEOUT, ConverseRequest, FALLBACK_MESSAGE, HISTORY_WINDOW, MAX_TOOL_CALLS_PER_TURN,
    NO_CREDENTIALS_MESSAGE, Orchestrator, Reply, SideEffectFn,
};
pub use prompt::compose;
