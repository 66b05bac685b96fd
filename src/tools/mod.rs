//! Tools the agent may call while answering a turn.

pub mod arguments;
pub mod tool;

pub use arguments::ToolArguments;
pub use tool::{Tool, ToolExecutionContext};
