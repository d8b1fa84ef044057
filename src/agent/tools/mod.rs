//! Tools the assistant can call while answering a question.

mod catalog;
mod registry;

pub use catalog::{QuerySinglesTool, TodayTool};
pub use registry::{AgentTool, AgentToolRegistry, ToolDefinition, ToolError};
