//! Convenience re-exports for common use.

pub use crate::agent::{Agent, DispatchSettings, DispatchStatus, Interaction, SessionStore};
pub use crate::config::AgentConfig;
pub use crate::error::{AgentError, Result, ToolError};
pub use crate::models::LanguageModel;
pub use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
pub use crate::tools::{FnTool, Tool, ToolArguments, ToolRegistry, ToolSchema};
pub use crate::types::{GenerationSettings, Message, ToolOutcome, ToolRequest, Usage};
