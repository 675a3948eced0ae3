//! Tool system for function calling.

pub mod arguments;
pub mod arithmetic;
pub mod registry;
pub mod search;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool};
pub use types::{ParamSpec, ToolSchema, ValueType};
pub use validation::validate_arguments;
