//! Integer arithmetic tools: add, subtract, multiply, divide, modulus.
//!
//! Each tool takes two integer operands `a` and `b`. Overflow is reported as
//! a tool failure; `divide` and `modulus` by zero fail with
//! [`ToolError::DivisionByZero`].

use std::sync::Arc;

use serde_json::json;

use crate::error::ToolError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{FnTool, Tool};
use crate::tools::types::{ToolSchema, ValueType};

pub fn add(a: i64, b: i64) -> Result<i64, ToolError> {
    a.checked_add(b).ok_or_else(|| overflow("add"))
}

pub fn subtract(a: i64, b: i64) -> Result<i64, ToolError> {
    a.checked_sub(b).ok_or_else(|| overflow("subtract"))
}

pub fn multiply(a: i64, b: i64) -> Result<i64, ToolError> {
    a.checked_mul(b).ok_or_else(|| overflow("multiply"))
}

pub fn divide(a: i64, b: i64) -> Result<f64, ToolError> {
    if b == 0 {
        return Err(ToolError::DivisionByZero);
    }
    Ok(a as f64 / b as f64)
}

pub fn modulus(a: i64, b: i64) -> Result<i64, ToolError> {
    if b == 0 {
        return Err(ToolError::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or_else(|| overflow("modulus"))?;
    // Remainder takes the sign of the divisor.
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn overflow(tool: &str) -> ToolError {
    ToolError::execution(tool, "integer overflow")
}

fn operands(args: &ToolArguments) -> Result<(i64, i64), ToolError> {
    Ok((args.get_i64("a")?, args.get_i64("b")?))
}

fn binary_schema(returns: ValueType) -> ToolSchema {
    ToolSchema::builder()
        .integer("a", "First operand")
        .integer("b", "Second operand")
        .returns(returns)
        .build()
}

fn integer_tool(
    name: &'static str,
    description: &'static str,
    op: fn(i64, i64) -> Result<i64, ToolError>,
) -> Arc<dyn Tool> {
    Arc::new(FnTool::sync(
        name,
        description,
        binary_schema(ValueType::Integer),
        move |args| {
            let (a, b) = operands(args)?;
            Ok(json!(op(a, b)?))
        },
    ))
}

pub fn add_tool() -> Arc<dyn Tool> {
    integer_tool("add", "Add two integers and return the sum.", add)
}

pub fn subtract_tool() -> Arc<dyn Tool> {
    integer_tool(
        "subtract",
        "Subtract the second integer from the first and return the result.",
        subtract,
    )
}

pub fn multiply_tool() -> Arc<dyn Tool> {
    integer_tool("multiply", "Multiply two integers and return the result.", multiply)
}

pub fn modulus_tool() -> Arc<dyn Tool> {
    integer_tool(
        "modulus",
        "Return the remainder when the first integer is divided by the second.",
        modulus,
    )
}

pub fn divide_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::sync(
        "divide",
        "Divide the first integer by the second and return the result as a float. Fails when dividing by zero.",
        binary_schema(ValueType::Number),
        |args| {
            let (a, b) = operands(args)?;
            Ok(json!(divide(a, b)?))
        },
    ))
}

/// All arithmetic tools, in advertised order.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        multiply_tool(),
        add_tool(),
        subtract_tool(),
        divide_tool(),
        modulus_tool(),
    ]
}
