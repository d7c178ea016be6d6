use crate::mcp::{CallToolParams, CallToolResult, ParamSpec, ParamType, ToolDescriptor, ToolHandler};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value};

/// Add two numbers together.
///
/// Operands parsed from JSON fit in 64 bits, so their sum always fits here.
#[inline]
pub fn add_numbers(a: i128, b: i128) -> i128 {
    a + b
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    a: Number,
    b: Number,
}

/// Largest magnitude accepted from a float operand (2^64)
const MAX_FLOAT_OPERAND: f64 = 18_446_744_073_709_551_616.0;

/// Widen a JSON integer. Floats with no fractional part, such as `2.0`, count
/// as integers; anything else is refused.
fn integer(name: &str, number: &Number) -> Result<i128, String> {
    if let Some(value) = number.as_i64() {
        return Ok(i128::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Ok(i128::from(value));
    }

    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() <= MAX_FLOAT_OPERAND => {
            Ok(value as i128)
        }
        _ => Err(format!("'{}' must be an integer, got {}", name, number)),
    }
}

/// JSON form of the sum, when it fits a JSON integer
fn json_integer(value: i128) -> Option<Value> {
    i64::try_from(value)
        .map(Value::from)
        .or_else(|_| u64::try_from(value).map(Value::from))
        .ok()
}

/// `add_numbers` tool handler
pub struct AddNumbersHandler;

impl AddNumbersHandler {
    #[inline]
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "add_numbers",
            "Add two numbers together",
            vec![
                ParamSpec::required("a", ParamType::Integer, "First addend"),
                ParamSpec::required("b", ParamType::Integer, "Second addend"),
            ],
            ParamType::Integer,
        )
    }
}

#[async_trait]
impl ToolHandler for AddNumbersHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = params.name.clone();
        let args: AddArgs = match super::parse_arguments(params) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let (a, b) = match (integer("a", &args.a), integer("b", &args.b)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(message), _) | (_, Err(message)) => {
                return Ok(CallToolResult::error(format!(
                    "Invalid arguments for tool '{}': {}",
                    tool, message
                )));
            }
        };

        let sum = add_numbers(a, b);
        let result = CallToolResult::text(sum.to_string());
        Ok(match json_integer(sum) {
            Some(value) => result.with_result(value),
            None => result,
        })
    }
}
