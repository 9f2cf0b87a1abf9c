use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::extract::itemize_receipt_tool;
use crate::Result;
use anyhow::Context;
use serde_json::Value;

/// Returns the `itemize_receipt` tool declaration that is sent with every request. The message is
/// the pretty-printed JSON and the structure is the same JSON as a value.
pub async fn schema() -> Result<Out<Value>> {
    let tool = serde_json::to_value(itemize_receipt_tool())
        .context("Unable to serialize the itemize_receipt tool")
        .pub_result(ErrorType::Internal)?;
    let pretty = serde_json::to_string_pretty(&tool)
        .context("Unable to format the itemize_receipt tool")
        .pub_result(ErrorType::Internal)?;
    Ok(Out::new(pretty, tool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema() {
        let out = schema().await.unwrap();
        let tool = out.structure().unwrap();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "itemize_receipt");
        let reparsed: Value = serde_json::from_str(out.message()).unwrap();
        assert_eq!(&reparsed, tool);
    }
}
