//! Decides what a chat response means: a structured receipt, or a refusal/commentary.

use crate::api::ChatResponse;
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::extract::schema::ITEMIZE_RECEIPT;
use crate::model::ReceiptExtraction;
use crate::Result;
use anyhow::{anyhow, Context};

/// What the model did with the image.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// The model called `itemize_receipt` and its arguments decoded.
    Extracted(ReceiptExtraction),
    /// The model answered with text instead. This is usually the "please send a receipt" reply to
    /// an image that is not a receipt. The message may be empty.
    Refusal(String),
}

/// Interprets the first choice of `response`.
///
/// # Errors
/// - `ErrorType::NoResponse` if there are no choices.
/// - `ErrorType::MalformedExtraction` if `itemize_receipt` was called with arguments that do not
///   decode as a `ReceiptExtraction`.
pub fn interpret(response: &ChatResponse) -> Result<Interpretation> {
    let message = match response.choices.first() {
        Some(choice) => &choice.message,
        None => {
            return Err(Error::new(
                ErrorType::NoResponse,
                anyhow!("The response contained no choices"),
            ))
        }
    };

    let call = message
        .tool_calls
        .as_deref()
        .and_then(|calls| calls.first())
        .filter(|call| call.function.name == ITEMIZE_RECEIPT);

    match call {
        Some(call) => {
            let receipt = decode(&call.function.arguments)
                .pub_result(ErrorType::MalformedExtraction)?;
            Ok(Interpretation::Extracted(receipt))
        }
        None => Ok(Interpretation::Refusal(
            message.content.clone().unwrap_or_default(),
        )),
    }
}

fn decode(arguments: &str) -> Res<ReceiptExtraction> {
    serde_json::from_str(arguments).with_context(|| {
        format!("Unable to decode the {ITEMIZE_RECEIPT} arguments as a receipt: {arguments}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Choice, FunctionCall, ResponseMessage, ToolCall};
    use crate::model::{Category, PaymentMethod};
    use chrono::NaiveDate;

    const CORNER_DELI: &str = r#"{
        "vendor": "Corner Deli",
        "date": "2024-03-01",
        "items": [
            {"name": "Sandwich", "price": 8.50, "quantity": 1, "category": "meal"},
            {"name": "Chips", "price": 2.00, "quantity": 2, "category": "groceries"}
        ],
        "payment_method": "credit"
    }"#;

    #[test]
    fn test_structured_branch() {
        let response = ChatResponse::tool_call("itemize_receipt", CORNER_DELI);
        let receipt = match interpret(&response).unwrap() {
            Interpretation::Extracted(receipt) => receipt,
            other => panic!("expected a receipt, got {other:?}"),
        };
        assert_eq!(receipt.vendor(), Some("Corner Deli"));
        assert_eq!(
            receipt.date(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(receipt.payment_method(), Some(PaymentMethod::Credit));
        assert_eq!(receipt.items().len(), 2);
        assert_eq!(receipt.items()[1].category(), Some(Category::Groceries));
    }

    #[test]
    fn test_refusal_branch() {
        let response = ChatResponse::text("Please provide an image of a receipt.");
        assert_eq!(
            interpret(&response).unwrap(),
            Interpretation::Refusal("Please provide an image of a receipt.".to_string())
        );
    }

    #[test]
    fn test_other_tool_is_refusal() {
        let response = ChatResponse::tool_call("describe_image", r#"{"text": "a cat"}"#);
        assert_eq!(
            interpret(&response).unwrap(),
            Interpretation::Refusal(String::new())
        );
    }

    #[test]
    fn test_empty_tool_calls_is_refusal() {
        let response = ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("Not a receipt".to_string()),
                    tool_calls: Some(Vec::new()),
                },
            }],
        };
        assert_eq!(
            interpret(&response).unwrap(),
            Interpretation::Refusal("Not a receipt".to_string())
        );
    }

    #[test]
    fn test_only_first_tool_call_counts() {
        let response = ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(vec![
                        ToolCall {
                            id: "call_1".to_string(),
                            function: FunctionCall {
                                name: "something_else".to_string(),
                                arguments: "{}".to_string(),
                            },
                        },
                        ToolCall {
                            id: "call_2".to_string(),
                            function: FunctionCall {
                                name: "itemize_receipt".to_string(),
                                arguments: CORNER_DELI.to_string(),
                            },
                        },
                    ]),
                },
            }],
        };
        assert!(matches!(
            interpret(&response).unwrap(),
            Interpretation::Refusal(_)
        ));
    }

    #[test]
    fn test_unparseable_arguments() {
        let response = ChatResponse::tool_call("itemize_receipt", "{not json");
        let err = interpret(&response).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedExtraction);
    }

    #[test]
    fn test_missing_items_is_malformed() {
        let response = ChatResponse::tool_call("itemize_receipt", r#"{"vendor": "V"}"#);
        let err = interpret(&response).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedExtraction);
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn test_zero_quantity_is_malformed() {
        let response = ChatResponse::tool_call(
            "itemize_receipt",
            r#"{"items": [{"name": "Pen", "price": 1.0, "quantity": 0}]}"#,
        );
        let err = interpret(&response).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedExtraction);
    }

    #[test]
    fn test_no_choices() {
        let err = interpret(&ChatResponse::default()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NoResponse);
    }
}
