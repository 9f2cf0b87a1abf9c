//! The declaration of the `itemize_receipt` tool offered to the model.
//!
//! Property names and enumerations come from the same types that decode the tool call, so the
//! schema the model sees and the shape we accept cannot drift apart.

use crate::api::{FunctionDefinition, Tool, ToolKind};
use crate::model::{Category, PaymentMethod};
use serde_json::{json, Value};

/// The name of the only tool the model is offered.
pub const ITEMIZE_RECEIPT: &str = "itemize_receipt";

const DESCRIPTION: &str = "Itemize a receipt from an image";

/// The receipt-level properties the model must always provide.
pub const REQUIRED_FIELDS: [&str; 4] = ["vendor", "date", "items", "payment_method"];

/// Builds the `itemize_receipt` tool definition.
pub fn itemize_receipt_tool() -> Tool {
    Tool {
        kind: ToolKind::Function,
        function: FunctionDefinition {
            name: ITEMIZE_RECEIPT.to_string(),
            description: DESCRIPTION.to_string(),
            parameters: parameters(),
        },
    }
}

fn parameters() -> Value {
    let categories: Vec<String> = Category::ALL.iter().map(|c| c.to_string()).collect();
    let payment_methods: Vec<String> = PaymentMethod::ALL.iter().map(|p| p.to_string()).collect();
    json!({
        "type": "object",
        "properties": {
            "vendor": {
                "type": "string",
                "description": "Name of vendor",
            },
            "date": {
                "type": "string",
                "format": "date",
                "description": "Date of purchase",
            },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of item",
                        },
                        "price": {
                            "type": "number",
                            "description": "Price of item",
                        },
                        "quantity": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Quantity of item",
                        },
                        "category": {
                            "type": "string",
                            "description": "Category of item",
                            "enum": categories,
                        },
                    },
                },
                "description": "List of items purchased",
            },
            "payment_method": {
                "type": "string",
                "description": "Payment method",
                "enum": payment_methods,
            },
        },
        "required": REQUIRED_FIELDS,
    })
}
