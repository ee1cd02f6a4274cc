use serde_json::json;

use super::adaptive_card;
use crate::bot::schema::Attachment;

/// Card shown inside a task module when the request cannot be served.
pub fn error_card(message: &str) -> Attachment {
    adaptive_card(
        vec![json!({
            "type": "TextBlock",
            "text": message,
            "wrap": true,
            "size": "default",
            "horizontalAlignment": "center",
        })],
        vec![],
    )
}
