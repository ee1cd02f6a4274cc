use serde_json::json;

use super::{adaptive_card, submit_action, text_block};
use crate::bot::commands::Command;
use crate::bot::schema::{Attachment, TaskModuleDetails};
use crate::strings;

pub fn welcome_card(app_base_uri: &str) -> Attachment {
    adaptive_card(
        vec![
            json!({
                "type": "ColumnSet",
                "columns": [
                    {
                        "type": "Column",
                        "width": "auto",
                        "items": [{
                            "type": "Image",
                            "url": format!("{}/Content/RewardAndRecognitionLogo.png", app_base_uri.trim_matches('/')),
                            "size": "medium",
                        }],
                    },
                    {
                        "type": "Column",
                        "width": "stretch",
                        "items": [{
                            "type": "TextBlock",
                            "text": strings::WELCOME_HEADER,
                            "weight": "bolder",
                            "size": "large",
                            "wrap": true,
                        }],
                        "verticalContentAlignment": "center",
                    },
                ],
            }),
            text_block(strings::WELCOME_TEXT),
        ],
        vec![submit_action(
            strings::CONFIGURE_ADMIN_BUTTON,
            &TaskModuleDetails::fetch(Command::ConfigureAdmin.as_str()),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_card_opens_admin_dialog() {
        let card = welcome_card("https://rnr.example.com");
        let data = &card.content["actions"][0]["data"];
        assert_eq!(data["command"], "CONFIGUREADMIN");
        assert_eq!(data["msteams"]["type"], "task/fetch");
    }
}
