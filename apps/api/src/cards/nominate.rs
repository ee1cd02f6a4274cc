use chrono::{DateTime, Utc};
use serde_json::json;

use super::{adaptive_card, award_image_url, date_token, submit_action};
use crate::bot::commands::Command;
use crate::bot::schema::{Attachment, TaskModuleDetails};
use crate::models::award::AwardEntity;
use crate::strings;

/// One card per award, each with a Nominate button for the given cycle.
pub fn nominate_carousel(
    app_base_uri: &str,
    awards: &[AwardEntity],
    cycle_id: &str,
    cycle_start: DateTime<Utc>,
    cycle_end: DateTime<Utc>,
) -> Vec<Attachment> {
    let header = strings::reward_cycle_header(&date_token(cycle_start), &date_token(cycle_end));

    awards
        .iter()
        .map(|award| {
            let action = TaskModuleDetails {
                award_id: Some(award.award_id.clone()),
                reward_cycle_id: Some(cycle_id.to_string()),
                ..TaskModuleDetails::fetch(Command::Nominate.as_str())
            };
            adaptive_card(
                vec![
                    json!({
                        "type": "TextBlock",
                        "text": strings::REWARD_TITLE,
                        "weight": "bolder",
                        "size": "large",
                    }),
                    json!({
                        "type": "Image",
                        "url": award_image_url(app_base_uri, award.award_link.as_deref()),
                        "width": "432px",
                        "height": "243px",
                        "size": "auto",
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": format!("**{}**", award.award_name.trim()),
                        "size": "large",
                        "weight": "bolder",
                        "spacing": "small",
                        "wrap": true,
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": header,
                        "size": "small",
                        "spacing": "small",
                        "wrap": true,
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": award.award_description,
                        "size": "small",
                        "spacing": "small",
                        "wrap": true,
                    }),
                ],
                vec![submit_action(strings::NOMINATE_BUTTON, &action)],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_one_card_per_award() {
        let awards = vec![
            AwardEntity {
                team_id: "team-1".to_string(),
                award_id: "a-1".to_string(),
                award_name: " Star ".to_string(),
                ..Default::default()
            },
            AwardEntity {
                team_id: "team-1".to_string(),
                award_id: "a-2".to_string(),
                award_name: "Helper".to_string(),
                award_link: Some("https://cdn.example.com/helper.png".to_string()),
                ..Default::default()
            },
        ];
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();
        let cards = nominate_carousel("https://rnr.example.com", &awards, "cycle-1", start, end);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].content["body"][2]["text"], "**Star**");
        assert_eq!(
            cards[1].content["body"][1]["url"],
            "https://cdn.example.com/helper.png"
        );
        let data = &cards[1].content["actions"][0]["data"];
        assert_eq!(data["command"], "NOMINATE");
        assert_eq!(data["AwardId"], "a-2");
        assert_eq!(data["RewardCycleId"], "cycle-1");
    }
}
