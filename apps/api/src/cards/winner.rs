use std::collections::BTreeSet;

use serde_json::json;

use super::{adaptive_card, award_image_url};
use crate::bot::schema::Attachment;
use crate::models::nomination::AwardWinnerNotification;
use crate::strings;

/// One card per award, in order of first appearance, listing every distinct
/// winner of that award.
pub fn winner_carousel(app_base_uri: &str, winners: &[AwardWinnerNotification]) -> Vec<Attachment> {
    let mut groups: Vec<(&str, Vec<&AwardWinnerNotification>)> = Vec::new();
    for winner in winners {
        match groups.iter_mut().find(|(name, _)| *name == winner.award_name) {
            Some((_, members)) => members.push(winner),
            None => groups.push((&winner.award_name, vec![winner])),
        }
    }

    groups
        .into_iter()
        .map(|(award_name, members)| {
            let first = members[0];
            adaptive_card(
                vec![
                    json!({
                        "type": "TextBlock",
                        "text": strings::AWARD_WINNER_CARD_TITLE,
                        "weight": "bolder",
                        "size": "large",
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": format!("{}: {}", strings::WINNER_CARD_REWARD_CYCLE_TITLE, first.award_cycle),
                        "size": "small",
                        "spacing": "small",
                        "wrap": true,
                    }),
                    json!({
                        "type": "Image",
                        "url": award_image_url(app_base_uri, first.award_link.as_deref()),
                        "width": "416px",
                        "height": "220px",
                        "size": "auto",
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": award_name,
                        "size": "large",
                        "weight": "bolder",
                        "spacing": "small",
                        "wrap": true,
                    }),
                    json!({
                        "type": "TextBlock",
                        "text": winner_names(&members),
                        "size": "small",
                        "spacing": "medium",
                        "wrap": true,
                    }),
                ],
                vec![],
            )
        })
        .collect()
}

/// Group nominations store several names comma-joined in one record.
fn winner_names(members: &[&AwardWinnerNotification]) -> String {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .flat_map(|member| member.nominated_to_name.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty() && seen.insert(name.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner(award: &str, names: &str) -> AwardWinnerNotification {
        AwardWinnerNotification {
            team_id: "team-1".to_string(),
            award_name: award.to_string(),
            award_cycle: "May 2024".to_string(),
            nominated_to_name: names.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_award_and_dedups_names() {
        let winners = vec![
            winner("Star", "Riley"),
            winner("Helper", "Sam"),
            winner("Star", "Riley, Jo"),
        ];
        let cards = winner_carousel("https://rnr.example.com", &winners);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].content["body"][3]["text"], "Star");
        assert_eq!(cards[0].content["body"][4]["text"], "Riley, Jo");
        assert_eq!(cards[0].content["body"][1]["text"], "Reward cycle: May 2024");
        assert_eq!(cards[1].content["body"][4]["text"], "Sam");
        assert!(cards[0].content.get("actions").is_none());
    }
}
