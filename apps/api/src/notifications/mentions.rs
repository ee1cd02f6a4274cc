//! Mention activities that tag team members by name.

use serde_json::json;

use crate::bot::schema::{Activity, TeamsChannelAccount};
use crate::strings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    SetAdmin,
    Nomination,
    Winner,
}

fn matches_address(member: &TeamsChannelAccount, address: &str) -> bool {
    [member.email.as_deref(), member.user_principal_name.as_deref()]
        .into_iter()
        .flatten()
        .any(|known| known.eq_ignore_ascii_case(address))
}

fn mention_text(name: &str) -> String {
    format!("<at>{name}</at>")
}

fn mention_entity(member: &TeamsChannelAccount) -> serde_json::Value {
    json!({
        "type": "mention",
        "mentioned": { "id": member.id, "name": member.name },
        "text": mention_text(&member.name),
    })
}

/// Builds a message mentioning every roster member whose e-mail or UPN is in
/// `addresses`. Set-admin and nomination messages also mention the acting
/// user, found by object id.
pub fn mention_activity(
    roster: &[TeamsChannelAccount],
    addresses: &[String],
    actor_object_id: Option<&str>,
    kind: MentionKind,
) -> Activity {
    let mentioned: Vec<&TeamsChannelAccount> = roster
        .iter()
        .filter(|member| {
            addresses
                .iter()
                .map(|address| address.trim())
                .any(|address| !address.is_empty() && matches_address(member, address))
        })
        .collect();

    let mut entities: Vec<_> = mentioned.iter().map(|m| mention_entity(m)).collect();
    let names = mentioned
        .iter()
        .map(|m| mention_text(&m.name))
        .collect::<Vec<_>>()
        .join(", ");

    let actor = actor_object_id
        .and_then(|oid| roster.iter().find(|member| member.aad_object_id == oid));
    let actor_text = actor.map(|a| mention_text(&a.name)).unwrap_or_default();

    let text = match kind {
        MentionKind::SetAdmin => strings::set_admin_mention(&names, &actor_text),
        MentionKind::Nomination => strings::nomination_mention(&names, &actor_text),
        MentionKind::Winner => format!("{} {names}", strings::WINNER_MENTION_TEXT),
    };
    if kind != MentionKind::Winner {
        if let Some(actor) = actor {
            entities.push(mention_entity(actor));
        }
    }

    Activity {
        entities,
        ..Activity::message(text)
    }
}

/// Splits a comma-joined address list.
pub fn split_addresses(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}
