//! User-facing text. English only.

pub const UNSUPPORTED_BOT_COMMAND: &str =
    "Sorry, I don't understand that. Use the Reward and Recognition tab or the messaging extension to nominate and endorse.";
pub const ERROR_MESSAGE: &str = "Something went wrong. Please try again in a while.";
pub const INVALID_TEAM_TEXT: &str =
    "Reward and Recognition is not installed in this team. Add the app to the team to nominate colleagues.";
pub const CYCLE_VALIDATION_MESSAGE: &str =
    "There is no reward cycle running at the moment. Please check with your admin.";
pub const CYCLE_CLOSED_MESSAGE: &str =
    "This reward cycle has been closed. Nominations and endorsements are no longer accepted.";

pub const NOMINATE_PEOPLE_TITLE: &str = "Nominate people";
pub const ENDORSE_TITLE: &str = "Endorse";
pub const CONFIGURE_ADMIN_TITLE: &str = "Configure admin";

pub const WELCOME_HEADER: &str = "Welcome to Reward and Recognition";
pub const WELCOME_TEXT: &str =
    "Recognise the people who make a difference. An admin sets up awards and reward cycles, team members nominate and endorse each other, and winners are announced right here.";
pub const CONFIGURE_ADMIN_BUTTON: &str = "Configure admin";

pub const ADMIN_HEADER: &str = "Reward and Recognition admin";
pub const ADMIN_SUBHEADER: &str = "Your team has a new admin";
pub const MANAGE_REWARD_TITLE: &str = "Manage rewards";

pub const REWARD_TITLE: &str = "Nominate for reward";
pub const NOMINATE_BUTTON: &str = "Nominate";
pub const ENDORSE_BUTTON: &str = "Endorse";
pub const OK_BUTTON: &str = "OK";

pub const AWARD_WINNER_CARD_TITLE: &str = "Congratulations to the award winners!";
pub const WINNER_CARD_REWARD_CYCLE_TITLE: &str = "Reward cycle";
pub const WINNER_MENTION_TEXT: &str = "Please join us in congratulating";

pub const NOMINATION_REMINDER_TEXT: &str =
    "The reward cycle ends in 3 days. Don't miss the chance to nominate your colleagues!";

pub fn admin_name(name: &str, principal_name: &str) -> String {
    format!("**{name}** ({principal_name}) will manage rewards for this team.")
}

pub fn note_for_team(note: &str) -> String {
    format!("Note: {note}")
}

pub fn nominated_by(name: &str) -> String {
    format!("Nominated by {name}")
}

pub fn reward_cycle_header(start: &str, end: &str) -> String {
    format!("Reward cycle: {start} - {end}")
}

pub fn successful_endorse(award_name: &str, nominee: &str, cycle_end: &str) -> String {
    format!("You endorsed {nominee} for {award_name}. Results will be published after the cycle ends on {cycle_end}.")
}

pub fn already_endorsed(cycle_end: &str) -> String {
    format!("You have already endorsed this nomination. Results will be published after the cycle ends on {cycle_end}.")
}

pub fn set_admin_mention(admins: &str, by: &str) -> String {
    format!("{admins} has been set as the Reward and Recognition admin by {by}.")
}

pub fn nomination_mention(nominees: &str, by: &str) -> String {
    format!("{nominees} has been nominated by {by}.")
}
