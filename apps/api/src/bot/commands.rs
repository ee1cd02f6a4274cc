/// Commands carried in card actions and task-module payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ConfigureAdmin,
    Endorse,
    Nominate,
    SaveAdminDetails,
    Cancel,
    UpdateAdminDetail,
    SaveNominatedDetails,
    Ok,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::ConfigureAdmin,
        Command::Endorse,
        Command::Nominate,
        Command::SaveAdminDetails,
        Command::Cancel,
        Command::UpdateAdminDetail,
        Command::SaveNominatedDetails,
        Command::Ok,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::ConfigureAdmin => "CONFIGUREADMIN",
            Command::Endorse => "ENDORSE",
            Command::Nominate => "NOMINATE",
            Command::SaveAdminDetails => "SAVEADMINDETAILS",
            Command::Cancel => "CANCEL",
            Command::UpdateAdminDetail => "UPDATEADMINDETAIL",
            Command::SaveNominatedDetails => "SAVENOMINATEDDETAILS",
            Command::Ok => "OK",
        }
    }

    /// Case-insensitive parse; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Command> {
        let raw = raw.trim();
        Command::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
