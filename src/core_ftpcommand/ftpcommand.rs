#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    CWD,
    CDUP,
    LIST,
    NLST,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    RETR,
    STOR,
    APPE,
    TYPE,
    MODE,
    STRU,
    REST,
    PASV,
    EPSV,
    PORT,
    EPRT,
    ABOR,
    SIZE,
    MDTM,
    FEAT,
    OPTS,
    SYST,
    NOOP,
    ALLO,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "PWD" | "XPWD" => Some(FtpCommand::PWD),
            "CWD" | "XCWD" => Some(FtpCommand::CWD),
            "CDUP" | "XCUP" => Some(FtpCommand::CDUP),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "TYPE" => Some(FtpCommand::TYPE),
            "MODE" => Some(FtpCommand::MODE),
            "STRU" => Some(FtpCommand::STRU),
            "REST" => Some(FtpCommand::REST),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            "PORT" => Some(FtpCommand::PORT),
            "EPRT" => Some(FtpCommand::EPRT),
            "ABOR" => Some(FtpCommand::ABOR),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "SYST" => Some(FtpCommand::SYST),
            "NOOP" => Some(FtpCommand::NOOP),
            "ALLO" => Some(FtpCommand::ALLO),
            _ => None,
        }
    }

    /// Commands usable before login.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::NOOP
                | FtpCommand::SYST
                | FtpCommand::FEAT
                | FtpCommand::OPTS
                | FtpCommand::ABOR
        )
    }

    pub fn requires_arg(&self) -> bool {
        matches!(
            self,
            FtpCommand::USER
                | FtpCommand::CWD
                | FtpCommand::MKD
                | FtpCommand::RMD
                | FtpCommand::DELE
                | FtpCommand::RNFR
                | FtpCommand::RNTO
                | FtpCommand::RETR
                | FtpCommand::STOR
                | FtpCommand::APPE
                | FtpCommand::TYPE
                | FtpCommand::MODE
                | FtpCommand::STRU
                | FtpCommand::REST
                | FtpCommand::PORT
                | FtpCommand::EPRT
                | FtpCommand::SIZE
                | FtpCommand::MDTM
                | FtpCommand::OPTS
        )
    }
}

/// Splits a command line at the first space into `(VERB, argument)`.
///
/// Telnet interrupt bytes some clients put in front of `ABOR` are dropped.
/// The argument keeps its inner spaces.
pub fn parse_command_line(line: &str) -> (String, String) {
    let line = line
        .trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
        .trim_end_matches(&['\r', '\n'][..]);
    match line.split_once(' ') {
        Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
        None => (line.to_ascii_uppercase(), String::new()),
    }
}

pub fn is_abort_line(line: &str) -> bool {
    let (verb, _) = parse_command_line(line);
    verb == "ABOR"
}
