//! REPL input parsing

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send as a chat message
    Message(String),
    Login(Option<String>),
    Signup,
    New,
    History,
    Open(String),
    WhoAmI,
    Logout,
    Help,
    Quit,
    /// `/open` without an argument
    MissingArgument(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(ReplCommand::Message(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        let command = match name.to_lowercase().as_str() {
            "login" | "signin" => ReplCommand::Login(arg.map(str::to_string)),
            "signup" | "register" => ReplCommand::Signup,
            "new" => ReplCommand::New,
            "history" | "ls" => ReplCommand::History,
            "open" | "o" => match arg {
                Some(arg) => ReplCommand::Open(arg.to_string()),
                None => ReplCommand::MissingArgument("/open <n|id>"),
            },
            "whoami" | "me" => ReplCommand::WhoAmI,
            "logout" | "signout" => ReplCommand::Logout,
            "help" | "h" | "?" => ReplCommand::Help,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(format!("/{}", name)),
        };
        Some(command)
    }

    /// Commands accepted before signing in
    pub fn allowed_signed_out(&self) -> bool {
        matches!(
            self,
            ReplCommand::Login(_)
                | ReplCommand::Signup
                | ReplCommand::Help
                | ReplCommand::Quit
                | ReplCommand::Unknown(_)
        )
    }
}
