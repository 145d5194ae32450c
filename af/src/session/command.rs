//! Slash command parsing

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    /// Set the context for later tasks; `None` clears it
    Context(Option<String>),
    History,
    /// Show a stored result as a report
    Show(Option<usize>),
    /// Show a stored result as JSON
    Json(Option<usize>),
    Clear,
    Unknown(String),
    /// A known command with an argument it cannot use
    Invalid(String),
}

impl SlashCommand {
    /// Parse a line starting with `/`
    ///
    /// `/show` and `/json` take an optional 1-based history id; without one
    /// they refer to the latest result.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "/help" | "/h" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/context" | "/ctx" => Self::Context(if rest.is_empty() { None } else { Some(rest.to_string()) }),
            "/history" => Self::History,
            "/show" => Self::parse_id(rest).map_or_else(|| Self::invalid(cmd, rest), Self::Show),
            "/json" => Self::parse_id(rest).map_or_else(|| Self::invalid(cmd, rest), Self::Json),
            "/clear" | "/c" => Self::Clear,
            _ => Self::Unknown(cmd.to_string()),
        }
    }

    /// `Some(None)` for no argument, `Some(Some(id))` for a positive id
    fn parse_id(rest: &str) -> Option<Option<usize>> {
        if rest.is_empty() {
            return Some(None);
        }
        match rest.parse::<usize>() {
            Ok(id) if id > 0 => Some(Some(id)),
            _ => None,
        }
    }

    fn invalid(cmd: &str, rest: &str) -> Self {
        Self::Invalid(format!("{}: expected a history number, got '{}'", cmd, rest))
    }
}
