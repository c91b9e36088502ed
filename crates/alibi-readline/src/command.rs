/// Slash commands available at any prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Retry,
    Restart,
    Quit,
}

impl Command {
    pub const NAMES: [&'static str; 5] = ["/help", "/status", "/retry", "/restart", "/quit"];

    /// Parses a line starting with `/`. Returns `None` for ordinary input.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let word = line.trim();
        if !word.starts_with('/') {
            return None;
        }
        let command = match word.to_ascii_lowercase().as_str() {
            "/help" | "/?" => Command::Help,
            "/status" | "/time" => Command::Status,
            "/retry" => Command::Retry,
            "/restart" => Command::Restart,
            "/quit" | "/exit" => Command::Quit,
            _ => return Some(Err(word.to_string())),
        };
        Some(Ok(command))
    }
}

pub const HELP_TEXT: &str = "\
/status   show the remaining time
/retry    resend your details if the first question failed to load
/restart  abandon this interrogation and start over
/quit     leave the game";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_is_not_a_command() {
        assert_eq!(Command::parse("I was at home"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/quit"), Some(Ok(Command::Quit)));
        assert_eq!(Command::parse(" /Restart "), Some(Ok(Command::Restart)));
        assert_eq!(Command::parse("/time"), Some(Ok(Command::Status)));
        assert_eq!(Command::parse("/nope"), Some(Err("/nope".to_string())));
    }
}
