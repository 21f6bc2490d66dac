//! Command parsing for line-based input.
//!
//! This module parses input lines into structured [`Command`] values.

use lexo_client::ClientEvent;

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter matchmaking.
    Join,

    /// Ask the server to restore an active session.
    Resume,

    /// Abandon the current session.
    Leave,

    /// Clear a finished session.
    Reset,

    /// Send a reaction.
    Emote {
        /// Emote symbol.
        symbol: String,
    },

    /// Show the command list.
    Help,

    /// Quit the application.
    Quit,

    /// Submit a word.
    Word {
        /// Raw text as typed.
        text: String,
    },

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

impl Command {
    /// The client event this command maps to, if any.
    ///
    /// `Help`, `Quit` and malformed commands are handled by the front end.
    pub fn into_event(self) -> Option<ClientEvent> {
        match self {
            Self::Join => Some(ClientEvent::Join { resume: false }),
            Self::Resume => Some(ClientEvent::Join { resume: true }),
            Self::Leave => Some(ClientEvent::Leave),
            Self::Reset => Some(ClientEvent::Reset),
            Self::Emote { symbol } => Some(ClientEvent::SendEmote { symbol }),
            Self::Word { text } => Some(ClientEvent::Submit { text }),
            Self::Help | Self::Quit | Self::Unknown { .. } | Self::InvalidArgs { .. } => None,
        }
    }
}

/// One-line summary of every command.
pub const HELP: &str = "/join  /resume  /leave  /reset  /emote <symbol>  /help  /quit";

/// Parse a user input string into a command.
///
/// Commands start with `/`. Anything else is a word.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Word { text: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "join" => Command::Join,
        "resume" => Command::Resume,
        "leave" => Command::Leave,
        "reset" => Command::Reset,

        "emote" => match parts.get(1) {
            Some(symbol) if parts.len() == 2 => Command::Emote { symbol: (*symbol).to_string() },
            Some(_) => Command::InvalidArgs {
                command: "emote".into(),
                error: "Emote must be a single symbol".into(),
            },
            None => Command::InvalidArgs {
                command: "emote".into(),
                error: "Usage: /emote <symbol>".into(),
            },
        },

        "help" | "h" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word() {
        assert_eq!(parse("  kalem "), Command::Word { text: "kalem".into() });
    }

    #[test]
    fn parse_join_and_resume() {
        assert_eq!(parse("/join"), Command::Join);
        assert_eq!(parse("/resume"), Command::Resume);
    }

    #[test]
    fn parse_leave_and_reset() {
        assert_eq!(parse("/leave"), Command::Leave);
        assert_eq!(parse("/reset"), Command::Reset);
    }

    #[test]
    fn parse_emote() {
        assert_eq!(parse("/emote 🔥"), Command::Emote { symbol: "🔥".into() });
    }

    #[test]
    fn parse_emote_missing_symbol() {
        assert!(
            matches!(parse("/emote"), Command::InvalidArgs { command, .. } if command == "emote")
        );
        assert!(matches!(parse("/emote a b"), Command::InvalidArgs { .. }));
    }

    #[test]
    fn parse_quit() {
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/q"), Command::Quit);
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse("/surrender"), Command::Unknown { .. }));
        assert!(matches!(parse("/"), Command::Unknown { .. }));
    }

    #[test]
    fn parse_empty_is_an_empty_word() {
        assert_eq!(parse(""), Command::Word { text: String::new() });
    }

    #[test]
    fn commands_map_to_client_events() {
        assert_eq!(parse("/resume").into_event(), Some(ClientEvent::Join { resume: true }));
        assert_eq!(parse("test").into_event(), Some(ClientEvent::Submit { text: "test".into() }));
        assert_eq!(parse("/quit").into_event(), None);
        assert_eq!(parse("/nope").into_event(), None);
    }
}
