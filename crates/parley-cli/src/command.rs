//! Line commands.
//!
//! A line starting with `/` is a command; anything else is a message to
//! send. Blank lines are still submitted so the view can reject them.

use parley_app::UserInput;
use parley_proto::Scope;
use thiserror::Error;

/// Help text listing the commands.
pub const HELP: &str = "\
/open <slug>   switch to a conversation
/close         close the current conversation
/name <name>   change your display name
/retry         reload a failed history or resend a failed message
/dismiss       forget failed messages
/quit          exit";

/// Command parse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Command is not recognised.
    #[error("unknown command /{0} (try /help)")]
    Unknown(String),

    /// Command needs an argument.
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    /// User asked for the command list.
    #[error("{}", HELP)]
    Help,
}

/// Translate one input line into user intents.
///
/// # Errors
///
/// Returns an error for unknown commands or missing arguments.
pub fn parse_line(line: &str) -> Result<Vec<UserInput>, CommandError> {
    let Some(command) = line.strip_prefix('/') else {
        return Ok(vec![UserInput::Draft(line.to_string()), UserInput::Submit]);
    };

    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command.trim_end(), ""),
    };

    let input = match name {
        "open" => UserInput::Open(Scope::new(required("open", argument)?)),
        "close" => UserInput::Close,
        "name" => UserInput::SetAuthorName(required("name", argument)?.to_string()),
        "retry" => UserInput::Retry,
        "dismiss" => UserInput::DismissFailed,
        "quit" | "exit" => UserInput::Quit,
        "help" => return Err(CommandError::Help),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(vec![input])
}

fn required<'a>(command: &'static str, argument: &'a str) -> Result<&'a str, CommandError> {
    if argument.is_empty() { Err(CommandError::MissingArgument(command)) } else { Ok(argument) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_draft_and_submit() {
        assert_eq!(parse_line("hello there").unwrap(), [
            UserInput::Draft("hello there".into()),
            UserInput::Submit
        ]);
    }

    #[test]
    fn blank_line_is_still_submitted() {
        assert_eq!(parse_line("").unwrap(), [UserInput::Draft(String::new()), UserInput::Submit]);
    }

    #[test]
    fn open_takes_slug() {
        assert_eq!(parse_line("/open  demo ").unwrap(), [UserInput::Open(Scope::new("demo"))]);
        assert_eq!(parse_line("/open"), Err(CommandError::MissingArgument("open")));
    }

    #[test]
    fn name_keeps_inner_spaces() {
        assert_eq!(parse_line("/name Kim Mina").unwrap(), [UserInput::SetAuthorName(
            "Kim Mina".into()
        )]);
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = parse_line("/frobnicate").unwrap_err();
        assert_eq!(err.to_string(), "unknown command /frobnicate (try /help)");
    }
}
