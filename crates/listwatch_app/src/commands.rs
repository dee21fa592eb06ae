//! Console commands, mirroring the bot's chat commands.

use listwatch_engine::{Destination, EngineCommand};

pub const HELP: &str = "\
commands:
  threads|th [year] [month]    list the threads of a month
  setlastcheck|slc <date>      move the last-check time
  check                        check for new threads now
  quit                         stop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Engine(EngineCommand),
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}; try `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parses one console line. A leading `/` is accepted, as in chat.
pub fn parse_line(line: &str, destination: &Destination) -> Result<Input, CommandError> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let destination = destination.clone();

    let input = match name.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "threads" | "th" => Input::Engine(EngineCommand::ListPeriod {
            args: rest.split_whitespace().map(str::to_string).collect(),
            destination,
        }),
        "setlastcheck" | "slc" if rest.is_empty() => {
            return Err(CommandError::Usage("setlastcheck <date>"));
        }
        "setlastcheck" | "slc" => Input::Engine(EngineCommand::SetCheckpoint {
            text: rest.to_string(),
            destination,
        }),
        "check" => Input::Engine(EngineCommand::CheckForUpdates { destination }),
        "help" | "start" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(input)
}
