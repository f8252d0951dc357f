//! Line command grammar for the terminal front-end.
//!
//! # Invariants
//! - Indices are zero-based, matching `MemoBook`.
//! - `title`/`content` take the rest of the line verbatim (may be empty).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const HELP: &str = "\
commands:
  list              show all memos, `*` marks the selected one
  show              print the selected memo
  add               append an Untitled memo and select it
  select <n>        select memo n
  title <text>      replace the selected memo's title
  content <text>    replace the selected memo's content
  delete <n>        delete memo n
  flush             write pending changes now
  help              print this help
  quit              flush and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show,
    Add,
    Select(usize),
    Title(String),
    Content(String),
    Delete(usize),
    Flush,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingIndex(&'static str),
    InvalidIndex(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown(name) => write!(f, "unknown command `{name}`; try `help`"),
            Self::MissingIndex(name) => write!(f, "`{name}` needs a memo index"),
            Self::InvalidIndex(value) => write!(f, "`{value}` is not a memo index"),
        }
    }
}

impl Error for CommandError {}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (trimmed, ""),
        };

        match name {
            "" => Err(CommandError::Empty),
            "list" | "ls" => Ok(Self::List),
            "show" => Ok(Self::Show),
            "add" | "new" => Ok(Self::Add),
            "select" => parse_index("select", rest).map(Self::Select),
            "delete" | "rm" => parse_index("delete", rest).map(Self::Delete),
            "title" => Ok(Self::Title(rest.to_string())),
            "content" => Ok(Self::Content(rest.to_string())),
            "flush" => Ok(Self::Flush),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_index(name: &'static str, rest: &str) -> Result<usize, CommandError> {
    let value = rest.trim();
    if value.is_empty() {
        return Err(CommandError::MissingIndex(name));
    }
    value
        .parse::<usize>()
        .map_err(|_| CommandError::InvalidIndex(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandError};

    #[test]
    fn parses_index_commands() {
        assert_eq!(Command::parse("select 2"), Ok(Command::Select(2)));
        assert_eq!(Command::parse("  rm 0 \n"), Ok(Command::Delete(0)));
        assert_eq!(
            Command::parse("delete"),
            Err(CommandError::MissingIndex("delete"))
        );
        assert_eq!(
            Command::parse("select -1"),
            Err(CommandError::InvalidIndex("-1".to_string()))
        );
    }

    #[test]
    fn text_commands_keep_rest_of_line() {
        assert_eq!(
            Command::parse("content  two  spaces "),
            Ok(Command::Content(" two  spaces ".to_string()))
        );
        assert_eq!(Command::parse("title"), Ok(Command::Title(String::new())));
    }

    #[test]
    fn rejects_blank_and_unknown_input() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("undo"),
            Err(CommandError::Unknown("undo".to_string()))
        );
    }
}
