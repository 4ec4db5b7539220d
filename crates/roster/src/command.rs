//! Direct-message command grammar.
//!
//! A command is either one of the bare words `help`, `stats`, `list-all`, or
//! `<verb> <#CHANNEL> [<@USER>...]`. Channel and user references may carry a
//! `|label` suffix, which is ignored.

use {
    regex::Regex,
    teambot_channels::{ChannelId, UserId},
};

use crate::Result;

const COMMAND_PATTERN: &str =
    r"^(?P<cmd>\w+)\s+<#(?P<channel>C\w+)(?:\|[^>]*)?>(?P<people>(?:\s+<@U\w+(?:\|[^>]*)?>)*)$";
const PERSON_PATTERN: &str = r"<@(?P<user>U\w+)(?:\|[^>]*)?>";

/// Roster verbs accepted before a channel reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Info,
    Create,
    Add,
    Remove,
    Join,
    Leave,
    Drop,
}

impl Verb {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "info" => Some(Self::Info),
            "create" => Some(Self::Create),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "join" => Some(Self::Join),
            "leave" => Some(Self::Leave),
            "drop" => Some(Self::Drop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Create => "create",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Drop => "drop",
        }
    }

    /// Whether the verb changes the directory.
    pub fn mutates(self) -> bool {
        !matches!(self, Self::Info)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Stats,
    ListAll,
    Roster {
        verb: Verb,
        channel: ChannelId,
        /// Users listed after the channel, in message order, duplicates kept.
        people: Vec<UserId>,
    },
}

/// Why a direct message was not a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFault {
    /// The text does not have the `<verb> <#channel> [<@user>...]` shape.
    Unrecognized,
    /// The shape matched but the verb is not known.
    UnknownVerb(String),
}

/// Compiled command grammar.
#[derive(Debug, Clone)]
pub struct CommandParser {
    command: Regex,
    person: Regex,
}

impl CommandParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            command: Regex::new(COMMAND_PATTERN)?,
            person: Regex::new(PERSON_PATTERN)?,
        })
    }

    /// Parse a direct message. Surrounding whitespace is ignored.
    pub fn parse(&self, text: &str) -> std::result::Result<Command, ParseFault> {
        let text = text.trim();
        match text {
            "help" => return Ok(Command::Help),
            "stats" => return Ok(Command::Stats),
            "list-all" => return Ok(Command::ListAll),
            _ => {},
        }

        let caps = self
            .command
            .captures(text)
            .ok_or(ParseFault::Unrecognized)?;
        let word = &caps["cmd"];
        let verb = Verb::parse(word).ok_or_else(|| ParseFault::UnknownVerb(word.to_string()))?;
        let people = caps
            .name("people")
            .map(|m| {
                self.person
                    .captures_iter(m.as_str())
                    .map(|p| UserId::new(&p["user"]))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Command::Roster {
            verb,
            channel: ChannelId::new(&caps["channel"]),
            people,
        })
    }
}
