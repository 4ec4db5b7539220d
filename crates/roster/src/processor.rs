use std::sync::Arc;

use {
    async_trait::async_trait,
    teambot_channels::{
        BotIdentity, ChannelId, ChannelKind, MessageEvent, OutputMessage, Transport, UserId,
    },
    teambot_directory::{DirectoryStats, Roster, RosterStore},
    teambot_plugins::Plugin,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    command::{Command, CommandParser, ParseFault, Verb},
    replies,
};

/// Result of one direct-message command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Help,
    Stats(DirectoryStats),
    Listed(Vec<(ChannelId, Roster)>),
    Info { channel: ChannelId, roster: Roster },
    Created(ChannelId),
    Updated(ChannelId),
    Deleted(ChannelId),
    ParseFault(ParseFault),
    RosterNotFound(ChannelId),
    RosterExists(ChannelId),
    /// The bot is not a member of the target channel.
    PermissionDenied(ChannelId),
}

impl Outcome {
    /// Reply texts, in the order they are sent.
    pub fn replies(&self, bot: &UserId) -> Vec<String> {
        match self {
            Self::Help => vec![replies::HELP_TEXT.to_string()],
            Self::Stats(stats) => vec![replies::stats(*stats)],
            Self::Listed(entries) => vec![replies::list_all(entries)],
            Self::Info { channel, roster } => vec![replies::team_members(channel, roster)],
            Self::Created(channel) => vec![replies::created(channel)],
            Self::Updated(channel) => vec![replies::updated(channel)],
            Self::Deleted(channel) => vec![replies::deleted(channel)],
            Self::ParseFault(_) => vec![
                replies::UNRECOGNIZED.to_string(),
                replies::HELP_TEXT.to_string(),
            ],
            Self::RosterNotFound(channel) => vec![replies::no_team_record(channel)],
            Self::RosterExists(_) => vec![replies::TEAM_EXISTS.to_string()],
            Self::PermissionDenied(channel) => vec![replies::must_invite(bot, channel)],
        }
    }
}

struct Session {
    identity: BotIdentity,
    transport: Arc<dyn Transport>,
}

/// Answers roster commands and channel mentions.
///
/// Owns the directory exclusively. Every mutation is committed before the
/// reply describing it is returned.
pub struct RosterProcessor {
    directory: Box<dyn RosterStore>,
    parser: CommandParser,
    session: Option<Session>,
}

impl RosterProcessor {
    pub fn new(directory: Box<dyn RosterStore>) -> Result<Self> {
        Ok(Self {
            directory,
            parser: CommandParser::new()?,
            session: None,
        })
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotSetUp)
    }

    /// Replies to one chat message. Messages in channels that are neither
    /// multi-party nor direct produce nothing.
    pub async fn process(&self, message: &MessageEvent) -> Result<Vec<OutputMessage>> {
        let session = self.session()?;
        let texts = match message.channel.kind() {
            ChannelKind::MultiParty => self.on_channel_message(session, message).await?,
            ChannelKind::Direct => {
                let outcome = self.on_direct_message(session, message).await?;
                outcome.replies(&session.identity.user_id)
            },
            ChannelKind::Other => Vec::new(),
        };
        Ok(texts
            .into_iter()
            .map(|text| OutputMessage::new(message.channel.clone(), text))
            .collect())
    }

    async fn on_channel_message(
        &self,
        session: &Session,
        message: &MessageEvent,
    ) -> Result<Vec<String>> {
        if !session.identity.is_mentioned_in(&message.text) {
            return Ok(Vec::new());
        }
        let reply = match self.directory.get(&message.channel).await? {
            Some(roster) => {
                debug!(channel = %message.channel, members = roster.len(), "broadcasting to team");
                replies::broadcast(&roster, &message.sender)
            },
            None => replies::no_channel_team(&session.identity.user_id),
        };
        Ok(vec![reply])
    }

    async fn on_direct_message(&self, session: &Session, message: &MessageEvent) -> Result<Outcome> {
        let command = match self.parser.parse(&message.text) {
            Ok(command) => command,
            Err(fault) => {
                debug!(sender = %message.sender, ?fault, "unrecognized command");
                return Ok(Outcome::ParseFault(fault));
            },
        };
        self.execute(session, command, &message.sender).await
    }

    /// Run a parsed command on behalf of `sender`.
    async fn execute(&self, session: &Session, command: Command, sender: &UserId) -> Result<Outcome> {
        let (verb, channel, people) = match command {
            Command::Help => return Ok(Outcome::Help),
            Command::Stats => return Ok(Outcome::Stats(self.directory.stats().await?)),
            Command::ListAll => return Ok(Outcome::Listed(self.directory.list().await?)),
            Command::Roster {
                verb,
                channel,
                people,
            } => (verb, channel, people),
        };

        if verb.mutates() && !self.bot_in_channel(session, &channel).await? {
            return Ok(Outcome::PermissionDenied(channel));
        }

        let next = match (verb, self.directory.get(&channel).await?) {
            (Verb::Create, Some(_)) => return Ok(Outcome::RosterExists(channel)),
            (Verb::Create, None) => people.into_iter().collect(),
            (_, None) => return Ok(Outcome::RosterNotFound(channel)),
            (Verb::Info, Some(roster)) => return Ok(Outcome::Info { channel, roster }),
            (Verb::Drop, Some(_)) => {
                self.directory.delete(&channel).await?;
                info!(channel = %channel, %sender, "team deleted");
                return Ok(Outcome::Deleted(channel));
            },
            (Verb::Add, Some(roster)) => roster.union(&people.into_iter().collect()),
            (Verb::Remove, Some(roster)) => roster.difference(&people.into_iter().collect()),
            (Verb::Join, Some(roster)) => roster.with(sender),
            (Verb::Leave, Some(roster)) => roster.without(sender),
        };
        self.commit(&channel, &next, verb, sender).await?;
        Ok(match verb {
            Verb::Create => Outcome::Created(channel),
            _ => Outcome::Updated(channel),
        })
    }

    async fn commit(
        &self,
        channel: &ChannelId,
        roster: &Roster,
        verb: Verb,
        sender: &UserId,
    ) -> Result<()> {
        self.directory.put(channel, roster).await?;
        info!(
            channel = %channel,
            %sender,
            command = verb.as_str(),
            members = roster.len(),
            "team updated"
        );
        Ok(())
    }

    async fn bot_in_channel(&self, session: &Session, channel: &ChannelId) -> Result<bool> {
        let members = session.transport.channel_members(channel).await?;
        Ok(members.contains(&session.identity.user_id))
    }
}

#[async_trait]
impl Plugin for RosterProcessor {
    fn name(&self) -> &str {
        "roster"
    }

    async fn setup(
        &mut self,
        identity: &BotIdentity,
        transport: Arc<dyn Transport>,
    ) -> anyhow::Result<()> {
        let stats = self.directory.stats().await?;
        info!(
            bot = %identity.user_id,
            teams = stats.teams,
            users = stats.users,
            "roster directory loaded"
        );
        self.session = Some(Session {
            identity: identity.clone(),
            transport,
        });
        Ok(())
    }

    async fn handle(&mut self, message: &MessageEvent) -> anyhow::Result<Vec<OutputMessage>> {
        Ok(self.process(message).await?)
    }
}
