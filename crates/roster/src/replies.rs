//! User-facing reply texts.

use {
    teambot_channels::{ChannelId, UserId},
    teambot_directory::{DirectoryStats, Roster},
};

pub const HELP_TEXT: &str = "Here are the commands I understand:
```
info #channel                           - get team info about #channel
create #channel @person1 @person2...    - create a team for #channel and add @person1 and @person2
add #channel @person3 @person4...       - add @person3 and @person4 to the team for #channel
remove #channel @person1 @person2...    - remove @person1 and @person2 from the team for #channel
join #channel                           - add yourself to the team for #channel
leave #channel                          - remove yourself from the team for #channel
drop #channel                           - drop the team record for #channel
list-all                                - list all registered teams
stats                                   - get slackbot team statistics
help                                    - this help```";

pub const UNRECOGNIZED: &str = "I didn't recognize that command.";
pub const TEAM_EXISTS: &str = "That team already exists.";
pub const NO_TEAMS: &str = "No teams registered yet.";

/// ` <@U1> <@U2>...` for each user, in iteration order.
fn mentions<'a>(users: impl IntoIterator<Item = &'a UserId>) -> String {
    users
        .into_iter()
        .map(|u| format!(" {}", u.mention()))
        .collect()
}

pub fn stats(stats: DirectoryStats) -> String {
    format!("{} distinct users in {} teams", stats.users, stats.teams)
}

pub fn list_all(entries: &[(ChannelId, Roster)]) -> String {
    if entries.is_empty() {
        return NO_TEAMS.to_string();
    }
    entries
        .iter()
        .map(|(channel, roster)| format!("{}:{}", channel.mention(), mentions(roster)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn no_team_record(channel: &ChannelId) -> String {
    format!("No team record for {}", channel.mention())
}

pub fn team_members(channel: &ChannelId, roster: &Roster) -> String {
    format!("Team members for {}:{}", channel.mention(), mentions(roster))
}

pub fn must_invite(bot: &UserId, channel: &ChannelId) -> String {
    format!(
        "You must invite {} to {} before you can manage team records.",
        bot.mention(),
        channel.mention()
    )
}

pub fn created(channel: &ChannelId) -> String {
    format!("Team {} created.", channel.mention())
}

pub fn updated(channel: &ChannelId) -> String {
    format!("Team {} updated.", channel.mention())
}

pub fn deleted(channel: &ChannelId) -> String {
    format!("Team {} deleted.", channel.mention())
}

pub fn no_channel_team(bot: &UserId) -> String {
    format!(
        "There is no team record for this channel.\nPM `help` to {} for more information.",
        bot.mention()
    )
}

/// `^ <@U1> <@U2>...` addressed to every member except `sender`.
pub fn broadcast(roster: &Roster, sender: &UserId) -> String {
    format!("^{}", mentions(roster.iter().filter(|u| *u != sender)))
}
