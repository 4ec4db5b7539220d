use {
    anyhow::{Context, Result},
    clap::Subcommand,
    teambot_channels::ChannelId,
    teambot_config::TeambotConfig,
    teambot_directory::{Roster, RosterStore, SqliteDirectory},
    teambot_roster::replies,
};

#[derive(Subcommand)]
pub enum TeamsAction {
    /// Print every team and its members.
    List,
    /// Print the members of one team.
    Show {
        /// Channel id, e.g. C0123ABCD.
        channel: String,
    },
    /// Distinct users and number of teams.
    Stats,
}

pub async fn handle_teams(action: TeamsAction, config: &TeambotConfig) -> Result<()> {
    let path = &config.directory.path;
    if !path.exists() {
        println!("No team directory at {}.", path.display());
        return Ok(());
    }
    let directory = SqliteDirectory::open(path)
        .await
        .with_context(|| format!("cannot open team directory {}", path.display()))?;

    let output = render(action, &directory).await;
    directory.close().await;

    println!("{}", output?);
    Ok(())
}

async fn render(action: TeamsAction, directory: &dyn RosterStore) -> Result<String> {
    Ok(match action {
        TeamsAction::List => render_list(&directory.list().await?),
        TeamsAction::Show { channel } => {
            let channel = ChannelId::from(channel);
            let roster = directory.get(&channel).await?;
            render_show(&channel, roster.as_ref())
        },
        TeamsAction::Stats => replies::stats(directory.stats().await?),
    })
}

fn members(roster: &Roster) -> String {
    if roster.is_empty() {
        return "(no members)".into();
    }
    roster
        .iter()
        .map(|u| u.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_list(entries: &[(ChannelId, Roster)]) -> String {
    if entries.is_empty() {
        return replies::NO_TEAMS.into();
    }
    entries
        .iter()
        .map(|(channel, roster)| format!("{channel}: {}", members(roster)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_show(channel: &ChannelId, roster: Option<&Roster>) -> String {
    match roster {
        Some(roster) => format!("{channel}: {}", members(roster)),
        None => format!("No team record for {channel}"),
    }
}
