// commands.rs
//
// Copyright 2025 Hidden London contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The admin commands. Every one of them goes through `ContentStore`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};

use hidden_london_data::{
    ActiveStatus, BatchStatus, Clan, ContentStore, Episode, EpisodeStatus, Location, Record,
    SaveOutcome, WriteIntent,
};

/// Edit the content of The Hidden World of London.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// More logging, repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "episode")]
    Episodes,
    #[value(alias = "clan")]
    Clans,
    #[value(alias = "location")]
    Locations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    Published,
    Archived,
}

impl From<StatusArg> for EpisodeStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Draft => EpisodeStatus::Draft,
            StatusArg::Published => EpisodeStatus::Published,
            StatusArg::Archived => EpisodeStatus::Archived,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the records of a kind, episodes in display order.
    #[command(alias = "ls")]
    List {
        kind: KindArg,
        /// Print the records as json.
        #[arg(long)]
        json: bool,
    },
    /// Print one record as json.
    Show { kind: KindArg, id: String },
    /// Create or edit episodes.
    #[command(subcommand)]
    Episode(EpisodeCommands),
    /// Create clans.
    #[command(subcommand)]
    Clan(ClanCommands),
    /// Create locations.
    #[command(subcommand)]
    Location(LocationCommands),
    /// Delete a record everywhere.
    #[command(alias = "rm")]
    Delete { kind: KindArg, id: String },
    /// Put episodes in the given order, first id first.
    ///
    /// Episodes left out keep their relative order after the listed ones.
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Replace the local copy of a kind with the remote one.
    Refresh { kind: KindArg },
}

#[derive(Debug, Subcommand)]
pub enum EpisodeCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        meta_description: String,
        /// Html body.
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, value_enum, default_value_t = StatusArg::Draft)]
        status: StatusArg,
        #[arg(long)]
        image_url: Option<String>,
        /// Display position, appended after the last episode when omitted.
        #[arg(long)]
        order: Option<i32>,
    },
    /// Change some fields of an existing episode.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        meta_description: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        image_url: Option<String>,
        /// Remove the episode image.
        #[arg(long, conflicts_with = "image_url")]
        clear_image: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClanCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        stone_description: String,
        #[arg(long, default_value = "")]
        offering: String,
        #[arg(long, default_value = "")]
        resonance_note: String,
        /// `#rgb` or `#rrggbb`.
        #[arg(long)]
        color_primary: Option<String>,
        #[arg(long)]
        color_secondary: Option<String>,
        #[arg(long)]
        emblem_url: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocationCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long, default_value = "")]
        magical_description: String,
        #[arg(long, default_value = "")]
        what_to_look_for: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
}

fn active(inactive: bool) -> ActiveStatus {
    if inactive {
        ActiveStatus::Inactive
    } else {
        ActiveStatus::Active
    }
}

impl Commands {
    pub async fn run(self, store: &ContentStore) -> Result<()> {
        match self {
            Commands::List { kind, json } => match kind {
                KindArg::Episodes => list::<Episode>(store, json).await,
                KindArg::Clans => list::<Clan>(store, json).await,
                KindArg::Locations => list::<Location>(store, json).await,
            },
            Commands::Show { kind, id } => match kind {
                KindArg::Episodes => show::<Episode>(store, &id).await,
                KindArg::Clans => show::<Clan>(store, &id).await,
                KindArg::Locations => show::<Location>(store, &id).await,
            },
            Commands::Episode(cmd) => cmd.run(store).await,
            Commands::Clan(cmd) => cmd.run(store).await,
            Commands::Location(cmd) => cmd.run(store).await,
            Commands::Delete { kind, id } => {
                let removed = match kind {
                    KindArg::Episodes => store.delete::<Episode>(&id).await?,
                    KindArg::Clans => store.delete::<Clan>(&id).await?,
                    KindArg::Locations => store.delete::<Location>(&id).await?,
                };
                if removed {
                    println!("Deleted {id}");
                } else {
                    println!("Nothing stored locally under {id}");
                }
                Ok(())
            }
            Commands::Reorder { ids } => reorder(store, &ids).await,
            Commands::Refresh { kind } => {
                let refreshed = match kind {
                    KindArg::Episodes => store.refresh::<Episode>().await?,
                    KindArg::Clans => store.refresh::<Clan>().await?,
                    KindArg::Locations => store.refresh::<Location>().await?,
                };
                if refreshed {
                    println!("Local copy refreshed");
                } else {
                    println!("Remote unavailable, local copy kept");
                }
                Ok(())
            }
        }
    }
}

impl EpisodeCommands {
    async fn run(self, store: &ContentStore) -> Result<()> {
        match self {
            EpisodeCommands::Add {
                title,
                meta_description,
                content,
                status,
                image_url,
                order,
            } => {
                let episode = Episode {
                    title,
                    meta_description,
                    content,
                    status: status.into(),
                    image_url,
                    episode_order: order.unwrap_or(0),
                    ..Default::default()
                };
                report(store.save(episode, WriteIntent::Create).await?);
                Ok(())
            }
            EpisodeCommands::Edit {
                id,
                title,
                meta_description,
                content,
                status,
                image_url,
                clear_image,
            } => {
                let Some(mut episode) = store.find::<Episode>(&id).await else {
                    bail!("No episode {id}");
                };
                if let Some(title) = title {
                    episode.title = title;
                }
                if let Some(meta_description) = meta_description {
                    episode.meta_description = meta_description;
                }
                if let Some(content) = content {
                    episode.content = content;
                }
                if let Some(status) = status {
                    episode.status = status.into();
                }
                if clear_image {
                    episode.image_url = None;
                } else if image_url.is_some() {
                    episode.image_url = image_url;
                }
                report(store.save(episode, WriteIntent::Update).await?);
                Ok(())
            }
        }
    }
}

impl ClanCommands {
    async fn run(self, store: &ContentStore) -> Result<()> {
        let ClanCommands::Add {
            name,
            stone_description,
            offering,
            resonance_note,
            color_primary,
            color_secondary,
            emblem_url,
            logo_url,
            inactive,
        } = self;

        let defaults = Clan::default();
        let clan = Clan {
            name,
            stone_description,
            offering,
            resonance_note,
            color_primary: color_primary.unwrap_or(defaults.color_primary),
            color_secondary: color_secondary.unwrap_or(defaults.color_secondary),
            emblem_url,
            logo_url,
            status: active(inactive),
            ..Default::default()
        };
        report(store.save(clan, WriteIntent::Create).await?);
        Ok(())
    }
}

impl LocationCommands {
    async fn run(self, store: &ContentStore) -> Result<()> {
        let LocationCommands::Add {
            name,
            lat,
            lng,
            magical_description,
            what_to_look_for,
            image_url,
            inactive,
        } = self;

        let location = Location {
            name,
            latitude: lat,
            longitude: lng,
            magical_description,
            what_to_look_for,
            image_url,
            status: active(inactive),
            ..Default::default()
        };
        report(store.save(location, WriteIntent::Create).await?);
        Ok(())
    }
}

async fn list<T: Record>(store: &ContentStore, json: bool) -> Result<()> {
    let records = store.get::<T>().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for record in &records {
        println!("{}\t{}", record.id().unwrap_or("-"), record.label());
    }
    Ok(())
}

async fn show<T: Record>(store: &ContentStore, id: &str) -> Result<()> {
    match store.find::<T>(id).await {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => bail!("No {} {}", T::KIND, id),
    }
    Ok(())
}

/// The listed episodes first, in the given order, then every other one in
/// its current display order.
fn arrange(mut known: Vec<Episode>, ids: &[String]) -> Result<Vec<Episode>> {
    let mut episodes = Vec::with_capacity(known.len());
    for id in ids {
        match known.iter().position(|e| e.has_id(id)) {
            Some(index) => episodes.push(known.remove(index)),
            None if episodes.iter().any(|e| e.has_id(id)) => bail!("Episode {id} listed twice"),
            None => bail!("No episode {id}"),
        }
    }
    episodes.append(&mut known);
    Ok(episodes)
}

async fn reorder(store: &ContentStore, ids: &[String]) -> Result<()> {
    let episodes = arrange(store.get::<Episode>().await, ids)?;

    let outcome = store.reorder_episodes(episodes).await;
    for (id, err) in &outcome.failed {
        eprintln!("{id}: save failed: {err}");
    }
    match outcome.status() {
        BatchStatus::Complete => println!("Reordered {} episodes, saved everywhere", outcome.synced),
        BatchStatus::LocalOnly => println!(
            "Reordered {} episodes, {} saved locally only, will not sync across devices",
            outcome.saved(),
            outcome.local_only
        ),
        BatchStatus::Partial => bail!(
            "Reorder incomplete: {} saved, {} failed",
            outcome.saved(),
            outcome.failed.len()
        ),
        BatchStatus::Failed => bail!("Reorder failed, nothing was saved"),
    }
    Ok(())
}

fn report<T: Record>(outcome: SaveOutcome<T>) {
    let id = outcome.record.id().unwrap_or("-");
    println!("{} {}: {}", T::KIND, id, outcome.sync);
}
