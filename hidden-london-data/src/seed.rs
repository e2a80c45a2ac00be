// seed.rs
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

//! Starter content for a site nothing has been written to yet.
//!
//! Only handed out when neither the remote nor the local cache has any
//! records of a kind. It is never written back to the cache.

use crate::models::{ActiveStatus, Clan, Episode, EpisodeStatus, Location};

/// Default episodes.
pub fn episodes() -> Vec<Episode> {
    vec![
        Episode {
            id: Some("ep_seed_1".to_owned()),
            title: "The Stone Beneath Cannon Street".to_owned(),
            meta_description: "Where the city keeps its oldest promise.".to_owned(),
            content: "<p>Behind an iron grille on Cannon Street sits a lump of \
                      limestone older than the city's name. Those who know how to \
                      listen say it still hums.</p>"
                .to_owned(),
            status: EpisodeStatus::Published,
            episode_order: 1,
            ..Default::default()
        },
        Episode {
            id: Some("ep_seed_2".to_owned()),
            title: "Rivers Under the Pavement".to_owned(),
            meta_description: "The Fleet, the Tyburn and the ones with no names.".to_owned(),
            content: "<p>London buried its rivers, but buried things are rarely \
                      quiet. Follow the drains on a wet night.</p>"
                .to_owned(),
            status: EpisodeStatus::Published,
            episode_order: 2,
            ..Default::default()
        },
        Episode {
            id: Some("ep_seed_3".to_owned()),
            title: "The Ravens' Accord".to_owned(),
            meta_description: "An old bargain kept at the Tower.".to_owned(),
            content: "<p>Six ravens, one kingdom, and a treaty nobody signed \
                      in ink.</p>"
                .to_owned(),
            status: EpisodeStatus::Published,
            episode_order: 3,
            ..Default::default()
        },
    ]
}

/// Default clans.
pub fn clans() -> Vec<Clan> {
    vec![
        Clan {
            id: Some("clan_seed_1".to_owned()),
            name: "The Keepers of the Stone".to_owned(),
            stone_description: "<p>Oolitic limestone, scarred by a thousand hands.</p>"
                .to_owned(),
            offering: "<p>A coin pressed warm against the grille.</p>".to_owned(),
            resonance_note: "<p>A low note, felt in the teeth.</p>".to_owned(),
            color_primary: "#2c2416".to_owned(),
            color_secondary: "#c9a96e".to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
        Clan {
            id: Some("clan_seed_2".to_owned()),
            name: "The Fleet Watchers".to_owned(),
            stone_description: "<p>River-worn flint from the Fleet's old bed.</p>".to_owned(),
            offering: "<p>Rainwater, poured at a drain cover.</p>".to_owned(),
            resonance_note: "<p>The sound of water where there is none.</p>".to_owned(),
            color_primary: "#1d3b4f".to_owned(),
            color_secondary: "#8fb8c9".to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
        Clan {
            id: Some("clan_seed_3".to_owned()),
            name: "The Raven Court".to_owned(),
            stone_description: "<p>Kentish ragstone from the Tower's curtain wall.</p>"
                .to_owned(),
            offering: "<p>A black feather, left and not taken back.</p>".to_owned(),
            resonance_note: "<p>Six voices, never in unison.</p>".to_owned(),
            color_primary: "#111111".to_owned(),
            color_secondary: "#6b5b95".to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
    ]
}

/// Default locations.
pub fn locations() -> Vec<Location> {
    vec![
        Location {
            id: Some("loc_seed_1".to_owned()),
            name: "London Stone, 111 Cannon Street".to_owned(),
            latitude: Some(51.5113),
            longitude: Some(-0.0904),
            magical_description: "<p>The city's heartstone.</p>".to_owned(),
            what_to_look_for: "<p>The grille at knee height, and who stops at it.</p>"
                .to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
        Location {
            id: Some("loc_seed_2".to_owned()),
            name: "Ray Street Grate, Clerkenwell".to_owned(),
            latitude: Some(51.5236),
            longitude: Some(-0.1087),
            magical_description: "<p>The one place the Fleet can still be heard.</p>"
                .to_owned(),
            what_to_look_for: "<p>A grate outside the Coach and Horses.</p>".to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
        Location {
            id: Some("loc_seed_3".to_owned()),
            name: "Tower of London".to_owned(),
            latitude: Some(51.5081),
            longitude: Some(-0.0759),
            magical_description: "<p>Where the ravens hold court.</p>".to_owned(),
            what_to_look_for: "<p>Count the birds. Then count again.</p>".to_owned(),
            status: ActiveStatus::Active,
            ..Default::default()
        },
    ]
}
