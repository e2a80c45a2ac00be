// main.rs
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

#[macro_use]
extern crate log;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use hidden_london_data::{ContentStore, StoreConfig};

mod commands;

use crate::commands::Cli;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> Result<()> {
    // A missing .env file is fine, the environment may already be set.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {:?}", path);
    }

    let config = StoreConfig::from_env()?;
    let store = ContentStore::init(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(cli.command.run(&store));
    store.dispose();
    result
}
