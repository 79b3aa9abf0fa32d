// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface (§6): `-c`/`--config <path>`, default
//! `config/config.ini`, plus verbosity flags for the logger.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "gossipd", about = "A gossip overlay node", version)]
pub struct Cli {
    /// Path to the INI configuration file.
    #[arg(short, long, default_value = "config/config.ini")]
    pub config: PathBuf,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
