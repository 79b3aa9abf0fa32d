// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;

use gossipd::cli::Cli;
use gossipd::{logging, GossipConfig, Node};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match GossipConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            log::error!("exiting gossipd");
            return std::process::ExitCode::FAILURE;
        }
    };

    let node = Node::new(config);
    if let Err(e) = node.run().await {
        log::error!("node exited with an error: {e}");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
