// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! A minimal simulated peer, for manually exercising a running node.
//!
//! Connects to a gossip node's P2P or API port and sends one message:
//! a PUSH/PULL probe on the P2P plane, or a NOTIFY/ANNOUNCE on the API
//! plane. Grounded on the original tool's `sample_peer.py`, which does the
//! same thing with a handful of `argparse` subcommands.

use clap::{Parser, Subcommand};
use gossipd::wire::{write_frame, Advertise, Announce, MessageType, Notify, PeerAddr};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "sim_peer", about = "Simulated peer for manual gossip node testing")]
struct Args {
    /// Address of the node to connect to, e.g. 127.0.0.1:9001.
    #[arg(long)]
    dest: String,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Send a P2P_PUSH advertising `self_addr`.
    Push {
        #[arg(long)]
        self_addr: String,
    },
    /// Send a P2P_PULL advertising `self_addr`.
    Pull {
        #[arg(long)]
        self_addr: String,
    },
    /// Send an API NOTIFY for `data_type`.
    Notify { data_type: u16 },
    /// Send an API ANNOUNCE with a text payload.
    Announce {
        data_type: u16,
        ttl: u8,
        payload: String,
    },
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let mut stream = TcpStream::connect(&args.dest).await?;
    println!("connected to {}", args.dest);

    let frame = match args.action {
        Action::Push { self_addr } => {
            Advertise { addr: parse_peer(&self_addr) }.to_frame(MessageType::P2pPush)
        }
        Action::Pull { self_addr } => {
            Advertise { addr: parse_peer(&self_addr) }.to_frame(MessageType::P2pPull)
        }
        Action::Notify { data_type } => Notify { data_type }.to_frame(),
        Action::Announce { data_type, ttl, payload } => {
            Announce { ttl, data_type, payload: payload.into_bytes() }.to_frame()
        }
    };

    write_frame(&mut stream, &frame).await.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    println!("sent {:?}", frame.msg_type);
    Ok(())
}

fn parse_peer(s: &str) -> PeerAddr {
    s.parse().unwrap_or_else(|_| {
        eprintln!("'{s}' is not a valid ipv4:port address");
        std::process::exit(1);
    })
}
