// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging setup (§10.2): a single `fern::Dispatch` over the `log` facade,
//! after `bee-autopeering/examples/node.rs`'s `setup_logger`.

use log::LevelFilter;

/// `verbosity` follows the CLI's repeated `-v` count: 0 = info, 1 = debug,
/// 2+ = trace.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{:<5}] {}: {}",
                chrono_like_timestamp(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply();

    if let Err(e) = result {
        eprintln!("failed to initialize logger: {e}");
    }
}

/// A dependency-free timestamp (`SystemTime` elapsed-since-epoch seconds)
/// — this crate has no time-formatting crate in its dependency graph, so
/// this stands in for `chrono`/`time` the way a minimal `fern` setup would.
fn chrono_like_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
