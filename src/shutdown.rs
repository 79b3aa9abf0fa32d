// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Graceful shutdown plumbing, after `bee-autopeering`'s `ShutdownBus` /
//! `Runnable` pair: a fixed number of long-running workers, each handed its
//! own one-shot cancellation receiver up front.

use tokio::sync::oneshot;

pub type ShutdownRx = oneshot::Receiver<()>;
type ShutdownTx = oneshot::Sender<()>;

/// Registry side: handed out one receiver per worker via [`Self::register`].
pub struct ShutdownBusRegistry(Vec<ShutdownRx>);

/// Broadcast side: fires every worker's cancellation signal on
/// [`Self::shutdown_all`]. `N` is the node's fixed worker count.
pub struct ShutdownBus<const N: usize> {
    senders: Vec<ShutdownTx>,
}

impl<const N: usize> ShutdownBus<N> {
    pub fn new() -> (Self, ShutdownBusRegistry) {
        let mut senders = Vec::with_capacity(N);
        let mut receivers = Vec::with_capacity(N);
        for _ in 0..N {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            receivers.push(rx);
        }
        (Self { senders }, ShutdownBusRegistry(receivers))
    }

    /// Signal every registered worker to stop. Already-finished workers
    /// simply drop their receiver, so a failed send here is not an error.
    pub fn shutdown_all(self) {
        for tx in self.senders {
            let _ = tx.send(());
        }
    }
}

impl ShutdownBusRegistry {
    /// Hand out the next unclaimed receiver. Panics if every receiver has
    /// already been registered — a programmer error (worker count must
    /// match the bus's `N`).
    pub fn register(&mut self) -> ShutdownRx {
        self.0.pop().expect("more workers registered than the shutdown bus has slots for")
    }
}

/// A long-running worker that cooperatively stops when handed a fired
/// shutdown signal. Mirrors `bee-autopeering`'s `task::Runnable`.
#[async_trait::async_trait]
pub trait Runnable: Send + 'static {
    const NAME: &'static str;

    async fn run(self, shutdown: ShutdownRx);
}

/// Spawns a [`Runnable`] onto the runtime, logging its name first — the
/// same convention `bee-autopeering`'s `Spawner` follows.
pub struct Spawner;

impl Spawner {
    pub fn spawn<R: Runnable>(runnable: R, shutdown: ShutdownRx) -> tokio::task::JoinHandle<()> {
        log::info!("starting worker '{}'", R::NAME);
        tokio::spawn(async move { runnable.run(shutdown).await })
    }
}
