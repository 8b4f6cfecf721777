//! Background expiration sweep.
//!
//! A named thread calls [`StockEngine::mark_expired_products`] with the
//! engine's clock on a fixed cadence, and on demand through the handle.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use foodbank_core::Clock;

use crate::engine::StockEngine;

/// Shortest cadence the loop runs at; a zero interval would never advance.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sweeper settings.
#[derive(Debug, Clone)]
pub struct ExpirationSweeper {
    pub interval: Duration,
    pub name: String,
}

impl Default for ExpirationSweeper {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            name: "stock-expiration-sweeper".to_string(),
        }
    }
}

/// Handle for a running sweeper (shutdown + trigger hook).
#[derive(Debug)]
pub struct ExpirationSweeperHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ExpirationSweeperHandle {
    /// Request an extra sweep. Triggers coalesce while one is pending.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the sweeper thread and wait for it to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl Drop for ExpirationSweeperHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

impl ExpirationSweeper {
    /// Use the engine's configured sweep interval.
    pub fn for_engine(engine: &StockEngine) -> Self {
        Self {
            interval: engine.config().sweep_interval,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Spawn the sweeper. It sweeps once right away, then every `interval`.
    pub fn spawn(&self, engine: Arc<StockEngine>) -> std::io::Result<ExpirationSweeperHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let mut cfg = self.clone();
        cfg.interval = cfg.interval.max(MIN_INTERVAL);
        let join = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || sweeper_loop(cfg, engine, shutdown_rx, trigger_rx))?;

        Ok(ExpirationSweeperHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn sweeper_loop(
    cfg: ExpirationSweeper,
    engine: Arc<StockEngine>,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
) {
    info!(sweeper = %cfg.name, interval_secs = cfg.interval.as_secs(), "expiration sweeper started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true;

    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(50));
            thread::sleep(sleep_for);
            continue;
        }
        pending = false;

        let at = engine.clock().now();
        match engine.mark_expired_products(at) {
            Ok(0) => {}
            Ok(count) => info!(sweeper = %cfg.name, lots = count, "expiration sweep completed"),
            Err(e) => warn!(sweeper = %cfg.name, error = %e, "expiration sweep failed"),
        }
    }

    info!(sweeper = %cfg.name, "expiration sweeper stopped");
}
