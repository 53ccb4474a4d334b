use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use stockhold_carts::ReservationManager;

/// Config for the reservation sweeper.
#[derive(Debug, Clone)]
pub struct ReservationSweeper {
    pub interval: Duration,
}

impl Default for ReservationSweeper {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Handle for the running sweeper (shutdown + nudge hook).
#[derive(Debug)]
pub struct ReservationSweeperHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ReservationSweeperHandle {
    /// Nudge hook: run a pass before the next scheduled tick.
    ///
    /// Backpressure: nudges are coalesced (bounded queue). If a pass is
    /// already pending, this becomes a no-op.
    pub fn trigger(&self) {
        // Coalesce: channel capacity=1; ignore if already full.
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the sweeper thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ReservationSweeper {
    /// Spawn the sweeper thread.
    ///
    /// - Schedule: one pass every `interval`, plus one on startup
    /// - Nudge: call `handle.trigger()` to run a pass sooner
    /// - A pass never kills the loop: holds it could not release are
    ///   reported by the manager and retried on the next pass
    pub fn spawn(
        &self,
        name: &'static str,
        manager: Arc<ReservationManager>,
    ) -> ReservationSweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || sweeper_loop(name, cfg, shutdown_rx, trigger_rx, manager))
            .expect("failed to spawn reservation sweeper thread");

        ReservationSweeperHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

fn sweeper_loop(
    name: &'static str,
    cfg: ReservationSweeper,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    manager: Arc<ReservationManager>,
) {
    info!(sweeper = name, "reservation sweeper started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup

    loop {
        // Shutdown has priority.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        // Nudges: non-blocking drain to coalesce multiple triggers.
        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if !pending {
            // Wait until next tick or nudge or shutdown.
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        let report = manager.sweep_expired(Utc::now());
        if report.released > 0 {
            info!(
                sweeper = name,
                released = report.released,
                skipped = report.skipped,
                "expired holds released"
            );
        }
        if report.failed > 0 {
            warn!(
                sweeper = name,
                failed = report.failed,
                "some expired holds could not be released"
            );
        }
    }

    info!(sweeper = name, "reservation sweeper stopped");
}
