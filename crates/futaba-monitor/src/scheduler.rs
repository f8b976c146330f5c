//! Fixed-interval driver for [`Monitor::tick`].

use std::{future::Future, sync::Arc, time::Duration};

use futaba_core::store::WatchStore;
use tokio::time::{self, MissedTickBehavior};

use crate::{monitor::Monitor, notifier::Notifier, source::ThreadSource};

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
  interval: Duration,
}

impl Scheduler {
  pub fn new(interval: Duration) -> Self { Self { interval } }

  /// Tick until `shutdown` resolves, returning how many ticks ran.
  ///
  /// The first tick fires immediately. Each tick runs on its own task and is
  /// awaited before the next is scheduled, so ticks never overlap and a
  /// panicking tick does not take the loop down. `shutdown` is only observed
  /// between ticks.
  pub async fn run<S, F, N>(
    &self,
    monitor: Arc<Monitor<S, F, N>>,
    shutdown: impl Future<Output = ()>,
  ) -> u64
  where
    S: WatchStore + 'static,
    F: ThreadSource + 'static,
    N: Notifier + 'static,
  {
    let mut interval = time::interval(self.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut ticks = 0;
    tracing::info!(interval_secs = self.interval.as_secs(), "monitor started");

    loop {
      tokio::select! {
        biased;
        () = &mut shutdown => break,
        _ = interval.tick() => {}
      }

      let monitor = monitor.clone();
      let handle = tokio::spawn(async move { monitor.tick().await });
      if let Err(e) = handle.await {
        tracing::error!(error = %e, "tick task panicked");
      }
      ticks += 1;
    }

    tracing::info!(ticks, "monitor stopped");
    ticks
  }
}
