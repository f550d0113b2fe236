use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic callback used to recompute countdown texts.
///
/// The task runs until the ticker is dropped or stopped. It only calls the
/// callback; it never touches the network.
pub struct CountdownTicker {
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Must be called from within a tokio runtime. The first tick fires one
    /// `period` after spawning.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick();
            }
        });

        debug!("Countdown ticker started ({:?})", period);
        CountdownTicker { handle }
    }

    /// Same as dropping the ticker
    pub fn stop(self) {}
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Countdown ticker stopped");
    }
}
