//! Tick bookkeeping for the fixed-interval scheduler.

/// Decides which game ticks a fixed-interval driver runs on.
#[derive(Debug, Clone)]
pub struct TickClock {
    /// Run every `interval` game ticks.
    interval: u64,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TickClock {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True if the driver should run on game tick `tick`.
    pub fn should_run(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }

    /// True once per `period`-tick window when sampled every `interval` ticks.
    pub fn is_window_start(&self, tick: u64, period: u64) -> bool {
        let period = period.max(1);
        tick % period < self.interval
    }
}
