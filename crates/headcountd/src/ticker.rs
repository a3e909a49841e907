//! Wall-clock aligned report ticker.
//!
//! Time is cut into `interval`-second slots aligned to the Unix epoch
//! (so a 10 s interval fires around :00, :10, :20, ...). The ticker fires on
//! the first poll that lands in a slot it has not fired in yet, so a fast loop
//! reports once per slot and a slow loop never skips a slot it reaches.

pub struct ReportTicker {
    interval_secs: i64,
    last_slot: Option<i64>,
}

impl ReportTicker {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs: interval_secs.max(1) as i64,
            last_slot: None,
        }
    }

    /// Returns true if a report is due at `epoch_secs`.
    pub fn poll(&mut self, epoch_secs: i64) -> bool {
        let slot = epoch_secs.div_euclid(self.interval_secs);
        if self.last_slot == Some(slot) {
            return false;
        }
        self.last_slot = Some(slot);
        true
    }
}
