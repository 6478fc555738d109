//! Progress reporting boundary.

/// Receives coarse progress updates during long scans.
///
/// `percent` runs 0..=100 while a stage is active; -1 signals that the whole
/// run is complete. Sinks must tolerate repeated calls with the same value.
pub trait ProgressSink {
    fn percent_done(&mut self, label: &str, percent: i32);
}

impl<F: FnMut(&str, i32)> ProgressSink for F {
    fn percent_done(&mut self, label: &str, percent: i32) {
        self(label, percent)
    }
}
