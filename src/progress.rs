use std::sync::atomic::{AtomicU8, Ordering};

/// `floor(done / total * 100)`, clamped to 100. An unknown (zero) total reports 0.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = u128::from(done) * 100 / u128::from(total);
    pct.min(100) as u8
}

/// Keeps the percentages of one phase non-decreasing. Shared by reference
/// with progress callbacks, so it only needs `&self`.
#[derive(Debug, Default)]
pub struct PhaseProgress {
    last: AtomicU8,
}

impl PhaseProgress {
    /// Starts a phase whose initial 0 has already been reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value to report, or `None` when it would not move forward.
    pub fn advance(&self, pct: u8) -> Option<u8> {
        let pct = pct.min(100);
        let prev = self.last.fetch_max(pct, Ordering::AcqRel);
        (pct > prev).then_some(pct)
    }

    pub fn last(&self) -> u8 {
        self.last.load(Ordering::Acquire)
    }
}

/// Reads the output byte count from an ffmpeg `-progress` key=value line.
pub fn parse_ffmpeg_progress_line(line: &str) -> Option<u64> {
    let rest = line.trim().strip_prefix("total_size=")?;
    rest.trim().parse::<u64>().ok()
}
