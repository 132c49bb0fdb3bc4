// ── Scan session ──

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the most recent scan ended, as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanOutcome {
    /// No pending result; the user acknowledged the last one.
    #[default]
    Dismissed,
    Success,
    Failure,
}

/// Scan lifecycle fields.
///
/// Progress fields (`current_frame_index`, `time_remaining`) are only
/// live while `is_scanning`; use [`progress`](Self::progress) rather
/// than reading them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSessionState {
    pub is_scanning: bool,
    pub output_directory: String,
    pub target_frame_count: NonZeroU32,
    pub current_frame_index: u32,
    pub last_outcome: ScanOutcome,
    /// Backend-formatted estimate, e.g. `"0:41:10"` or `"-"`.
    pub time_remaining: String,
}

impl Default for ScanSessionState {
    fn default() -> Self {
        Self {
            is_scanning: false,
            output_directory: String::new(),
            target_frame_count: NonZeroU32::MIN,
            current_frame_index: 0,
            last_outcome: ScanOutcome::Dismissed,
            time_remaining: "-".into(),
        }
    }
}

/// Live progress of a running scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub current: u32,
    pub target: u32,
}

impl ScanProgress {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(self) -> f64 {
        if self.target == 0 {
            return 1.0;
        }
        (f64::from(self.current) / f64::from(self.target)).min(1.0)
    }

    /// Zero once the index reaches or passes the target.
    pub fn frames_remaining(self) -> u32 {
        self.target.saturating_sub(self.current)
    }
}

impl ScanSessionState {
    /// Progress while scanning, `None` otherwise.
    ///
    /// The index is clamped to the target: single-field events can
    /// briefly deliver a new index before the matching `n_frames`.
    pub fn progress(&self) -> Option<ScanProgress> {
        if !self.is_scanning {
            return None;
        }
        let target = self.target_frame_count.get();
        Some(ScanProgress {
            current: self.current_frame_index.min(target),
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn defaults() {
        let scan = ScanSessionState::default();
        assert!(!scan.is_scanning);
        assert_eq!(scan.last_outcome, ScanOutcome::Dismissed);
        assert_eq!(scan.time_remaining, "-");
    }

    #[test]
    fn progress_only_while_scanning() {
        let mut scan = ScanSessionState {
            target_frame_count: NonZeroU32::new(40).unwrap(),
            current_frame_index: 10,
            ..ScanSessionState::default()
        };
        assert!(scan.progress().is_none());

        scan.is_scanning = true;
        let progress = scan.progress().unwrap();
        assert_eq!(progress.current, 10);
        assert_eq!(progress.frames_remaining(), 30);
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_clamps_to_target() {
        let scan = ScanSessionState {
            is_scanning: true,
            target_frame_count: NonZeroU32::new(5).unwrap(),
            current_frame_index: 9,
            ..ScanSessionState::default()
        };
        assert_eq!(scan.progress().unwrap().current, 5);
    }

    #[test]
    fn overshooting_progress_saturates() {
        let progress = ScanProgress { current: 12, target: 10 };
        assert_eq!(progress.frames_remaining(), 0);
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);

        let empty = ScanProgress { current: 0, target: 0 };
        assert_eq!(empty.frames_remaining(), 0);
        assert!((empty.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outcome_literals() {
        assert_eq!("success".parse::<ScanOutcome>().unwrap(), ScanOutcome::Success);
        assert_eq!(ScanOutcome::Failure.to_string(), "failure");
        assert!("Success!".parse::<ScanOutcome>().is_err());
    }
}
