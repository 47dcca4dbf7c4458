// Start/end window in epoch millis.

use super::ParamError;

/// Validated `[start, end]` window; `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Validates the raw bounds. A missing `end` becomes `now_ms`; a missing `start` becomes
    /// `end - default_window_ms`.
    pub fn resolve(
        start: Option<i64>,
        end: Option<i64>,
        now_ms: i64,
        default_window_ms: i64,
    ) -> Result<Self, ParamError> {
        if let Some(s) = start
            && s < 0
        {
            return Err(ParamError(format!("start must not be negative, got {s}")));
        }
        if let Some(e) = end
            && e < 0
        {
            return Err(ParamError(format!("end must not be negative, got {e}")));
        }
        let end = end.unwrap_or(now_ms);
        let start = start.unwrap_or_else(|| end.saturating_sub(default_window_ms).max(0));
        if start >= end {
            return Err(ParamError::new("start must be before end"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn width(&self) -> i64 {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts <= self.end
    }
}
