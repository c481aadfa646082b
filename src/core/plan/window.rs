//! Windows and the lazy window plan

use crate::domain::{DataType, ExportError, FetchRequest, Result};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;

/// One bounded sub-range queried as `start < date <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Exclusive lower bound
    pub start: DateTime<Utc>,

    /// Inclusive upper bound
    pub end: DateTime<Utc>,

    /// Set on the floor-clamped window that closes the plan
    pub is_final: bool,
}

impl Window {
    /// Width of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Ordered, lazily produced sequence of windows, newest first
///
/// The plan only does time arithmetic. Stopping early on empty results is
/// the fetcher's decision.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    data_type: DataType,
    chunk: Duration,
    floor: DateTime<Utc>,
    ceiling: DateTime<Utc>,
    cursor: Option<DateTime<Utc>>,
}

impl WindowPlan {
    /// Plan windows for `data_type` between `after` (or the hard floor) and `before`
    ///
    /// # Errors
    ///
    /// Returns a validation error for data types that are not paginated.
    pub fn new(
        data_type: DataType,
        before: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let chunk = data_type.chunk().ok_or_else(|| {
            ExportError::Validation(format!("{data_type} is not fetched in windows"))
        })?;

        let floor = after
            .map(|a| a.trunc_subsecs(0))
            .or_else(|| data_type.hard_floor())
            .ok_or_else(|| ExportError::Validation(format!("{data_type} has no floor date")))?;

        let ceiling = data_type.ceiling_of(before);
        let cursor = (ceiling > floor).then_some(ceiling);

        Ok(Self {
            data_type,
            chunk,
            floor,
            ceiling,
            cursor,
        })
    }

    /// Plan windows for a run request
    pub fn for_request(request: &FetchRequest) -> Result<Self> {
        Self::new(request.data_type, request.before_date, request.after_date)
    }

    /// Data type the plan was built for
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Effective floor: caller bound or hard floor
    pub fn floor(&self) -> DateTime<Utc> {
        self.floor
    }

    /// Upper bound of the first window
    pub fn ceiling(&self) -> DateTime<Utc> {
        self.ceiling
    }

    /// Rewind the plan to its first window
    pub fn restart(&mut self) {
        self.cursor = (self.ceiling > self.floor).then_some(self.ceiling);
    }
}

impl Iterator for WindowPlan {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let end = self.cursor?;
        let candidate = end - self.chunk;

        if candidate <= self.floor {
            self.cursor = None;
            return Some(Window {
                start: self.floor,
                end,
                is_final: true,
            });
        }

        self.cursor = Some(candidate);
        Some(Window {
            start: candidate,
            end,
            is_final: false,
        })
    }
}
