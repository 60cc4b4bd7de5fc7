//! Moving-average window lengths.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidArgument;

/// Which of the two averages a window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowRole {
    Short,
    Long,
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowRole::Short => f.write_str("short"),
            WindowRole::Long => f.write_str("long"),
        }
    }
}

/// Count of trailing bars in a moving average. Always >= 1.
///
/// No ordering is enforced between the short and long window: a short window
/// larger than the long one is legal and only swaps which line sits on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct MovingAverageWindow(usize);

impl MovingAverageWindow {
    pub fn new(bars: usize, role: WindowRole) -> Result<Self, InvalidArgument> {
        if bars == 0 {
            return Err(InvalidArgument::ZeroWindow { role });
        }
        Ok(Self(bars))
    }

    /// For compile-time constants; panics on zero.
    pub const fn new_const(bars: usize) -> Self {
        assert!(bars >= 1, "moving-average window must be >= 1");
        Self(bars)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for MovingAverageWindow {
    type Error = InvalidArgument;

    fn try_from(bars: usize) -> Result<Self, Self::Error> {
        // Role is unknown at this level; callers that know it use `new`.
        Self::new(bars, WindowRole::Short)
    }
}

impl From<MovingAverageWindow> for usize {
    fn from(window: MovingAverageWindow) -> Self {
        window.0
    }
}

impl fmt::Display for MovingAverageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
