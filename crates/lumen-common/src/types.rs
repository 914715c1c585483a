use serde::{Deserialize, Serialize};
use std::fmt;

/// Size constraint passed alongside `webview_set_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum SizeHint {
    /// Plain resize.
    #[default]
    None = 0,
    /// Minimum bounds.
    Min = 1,
    /// Maximum bounds.
    Max = 2,
    /// Fixed size, the user cannot resize.
    Fixed = 3,
}

impl SizeHint {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Min),
            2 => Some(Self::Max),
            3 => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Where the engine's event loop lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// The constructing thread owns the engine and `run` blocks it.
    #[default]
    Blocking,
    /// A dedicated thread owns the engine; `run` only signals it to start.
    Background,
}

/// Lifecycle of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Created,
    /// Background mode only: engine exists, owner is parked on the start gate.
    AwaitingStart,
    Running,
    Closed,
}

impl LifecycleState {
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::AwaitingStart => "awaiting-start",
            Self::Running => "running",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}
