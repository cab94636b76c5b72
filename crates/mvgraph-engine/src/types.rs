//! Lifecycle, playback and filter identity types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of the engine-side graph.
///
/// Discriminants match the engine's wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphState {
    #[default]
    NotBuilt,
    Error,
    Playing,
    Paused,
    Stopped,
}

impl GraphState {
    /// Decode an engine state code.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::NotBuilt),
            1 => Ok(Self::Error),
            2 => Ok(Self::Playing),
            3 => Ok(Self::Paused),
            4 => Ok(Self::Stopped),
            other => Err(Error::UnknownStateCode(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NotBuilt => 0,
            Self::Error => 1,
            Self::Playing => 2,
            Self::Paused => 3,
            Self::Stopped => 4,
        }
    }

    /// A graph is active once built and until destroyed or faulted.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused | Self::Stopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotBuilt => "NOT_BUILT",
            Self::Error => "ERROR",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction and looping behaviour requested when a graph starts playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackMode {
    ForwardOnce,
    ForwardLoop,
    BackwardOnce,
    BackwardLoop,
    PingPong,
    PingPongInverse,
    /// Run every source as fast as it produces data.
    Realtime,
}

impl PlaybackMode {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::ForwardOnce),
            1 => Ok(Self::ForwardLoop),
            2 => Ok(Self::BackwardOnce),
            3 => Ok(Self::BackwardLoop),
            4 => Ok(Self::PingPong),
            5 => Ok(Self::PingPongInverse),
            255 => Ok(Self::Realtime),
            other => Err(Error::UnknownPlaybackMode(other.to_string())),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::ForwardOnce => 0,
            Self::ForwardLoop => 1,
            Self::BackwardOnce => 2,
            Self::BackwardLoop => 3,
            Self::PingPong => 4,
            Self::PingPongInverse => 5,
            Self::Realtime => 255,
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ForwardOnce => "forward_once",
            Self::ForwardLoop => "forward_loop",
            Self::BackwardOnce => "backward_once",
            Self::BackwardLoop => "backward_loop",
            Self::PingPong => "ping_pong",
            Self::PingPongInverse => "ping_pong_inverse",
            Self::Realtime => "realtime",
        };
        f.write_str(name)
    }
}

/// Accepts the numeric engine code (`"255"`) or a name (`"forward_loop"`,
/// `"PingPong"`, `"realtime"`).
impl FromStr for PlaybackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i32>() {
            return Self::from_code(code);
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "forwardonce" => Ok(Self::ForwardOnce),
            "forwardloop" => Ok(Self::ForwardLoop),
            "backwardonce" => Ok(Self::BackwardOnce),
            "backwardloop" => Ok(Self::BackwardLoop),
            "pingpong" => Ok(Self::PingPong),
            "pingponginverse" => Ok(Self::PingPongInverse),
            "realtime" => Ok(Self::Realtime),
            _ => Err(Error::UnknownPlaybackMode(s.to_string())),
        }
    }
}

/// Engine-assigned filter instance id. Never interpreted by mvgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(i64);

impl FilterId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
