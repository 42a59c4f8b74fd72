use serde::{Deserialize, Serialize};

/// Position of one live coordinate when a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPosition {
    pub name: String,
    #[serde(with = "crate::float_repr")]
    pub x: f32,
    #[serde(with = "crate::float_repr")]
    pub y: f32,
}

/// Distance between a tracked pair of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDistance {
    pub from: String,
    pub to: String,
    /// `None` if either coordinate had been removed by then.
    #[serde(with = "crate::float_repr::option")]
    pub distance: Option<f32>,
}

/// A snapshot of the stage after a given number of step-list replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Completed iterations (0 for the initial state).
    pub iteration: u32,
    /// Live coordinates in declaration order. Removed coordinates are omitted.
    pub positions: Vec<NamedPosition>,
    /// Tracked pair distances, empty when none are configured.
    pub distances: Vec<TrackedDistance>,
}
