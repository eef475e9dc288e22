//! JSON payload types for the `/api/v2/` robot API.
//!
//! - `state`: robot state attributes, info, and statistics.
//! - `map`: map snapshots with run-length encoded layers.
//! - `control`: segment and control command requests.

/// Segment listing and control command payloads.
pub mod control;
/// Map snapshot payloads.
pub mod map;
/// Robot state attribute payloads.
pub mod state;

pub use control::{
    BasicControlAction, FanSpeedPreset, MapSegmentsRequest, PresetControl, Segment,
    WaterUsagePreset,
};
pub use map::Map;
pub use state::{RobotInfo, RobotState, StateAttribute, StatisticsDataPoint};
