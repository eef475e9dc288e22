//! Segment listings and control command payloads.

use serde::{Deserialize, Serialize};

/// A named cleanable area from the segmentation capability.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, Hash, PartialEq)]
pub struct Segment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// Request body for cleaning a set of segments.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct MapSegmentsRequest {
    pub action: SegmentAction,
    #[serde(rename = "segment_ids")]
    pub segment_ids: Vec<String>,
    pub iterations: u32,
    #[serde(rename = "customOrder")]
    pub custom_order: bool,
}

impl MapSegmentsRequest {
    /// One-pass cleaning request preserving the given segment order.
    pub fn start(segment_ids: Vec<String>) -> Self {
        Self {
            action: SegmentAction::StartSegmentAction,
            segment_ids,
            iterations: 1,
            custom_order: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentAction {
    StartSegmentAction,
}

/// Basic motion command accepted by the control capability.
#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BasicControlAction {
    Start,
    Stop,
    Pause,
    Home,
}

/// Fan suction presets.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FanSpeedPreset {
    Off,
    Low,
    Medium,
    High,
    Max,
}

/// Mop water usage presets.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WaterUsagePreset {
    Off,
    Low,
    Medium,
    High,
}

/// `{ "name": <preset> }` wrapper used by preset PUT endpoints.
#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
pub struct PresetControl<P> {
    pub name: P,
}

/// `{ "action": <action> }` wrapper used by the basic control endpoint.
#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
pub(crate) struct ControlRequest {
    pub action: BasicControlAction,
}
