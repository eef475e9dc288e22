//! Robot state payloads shared by REST responses and SSE frames.

use serde::Deserialize;

use crate::model::map::Map;

/// One attribute of the robot's reported state.
///
/// The firmware tags each attribute object with a `__class` discriminator;
/// attribute classes this crate does not know about fail decoding, which the
/// streaming layer treats as a droppable frame rather than an error.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "__class")]
pub enum StateAttribute {
    #[serde(rename = "AttachmentStateAttribute")]
    Attachment {
        #[serde(rename = "type")]
        kind: AttachmentKind,
        attached: bool,
    },
    #[serde(rename = "StatusStateAttribute")]
    Status { value: Status, flag: StatusFlag },
    #[serde(rename = "PresetSelectionStateAttribute")]
    PresetSelection {
        #[serde(rename = "type")]
        kind: PresetKind,
        value: PresetValue,
    },
    #[serde(rename = "BatteryStateAttribute")]
    Battery { level: i64, flag: BatteryFlag },
    #[serde(rename = "ConsumableStateAttribute")]
    Consumable {
        #[serde(rename = "type")]
        kind: String,
        #[serde(rename = "subType")]
        sub_type: String,
        remaining: ConsumableRemaining,
    },
}

/// Removable hardware the robot can report as attached.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Dustbin,
    Watertank,
    Mop,
}

/// Top-level activity the robot reports.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Error,
    Docked,
    Idle,
    Returning,
    Cleaning,
    Paused,
    ManualControl,
    Moving,
}

/// Qualifier for the current status.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    None,
    Zone,
    Segment,
    Spot,
    Target,
    Resumable,
    Mapping,
}

/// Which preset selection an attribute refers to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    FanSpeed,
    WaterGrade,
    OperationMode,
}

/// Selected preset value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PresetValue {
    Off,
    Min,
    Low,
    Medium,
    High,
    Max,
    Turbo,
    Custom,
    Vacuum,
    Mop,
    VacuumAndMop,
}

/// Charging state qualifier for the battery attribute.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BatteryFlag {
    None,
    Charging,
    Discharging,
    Charged,
}

/// Remaining life of a consumable part.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct ConsumableRemaining {
    pub value: i64,
    pub unit: ConsumableUnit,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableUnit {
    Percent,
    Minutes,
}

/// Combined state snapshot returned by `robot/state`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RobotState {
    pub attributes: Vec<StateAttribute>,
    pub map: Map,
}

/// Vendor and model information returned by `robot`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RobotInfo {
    pub manufacturer: String,
    pub model_name: String,
    pub model_details: ModelDetails,
    pub implementation: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetails {
    pub supported_attachments: Vec<AttachmentKind>,
}

/// One statistics measurement from the statistics capabilities.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct StatisticsDataPoint {
    #[serde(rename = "type")]
    pub kind: StatisticKind,
    pub value: i64,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    Time,
    Area,
}
