//! Map snapshot payloads.
//!
//! Layers carry run-length encoded pixel data (`x, y, count` triples) and
//! entities carry flat coordinate pair lists. Both are kept compressed at
//! decode time; expansion is offered as methods so that consumers that only
//! inspect metadata never pay for it.

use serde::Deserialize;

/// A map snapshot as served by `robot/state/map` and the map SSE stream.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    pub size: Size,
    pub pixel_size: i64,
    pub layers: Vec<Layer>,
    pub entities: Vec<Entity>,
    pub meta_data: MapMetaData,
}

impl Map {
    /// Bounding box covering every layer, in map pixel coordinates.
    ///
    /// Returns `None` when the map has no layers.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut layers = self.layers.iter();
        let first = layers.next()?;
        let mut bounds = Bounds {
            min: Point {
                x: first.dimensions.x.min,
                y: first.dimensions.y.min,
            },
            max: Point {
                x: first.dimensions.x.max,
                y: first.dimensions.y.max,
            },
        };
        for layer in layers {
            bounds.min.x = bounds.min.x.min(layer.dimensions.x.min);
            bounds.min.y = bounds.min.y.min(layer.dimensions.y.min);
            bounds.max.x = bounds.max.x.max(layer.dimensions.x.max);
            bounds.max.y = bounds.max.y.max(layer.dimensions.y.max);
        }
        Some(bounds)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct Size {
    pub x: i64,
    pub y: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapMetaData {
    pub vendor_map_id: i64,
    pub version: i64,
    pub nonce: String,
    pub total_layer_area: i64,
}

/// One pixel layer (floor, wall, or a named segment).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub dimensions: LayerDimensions,
    pub compressed_pixels: Vec<i64>,
    pub meta_data: LayerMetaData,
    #[serde(rename = "type")]
    pub kind: LayerKind,
}

impl Layer {
    /// Expands the run-length encoded pixel runs into individual pixels.
    ///
    /// Runs are `x_start, y, count` triples; a trailing partial triple is
    /// ignored.
    pub fn pixels(&self) -> Vec<Point> {
        let mut pixels = Vec::new();
        for run in self.compressed_pixels.chunks_exact(3) {
            let (x_start, y, count) = (run[0], run[1], run[2]);
            for offset in 0..count.max(0) {
                pixels.push(Point {
                    x: x_start + offset,
                    y,
                });
            }
        }
        pixels
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerDimensions {
    pub x: Dimension,
    pub y: Dimension,
    pub pixel_count: i64,
}

/// Per-axis extent statistics for a layer.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct Dimension {
    pub min: i64,
    pub max: i64,
    pub mid: i64,
    pub avg: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetaData {
    #[serde(default)]
    pub segment_id: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Floor,
    Wall,
    Segment,
}

/// A point-based map feature (robot position, paths, zones, walls).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub points: Vec<i64>,
    pub meta_data: EntityMetaData,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

impl Entity {
    /// Expands the flat coordinate list into points.
    ///
    /// Coordinates are `x, y` pairs; a trailing unpaired value is ignored.
    pub fn positions(&self) -> Vec<Point> {
        self.points
            .chunks_exact(2)
            .map(|pair| Point {
                x: pair[0],
                y: pair[1],
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct EntityMetaData {
    #[serde(default)]
    pub angle: Option<i64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ActiveZone,
    ChargerLocation,
    GoToTarget,
    NoGoArea,
    NoMopArea,
    Path,
    PredictedPath,
    RobotPosition,
    VirtualWall,
}

/// A map pixel coordinate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Min/max corners of a pixel-space bounding box.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> i64 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y + 1
    }
}
