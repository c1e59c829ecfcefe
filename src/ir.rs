use crate::path::serialize_svg;
use chrono::{DateTime, Utc};
use kurbo::BezPath;
use serde::Serialize;

// =============================================================================
// Phase 1: Extraction
// =============================================================================

/// One distinct date key and how many records carried it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalCountPoint {
    pub key: String, // Exact source string, the grouping key
    pub instant: DateTime<Utc>,
    pub count: u32,
}

/// One record's label and value. Duplicate categories stay distinct points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalPoint {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A derived percentage, or the explicit signal that it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RatioScalar {
    Percent(f64),
    Undefined,
}

impl RatioScalar {
    pub fn percent(&self) -> crate::error::ChartResult<f64> {
        match self {
            RatioScalar::Percent(p) => Ok(*p),
            RatioScalar::Undefined => Err(crate::error::ChartError::DivisionByZero),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, RatioScalar::Percent(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum Series {
    TemporalCount(Vec<TemporalCountPoint>),
    CategoricalValue(Vec<CategoricalPoint>),
    Ratio(RatioScalar),
    Geo(Vec<GeoPoint>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::TemporalCount(p) => p.len(),
            Series::CategoricalValue(p) => p.len(),
            Series::Ratio(r) => usize::from(r.is_defined()),
            Series::Geo(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Phase 3: Geometry (shape descriptors)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrientation {
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub label: String,
    pub position: f64,
}

/// Tick values and positions along one axis, offset from the inner origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub orientation: AxisOrientation,
    pub offset: f64,
    pub ticks: Vec<AxisTick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaGeometry {
    #[serde(serialize_with = "serialize_svg")]
    pub path: BezPath,
    pub points: Vec<(f64, f64)>, // Mapped (x, y) in ascending instant order
    pub baseline: f64,
    pub x_axis: Axis,
    pub y_axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRect {
    pub key: String, // Stable identity: category plus occurrence index
    pub category: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGeometry {
    pub bars: Vec<BarRect>,
    pub inner_width: f64,
    pub inner_height: f64,
    pub x_axis: Axis,
    pub y_axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeTick {
    pub value: f64,
    pub angle: f64,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub label: String,
    pub label_position: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pointer {
    pub angle: f64, // Radians, rotation about the centre from 12 o'clock
    pub length: f64,
    pub tip: (f64, f64),
}

impl Pointer {
    pub fn at(center: (f64, f64), length: f64, angle: f64) -> Self {
        Pointer {
            angle,
            length,
            tip: (center.0 + length * angle.sin(), center.1 - length * angle.cos()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeGeometry {
    pub center: (f64, f64),
    pub start_angle: f64,
    pub end_angle: f64,
    #[serde(serialize_with = "serialize_svg")]
    pub background: BezPath,
    pub hub_radius: f64,
    pub ticks: Vec<GaugeTick>,
    pub pointer: Option<Pointer>,
    pub label: String,
    pub label_position: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPath {
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_svg")]
    pub path: BezPath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapGeometry {
    pub regions: Vec<RegionPath>,
    pub markers: Vec<Marker>,
}

/// Renderable output of one pipeline run. Pure data, no surface handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartGeometry {
    Empty,
    Area(AreaGeometry),
    Bar(BarGeometry),
    Gauge(GaugeGeometry),
    Map(MapGeometry),
}
