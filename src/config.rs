// Chart configuration: field paths, layout constants, transition settings

use crate::record::FieldPath;
use crate::transition::Easing;
use crate::viewport::{HeightPolicy, Margins};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::f64::consts::FRAC_PI_2;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Area,
    Bar,
    Gauge,
    Map,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub fields: FieldConfig,
    pub area: AreaConfig,
    pub bar: BarConfig,
    pub gauge: GaugeConfig,
    pub map: MapConfig,
    pub transition: TransitionConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            kind: ChartKind::Area,
            fields: FieldConfig::default(),
            area: AreaConfig::default(),
            bar: BarConfig::default(),
            gauge: GaugeConfig::default(),
            map: MapConfig::default(),
            transition: TransitionConfig::default(),
        }
    }
}

impl ChartConfig {
    pub fn for_kind(kind: ChartKind) -> Self {
        ChartConfig {
            kind,
            ..Default::default()
        }
    }

    /// Load a JSON config file; unspecified keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub fn margins(&self) -> Margins {
        match self.kind {
            ChartKind::Area => self.area.margins,
            ChartKind::Bar => self.bar.margins,
            ChartKind::Gauge | ChartKind::Map => Margins::zero(),
        }
    }

    pub fn height_policy(&self) -> HeightPolicy {
        match self.kind {
            ChartKind::Area => HeightPolicy::FractionOfWidth(self.area.height_ratio),
            ChartKind::Bar => HeightPolicy::Fixed(self.bar.container_height),
            // Room for the readout below the half-disc.
            ChartKind::Gauge => HeightPolicy::Fixed(self.gauge.size / 2.0 + 50.0),
            ChartKind::Map => HeightPolicy::Container,
        }
    }

    /// Size used when the container reports zero.
    pub fn fallback_size(&self) -> (f64, f64) {
        match self.kind {
            ChartKind::Area => (self.area.fallback_width, self.area.fallback_width * self.area.height_ratio),
            ChartKind::Bar => (self.bar.container_width, self.bar.container_height),
            ChartKind::Gauge => (self.gauge.size, self.gauge.size / 2.0 + 50.0),
            ChartKind::Map => self.map.fallback_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub order_date: FieldPath,
    pub order_number: FieldPath,
    pub total_cost: FieldPath,
    pub buyer_approval_date: FieldPath,
    pub supplier_approval_date: FieldPath,
    pub latitude: FieldPath,
    pub longitude: FieldPath,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            order_date: "orderInformation.orderDate".into(),
            order_number: "orderInformation.orderNumber".into(),
            total_cost: "paymentInformation.totalOrderCost".into(),
            buyer_approval_date: "approval.buyerApprovalDate".into(),
            supplier_approval_date: "approval.supplierApprovalDate".into(),
            latitude: "buyerInformation.coordinates.latitude".into(),
            longitude: "buyerInformation.coordinates.longitude".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    pub margins: Margins,
    pub height_ratio: f64,
    pub fallback_width: f64,
    pub tick_count: usize,
}

impl Default for AreaConfig {
    fn default() -> Self {
        AreaConfig {
            margins: Margins::new(20.0, 30.0, 30.0, 40.0),
            height_ratio: 0.5,
            fallback_width: 800.0,
            tick_count: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub margins: Margins,
    pub container_width: f64,
    pub container_height: f64,
    pub padding: f64,
    /// Minimum horizontal pixels per category; wider data sets widen the chart.
    pub min_band_step: f64,
    pub tick_count: usize,
}

impl Default for BarConfig {
    fn default() -> Self {
        BarConfig {
            margins: Margins::new(20.0, 30.0, 40.0, 60.0),
            container_width: 800.0,
            container_height: 400.0,
            padding: 0.1,
            min_band_step: 40.0,
            tick_count: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub size: f64,
    pub arc_thickness: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub tick_values: Vec<f64>,
    /// Added to every tick value before it goes through the angle scale.
    pub tick_bias: f64,
    pub hub_radius: f64,
    pub tick_inset: f64,
    pub label_inset: f64,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        GaugeConfig {
            size: 220.0,
            arc_thickness: 20.0,
            min_value: 0.0,
            max_value: 100.0,
            start_angle: -FRAC_PI_2,
            end_angle: FRAC_PI_2,
            tick_values: vec![0.0, 25.0, 50.0, 75.0, 100.0],
            tick_bias: crate::compiler::GAUGE_TICK_BIAS,
            hub_radius: 6.0,
            tick_inset: 10.0,
            label_inset: 25.0,
        }
    }
}

impl GaugeConfig {
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn pointer_length(&self) -> f64 {
        self.radius() - self.arc_thickness / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub scale_divisor: f64,
    pub translate_y_divisor: f64,
    pub marker_radius: f64,
    pub region_collection: String,
    pub fallback_size: (f64, f64),
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            scale_divisor: 6.5,
            translate_y_divisor: 1.5,
            marker_radius: 4.0,
            region_collection: "countries".to_string(),
            fallback_size: (960.0, 500.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            duration_ms: 400,
            easing: Easing::CubicInOut,
        }
    }
}

impl TransitionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
