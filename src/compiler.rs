use crate::config::{AreaConfig, BarConfig, ChartConfig, ChartKind, GaugeConfig, MapConfig};
use crate::error::{ChartError, ChartResult, Condition, Diagnostics};
use crate::ir::{
    AreaGeometry, Axis, AxisOrientation, BarGeometry, BarRect, CategoricalPoint, ChartGeometry, GaugeGeometry,
    GaugeTick, GeoPoint, MapGeometry, Marker, Pointer, RatioScalar, RegionPath, Series, TemporalCountPoint,
};
use crate::path::{canvas_arc, fmt_num, monotone_x};
use crate::projection::MercatorProjection;
use crate::scale::{AngularScale, BandScale, LinearScale, TimeScale};
use crate::topology::Topology;
use crate::viewport::Viewport;
use kurbo::BezPath;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

/// Offset added to each canonical gauge tick value before it is mapped to an angle.
/// The pointer angle does not get it.
pub const GAUGE_TICK_BIAS: f64 = 150.0;

/// The scales a run resolved, kept for axis drawing and inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleSet {
    None,
    Area { x: TimeScale, y: LinearScale },
    Bar { x: BandScale, y: LinearScale },
    Gauge { angle: AngularScale },
    Map { projection: MercatorProjection },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledChart {
    pub geometry: ChartGeometry,
    pub scales: ScaleSet,
}

impl CompiledChart {
    pub fn empty() -> Self {
        CompiledChart { geometry: ChartGeometry::Empty, scales: ScaleSet::None }
    }
}

/// Compile a series into shape descriptors for the configured chart kind
pub fn compile_geometry(
    series: &Series,
    viewport: &Viewport,
    config: &ChartConfig,
    topology: Option<&Topology>,
    diagnostics: &mut Diagnostics,
) -> ChartResult<CompiledChart> {
    let compiled = match (config.kind, series) {
        (ChartKind::Area, Series::TemporalCount(points)) => {
            let (geometry, x, y) = compile_area(points, viewport, &config.area, diagnostics);
            CompiledChart { geometry: ChartGeometry::Area(geometry), scales: ScaleSet::Area { x, y } }
        }
        (ChartKind::Bar, Series::CategoricalValue(points)) => {
            let (geometry, x, y) = compile_bars(points, viewport, &config.bar, diagnostics);
            CompiledChart { geometry: ChartGeometry::Bar(geometry), scales: ScaleSet::Bar { x, y } }
        }
        (ChartKind::Gauge, Series::Ratio(ratio)) => {
            let (geometry, angle) = compile_gauge(*ratio, &config.gauge, diagnostics);
            CompiledChart { geometry: ChartGeometry::Gauge(geometry), scales: ScaleSet::Gauge { angle } }
        }
        (ChartKind::Map, Series::Geo(points)) => {
            let (geometry, projection) = compile_map(points, topology, viewport, &config.map, diagnostics);
            CompiledChart { geometry: ChartGeometry::Map(geometry), scales: ScaleSet::Map { projection } }
        }
        (kind, _) => {
            return Err(ChartError::InvalidInput(format!(
                "{:?} chart cannot be drawn from this series",
                kind
            )))
        }
    };
    Ok(compiled)
}

// =============================================================================
// Area
// =============================================================================

/// Monotone area from the baseline up to each count, points in ascending instant order.
pub fn compile_area(
    points: &[TemporalCountPoint],
    viewport: &Viewport,
    config: &AreaConfig,
    diagnostics: &mut Diagnostics,
) -> (AreaGeometry, TimeScale, LinearScale) {
    let inner_width = viewport.inner_width();
    let inner_height = viewport.inner_height();

    // Stable: equal instants keep their extraction order.
    let mut sorted: Vec<&TemporalCountPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.instant);

    let x = TimeScale::resolve(&sorted, |p| p.instant, (0.0, inner_width), diagnostics);
    let y = LinearScale::resolve(&sorted, |p| p.count as f64, (inner_height, 0.0), diagnostics);

    let mapped: Vec<(f64, f64)> = sorted
        .iter()
        .map(|p| (x.map(p.instant), y.map(p.count as f64)))
        .collect();

    let mut path = BezPath::new();
    if let (Some(first), Some(last)) = (mapped.first(), mapped.last()) {
        monotone_x(&mut path, &mapped, false);
        path.line_to((last.0, inner_height));
        path.line_to((first.0, inner_height));
        path.close_path();
    }

    let geometry = AreaGeometry {
        path,
        points: mapped,
        baseline: inner_height,
        x_axis: Axis {
            orientation: AxisOrientation::Bottom,
            offset: inner_height,
            ticks: x.axis_ticks(config.tick_count),
        },
        y_axis: Axis {
            orientation: AxisOrientation::Left,
            offset: 0.0,
            ticks: y.axis_ticks(config.tick_count),
        },
    };
    (geometry, x, y)
}

// =============================================================================
// Bar
// =============================================================================

/// One rectangle per point; duplicate categories share a band but stay separate rects.
pub fn compile_bars(
    points: &[CategoricalPoint],
    viewport: &Viewport,
    config: &BarConfig,
    diagnostics: &mut Diagnostics,
) -> (BarGeometry, BandScale, LinearScale) {
    let inner_width = (points.len() as f64 * config.min_band_step).max(viewport.inner_width());
    let inner_height = viewport.inner_height();

    let x = BandScale::resolve(points, |p| p.category.as_str(), (0.0, inner_width), config.padding, diagnostics);
    let y = LinearScale::resolve(points, |p| p.value, (inner_height, 0.0), diagnostics);
    let bandwidth = x.bandwidth();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let bars = points
        .iter()
        .filter_map(|p| {
            let band_x = x.position(&p.category)?;
            let occurrence = occurrences.entry(p.category.as_str()).or_insert(0);
            let key = format!("{}#{}", p.category, occurrence);
            *occurrence += 1;

            // Non-finite values, and a flat value axis, rest on the baseline.
            let top = if p.value.is_finite() && !y.is_degenerate() { y.map(p.value) } else { inner_height };
            Some(BarRect {
                key,
                category: p.category.clone(),
                value: p.value,
                x: band_x,
                y: top,
                width: bandwidth,
                height: inner_height - top,
            })
        })
        .collect();

    let geometry = BarGeometry {
        bars,
        inner_width,
        inner_height,
        x_axis: Axis {
            orientation: AxisOrientation::Bottom,
            offset: inner_height,
            ticks: x.axis_ticks(),
        },
        y_axis: Axis {
            orientation: AxisOrientation::Left,
            offset: 0.0,
            ticks: y.axis_ticks(config.tick_count),
        },
    };
    (geometry, x, y)
}

// =============================================================================
// Gauge
// =============================================================================

pub fn compile_gauge(
    ratio: RatioScalar,
    config: &GaugeConfig,
    diagnostics: &mut Diagnostics,
) -> (GaugeGeometry, AngularScale) {
    let radius = config.radius();
    let center = (radius, radius);
    let angle = AngularScale::resolve(
        (config.min_value, config.max_value),
        (config.start_angle, config.end_angle),
        diagnostics,
    );

    // Gauge angles run clockwise from 12 o'clock; the path builder measures from 3 o'clock.
    let start = config.start_angle - FRAC_PI_2;
    let end = config.end_angle - FRAC_PI_2;
    let mut background = BezPath::new();
    canvas_arc(&mut background, center, radius, start, end, false);
    canvas_arc(&mut background, center, radius - config.arc_thickness, end, start, true);
    background.close_path();

    let tick_radius = radius - config.arc_thickness - config.tick_inset;
    let label_radius = radius - config.arc_thickness - config.label_inset;
    let ticks = config
        .tick_values
        .iter()
        .map(|&value| {
            let a = angle.map(value + config.tick_bias);
            let at = |r: f64| (center.0 + r * a.cos(), center.1 + r * a.sin());
            GaugeTick {
                value,
                angle: a,
                start: at(tick_radius),
                end: at(radius),
                label: fmt_num(value),
                label_position: at(label_radius),
            }
        })
        .collect();

    let (pointer, label) = match ratio {
        RatioScalar::Percent(p) => (
            Some(Pointer::at(center, config.pointer_length(), angle.map(p))),
            format!("{}%", p.round()),
        ),
        RatioScalar::Undefined => (None, "\u{2013}".to_string()),
    };

    let geometry = GaugeGeometry {
        center,
        start_angle: config.start_angle,
        end_angle: config.end_angle,
        background,
        hub_radius: config.hub_radius,
        ticks,
        pointer,
        label,
        label_position: (center.0, center.1 + config.arc_thickness + 30.0),
    };
    (geometry, angle)
}

// =============================================================================
// Map
// =============================================================================

pub fn compile_map(
    points: &[GeoPoint],
    topology: Option<&Topology>,
    viewport: &Viewport,
    config: &MapConfig,
    diagnostics: &mut Diagnostics,
) -> (MapGeometry, MercatorProjection) {
    let projection = MercatorProjection::for_viewport(viewport, config);

    let regions = match topology.and_then(|t| t.collection(&config.region_collection)) {
        Some(regions) => regions
            .iter()
            .map(|region| RegionPath {
                id: region.id.clone(),
                path: region_path(&region.geometry, &projection),
            })
            .collect(),
        None => {
            let available: Vec<&str> = topology.map(|t| t.names().collect()).unwrap_or_default();
            log::warn!(
                "no '{}' region collection (topology has [{}]); drawing markers only",
                config.region_collection,
                available.join(", ")
            );
            Vec::new()
        }
    };

    let mut dropped = 0;
    let markers: Vec<Marker> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match projection.project(p.longitude, p.latitude) {
            Some((x, y)) => Some(Marker { key: format!("marker/{}", i), x, y, radius: config.marker_radius }),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        diagnostics.push(Condition::ProjectionFailure { dropped });
    }
    (MapGeometry { regions, markers }, projection)
}

fn region_path(geometry: &geo::MultiPolygon<f64>, projection: &MercatorProjection) -> BezPath {
    let mut path = BezPath::new();
    for polygon in &geometry.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let projected: Vec<(f64, f64)> = ring
                .coords()
                .filter_map(|c| projection.project(c.x, c.y))
                .collect();
            if projected.len() < 3 {
                continue;
            }
            path.move_to(projected[0]);
            for &point in &projected[1..] {
                path.line_to(point);
            }
            path.close_path();
        }
    }
    path
}
