// Event-driven pipeline: records and container size in, geometry and animation frames out

use crate::compiler::{compile_geometry, CompiledChart, ScaleSet};
use crate::config::{ChartConfig, ChartKind};
use crate::error::{ChartResult, Diagnostics};
use crate::extract::{extract, FieldSpec};
use crate::ir::ChartGeometry;
use crate::scene::{Frame, Scene};
use crate::topology::Topology;
use crate::viewport::{ContainerBox, Viewport, ViewportManager};
use serde_json::Value;
use std::time::Duration;

/// Field paths each chart kind reads.
pub fn field_spec(config: &ChartConfig) -> FieldSpec {
    let fields = &config.fields;
    match config.kind {
        ChartKind::Area => FieldSpec::TemporalCount { date: fields.order_date.clone() },
        ChartKind::Bar => FieldSpec::CategoricalValue {
            label: fields.order_number.clone(),
            value: fields.total_cost.clone(),
        },
        ChartKind::Gauge => FieldSpec::Ratio {
            left: fields.buyer_approval_date.clone(),
            right: fields.supplier_approval_date.clone(),
        },
        ChartKind::Map => FieldSpec::Geo {
            latitude: fields.latitude.clone(),
            longitude: fields.longitude.clone(),
        },
    }
}

/// One pure run: records and a viewport to scales and shape descriptors.
pub fn run(
    records: &Value,
    config: &ChartConfig,
    viewport: &Viewport,
    topology: Option<&Topology>,
) -> ChartResult<(CompiledChart, Diagnostics)> {
    let extraction = extract(records, &field_spec(config))?;
    if extraction.series.is_empty() {
        log::info!("no drawable points for the {:?} chart", config.kind);
    }
    let mut diagnostics = extraction.diagnostics;
    let compiled = compile_geometry(&extraction.series, viewport, config, topology, &mut diagnostics)?;
    Ok((compiled, diagnostics))
}

/// Single-writer cache of the current viewport, scales, geometry and scene.
///
/// Every triggering event recomputes the scales and geometry wholesale; the
/// scene then retargets its transitions from wherever they currently are.
#[derive(Debug, Clone)]
pub struct ChartPipeline {
    config: ChartConfig,
    topology: Option<Topology>,
    viewport: ViewportManager,
    records: Option<Value>,
    compiled: CompiledChart,
    diagnostics: Diagnostics,
    scene: Scene,
}

impl ChartPipeline {
    pub fn new(config: ChartConfig, container: ContainerBox) -> Self {
        let viewport = ViewportManager::new(
            config.height_policy(),
            config.margins(),
            config.fallback_size(),
            container,
        );
        let scene = Scene::new(config.transition.duration(), config.transition.easing);
        ChartPipeline {
            config,
            topology: None,
            viewport,
            records: None,
            compiled: CompiledChart::empty(),
            diagnostics: Diagnostics::new(),
            scene,
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        self.viewport.current()
    }

    /// Target geometry of the latest run.
    pub fn geometry(&self) -> &ChartGeometry {
        &self.compiled.geometry
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.compiled.scales
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_animating(&self) -> bool {
        self.scene.is_animating()
    }

    /// Input-data change.
    pub fn set_records(&mut self, records: Value) -> ChartResult<()> {
        self.records = Some(records);
        self.recompute()
    }

    /// Container-resize notification. `None` when the viewport did not change
    /// and nothing was recomputed.
    pub fn resize(&mut self, container: ContainerBox) -> Option<ChartResult<()>> {
        self.viewport.observe(container)?;
        if self.records.is_none() {
            return Some(Ok(()));
        }
        Some(self.recompute())
    }

    /// Advance the animation clock.
    pub fn tick(&mut self, dt: Duration) {
        self.scene.tick(dt);
    }

    /// Current interpolated value of every animated property.
    pub fn frame(&self) -> Frame {
        self.scene.frame()
    }

    /// Geometry as it should be drawn right now.
    pub fn rendered(&self) -> ChartGeometry {
        self.scene.apply_to(&self.compiled.geometry)
    }

    fn recompute(&mut self) -> ChartResult<()> {
        let records = self.records.as_ref().unwrap_or(&Value::Null);
        let viewport = *self.viewport.current();
        match run(records, &self.config, &viewport, self.topology.as_ref()) {
            Ok((compiled, diagnostics)) => {
                self.compiled = compiled;
                self.diagnostics = diagnostics;
                self.scene.apply(&self.compiled.geometry);
                Ok(())
            }
            Err(e) => {
                log::error!("chart run failed: {}", e);
                self.compiled = CompiledChart::empty();
                self.diagnostics = Diagnostics::new();
                self.scene.apply(&self.compiled.geometry);
                Err(e)
            }
        }
    }
}
