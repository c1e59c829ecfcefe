use crate::ir::{Axis, AxisOrientation, ChartGeometry};
use crate::path::rings;
use crate::viewport::Viewport;
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use kurbo::BezPath;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const STEELBLUE: RGBColor = RGBColor(70, 130, 180);
const REGION_FILL: RGBColor = RGBColor(204, 204, 204);
const REGION_STROKE: RGBColor = RGBColor(51, 51, 51);
const DIAL: RGBColor = RGBColor(221, 221, 221);
const AXIS: RGBColor = RGBColor(0, 0, 0);

/// Flattening tolerance for curves and arcs, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.25;
/// Largest raster canvas, in pixels, the PNG path will allocate.
const MAX_CANVAS_PIXELS: usize = 1 << 26;
const TICK_SIZE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub fill: Option<RGBColor>,
    pub stroke: Option<RGBColor>,
    pub stroke_width: u32,
}

impl Paint {
    pub fn fill(color: RGBColor) -> Self {
        Paint { fill: Some(color), stroke: None, stroke_width: 0 }
    }

    pub fn stroke(color: RGBColor, width: u32) -> Self {
        Paint { fill: None, stroke: Some(color), stroke_width: width }
    }

    pub fn with_stroke(mut self, color: RGBColor, width: u32) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Minimal drawing substrate the chart descriptors are painted onto.
/// Coordinates are canvas pixels.
pub trait Surface {
    fn fill_path(&mut self, path: &BezPath, offset: (f64, f64), paint: &Paint) -> Result<()>;
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) -> Result<()>;
    fn circle(&mut self, center: (f64, f64), radius: f64, paint: &Paint) -> Result<()>;
    fn line(&mut self, from: (f64, f64), to: (f64, f64), paint: &Paint) -> Result<()>;
    fn text(&mut self, text: &str, at: (f64, f64), size: f64, anchor: Anchor) -> Result<()>;
}

/// Canvas size for a geometry; bar charts widen past the viewport when crowded.
pub fn canvas_size(geometry: &ChartGeometry, viewport: &Viewport) -> (u32, u32) {
    let width = match geometry {
        ChartGeometry::Bar(bars) => {
            (bars.inner_width + viewport.margins.left + viewport.margins.right).max(viewport.width)
        }
        _ => viewport.width,
    };
    (width.ceil().max(1.0) as u32, viewport.height.ceil().max(1.0) as u32)
}

/// Paint a geometry onto a surface, translating inner coordinates by the margins.
pub fn draw_chart<S: Surface>(surface: &mut S, geometry: &ChartGeometry, viewport: &Viewport) -> Result<()> {
    let origin = (viewport.margins.left, viewport.margins.top);
    let at = |(x, y): (f64, f64)| (origin.0 + x, origin.1 + y);

    match geometry {
        ChartGeometry::Empty => {}
        ChartGeometry::Area(area) => {
            surface.fill_path(&area.path, origin, &Paint::fill(STEELBLUE))?;
            draw_axis(surface, &area.x_axis, origin, viewport.inner_width())?;
            draw_axis(surface, &area.y_axis, origin, viewport.inner_height())?;
        }
        ChartGeometry::Bar(bars) => {
            let paint = Paint::fill(STEELBLUE);
            for rect in &bars.bars {
                let (x, y) = at((rect.x, rect.y));
                surface.rect(x, y, rect.width, rect.height, &paint)?;
            }
            draw_axis(surface, &bars.x_axis, origin, bars.inner_width)?;
            draw_axis(surface, &bars.y_axis, origin, bars.inner_height)?;
        }
        ChartGeometry::Gauge(gauge) => {
            // The dial is laid out at a fixed size; centre it in wider containers.
            let slack = (viewport.inner_width() - 2.0 * gauge.center.0).max(0.0);
            let origin = (origin.0 + slack / 2.0, origin.1);
            let at = |(x, y): (f64, f64)| (origin.0 + x, origin.1 + y);
            surface.fill_path(&gauge.background, origin, &Paint::fill(DIAL))?;
            let tick_paint = Paint::stroke(BLACK, 2);
            for tick in &gauge.ticks {
                surface.line(at(tick.start), at(tick.end), &tick_paint)?;
                surface.text(&tick.label, at(tick.label_position), 12.0, Anchor::Middle)?;
            }
            if let Some(pointer) = &gauge.pointer {
                surface.line(at(gauge.center), at(pointer.tip), &Paint::stroke(BLACK, 4))?;
            }
            surface.circle(at(gauge.center), gauge.hub_radius, &Paint::fill(BLACK))?;
            surface.text(&gauge.label, at(gauge.label_position), 20.0, Anchor::Middle)?;
        }
        ChartGeometry::Map(map) => {
            let paint = Paint::fill(REGION_FILL).with_stroke(REGION_STROKE, 1);
            for region in &map.regions {
                surface.fill_path(&region.path, origin, &paint)?;
            }
            let marker = Paint::fill(RED);
            for m in &map.markers {
                surface.circle(at((m.x, m.y)), m.radius, &marker)?;
            }
        }
    }
    Ok(())
}

fn draw_axis<S: Surface>(surface: &mut S, axis: &Axis, origin: (f64, f64), extent: f64) -> Result<()> {
    let paint = Paint::stroke(AXIS, 1);
    match axis.orientation {
        AxisOrientation::Bottom => {
            let y = origin.1 + axis.offset;
            surface.line((origin.0, y), (origin.0 + extent, y), &paint)?;
            for tick in &axis.ticks {
                let x = origin.0 + tick.position;
                surface.line((x, y), (x, y + TICK_SIZE), &paint)?;
                surface.text(&tick.label, (x, y + TICK_SIZE + 9.0), 10.0, Anchor::Middle)?;
            }
        }
        AxisOrientation::Left => {
            let x = origin.0 + axis.offset;
            surface.line((x, origin.1), (x, origin.1 + extent), &paint)?;
            for tick in &axis.ticks {
                let y = origin.1 + tick.position;
                surface.line((x - TICK_SIZE, y), (x, y), &paint)?;
                surface.text(&tick.label, (x - TICK_SIZE - 3.0, y), 10.0, Anchor::End)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// plotters backend
// =============================================================================

pub struct PlottersSurface<DB: DrawingBackend> {
    area: DrawingArea<DB, Shift>,
}

impl<DB: DrawingBackend> PlottersSurface<DB> {
    pub fn new(area: DrawingArea<DB, Shift>) -> Self {
        PlottersSurface { area }
    }

    pub fn present(&self) -> Result<()> {
        self.area
            .present()
            .map_err(|e| anyhow!("Failed to present drawing: {:?}", e))
    }
}

fn px(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

impl<DB: DrawingBackend> Surface for PlottersSurface<DB> {
    fn fill_path(&mut self, path: &BezPath, offset: (f64, f64), paint: &Paint) -> Result<()> {
        for ring in rings(path, FLATTEN_TOLERANCE) {
            let points: Vec<(i32, i32)> = ring.iter().map(|&(x, y)| px((x + offset.0, y + offset.1))).collect();
            if let Some(fill) = paint.fill {
                self.area
                    .draw(&Polygon::new(points.clone(), fill.filled()))
                    .map_err(|e| anyhow!("Failed to fill path: {:?}", e))?;
            }
            if let Some(stroke) = paint.stroke {
                self.area
                    .draw(&PathElement::new(points, stroke.stroke_width(paint.stroke_width)))
                    .map_err(|e| anyhow!("Failed to stroke path: {:?}", e))?;
            }
        }
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) -> Result<()> {
        let corners = [px((x, y)), px((x + width, y + height))];
        if let Some(fill) = paint.fill {
            self.area
                .draw(&Rectangle::new(corners, fill.filled()))
                .map_err(|e| anyhow!("Failed to draw rect: {:?}", e))?;
        }
        if let Some(stroke) = paint.stroke {
            self.area
                .draw(&Rectangle::new(corners, stroke.stroke_width(paint.stroke_width)))
                .map_err(|e| anyhow!("Failed to draw rect: {:?}", e))?;
        }
        Ok(())
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, paint: &Paint) -> Result<()> {
        let radius = radius.round().max(0.0) as u32;
        if let Some(fill) = paint.fill {
            self.area
                .draw(&Circle::new(px(center), radius, fill.filled()))
                .map_err(|e| anyhow!("Failed to draw circle: {:?}", e))?;
        }
        if let Some(stroke) = paint.stroke {
            self.area
                .draw(&Circle::new(px(center), radius, stroke.stroke_width(paint.stroke_width)))
                .map_err(|e| anyhow!("Failed to draw circle: {:?}", e))?;
        }
        Ok(())
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), paint: &Paint) -> Result<()> {
        let color = paint.stroke.or(paint.fill).unwrap_or(BLACK);
        self.area
            .draw(&PathElement::new(vec![px(from), px(to)], color.stroke_width(paint.stroke_width.max(1))))
            .map_err(|e| anyhow!("Failed to draw line: {:?}", e))
    }

    fn text(&mut self, text: &str, at: (f64, f64), size: f64, anchor: Anchor) -> Result<()> {
        let h = match anchor {
            Anchor::Start => HPos::Left,
            Anchor::Middle => HPos::Center,
            Anchor::End => HPos::Right,
        };
        let style = TextStyle::from(("sans-serif", size).into_font())
            .color(&BLACK)
            .pos(Pos::new(h, VPos::Center));
        // Missing fonts only cost the labels.
        if let Err(e) = self.area.draw(&Text::new(text.to_string(), px(at), style)) {
            log::warn!("skipping label '{}': {:?}", text, e);
        }
        Ok(())
    }
}

/// Render to an SVG document.
pub fn render_svg(geometry: &ChartGeometry, viewport: &Viewport) -> Result<String> {
    let size = canvas_size(geometry, viewport);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Failed to fill background: {:?}", e))?;
        let mut surface = PlottersSurface::new(root);
        draw_chart(&mut surface, geometry, viewport)?;
        surface.present()?;
    }
    Ok(svg)
}

/// Render to PNG bytes.
pub fn render_png(geometry: &ChartGeometry, viewport: &Viewport) -> Result<Vec<u8>> {
    let (width, height) = canvas_size(geometry, viewport);
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .filter(|&n| n <= MAX_CANVAS_PIXELS)
        .ok_or_else(|| anyhow!("Canvas {}x{} is too large to rasterize", width, height))?;
    let mut buffer = vec![0u8; pixels * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();

        root.fill(&WHITE)
            .context("Failed to fill background")?;

        let mut surface = PlottersSurface::new(root);
        draw_chart(&mut surface, geometry, viewport)?;
        surface.present()?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                &buffer,
                width,
                height,
                image::ColorType::Rgb8,
            )
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}
