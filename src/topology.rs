// Boundary data: named region collections decoded from TopoJSON

use crate::error::{ChartError, ChartResult};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Pre-parsed boundary data, one region list per named collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    collections: BTreeMap<String, Vec<Region>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, regions: Vec<Region>) {
        self.collections.insert(name.into(), regions);
    }

    pub fn collection(&self, name: &str) -> Option<&[Region]> {
        self.collections.get(name).map(|r| r.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(|k| k.as_str())
    }

    /// Decode every object of a TopoJSON topology.
    pub fn from_topojson(value: &Value) -> ChartResult<Self> {
        if value["type"].as_str() != Some("Topology") {
            return Err(ChartError::InvalidInput("expected a TopoJSON Topology".to_string()));
        }
        let arcs = decode_arcs(value)?;
        let objects = value["objects"]
            .as_object()
            .ok_or_else(|| ChartError::InvalidInput("topology has no objects".to_string()))?;

        let mut topology = Topology::new();
        for (name, object) in objects {
            let mut regions = Vec::new();
            collect_regions(object, &arcs, &mut regions)?;
            topology.insert(name.clone(), regions);
        }
        Ok(topology)
    }
}

/// Arcs with the quantization transform undone and deltas accumulated.
fn decode_arcs(value: &Value) -> ChartResult<Vec<Vec<Coord<f64>>>> {
    let transform = match &value["transform"] {
        Value::Null => None,
        t => Some((pair(&t["scale"])?, pair(&t["translate"])?)),
    };
    let arcs = value["arcs"]
        .as_array()
        .ok_or_else(|| ChartError::InvalidInput("topology has no arcs".to_string()))?;

    arcs.iter()
        .map(|arc| {
            let positions = arc
                .as_array()
                .ok_or_else(|| ChartError::InvalidInput("arc must be an array".to_string()))?;
            let mut x = 0.0;
            let mut y = 0.0;
            positions
                .iter()
                .map(|p| {
                    let (px, py) = pair(p)?;
                    Ok(match transform {
                        Some((scale, translate)) => {
                            x += px;
                            y += py;
                            Coord { x: x * scale.0 + translate.0, y: y * scale.1 + translate.1 }
                        }
                        None => Coord { x: px, y: py },
                    })
                })
                .collect()
        })
        .collect()
}

fn pair(value: &Value) -> ChartResult<(f64, f64)> {
    match (value[0].as_f64(), value[1].as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ChartError::InvalidInput(format!("expected a number pair, found {}", value))),
    }
}

fn collect_regions(object: &Value, arcs: &[Vec<Coord<f64>>], out: &mut Vec<Region>) -> ChartResult<()> {
    let id = match &object["id"] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match object["type"].as_str() {
        Some("GeometryCollection") => {
            for geometry in object["geometries"].as_array().into_iter().flatten() {
                collect_regions(geometry, arcs, out)?;
            }
        }
        Some("Polygon") => {
            let polygon = decode_polygon(&object["arcs"], arcs)?;
            out.push(Region { id, geometry: MultiPolygon(vec![polygon]) });
        }
        Some("MultiPolygon") => {
            let polygons = object["arcs"]
                .as_array()
                .into_iter()
                .flatten()
                .map(|rings| decode_polygon(rings, arcs))
                .collect::<ChartResult<Vec<_>>>()?;
            out.push(Region { id, geometry: MultiPolygon(polygons) });
        }
        // Points and lines carry no area to fill.
        _ => {}
    }
    Ok(())
}

fn decode_polygon(rings: &Value, arcs: &[Vec<Coord<f64>>]) -> ChartResult<Polygon<f64>> {
    let mut decoded = rings
        .as_array()
        .into_iter()
        .flatten()
        .map(|ring| decode_ring(ring, arcs))
        .collect::<ChartResult<Vec<_>>>()?;
    if decoded.is_empty() {
        return Ok(Polygon::new(LineString::new(Vec::new()), Vec::new()));
    }
    let exterior = decoded.remove(0);
    Ok(Polygon::new(exterior, decoded))
}

/// Stitch arcs into one ring; `~i` (negative) indices walk arc `i` backwards.
fn decode_ring(ring: &Value, arcs: &[Vec<Coord<f64>>]) -> ChartResult<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::new();
    for index in ring.as_array().into_iter().flatten() {
        let index = index
            .as_i64()
            .ok_or_else(|| ChartError::InvalidInput(format!("arc index must be an integer, found {}", index)))?;
        let (position, reversed) = if index < 0 { ((!index) as usize, true) } else { (index as usize, false) };
        let arc = arcs
            .get(position)
            .ok_or_else(|| ChartError::InvalidInput(format!("arc index {} out of bounds", index)))?;

        let mut points: Vec<Coord<f64>> = arc.clone();
        if reversed {
            points.reverse();
        }
        // Consecutive arcs share their joining vertex.
        let skip = usize::from(!coords.is_empty());
        coords.extend(points.into_iter().skip(skip));
    }
    Ok(LineString::new(coords))
}
