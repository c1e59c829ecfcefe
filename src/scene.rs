// Persistent scene: keyed elements whose animatable properties carry transitions

use crate::ir::{ChartGeometry, Pointer};
use crate::transition::{Easing, Transition};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    X,
    Width,
    Height,
    Angle,
}

pub const POINTER_KEY: &str = "gauge/pointer";

pub fn bar_key(rect_key: &str) -> String {
    format!("bar/{}", rect_key)
}

#[derive(Debug, Clone)]
struct Element {
    properties: BTreeMap<Property, Transition>,
}

/// Current interpolated value of every animated property, by element key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub values: BTreeMap<String, BTreeMap<Property, f64>>,
}

impl Frame {
    pub fn get(&self, key: &str, property: Property) -> Option<f64> {
        self.values.get(key)?.get(&property).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    elements: BTreeMap<String, Element>,
    duration: Duration,
    easing: Easing,
}

impl Scene {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Scene { elements: BTreeMap::new(), duration, easing }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.elements.contains_key(key)
    }

    pub fn is_animating(&self) -> bool {
        self.elements
            .values()
            .any(|e| e.properties.values().any(|t| t.is_animating()))
    }

    /// Diff the scene against freshly compiled geometry.
    ///
    /// New keys enter from their entry values, existing keys are retargeted from
    /// their current interpolated values, and keys that disappeared are dropped.
    pub fn apply(&mut self, geometry: &ChartGeometry) {
        let targets = animated_targets(geometry);

        let live: HashSet<&str> = targets.iter().map(|t| t.key.as_str()).collect();
        let before = self.elements.len();
        self.elements.retain(|key, _| live.contains(key.as_str()));
        let removed = before - self.elements.len();
        let mut added = 0;

        for target in targets {
            let (duration, easing) = (self.duration, self.easing);
            let element = self.elements.entry(target.key).or_insert_with(|| {
                added += 1;
                Element { properties: BTreeMap::new() }
            });
            for (property, entry, to) in target.properties {
                element
                    .properties
                    .entry(property)
                    .or_insert_with(|| Transition::new(entry, duration, easing))
                    .set_target(to);
            }
        }
        log::debug!("scene diff: {} added, {} removed, {} total", added, removed, self.elements.len());
    }

    /// Advance every transition by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        for element in self.elements.values_mut() {
            for transition in element.properties.values_mut() {
                transition.tick(dt);
            }
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            values: self
                .elements
                .iter()
                .map(|(key, element)| {
                    let values = element.properties.iter().map(|(p, t)| (*p, t.value())).collect();
                    (key.clone(), values)
                })
                .collect(),
        }
    }

    /// Copy of `geometry` with animated properties replaced by their current values.
    pub fn apply_to(&self, geometry: &ChartGeometry) -> ChartGeometry {
        let frame = self.frame();
        let mut out = geometry.clone();
        match &mut out {
            ChartGeometry::Bar(bars) => {
                let baseline = bars.inner_height;
                for rect in &mut bars.bars {
                    let key = bar_key(&rect.key);
                    if let Some(x) = frame.get(&key, Property::X) {
                        rect.x = x;
                    }
                    if let Some(width) = frame.get(&key, Property::Width) {
                        rect.width = width;
                    }
                    if let Some(height) = frame.get(&key, Property::Height) {
                        rect.height = height;
                        rect.y = baseline - height;
                    }
                }
            }
            ChartGeometry::Gauge(gauge) => {
                let center = gauge.center;
                if let (Some(pointer), Some(angle)) = (gauge.pointer.as_mut(), frame.get(POINTER_KEY, Property::Angle)) {
                    *pointer = Pointer::at(center, pointer.length, angle);
                }
            }
            ChartGeometry::Area(_) | ChartGeometry::Map(_) | ChartGeometry::Empty => {}
        }
        out
    }
}

struct Target {
    key: String,
    properties: Vec<(Property, f64, f64)>, // (property, entry value, target value)
}

fn animated_targets(geometry: &ChartGeometry) -> Vec<Target> {
    match geometry {
        ChartGeometry::Bar(bars) => bars
            .bars
            .iter()
            .map(|rect| Target {
                key: bar_key(&rect.key),
                properties: vec![
                    (Property::X, rect.x, rect.x),
                    (Property::Width, rect.width, rect.width),
                    (Property::Height, 0.0, rect.height),
                ],
            })
            .collect(),
        // The needle sweeps in from the start of the dial.
        ChartGeometry::Gauge(gauge) => gauge
            .pointer
            .iter()
            .map(|pointer| Target {
                key: POINTER_KEY.to_string(),
                properties: vec![(Property::Angle, gauge.start_angle, pointer.angle)],
            })
            .collect(),
        ChartGeometry::Area(_) | ChartGeometry::Map(_) | ChartGeometry::Empty => Vec::new(),
    }
}
