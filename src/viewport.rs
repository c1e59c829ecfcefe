// Viewport manager: container size observations -> layout

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Margins { top, right, bottom, left }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Current chart box and its derived inner drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl Viewport {
    pub fn new(width: f64, height: f64, margins: Margins) -> Self {
        Viewport { width, height, margins }
    }

    pub fn inner_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }
}

/// Container box as reported by the host surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerBox {
    pub width: f64,
    pub height: f64,
}

impl ContainerBox {
    pub fn new(width: f64, height: f64) -> Self {
        ContainerBox { width, height }
    }
}

/// How a chart kind derives its height from the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightPolicy {
    FractionOfWidth(f64),
    Fixed(f64),
    Container,
}

#[derive(Debug, Clone)]
pub struct ViewportManager {
    policy: HeightPolicy,
    margins: Margins,
    fallback: (f64, f64),
    current: Viewport,
}

impl ViewportManager {
    /// Set up from the initial container box; the first viewport is available
    /// immediately, before any resize notification.
    pub fn new(policy: HeightPolicy, margins: Margins, fallback: (f64, f64), initial: ContainerBox) -> Self {
        let mut manager = ViewportManager {
            policy,
            margins,
            fallback,
            current: Viewport::new(0.0, 0.0, margins),
        };
        manager.current = manager.layout(initial);
        log::info!("initial viewport {}x{}", manager.current.width, manager.current.height);
        manager
    }

    pub fn current(&self) -> &Viewport {
        &self.current
    }

    /// Feed a resize notification. Returns the new viewport only when it differs.
    pub fn observe(&mut self, container: ContainerBox) -> Option<Viewport> {
        let next = self.layout(container);
        if next == self.current {
            log::debug!("viewport unchanged at {}x{}", next.width, next.height);
            return None;
        }
        log::info!("viewport {}x{} -> {}x{}", self.current.width, self.current.height, next.width, next.height);
        self.current = next;
        Some(next)
    }

    fn layout(&self, container: ContainerBox) -> Viewport {
        let width = if container.width > 0.0 { container.width } else { self.fallback.0 };
        let height = match self.policy {
            HeightPolicy::FractionOfWidth(ratio) => width * ratio,
            HeightPolicy::Fixed(height) => height,
            HeightPolicy::Container => {
                if container.height > 0.0 { container.height } else { self.fallback.1 }
            }
        };
        Viewport::new(width, height, self.margins)
    }
}
