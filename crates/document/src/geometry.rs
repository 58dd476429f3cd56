use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// Axis-aligned rectangle in page or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.max_x() <= self.max_x() + EPS
            && other.max_y() <= self.max_y() + EPS
    }

    pub fn approx_eq(&self, other: &Bounds) -> bool {
        const EPS: f64 = 1e-6;
        (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
            && (self.w - other.w).abs() < EPS
            && (self.h - other.h).abs() < EPS
    }
}

/// Page-to-screen transform: `screen = (page + (x, y)) * z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        }
    }
}

impl Camera {
    /// The camera that shows `bounds` as large as possible inside `viewport`,
    /// centered, keeping `inset` screen pixels free on every side.
    pub fn fit(bounds: Bounds, viewport: Size, inset: f64) -> Option<Camera> {
        let avail_w = viewport.w - 2.0 * inset;
        let avail_h = viewport.h - 2.0 * inset;
        if bounds.w <= 0.0 || bounds.h <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
            return None;
        }
        let z = (avail_w / bounds.w).min(avail_h / bounds.h);
        Some(Camera {
            x: (viewport.w / z - bounds.w) / 2.0 - bounds.x,
            y: (viewport.h / z - bounds.h) / 2.0 - bounds.y,
            z,
        })
    }

    /// The part of the page visible through `viewport`.
    pub fn visible_bounds(&self, viewport: Size) -> Bounds {
        Bounds::new(-self.x, -self.y, viewport.w / self.z, viewport.h / self.z)
    }
}
