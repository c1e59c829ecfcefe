// Path helpers on top of kurbo

use kurbo::{Arc, BezPath, PathEl, Point, Vec2};
use serde::Serializer;
use std::f64::consts::PI;

/// Serialize a path as its SVG `d` string.
pub fn serialize_svg<S: Serializer>(path: &BezPath, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_svg())
}

/// Append a circular arc using canvas angles (0 = +x, growing clockwise on screen).
///
/// Lines to the arc start if the path has a current point, otherwise moves there.
pub fn canvas_arc(path: &mut BezPath, center: (f64, f64), radius: f64, start: f64, end: f64, anticlockwise: bool) {
    let arc = Arc {
        center: Point::from(center),
        radii: Vec2::new(radius, radius),
        start_angle: start,
        sweep_angle: sweep(start, end, anticlockwise),
        x_rotation: 0.0,
    };
    let from = center_offset(center, radius, start);
    if path.elements().is_empty() || matches!(path.elements().last(), Some(PathEl::ClosePath)) {
        path.move_to(from);
    } else {
        path.line_to(from);
    }
    path.extend(arc.append_iter(0.1));
}

fn center_offset(center: (f64, f64), radius: f64, angle: f64) -> Point {
    Point::new(center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
}

fn sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    let delta = end - start;
    if anticlockwise {
        if delta > 0.0 { delta - 2.0 * PI * (delta / (2.0 * PI)).ceil() } else { delta }
    } else if delta < 0.0 {
        delta + 2.0 * PI * (-delta / (2.0 * PI)).ceil()
    } else {
        delta
    }
}

/// Flatten into polylines, one per subpath. Closed subpaths repeat their first point.
pub fn rings(path: &BezPath, tolerance: f64) -> Vec<Vec<(f64, f64)>> {
    let mut subpaths: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            if !current.is_empty() {
                subpaths.push(std::mem::take(&mut current));
            }
            current.push((p.x, p.y));
        }
        PathEl::LineTo(p) => current.push((p.x, p.y)),
        PathEl::ClosePath => {
            if let Some(&first) = current.first() {
                current.push(first);
            }
            subpaths.push(std::mem::take(&mut current));
        }
        // flatten only emits moves, lines and closes
        PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => current.push((p.x, p.y)),
    });
    if !current.is_empty() {
        subpaths.push(current);
    }
    subpaths
}

/// Compact number formatting for labels: at most 3 decimals, no trailing zeros.
pub fn fmt_num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" { "0".to_string() } else { s }
}

/// Monotone-in-x cubic interpolation through `points` (which must be sorted by x).
///
/// Tangents follow Steffen's method, so the curve never overshoots between
/// samples. Appends to `path`, starting with a move unless `continue_path`.
pub fn monotone_x(path: &mut BezPath, points: &[(f64, f64)], continue_path: bool) {
    let n = points.len();
    if n == 0 {
        return;
    }
    if continue_path {
        path.line_to(points[0]);
    } else {
        path.move_to(points[0]);
    }
    if n == 1 {
        return;
    }
    if n == 2 {
        path.line_to(points[1]);
        return;
    }

    let mut tangents = vec![0.0; n];
    for i in 1..n - 1 {
        tangents[i] = slope3(points[i - 1], points[i], points[i + 1]);
    }
    tangents[0] = slope2(points[0], points[1], tangents[1]);
    tangents[n - 1] = slope2(points[n - 2], points[n - 1], tangents[n - 2]);

    for i in 0..n - 1 {
        let (xa, ya) = points[i];
        let (xb, yb) = points[i + 1];
        let dx = (xb - xa) / 3.0;
        path.curve_to(
            (xa + dx, ya + dx * tangents[i]),
            (xb - dx, yb - dx * tangents[i + 1]),
            (xb, yb),
        );
    }
}

fn sign(x: f64) -> f64 {
    if x < 0.0 { -1.0 } else { 1.0 }
}

fn slope3(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let h0 = p1.0 - p0.0;
    let h1 = p2.0 - p1.0;
    let s0 = if h0 != 0.0 { (p1.1 - p0.1) / h0 } else { 0.0 };
    let s1 = if h1 != 0.0 { (p2.1 - p1.1) / h1 } else { 0.0 };
    let p = if h0 + h1 != 0.0 { (s0 * h1 + s1 * h0) / (h0 + h1) } else { 0.0 };
    let t = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if t.is_finite() { t } else { 0.0 }
}

fn slope2(p0: (f64, f64), p1: (f64, f64), t: f64) -> f64 {
    let h = p1.0 - p0.0;
    if h != 0.0 { (3.0 * (p1.1 - p0.1) / h - t) / 2.0 } else { t }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.25), "1.25");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(2.0 / 3.0), "0.667");
    }

    #[test]
    fn test_polyline_rings() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 5.5));
        path.close_path();
        let svg = path.to_svg();
        assert!(svg.starts_with('M') && svg.ends_with('Z'), "{}", svg);
        assert_eq!(rings(&path, 0.1), vec![vec![(0.0, 0.0), (10.0, 5.5), (0.0, 0.0)]]);
    }

    #[test]
    fn test_monotone_two_points_is_line() {
        let mut path = BezPath::new();
        monotone_x(&mut path, &[(0.0, 0.0), (10.0, 10.0)], false);
        assert_eq!(
            path.elements(),
            &[PathEl::MoveTo(Point::new(0.0, 0.0)), PathEl::LineTo(Point::new(10.0, 10.0))]
        );
    }

    #[test]
    fn test_monotone_does_not_overshoot() {
        let points = [(0.0, 0.0), (1.0, 10.0), (2.0, 10.0), (3.0, 0.0)];
        let mut path = BezPath::new();
        monotone_x(&mut path, &points, false);
        assert_eq!(path.elements().len(), 4);
        for poly in rings(&path, 0.001) {
            for (_, y) in poly {
                assert!(y <= 10.0 + 1e-9 && y >= -1e-9, "overshoot at y={}", y);
            }
        }
    }

    #[test]
    fn test_arc_half_turn() {
        let mut path = BezPath::new();
        canvas_arc(&mut path, (0.0, 0.0), 10.0, PI, 2.0 * PI, false);
        let bounds = path.bounding_box();
        // Clockwise on screen from west to east passes through north (negative y).
        assert!((bounds.x0 + 10.0).abs() < 0.1 && (bounds.x1 - 10.0).abs() < 0.1);
        assert!((bounds.y0 + 10.0).abs() < 0.1 && bounds.y1.abs() < 0.1);

        let flat = rings(&path, 0.01);
        let last = *flat[0].last().unwrap();
        assert!((last.0 - 10.0).abs() < 1e-6 && last.1.abs() < 1e-6);
    }

    #[test]
    fn test_arc_after_line_connects() {
        let mut path = BezPath::new();
        canvas_arc(&mut path, (0.0, 0.0), 10.0, PI, 2.0 * PI, false);
        canvas_arc(&mut path, (0.0, 0.0), 5.0, 2.0 * PI, PI, true);
        path.close_path();
        let moves = path.elements().iter().filter(|el| matches!(el, PathEl::MoveTo(_))).count();
        assert_eq!(moves, 1);
        assert!(matches!(path.elements()[path.elements().len() - 1], PathEl::ClosePath));
        assert_eq!(rings(&path, 0.1).len(), 1);
    }
}
