//! Douglas-Peucker polyline simplification.

/// Simplify a polyline, keeping every point whose perpendicular
/// distance from the chord of its span exceeds `tolerance`. The first
/// and last points are always kept. A non-positive tolerance or a
/// polyline with fewer than three points is returned unchanged.
pub fn douglas_peucker(tolerance: f64, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if tolerance <= 0.0 || points.len() < 3 {
        return points.to_vec();
    }

    let mut farthest = 0;
    let mut max_dist = 0.0;
    let first = points[0];
    let last = points[points.len() - 1];
    for (i, &p) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(p, first, last);
        if dist > max_dist {
            max_dist = dist;
            farthest = i;
        }
    }

    if max_dist <= tolerance {
        return vec![first, last];
    }

    let mut left = douglas_peucker(tolerance, &points[..=farthest]);
    let right = douglas_peucker(tolerance, &points[farthest..]);
    // the split point appears at the end of left and the start of right
    left.pop();
    left.extend(right);
    left
}

fn perpendicular_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        // degenerate chord, fall back to point distance
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    ((p.0 - a.0) * dy - (p.1 - a.1) * dx).abs() / len
}
