//! Shape generation for 2D primitives
//!
//! A [`DrawList`] accumulates colored triangles, in the order shapes are
//! drawn, much like painting onto a 2D canvas.

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;

/// Segments used for a full circle
const CIRCLE_SEGMENTS: u32 = 32;

/// Triangle list built up in painter's order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    vertices: Vec<Vertex>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        self.vertices.push(Vertex::new(a.x, a.y, color));
        self.vertices.push(Vertex::new(b.x, b.y, color));
        self.vertices.push(Vertex::new(c.x, c.y, color));
    }

    /// Fill a simple (possibly concave) polygon
    pub fn fill_polygon(&mut self, points: &[Vec2], color: [f32; 4]) {
        for [a, b, c] in triangulate(points) {
            self.push_triangle(points[a], points[b], points[c], color);
        }
    }

    /// Fill an axis-aligned rectangle from its top-left corner
    pub fn fill_rect(&mut self, min: Vec2, size: Vec2, color: [f32; 4]) {
        let max = min + size;
        let tr = Vec2::new(max.x, min.y);
        let bl = Vec2::new(min.x, max.y);
        self.push_triangle(min, tr, max, color);
        self.push_triangle(min, max, bl, color);
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        for i in 0..CIRCLE_SEGMENTS {
            let a1 = i as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            let a2 = (i + 1) as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            let p1 = center + Vec2::from_angle(a1) * radius;
            let p2 = center + Vec2::from_angle(a2) * radius;
            self.push_triangle(center, p1, p2, color);
        }
    }

    /// Ring centered on the circle's edge
    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: [f32; 4]) {
        let inner = (radius - width / 2.0).max(0.0);
        let outer = radius + width / 2.0;

        for i in 0..CIRCLE_SEGMENTS {
            let d1 = Vec2::from_angle(i as f32 / CIRCLE_SEGMENTS as f32 * TAU);
            let d2 = Vec2::from_angle((i + 1) as f32 / CIRCLE_SEGMENTS as f32 * TAU);

            let inner1 = center + d1 * inner;
            let outer1 = center + d1 * outer;
            let inner2 = center + d2 * inner;
            let outer2 = center + d2 * outer;

            // Two triangles per segment
            self.push_triangle(inner1, outer1, inner2, color);
            self.push_triangle(inner2, outer1, outer2, color);
        }
    }

    /// Straight line of the given width
    pub fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
        let dir = (to - from).normalize_or_zero();
        if dir == Vec2::ZERO {
            return;
        }
        let perp = dir.perp() * (width / 2.0);
        self.push_triangle(from - perp, from + perp, to + perp, color);
        self.push_triangle(from - perp, to + perp, to - perp, color);
    }

    /// Append another list on top of this one
    pub fn extend(&mut self, other: &DrawList) {
        self.vertices.extend_from_slice(&other.vertices);
    }
}

/// Twice the signed area (positive for counter-clockwise in y-up terms)
fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum()
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple polygon.
/// Returns index triples into `points`; degenerate input yields nothing.
pub fn triangulate(points: &[Vec2]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    // Work on a counter-clockwise ordering so convex corners have positive cross
    let mut remaining: Vec<usize> = (0..n).collect();
    if signed_area(points) < 0.0 {
        remaining.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut guard = 0;

    while remaining.len() > 3 && guard < n * n {
        guard += 1;
        let m = remaining.len();
        let mut clipped = false;

        for i in 0..m {
            let prev = remaining[(i + m - 1) % m];
            let cur = remaining[i];
            let next = remaining[(i + 1) % m];
            let (a, b, c) = (points[prev], points[cur], points[next]);

            if (b - a).perp_dot(c - b) <= 0.0 {
                continue; // reflex or collinear
            }

            let contains_other = remaining
                .iter()
                .filter(|&&j| j != prev && j != cur && j != next)
                .any(|&j| point_in_triangle(points[j], a, b, c));
            if contains_other {
                continue;
            }

            triangles.push([prev, cur, next]);
            remaining.remove(i);
            clipped = true;
            break;
        }

        if !clipped {
            // Self-intersecting or fully collinear input
            break;
        }
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }

    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(points: &[Vec2], tris: &[[usize; 3]]) -> f32 {
        tris.iter()
            .map(|[a, b, c]| ((points[*b] - points[*a]).perp_dot(points[*c] - points[*a])).abs() / 2.0)
            .sum()
    }

    #[test]
    fn test_triangulate_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let tris = triangulate(&square);
        assert_eq!(tris.len(), 2);
        assert!((area_of(&square, &tris) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangulate_concave_either_winding() {
        // L-shape, area 300
        let mut l_shape = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];
        let tris = triangulate(&l_shape);
        assert_eq!(tris.len(), 4);
        assert!((area_of(&l_shape, &tris) - 300.0).abs() < 1e-3);

        l_shape.reverse();
        let tris = triangulate(&l_shape);
        assert_eq!(tris.len(), 4);
        assert!((area_of(&l_shape, &tris) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangulate_degenerate() {
        assert!(triangulate(&[Vec2::ZERO, Vec2::X]).is_empty());
    }

    #[test]
    fn test_draw_list_counts() {
        let mut list = DrawList::new();
        list.fill_rect(Vec2::ZERO, Vec2::new(4.0, 2.0), [1.0; 4]);
        assert_eq!(list.triangle_count(), 2);

        list.fill_circle(Vec2::ZERO, 5.0, [1.0; 4]);
        assert_eq!(list.triangle_count(), 2 + CIRCLE_SEGMENTS as usize);

        list.stroke_circle(Vec2::ZERO, 5.0, 1.0, [1.0; 4]);
        assert_eq!(list.triangle_count(), 2 + 3 * CIRCLE_SEGMENTS as usize);

        // Zero-length lines draw nothing
        let before = list.triangle_count();
        list.line(Vec2::ONE, Vec2::ONE, 2.0, [1.0; 4]);
        assert_eq!(list.triangle_count(), before);
    }
}
