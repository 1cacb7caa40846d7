//! Geometry for links and the viewport.
//!
//! Links are drawn between element edges rather than centers: the segment
//! joining the two centers is clipped against each element's rectangle and
//! only the part in the gap between them is rendered.

use crate::elements::Element;
use crate::viewport::{MAX_SCALE, MIN_SCALE, Viewport};
use kurbo::{Line, Point, Rect, Vec2};
use std::f64::consts::FRAC_PI_6;

/// Intersection of two segments, if they cross.
///
/// Solves `a.p0 + t (a.p1 - a.p0) = b.p0 + u (b.p1 - b.p0)` with the
/// determinant formula. Parallel segments (zero determinant) never intersect.
fn segment_intersection(a: Line, b: Line) -> Option<Point> {
    let (x1, y1, x2, y2) = (a.p0.x, a.p0.y, a.p1.x, a.p1.y);
    let (x3, y3, x4, y4) = (b.p0.x, b.p0.y, b.p1.x, b.p1.y);

    let den = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if den == 0.0 {
        return None;
    }

    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / den;
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / den;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
    } else {
        None
    }
}

/// The four edges of a rectangle: top, bottom, left, right.
fn rect_edges(rect: Rect) -> [Line; 4] {
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    [
        Line::new((x0, y0), (x1, y0)),
        Line::new((x0, y1), (x1, y1)),
        Line::new((x0, y0), (x0, y1)),
        Line::new((x1, y0), (x1, y1)),
    ]
}

/// Intersect the segment `p1 -> p2` with the edges of `rect`, returning the
/// crossing closest to `p2`, or `None` if the segment never crosses an edge.
pub fn intersect_line_with_rect(p1: Point, p2: Point, rect: Rect) -> Option<Point> {
    let segment = Line::new(p1, p2);
    rect_edges(rect)
        .into_iter()
        .filter_map(|edge| segment_intersection(segment, edge))
        .min_by(|a, b| a.distance(p2).total_cmp(&b.distance(p2)))
}

/// Where a link between two elements starts and ends.
///
/// Either point is `None` when its segment is degenerate (for example when the
/// two centers coincide); such links are not rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePoints {
    /// On the edge of the first element.
    pub point1: Option<Point>,
    /// On the edge of the second element.
    pub point2: Option<Point>,
}

impl EdgePoints {
    /// Both points, when the link can be drawn.
    pub fn both(&self) -> Option<(Point, Point)> {
        Some((self.point1?, self.point2?))
    }
}

/// Edge points of the segment joining the centers of two rectangles.
pub fn rect_edge_points(a: Rect, b: Rect) -> EdgePoints {
    let ca = a.center();
    let cb = b.center();
    EdgePoints {
        point1: intersect_line_with_rect(ca, cb, a),
        point2: intersect_line_with_rect(cb, ca, b),
    }
}

/// Edge points for a link from `a` to `b`, using approximated heights for
/// images whose height is still auto.
pub fn resolve_edge_points(a: &Element, b: &Element) -> EdgePoints {
    rect_edge_points(a.bounds(), b.bounds())
}

/// A renderable link: the visible segment plus an arrowhead at its end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkArrow {
    pub line: Line,
    /// Tip followed by the two barbs.
    pub head: [Point; 3],
}

/// Build the arrow for a link, or `None` if the edge points are degenerate.
pub fn link_arrow(edges: EdgePoints, head_size: f64) -> Option<LinkArrow> {
    let (start, tip) = edges.both()?;
    let angle = (tip.y - start.y).atan2(tip.x - start.x);
    let barb = |a: f64| tip - Vec2::new(head_size * a.cos(), head_size * a.sin());
    Some(LinkArrow {
        line: Line::new(start, tip),
        head: [tip, barb(angle - FRAC_PI_6), barb(angle + FRAC_PI_6)],
    })
}

/// Convert a screen point to board space: `(screen - offset) / scale`.
pub fn to_board_space(screen_point: Point, viewport: &Viewport) -> Point {
    let v = (screen_point.to_vec2() - viewport.offset) / viewport.scale;
    v.to_point()
}

/// Zoom by `delta` keeping the board point under `screen_point` fixed.
pub fn zoom_at(screen_point: Point, viewport: &Viewport, delta: f64) -> Viewport {
    zoom_at_within(screen_point, viewport, delta, MIN_SCALE, MAX_SCALE)
}

/// [`zoom_at`] with explicit scale bounds.
pub fn zoom_at_within(screen_point: Point, viewport: &Viewport, delta: f64, min: f64, max: f64) -> Viewport {
    let new_scale = (viewport.scale + delta).clamp(min, max);
    let ratio = new_scale / viewport.scale;
    let anchor = screen_point.to_vec2();
    Viewport {
        scale: new_scale,
        offset: (viewport.offset - anchor) * ratio + anchor,
    }
}
