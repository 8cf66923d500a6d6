use itertools::Itertools as _;

use crate::geometry::{ClipRect, PixelPoint, TilePoint, is_hole};

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Output of [`clip_line`]: all kept points in one buffer, split into parts by start offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClippedLines {
    /// Points of all parts, in order
    pub points: Vec<TilePoint>,
    /// Offset into `points` where each part begins
    pub parts: Vec<usize>,
}

impl ClippedLines {
    /// True if no segment of the line survived clipping
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over the clipped parts
    pub fn parts(&self) -> impl Iterator<Item = &[TilePoint]> {
        let ends = self.parts.iter().skip(1).copied().chain([self.points.len()]);
        self.parts
            .iter()
            .zip(ends)
            .map(|(&start, end)| &self.points[start..end])
    }

    /// Consume into one vector per part
    #[must_use]
    pub fn into_parts(self) -> Vec<Vec<TilePoint>> {
        self.parts().map(<[TilePoint]>::to_vec).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn rounded(self) -> TilePoint {
        TilePoint::new(
            self.x.round_ties_even() as i32,
            self.y.round_ties_even() as i32,
        )
    }
}

impl From<PixelPoint> for Point {
    fn from(p: PixelPoint) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

fn to_point<P: Into<PixelPoint>>(p: P) -> Point {
    let p: PixelPoint = p.into();
    Point::from(p)
}

/// Shoelace sum in floating point, for rings that are not clipped yet
fn float_area(ring: &[Point]) -> f64 {
    let Some(&last) = ring.last() else {
        return 0.0;
    };
    let mut prev = last;
    let mut sum = 0.0;
    for &p in ring {
        sum += prev.x * p.y - p.x * prev.y;
        prev = p;
    }
    sum
}

/// Float copy of the clip rectangle
#[derive(Debug, Clone, Copy)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl From<&ClipRect> for Bounds {
    fn from(rect: &ClipRect) -> Self {
        Self {
            x_min: f64::from(rect.x_min),
            x_max: f64::from(rect.x_max),
            y_min: f64::from(rect.y_min),
            y_max: f64::from(rect.y_max),
        }
    }
}

impl Bounds {
    fn outcode(&self, p: Point) -> u8 {
        let mut code = INSIDE;
        if p.x < self.x_min {
            code |= LEFT;
        } else if p.x > self.x_max {
            code |= RIGHT;
        }
        if p.y < self.y_min {
            code |= BOTTOM;
        } else if p.y > self.y_max {
            code |= TOP;
        }
        code
    }

    /// Cohen-Sutherland clip of one segment.
    /// Returns the clipped endpoints and whether the start point was moved.
    fn clip_segment(&self, mut a: Point, mut b: Point) -> Option<(Point, Point, bool)> {
        let mut code_a = self.outcode(a);
        let mut code_b = self.outcode(b);
        let mut start_moved = false;

        loop {
            if code_a | code_b == INSIDE {
                return Some((a, b, start_moved));
            }
            if code_a & code_b != INSIDE {
                return None;
            }

            let out = if code_a == INSIDE { code_b } else { code_a };
            let p = if out & TOP != 0 {
                Point {
                    x: a.x + (b.x - a.x) * (self.y_max - a.y) / (b.y - a.y),
                    y: self.y_max,
                }
            } else if out & BOTTOM != 0 {
                Point {
                    x: a.x + (b.x - a.x) * (self.y_min - a.y) / (b.y - a.y),
                    y: self.y_min,
                }
            } else if out & RIGHT != 0 {
                Point {
                    x: self.x_max,
                    y: a.y + (b.y - a.y) * (self.x_max - a.x) / (b.x - a.x),
                }
            } else {
                Point {
                    x: self.x_min,
                    y: a.y + (b.y - a.y) * (self.x_min - a.x) / (b.x - a.x),
                }
            };

            if out == code_a {
                a = p;
                code_a = self.outcode(a);
                start_moved = true;
            } else {
                b = p;
                code_b = self.outcode(b);
            }
        }
    }
}

/// Clip a polyline against `rect`, splitting it wherever it leaves the rectangle.
///
/// A new part starts when the previous segment was rejected or when the current
/// segment enters the rectangle at a new point. Intersections are computed in
/// floating point and rounded half to even when appended.
#[must_use]
pub fn clip_line<P>(line: &[P], rect: &ClipRect) -> ClippedLines
where
    P: Copy + Into<PixelPoint>,
{
    let bounds = Bounds::from(rect);
    let mut result = ClippedLines::default();
    let mut prev_accepted = false;

    for (a, b) in line.iter().copied().tuple_windows() {
        match bounds.clip_segment(to_point(a), to_point(b)) {
            Some((a, b, start_moved)) => {
                if !prev_accepted || start_moved {
                    result.parts.push(result.points.len());
                    result.points.push(a.rounded());
                }
                result.points.push(b.rounded());
                prev_accepted = true;
            }
            None => prev_accepted = false,
        }
    }
    result
}

/// Clip a closed ring against `rect` with four Sutherland-Hodgman passes.
///
/// Returns an empty vector if the ring lies outside the rectangle. A result with more
/// than 3 points is closed, and keeps the hole classification of the input ring.
/// Consecutive duplicate pixels are merged. Callers must drop results shorter than 4 points.
/// Only the result is narrowed to `i32`, so the input may lie far outside the `i32` range.
#[must_use]
pub fn clip_ring<P>(ring: &[P], rect: &ClipRect) -> Vec<TilePoint>
where
    P: Copy + Into<PixelPoint>,
{
    if ring.is_empty() {
        return Vec::new();
    }
    let bounds = Bounds::from(rect);
    let mut points: Vec<Point> = ring.iter().copied().map(to_point).collect();
    let was_hole = float_area(&points) > 0.0;

    points = clip_pass(&points, |p| p.x >= bounds.x_min, |a, b| at_x(a, b, bounds.x_min));
    if !points.is_empty() {
        points = clip_pass(&points, |p| p.y <= bounds.y_max, |a, b| at_y(a, b, bounds.y_max));
    }
    if !points.is_empty() {
        points = clip_pass(&points, |p| p.x <= bounds.x_max, |a, b| at_x(a, b, bounds.x_max));
    }
    if !points.is_empty() {
        points = clip_pass(&points, |p| p.y >= bounds.y_min, |a, b| at_y(a, b, bounds.y_min));
    }
    if points.is_empty() {
        return Vec::new();
    }

    let mut result: Vec<TilePoint> = points.into_iter().map(Point::rounded).collect();
    // intersections on a corner repeat the same pixel
    result.dedup();
    if result.len() > 3 && result.first() != result.last() {
        result.push(result[0]);
    }
    if is_hole(&result) != was_hole {
        result.reverse();
    }
    result
}

/// One half-plane pass over a ring, wrapping from the last point to the first
fn clip_pass(
    points: &[Point],
    inside: impl Fn(Point) -> bool,
    intersect: impl Fn(Point, Point) -> Point,
) -> Vec<Point> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    let mut output = Vec::with_capacity(points.len() + 4);
    let mut prev = last;
    for &cur in points {
        match (inside(prev), inside(cur)) {
            (true, true) => output.push(cur),
            (false, true) => {
                output.push(intersect(prev, cur));
                output.push(cur);
            }
            (true, false) => output.push(intersect(prev, cur)),
            (false, false) => {}
        }
        prev = cur;
    }
    output
}

fn at_x(a: Point, b: Point, x: f64) -> Point {
    Point {
        x,
        y: a.y + (b.y - a.y) * (x - a.x) / (b.x - a.x),
    }
}

fn at_y(a: Point, b: Point, y: f64) -> Point {
    Point {
        x: a.x + (b.x - a.x) * (y - a.y) / (b.y - a.y),
        y,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::geometry::signed_area;

    fn pts(points: &[(i32, i32)]) -> Vec<TilePoint> {
        points.iter().copied().map(TilePoint::from).collect()
    }

    const SMALL: ClipRect = ClipRect::new(0, 50, 0, 50);

    #[test]
    fn horizontal_line_is_clipped_to_both_edges() {
        let rect = ClipRect::new(-20, 532, -20, 532);
        let clipped = clip_line(&pts(&[(-30, 5), (600, 5)]), &rect);
        assert_eq!(clipped.into_parts(), vec![pts(&[(-20, 5), (532, 5)])]);
    }

    #[test]
    fn connected_segments_stay_in_one_part() {
        let line = pts(&[(0, 0), (10, 0), (20, 0), (20, 10)]);
        let clipped = clip_line(&line, &SMALL);
        assert_eq!(clipped.parts, vec![0]);
        assert_eq!(clipped.points, line);
    }

    #[test]
    fn leaving_and_reentering_splits_parts() {
        let line = pts(&[(10, 10), (80, 10), (80, 40), (10, 40)]);
        let clipped = clip_line(&line, &SMALL);
        assert_eq!(
            clipped.into_parts(),
            vec![pts(&[(10, 10), (50, 10)]), pts(&[(50, 40), (10, 40)])]
        );
    }

    #[test]
    fn diagonal_entry_is_interpolated() {
        let clipped = clip_line(&pts(&[(-10, 0), (10, 20)]), &SMALL);
        assert_eq!(clipped.into_parts(), vec![pts(&[(0, 10), (10, 20)])]);
    }

    #[rstest]
    #[case::outside(&[(60, 60), (70, 80), (100, 60)])]
    #[case::single_point(&[(10, 10)])]
    #[case::empty(&[])]
    fn nothing_survives(#[case] line: &[(i32, i32)]) {
        let clipped = clip_line(&pts(line), &SMALL);
        assert!(clipped.is_empty());
        assert_eq!(clipped.parts().count(), 0);
    }

    #[test]
    fn clipped_lines_stay_inside() {
        let line = pts(&[(-40, 25), (25, -40), (90, 25), (25, 90), (-40, 25), (25, 25), (120, 3)]);
        let clipped = clip_line(&line, &SMALL);
        assert!(!clipped.is_empty());
        for part in clipped.parts() {
            assert!(part.len() >= 2);
            assert!(part.iter().all(|p| SMALL.contains(*p)), "{part:?}");
        }
    }

    #[test]
    fn ring_inside_is_unchanged() {
        let ring = pts(&[(10, 10), (40, 10), (40, 40), (10, 40), (10, 10)]);
        assert_eq!(clip_ring(&ring, &SMALL), ring);

        let reversed: Vec<_> = ring.iter().rev().copied().collect();
        assert_eq!(clip_ring(&reversed, &SMALL), reversed);
    }

    #[test]
    fn ring_larger_than_rect_becomes_rect() {
        let ring = pts(&[(-10, -10), (60, -10), (60, 60), (-10, 60), (-10, -10)]);
        let clipped = clip_ring(&ring, &SMALL);
        assert_eq!(clipped, pts(&[(50, 0), (50, 50), (0, 50), (0, 0), (50, 0)]));
        assert_eq!(is_hole(&clipped), is_hole(&ring));
    }

    #[test]
    fn ring_outside_is_empty() {
        let ring = pts(&[(60, 60), (90, 60), (90, 90), (60, 60)]);
        assert_eq!(clip_ring(&ring, &SMALL), vec![]);
        assert_eq!(clip_ring::<TilePoint>(&[], &SMALL), vec![]);
    }

    #[test]
    fn ring_touching_a_corner_degenerates() {
        // only the corner point and its copies survive, too few for a polygon
        let ring = pts(&[(50, 50), (80, 50), (80, 80), (50, 50)]);
        let clipped = clip_ring(&ring, &SMALL);
        assert!(clipped.len() < 4, "{clipped:?}");
    }

    #[test]
    fn wide_ring_around_rect_becomes_rect() {
        let far = 1_i64 << 40;
        let ring = [
            PixelPoint::new(-far, -far),
            PixelPoint::new(far, -far),
            PixelPoint::new(far, far),
            PixelPoint::new(-far, far),
            PixelPoint::new(-far, -far),
        ];
        let clipped = clip_ring(&ring, &SMALL);
        assert_eq!(clipped, pts(&[(50, 0), (50, 50), (0, 50), (0, 0), (50, 0)]));
        assert!(is_hole(&clipped));
    }

    #[test]
    fn wide_diagonal_keeps_its_direction() {
        // saturating these to i32 would bend the line away from the rect's diagonal
        let far = 1_i64 << 40;
        let line = [PixelPoint::new(-far, -far), PixelPoint::new(far, far)];
        let clipped = clip_line(&line, &SMALL);
        assert_eq!(clipped.into_parts(), vec![pts(&[(0, 0), (50, 50)])]);
    }

    #[rstest]
    #[case::outer(&[(-20, 10), (30, -20), (70, 30), (20, 70), (-20, 10)])]
    #[case::hole(&[(-20, 10), (20, 70), (70, 30), (30, -20), (-20, 10)])]
    fn partially_clipped_ring_is_closed_and_contained(#[case] ring: &[(i32, i32)]) {
        let ring = pts(ring);
        let clipped = clip_ring(&ring, &SMALL);
        assert!(clipped.len() >= 4);
        assert_eq!(clipped.first(), clipped.last());
        assert!(clipped.iter().all(|p| SMALL.contains(*p)));
        assert_eq!(is_hole(&clipped), is_hole(&ring));
        assert_ne!(signed_area(&clipped), 0);
    }
}
