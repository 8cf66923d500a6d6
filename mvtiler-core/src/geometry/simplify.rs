use crate::geometry::PixelPoint;

/// Douglas-Peucker simplification of a path in tile pixels.
///
/// Endpoints are always kept, along with every point farther than `tolerance`
/// from the chord of its sub-range. Points repeating the first point at the end
/// of a closed path are trimmed before simplifying and the closing point is put
/// back afterwards. A path collapsing to two identical points yields an empty result.
#[must_use]
pub fn simplify<P>(points: &[P], tolerance: f64) -> Vec<P>
where
    P: Copy + PartialEq + Into<PixelPoint>,
{
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let mut len = points.len();
    while len > 2 && points[len - 1] == first {
        len -= 1;
    }
    let trimmed = len < points.len();
    let points = &points[..len];

    let last = len - 1;
    let mut keep = vec![false; len];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0, last)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for idx in start + 1..end {
            let dist = segment_distance(points[idx].into(), points[start].into(), points[end].into());
            // strict comparison keeps the lowest index on ties
            if dist > max_dist {
                max_dist = dist;
                max_idx = idx;
            }
        }
        if max_dist > tolerance && max_idx != start {
            keep[max_idx] = true;
            ranges.push((max_idx, end));
            ranges.push((start, max_idx));
        }
    }

    let mut result: Vec<P> = points
        .iter()
        .zip(keep)
        .filter_map(|(p, keep)| keep.then_some(*p))
        .collect();

    if result.len() == 2 && result[0] == result[1] {
        return Vec::new();
    }
    if trimmed {
        result.push(first);
    }
    result
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (dx, dy) = (bx - ax, by - ay);

    if dx == 0.0 && dy == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    if (px - ax) * dx + (py - ay) * dy <= 0.0 {
        return (px - ax).hypot(py - ay);
    }
    if (px - bx) * -dx + (py - by) * -dy <= 0.0 {
        return (px - bx).hypot(py - by);
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::geometry::TilePoint;

    fn pts(points: &[(i32, i32)]) -> Vec<TilePoint> {
        points.iter().copied().map(TilePoint::from).collect()
    }

    #[test]
    fn distance_to_segment() {
        let a = PixelPoint::new(0, 0);
        let b = PixelPoint::new(10, 0);
        assert_relative_eq!(segment_distance(PixelPoint::new(5, 3), a, b), 3.0);
        assert_relative_eq!(segment_distance(PixelPoint::new(-3, 4), a, b), 5.0);
        assert_relative_eq!(segment_distance(PixelPoint::new(13, 4), a, b), 5.0);
        assert_relative_eq!(segment_distance(PixelPoint::new(3, 4), a, a), 5.0);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::single(&[(1, 1)])]
    #[case::two_points(&[(1, 1), (5, 5)])]
    #[case::two_equal(&[(1, 1), (1, 1)])]
    fn short_input_unchanged(#[case] input: &[(i32, i32)]) {
        let input = pts(input);
        assert_eq!(simplify(&input, 1.0), input);
    }

    #[test]
    fn drops_collinear_points() {
        let line = pts(&[(0, 0), (1, 0), (2, 0), (3, 0), (10, 0)]);
        assert_eq!(simplify(&line, 0.5), pts(&[(0, 0), (10, 0)]));
    }

    #[test]
    fn keeps_far_points() {
        let line = pts(&[(0, 0), (5, 1), (10, 10), (15, 1), (20, 0)]);
        assert_eq!(simplify(&line, 3.0), pts(&[(0, 0), (10, 10), (20, 0)]));
        assert_eq!(simplify(&line, 0.5), line);
    }

    #[test]
    fn ties_pick_lowest_index() {
        // both inner points are 4px away from the chord
        let line = pts(&[(0, 0), (3, 4), (7, 4), (10, 0)]);
        assert_eq!(simplify(&line, 4.5), pts(&[(0, 0), (10, 0)]));
        assert_eq!(simplify(&line, 3.9), pts(&[(0, 0), (3, 4), (10, 0)]));
    }

    #[test]
    fn closed_ring_keeps_closure() {
        let ring = pts(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]);
        assert_eq!(simplify(&ring, 1.0), ring);

        let noisy = pts(&[(0, 0), (5, 0), (10, 0), (10, 10), (0, 10), (0, 0), (0, 0)]);
        assert_eq!(simplify(&noisy, 1.0), ring);
    }

    #[test]
    fn degenerate_collapses_to_empty() {
        let dup = pts(&[(4, 4), (4, 4), (4, 4)]);
        assert_eq!(simplify(&dup, 1.0), vec![]);

        let spike = pts(&[(0, 0), (1, 0), (0, 0)]);
        assert_eq!(simplify(&spike, 2.0), pts(&[(0, 0), (1, 0), (0, 0)]));
    }

    #[rstest]
    #[case(0.5)]
    #[case(2.0)]
    #[case(8.0)]
    fn idempotent_and_keeps_endpoints(#[case] tolerance: f64) {
        let line = pts(&[
            (0, 0),
            (3, 7),
            (6, 2),
            (9, 12),
            (14, 4),
            (18, 9),
            (25, -3),
            (31, 5),
        ]);
        let once = simplify(&line, tolerance);
        assert!(once.len() <= line.len());
        assert_eq!(once.first(), line.first());
        assert_eq!(once.last(), line.last());
        assert_eq!(simplify(&once, tolerance), once);
    }
}
