use crate::geometry::{GeometryKind, TilePoint};
use crate::mvt::commands::{Command, zigzag_decode, zigzag_encode};
use crate::{TilerError, TilerResult};

/// Running position of the pen, shared by all parts of one feature
#[derive(Debug, Default)]
struct Cursor {
    x: i32,
    y: i32,
}

impl Cursor {
    fn encode_to(&mut self, p: TilePoint, out: &mut Vec<u32>) {
        out.push(zigzag_encode(p.x.wrapping_sub(self.x)));
        out.push(zigzag_encode(p.y.wrapping_sub(self.y)));
        self.x = p.x;
        self.y = p.y;
    }

    fn decode_from(&mut self, dx: u32, dy: u32) -> TilePoint {
        self.x = self.x.wrapping_add(zigzag_decode(dx));
        self.y = self.y.wrapping_add(zigzag_decode(dy));
        TilePoint::new(self.x, self.y)
    }
}

/// Encode the parts of one feature into an MVT command stream.
///
/// Points emit one `MoveTo` per group, lines a `MoveTo` plus a `LineTo` per part,
/// and polygons additionally close every ring with `ClosePath`. A repeated
/// closing point of a ring is not written.
pub fn encode_geometry(kind: GeometryKind, parts: &[Vec<TilePoint>]) -> TilerResult<Vec<u32>> {
    if kind == GeometryKind::Unknown {
        return Err(TilerError::UnknownGeometryKind);
    }
    if parts.is_empty() || parts.iter().any(Vec::is_empty) {
        return Err(TilerError::EmptyGeometry(kind));
    }

    let size = parts.iter().map(|p| p.len() * 2 + 3).sum();
    let mut encoded = Vec::with_capacity(size);
    let mut cursor = Cursor::default();

    for part in parts {
        match kind {
            GeometryKind::Point => {
                encoded.push(Command::MoveTo.integer(part.len() as u32));
                for p in part {
                    cursor.encode_to(*p, &mut encoded);
                }
            }
            GeometryKind::LineString => {
                encoded.push(Command::MoveTo.integer(1));
                cursor.encode_to(part[0], &mut encoded);
                if part.len() > 1 {
                    encoded.push(Command::LineTo.integer(part.len() as u32 - 1));
                    for p in &part[1..] {
                        cursor.encode_to(*p, &mut encoded);
                    }
                }
            }
            GeometryKind::Polygon => {
                let closed = part.len() > 1 && part.first() == part.last();
                let end = if closed { part.len() - 1 } else { part.len() };
                encoded.push(Command::MoveTo.integer(1));
                cursor.encode_to(part[0], &mut encoded);
                if end > 1 {
                    encoded.push(Command::LineTo.integer(end as u32 - 1));
                    for p in &part[1..end] {
                        cursor.encode_to(*p, &mut encoded);
                    }
                }
                encoded.push(Command::ClosePath.integer(1));
            }
            GeometryKind::Unknown => return Err(TilerError::UnknownGeometryKind),
        }
    }
    Ok(encoded)
}

/// Decode an MVT command stream into absolute parts.
///
/// `ClosePath` appends a copy of the ring's first point, so closed rings come back closed.
pub fn decode_geometry(kind: GeometryKind, commands: &[u32]) -> TilerResult<Vec<Vec<TilePoint>>> {
    if kind == GeometryKind::Unknown {
        return Err(TilerError::UnknownGeometryKind);
    }

    let mut parts: Vec<Vec<TilePoint>> = Vec::new();
    let mut cursor = Cursor::default();
    let mut stream = commands.iter().copied();

    while let Some(value) = stream.next() {
        let (cmd, count) = Command::parse(value)?;
        match cmd {
            Command::MoveTo | Command::LineTo => {
                if cmd == Command::MoveTo || parts.is_empty() {
                    parts.push(Vec::with_capacity(count as usize + 1));
                }
                for _ in 0..count {
                    let (Some(dx), Some(dy)) = (stream.next(), stream.next()) else {
                        return Err(TilerError::TruncatedGeometry);
                    };
                    let p = cursor.decode_from(dx, dy);
                    if let Some(part) = parts.last_mut() {
                        part.push(p);
                    }
                }
            }
            Command::ClosePath => {
                if kind == GeometryKind::Point {
                    return Err(TilerError::ClosePathOnPoint);
                }
                if let Some(part) = parts.last_mut() {
                    if let Some(&first) = part.first() {
                        part.push(first);
                    }
                }
            }
        }
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn part(points: &[(i32, i32)]) -> Vec<TilePoint> {
        points.iter().copied().map(TilePoint::from).collect()
    }

    fn encode(kind: GeometryKind, parts: &[&[(i32, i32)]]) -> Vec<u32> {
        let parts: Vec<_> = parts.iter().map(|p| part(p)).collect();
        encode_geometry(kind, &parts).unwrap()
    }

    #[test]
    fn point_encoding() {
        assert_eq!(encode(GeometryKind::Point, &[&[(25, 17)]]), vec![9, 50, 34]);
        assert_eq!(encode(GeometryKind::Point, &[&[(100, 200)]]), vec![9, 200, 400]);
    }

    #[test]
    fn multipoint_encoding() {
        assert_eq!(
            encode(GeometryKind::Point, &[&[(5, 7), (3, 2)]]),
            vec![17, 10, 14, 3, 9]
        );
        // the cursor carries over to the next group
        assert_eq!(
            encode(GeometryKind::Point, &[&[(5, 7)], &[(3, 2)]]),
            vec![9, 10, 14, 9, 3, 9]
        );
    }

    #[test]
    fn linestring_encoding() {
        assert_eq!(
            encode(GeometryKind::LineString, &[&[(2, 2), (2, 10), (10, 10)]]),
            vec![9, 4, 4, 18, 0, 16, 16, 0]
        );
    }

    #[test]
    fn multilinestring_encoding() {
        assert_eq!(
            encode(
                GeometryKind::LineString,
                &[&[(2, 2), (2, 10), (10, 10)], &[(1, 1), (3, 5)]]
            ),
            vec![9, 4, 4, 18, 0, 16, 16, 0, 9, 17, 17, 10, 4, 8]
        );
    }

    #[test]
    fn polygon_encoding() {
        assert_eq!(
            encode(GeometryKind::Polygon, &[&[(3, 6), (8, 12), (20, 34), (3, 6)]]),
            vec![9, 6, 12, 18, 10, 12, 24, 44, 15]
        );
        // an open ring encodes the same way
        assert_eq!(
            encode(GeometryKind::Polygon, &[&[(3, 6), (8, 12), (20, 34)]]),
            vec![9, 6, 12, 18, 10, 12, 24, 44, 15]
        );
    }

    #[test]
    fn multipolygon_encoding() {
        let rings: &[&[(i32, i32)]] = &[
            &[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)],
            &[(11, 11), (20, 11), (20, 20), (11, 20), (11, 11)],
            &[(13, 13), (13, 17), (17, 17), (17, 13), (13, 13)],
        ];
        assert_eq!(
            encode(GeometryKind::Polygon, rings),
            vec![
                9, 0, 0, 26, 20, 0, 0, 20, 19, 0, 15, 9, 22, 2, 26, 18, 0, 0, 18, 17, 0, 15, 9, 4,
                13, 26, 0, 8, 8, 0, 0, 7, 15
            ]
        );
    }

    #[test]
    fn encode_rejects_bad_input() {
        assert!(matches!(
            encode_geometry(GeometryKind::Unknown, &[part(&[(1, 1)])]),
            Err(TilerError::UnknownGeometryKind)
        ));
        assert!(matches!(
            encode_geometry(GeometryKind::Point, &[]),
            Err(TilerError::EmptyGeometry(GeometryKind::Point))
        ));
        assert!(matches!(
            encode_geometry(GeometryKind::LineString, &[part(&[(1, 1), (2, 2)]), vec![]]),
            Err(TilerError::EmptyGeometry(GeometryKind::LineString))
        ));
    }

    #[rstest]
    #[case::point(GeometryKind::Point, vec![vec![(25, 17)]])]
    #[case::point_groups(GeometryKind::Point, vec![vec![(5, 7), (3, 2)], vec![(-4, 9)]])]
    #[case::line(GeometryKind::LineString, vec![vec![(2, 2), (2, 10), (10, 10)]])]
    #[case::single_vertex_line(GeometryKind::LineString, vec![vec![(7, 7)], vec![(1, 1), (3, 5)]])]
    #[case::lines(GeometryKind::LineString, vec![vec![(-20, 5), (532, 5)], vec![(1, 1), (3, 5)]])]
    #[case::ring(GeometryKind::Polygon, vec![vec![(3, 6), (8, 12), (20, 34), (3, 6)]])]
    #[case::rings(
        GeometryKind::Polygon,
        vec![
            vec![(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)],
            vec![(13, 13), (13, 17), (17, 17), (17, 13), (13, 13)],
        ]
    )]
    #[case::extremes(
        GeometryKind::LineString,
        vec![vec![(i32::MIN, i32::MAX), (i32::MAX, i32::MIN)]]
    )]
    fn decode_reverses_encode(#[case] kind: GeometryKind, #[case] parts: Vec<Vec<(i32, i32)>>) {
        let expected: Vec<_> = parts.iter().map(|p| part(p)).collect();
        let encoded = encode_geometry(kind, &expected).unwrap();
        assert_eq!(decode_geometry(kind, &encoded).unwrap(), expected);
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(
            decode_geometry(GeometryKind::Point, &[9, 50]),
            Err(TilerError::TruncatedGeometry)
        ));
        assert!(matches!(
            decode_geometry(GeometryKind::Point, &[9, 50, 34, 15]),
            Err(TilerError::ClosePathOnPoint)
        ));
        assert!(matches!(
            decode_geometry(GeometryKind::Polygon, &[9, 50, 34, 4]),
            Err(TilerError::UnknownCommand(4))
        ));
        assert!(matches!(
            decode_geometry(GeometryKind::Unknown, &[9, 50, 34]),
            Err(TilerError::UnknownGeometryKind)
        ));
        assert!(decode_geometry(GeometryKind::Polygon, &[]).unwrap().is_empty());
    }

    #[test]
    fn close_path_on_empty_part_is_ignored() {
        assert_eq!(
            decode_geometry(GeometryKind::Polygon, &[15, 9, 2, 2, 15]).unwrap(),
            vec![part(&[(1, 1), (1, 1)])]
        );
    }
}
