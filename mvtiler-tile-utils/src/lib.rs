//! Tile grid utilities shared by the mvtiler crates.
//!
//! Everything here works in spherical Web Mercator (EPSG:3857) meters,
//! with tile rows numbered north-up (XYZ). Use [`invert_y_value`] to convert
//! to the south-up (TMS) rows stored in `MBTiles` files.

use std::f64::consts::PI;
use std::fmt::{Display, Formatter};
use std::io::{Read as _, Write as _};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

mod matrix;
pub use matrix::TileMatrix;

mod rectangle;
pub use rectangle::{Rect, TileRect};

/// Radius of the spherical Mercator earth model, in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Length of the equator in Web Mercator meters
pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * PI * EARTH_RADIUS;

/// Highest supported zoom level (inclusive)
pub const MAX_ZOOM: u8 = 49;

/// Latitude limit of the Web Mercator square, in degrees
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u64,
    pub y: u64,
}

impl TileCoord {
    #[must_use]
    pub fn new(z: u8, x: u64, y: u64) -> Self {
        Self { z, x, y }
    }

    /// The four tiles covering this one at the next zoom level, in
    /// `(2x,2y), (2x+1,2y), (2x,2y+1), (2x+1,2y+1)` order.
    #[must_use]
    pub fn children(&self) -> [Self; 4] {
        let (z, x, y) = (self.z + 1, self.x * 2, self.y * 2);
        [
            Self::new(z, x, y),
            Self::new(z, x + 1, y),
            Self::new(z, x, y + 1),
            Self::new(z, x + 1, y + 1),
        ]
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}/{}/{}", self.z, self.x, self.y)
        } else {
            write!(f, "{},{},{}", self.z, self.x, self.y)
        }
    }
}

/// Number of tiles along one axis at the given zoom
#[must_use]
pub fn tiles_per_side(zoom: u8) -> u64 {
    1_u64 << zoom
}

/// Flip a tile row between XYZ (north-up) and TMS (south-up) numbering.
///
/// ```
/// # use mvtiler_tile_utils::invert_y_value;
/// assert_eq!(invert_y_value(3, 0), 7);
/// assert_eq!(invert_y_value(3, invert_y_value(3, 2)), 2);
/// ```
#[must_use]
pub fn invert_y_value(zoom: u8, y: u64) -> u64 {
    tiles_per_side(zoom) - y - 1
}

/// Convert longitude and latitude (degrees) into Web Mercator meters
#[must_use]
pub fn wgs84_to_webmercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}

/// Convert Web Mercator meters into longitude and latitude (degrees)
#[must_use]
pub fn webmercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

pub fn decode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

pub fn encode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Returns true if the data starts with the gzip magic bytes
#[must_use]
pub fn is_gzipped(data: &[u8]) -> bool {
    data.starts_with(b"\x1f\x8b")
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_children_order() {
        let children = TileCoord::new(1, 1, 0).children();
        assert_eq!(
            children,
            [
                TileCoord::new(2, 2, 0),
                TileCoord::new(2, 3, 0),
                TileCoord::new(2, 2, 1),
                TileCoord::new(2, 3, 1),
            ]
        );
    }

    #[test]
    fn test_display() {
        let xyz = TileCoord::new(5, 3, 17);
        assert_eq!(xyz.to_string(), "5,3,17");
        assert_eq!(format!("{xyz:#}"), "5/3/17");
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 0, 1)]
    #[case(1, 1, 0)]
    #[case(3, 2, 5)]
    #[case(14, 6000, 10383)]
    fn test_invert_y(#[case] zoom: u8, #[case] y: u64, #[case] expected: u64) {
        assert_eq!(invert_y_value(zoom, y), expected);
        assert_eq!(invert_y_value(zoom, expected), y);
    }

    #[test]
    fn test_invert_y_max_zoom() {
        assert_eq!(invert_y_value(MAX_ZOOM, 0), (1_u64 << 49) - 1);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(-122.4194, 37.7749)]
    #[case(180.0, 85.0)]
    #[case(-73.9857, -40.7484)]
    fn test_mercator_round_trip(#[case] lon: f64, #[case] lat: f64) {
        let (x, y) = wgs84_to_webmercator(lon, lat);
        let (lon2, lat2) = webmercator_to_wgs84(x, y);
        assert_relative_eq!(lon, lon2, epsilon = 1e-9);
        assert_relative_eq!(lat, lat2, epsilon = 1e-9);
    }

    #[test]
    fn test_mercator_world_edge() {
        let (x, y) = wgs84_to_webmercator(180.0, MAX_LATITUDE);
        assert_relative_eq!(x, EARTH_CIRCUMFERENCE / 2.0, epsilon = 1e-6);
        assert_relative_eq!(y, EARTH_CIRCUMFERENCE / 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_gzip_round_trip() {
        let data = b"vector tile bytes".repeat(10);
        let compressed = encode_gzip(&data).unwrap();
        assert!(is_gzipped(&compressed));
        assert!(!is_gzipped(&data));
        assert_eq!(decode_gzip(&compressed).unwrap(), data);
    }
}
