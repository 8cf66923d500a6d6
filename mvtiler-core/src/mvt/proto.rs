//! Vector tile wire messages, version 2.1 of the Mapbox Vector Tile specification.
//!
//! See <https://github.com/mapbox/vector-tile-spec/tree/master/2.1>.

use prost::{Enumeration, Message};

/// Vector tile data.
#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    /// Layers of the tile.
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

/// Tile layer.
#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    /// Vector tile specification version used by this layer.
    #[prost(uint32, required, tag = "15", default = "1")]
    pub version: u32,
    /// Unique layer identifier.
    #[prost(string, required, tag = "1")]
    pub name: String,
    /// The features in this layer.
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    /// Tag keys used by the layer's features.
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    /// Tag values used by the layer's features.
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    /// Width and height of the layer's coordinate system.
    #[prost(uint32, optional, tag = "5", default = "4096")]
    pub extent: Option<u32>,
}

/// Layer feature.
#[derive(Clone, PartialEq, Eq, Hash, Message)]
pub struct Feature {
    /// Feature identifier.
    #[prost(uint64, optional, tag = "1", default = "0")]
    pub id: Option<u64>,
    /// Consecutive pairs of indexes into [`Layer::keys`] and [`Layer::values`].
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub tags: Vec<u32>,
    /// The type of geometry stored in this feature.
    #[prost(enumeration = "GeomType", optional, tag = "3", default = "Unknown")]
    pub r#type: Option<i32>,
    /// Stream of geometry commands and parameters.
    #[prost(uint32, repeated, packed = "true", tag = "4")]
    pub geometry: Vec<u32>,
}

/// Types of geometry for a feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum GeomType {
    /// Unknown geometry
    Unknown = 0,
    /// Points
    Point = 1,
    /// Line strings
    Linestring = 2,
    /// Polygon rings
    Polygon = 3,
}

/// Feature tag value. Exactly one field is set in a valid message.
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    /// String value
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    /// 32 bit float value
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    /// 64 bit float value
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    /// Signed integer value
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    /// Unsigned integer value
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    /// Zigzag encoded signed integer value
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    /// Boolean value
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}
