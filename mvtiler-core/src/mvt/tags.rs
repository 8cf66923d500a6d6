use std::collections::HashMap;

use crate::mvt::TileValue;

/// Builds the key and value tables of one layer, each deduplicated in first-seen order.
#[derive(Debug, Default)]
pub struct TagsBuilder {
    keys: Vec<String>,
    key_index: HashMap<String, u32>,
    values: Vec<TileValue>,
    value_index: HashMap<TileValue, u32>,
}

impl TagsBuilder {
    /// Creates an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table indexes of a key and value, adding them if not seen yet
    pub fn insert(&mut self, key: &str, value: &TileValue) -> (u32, u32) {
        let key_idx = if let Some(idx) = self.key_index.get(key) {
            *idx
        } else {
            let idx = self.keys.len() as u32;
            self.keys.push(key.to_string());
            self.key_index.insert(key.to_string(), idx);
            idx
        };
        let value_idx = if let Some(idx) = self.value_index.get(value) {
            *idx
        } else {
            let idx = self.values.len() as u32;
            self.values.push(value.clone());
            self.value_index.insert(value.clone(), idx);
            idx
        };
        (key_idx, value_idx)
    }

    /// Consumes the builder, returning the key and value tables
    #[must_use]
    pub fn into_tags(self) -> (Vec<String>, Vec<TileValue>) {
        (self.keys, self.values)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn first_seen_order() {
        let mut builder = TagsBuilder::new();
        assert_eq!(builder.insert("name", &"Main St".into()), (0, 0));
        assert_eq!(builder.insert("lanes", &TileValue::Uint(2)), (1, 1));
        assert_eq!(builder.insert("name", &"Main St".into()), (0, 0));
        assert_eq!(builder.insert("alt_name", &"Main St".into()), (2, 0));
        assert_eq!(builder.insert("lanes", &TileValue::Int(2)), (1, 2));

        let (keys, values) = builder.into_tags();
        assert_eq!(keys, vec!["name", "lanes", "alt_name"]);
        assert_eq!(
            values,
            vec![
                TileValue::from("Main St"),
                TileValue::Uint(2),
                TileValue::Int(2)
            ]
        );
    }
}
