//! OSM node types

use crate::impl_entity_ord;
use crate::types::Entity;
use serde::{Deserialize, Serialize};

/// Node as produced by a reader, with its tags
#[derive(Debug, Clone, PartialEq)]
pub struct OsmNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Vec<(String, String)>,
}

impl OsmNode {
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat,
            lon,
            tags: Vec::new(),
        }
    }

    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Compact form kept by the node tables: id and single-precision coordinates
    pub fn slim(&self) -> SlimNode {
        SlimNode {
            id: self.id,
            lat: self.lat as f32,
            lon: self.lon as f32,
        }
    }
}

/// Node reduced to what lookups need; ordered and compared by id
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlimNode {
    pub id: i64,
    pub lat: f32,
    pub lon: f32,
}

impl Entity for SlimNode {
    fn id(&self) -> i64 {
        self.id
    }
}
impl_entity_ord!(SlimNode);

impl SlimNode {
    /// Lookup key for `id`; coordinates are ignored by comparisons
    pub fn key(id: i64) -> Self {
        Self {
            id,
            lat: 0.0,
            lon: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slim_keeps_id_and_coordinates() {
        let node = OsmNode::new(42, 55.6761, 12.5683).with_tag("amenity", "cafe");
        let slim = node.slim();

        assert_eq!(slim.id, 42);
        assert!((slim.lat - 55.6761).abs() < 1e-4);
        assert!((slim.lon - 12.5683).abs() < 1e-4);
        assert_eq!(node.tag("amenity"), Some("cafe"));
        assert_eq!(node.tag("name"), None);
    }

    #[test]
    fn test_slim_nodes_compare_by_id() {
        let a = SlimNode { id: 1, lat: 1.0, lon: 2.0 };
        let b = SlimNode { id: 1, lat: 3.0, lon: 4.0 };
        assert_eq!(a, b);
        assert!(SlimNode::key(0) < a);
        assert_eq!(SlimNode::key(1), a);
    }
}
