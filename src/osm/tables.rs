//! Node tables fed by an [`OsmObserver`]

use super::node::{OsmNode, SlimNode};
use super::OsmObserver;
use crate::index::{BTreeSet, SortedArraySet, Storage};
use crate::storage::{FileBackedStorage, LeafCache, RefTable, VecRefTable};
use crate::Result;

/// Slim nodes in an in-memory reference table
#[derive(Debug, Default)]
pub struct NodeTable {
    table: VecRefTable<SlimNode>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, node: SlimNode) -> Result<()> {
        self.table.put(node)
    }

    pub fn get(&self, id: i64) -> Result<Option<SlimNode>> {
        self.table.get(id)
    }

    pub fn len(&self) -> Result<usize> {
        self.table.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.table.is_empty()
    }
}

impl OsmObserver for NodeTable {
    fn on_node(&mut self, node: &OsmNode) -> Result<()> {
        self.put(node.slim())
    }
}

/// Slim nodes in a B+Tree over any leaf storage
pub struct BTreeNodeTable<S = SortedArraySet<SlimNode>> {
    tree: BTreeSet<SlimNode, S>,
}

impl BTreeNodeTable {
    pub fn new() -> Self {
        Self {
            tree: BTreeSet::new(),
        }
    }
}

impl Default for BTreeNodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BTreeNodeTable<FileBackedStorage<SlimNode>> {
    /// Table whose leaves spill through `cache`
    pub fn file_backed(cache: &LeafCache<SlimNode>) -> Result<Self> {
        Ok(Self {
            tree: BTreeSet::file_backed(cache)?,
        })
    }
}

impl<S: Storage<SlimNode>> BTreeNodeTable<S> {
    pub fn with_storage(storage: S) -> Self {
        Self {
            tree: BTreeSet::with_storage(storage),
        }
    }

    pub fn get(&self, id: i64) -> Result<Option<SlimNode>> {
        self.tree.get(&SlimNode::key(id))
    }

    pub fn contains(&self, id: i64) -> Result<bool> {
        self.tree.contains(&SlimNode::key(id))
    }

    pub fn tree(&self) -> &BTreeSet<SlimNode, S> {
        &self.tree
    }
}

impl<S: Storage<SlimNode>> OsmObserver for BTreeNodeTable<S> {
    fn on_node(&mut self, node: &OsmNode) -> Result<()> {
        self.tree.add(node.slim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use tempfile::TempDir;

    fn nodes(count: i64) -> Vec<OsmNode> {
        (0..count)
            .map(|i| OsmNode::new(i * 7919 % 10_007, 55.0 + i as f64 * 1e-4, 12.0))
            .collect()
    }

    #[test]
    fn test_node_table_from_observer() {
        let mut table = NodeTable::new();
        for node in nodes(500) {
            table.on_node(&node).unwrap();
        }

        assert_eq!(table.len().unwrap(), 500);
        assert_eq!(table.get(7919).unwrap().map(|n| n.id), Some(7919));
        assert!(table.get(-1).unwrap().is_none());
    }

    #[test]
    fn test_node_table_keeps_latest_position() {
        let mut table = NodeTable::new();
        table.on_node(&OsmNode::new(1, 10.0, 20.0)).unwrap();
        table.on_node(&OsmNode::new(1, 11.0, 21.0)).unwrap();

        let node = table.get(1).unwrap().unwrap();
        assert_eq!(node.lat, 11.0);
        assert_eq!(table.len().unwrap(), 1);
    }

    #[test]
    fn test_btree_node_table_in_memory() {
        let mut table = BTreeNodeTable::new();
        let input = nodes(2000);
        for node in &input {
            table.on_node(node).unwrap();
        }

        for node in &input {
            let found = table.get(node.id).unwrap().unwrap();
            assert_eq!(found.lat, node.lat as f32);
            assert!(table.contains(node.id).unwrap());
        }
        table.tree().check_invariants().unwrap();
    }

    #[test]
    fn test_btree_node_table_file_backed() {
        let dir = TempDir::new().unwrap();
        let config = IndexConfig::for_testing().with_temp_dir(dir.path());
        let cache = LeafCache::with_config(&config).unwrap();

        let mut table = BTreeNodeTable::file_backed(&cache).unwrap();
        let input = nodes(3000);
        for node in &input {
            table.on_node(node).unwrap();
        }

        for node in &input {
            assert_eq!(table.get(node.id).unwrap().map(|n| n.id), Some(node.id));
        }
        assert!(table.get(20_000).unwrap().is_none());
        assert!(cache.stats().write_backs > 0);
    }
}
