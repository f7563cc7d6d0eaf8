//! OpenStreetMap node ingestion
//!
//! A reader walks an OSM extract and reports every element to an
//! [`OsmObserver`]. The node tables here are observers that keep a
//! [`SlimNode`] per node, either in an in-memory reference table
//! ([`NodeTable`]) or in a B+Tree over any leaf storage ([`BTreeNodeTable`]).

mod node;
mod tables;

pub use node::{OsmNode, SlimNode};
pub use tables::{BTreeNodeTable, NodeTable};

use crate::Result;

/// Receiver of parsed OSM elements
///
/// Errors returned by a callback abort the read and reach its caller.
pub trait OsmObserver {
    fn on_node(&mut self, _node: &OsmNode) -> Result<()> {
        Ok(())
    }

    /// Called once after the last element
    fn on_finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Report every node of `nodes` to `observer`, then finish it
pub fn feed<'a, O, I>(observer: &mut O, nodes: I) -> Result<usize>
where
    O: OsmObserver + ?Sized,
    I: IntoIterator<Item = &'a OsmNode>,
{
    let mut count = 0;
    for node in nodes {
        observer.on_node(node)?;
        count += 1;
    }
    observer.on_finish()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexError;

    struct Counting {
        seen: Vec<i64>,
        finished: bool,
        fail_on: Option<i64>,
    }

    impl OsmObserver for Counting {
        fn on_node(&mut self, node: &OsmNode) -> Result<()> {
            if self.fail_on == Some(node.id) {
                return Err(IndexError::InvalidArgument(format!("node {}", node.id)));
            }
            self.seen.push(node.id);
            Ok(())
        }

        fn on_finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn test_feed_reports_every_node() {
        let nodes: Vec<_> = (0..5).map(|id| OsmNode::new(id, 0.0, 0.0)).collect();
        let mut observer = Counting { seen: Vec::new(), finished: false, fail_on: None };

        assert_eq!(feed(&mut observer, &nodes).unwrap(), 5);
        assert_eq!(observer.seen, vec![0, 1, 2, 3, 4]);
        assert!(observer.finished);
    }

    #[test]
    fn test_feed_stops_on_observer_error() {
        let nodes: Vec<_> = (0..5).map(|id| OsmNode::new(id, 0.0, 0.0)).collect();
        let mut observer = Counting { seen: Vec::new(), finished: false, fail_on: Some(2) };

        assert!(feed(&mut observer, &nodes).is_err());
        assert_eq!(observer.seen, vec![0, 1]);
        assert!(!observer.finished);
    }

    #[test]
    fn test_feed_into_node_table() {
        let nodes: Vec<_> = (0..50).rev().map(|id| OsmNode::new(id, 1.0, 2.0)).collect();
        let mut table = NodeTable::new();

        feed(&mut table, &nodes).unwrap();
        assert_eq!(table.get(25).unwrap().map(|n| n.id), Some(25));
    }
}
