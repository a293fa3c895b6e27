use super::{list_shards, HitsError, HitsResult, NodeId, NodeRecord, RecordReader, Role};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::path::Path;

/// The log-domain ranks of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRanks {
    pub hub: f32,
    pub authority: f32,
}

impl Default for NodeRanks {
    fn default() -> Self {
        Self {
            hub: f32::NEG_INFINITY,
            authority: f32::NEG_INFINITY,
        }
    }
}

/// Reads the ranks of all nodes of an iteration directory.
pub fn read_ranks(dir: impl AsRef<Path>) -> HitsResult<BTreeMap<NodeId, NodeRanks>> {
    let mut ranks = BTreeMap::new();
    for shard in list_shards(dir)? {
        for record in RecordReader::open(shard)? {
            match record? {
                NodeRecord::Complete {
                    node, role, rank, ..
                } => {
                    let entry: &mut NodeRanks = ranks.entry(node).or_default();
                    match role {
                        Role::Hub => entry.hub = rank,
                        Role::Authority => entry.authority = rank,
                    }
                }
                other => {
                    return Err(HitsError::UnexpectedKind {
                        kind: other.kind(),
                        key: other.node(),
                    })
                }
            }
        }
    }
    Ok(ranks)
}

#[derive(Debug, Clone, Copy)]
struct Scored(f32, NodeId);

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    // Ties are broken in favor of smaller identifiers.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .total_cmp(&other.0)
            .then_with(|| other.1.cmp(&self.1))
    }
}

/// Returns the `k` nodes with the highest rank in `role`, by decreasing
/// rank, together with their log-domain rank.
pub fn top_nodes(dir: impl AsRef<Path>, role: Role, k: usize) -> HitsResult<Vec<(NodeId, f32)>> {
    if k == 0 {
        return Ok(Vec::new());
    }
    // k may exceed the number of nodes by far.
    let mut heap = BinaryHeap::new();
    for shard in list_shards(dir)? {
        for record in RecordReader::open(shard)? {
            if let NodeRecord::Complete {
                node,
                role: r,
                rank,
                ..
            } = record?
            {
                if r != role {
                    continue;
                }
                heap.push(Reverse(Scored(rank, node)));
                if heap.len() > k {
                    heap.pop();
                }
            }
        }
    }
    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(Scored(rank, node))| (node, rank))
        .collect())
}
