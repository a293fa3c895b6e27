use super::NodeId;
use crate::utils::jenkins_hash;

/// A deterministic assignment of nodes to partitions.
///
/// The same partitioner must route messages and lay out static-structure
/// files, or the merge-join of the reducer will find nodes in the wrong
/// file.
pub trait Partitioner: Sync {
    /// Returns the partition of `node`, a value in `0..num_partitions`.
    fn partition(&self, node: NodeId, num_partitions: usize) -> usize;
}

/// Partitions nodes by a fixed-seed hash of their identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashPartitioner;

impl HashPartitioner {
    const SEED: u64 = 0x5d58_8b65_6c07_8965;
}

impl Partitioner for HashPartitioner {
    #[inline(always)]
    fn partition(&self, node: NodeId, num_partitions: usize) -> usize {
        (jenkins_hash(Self::SEED, node as u32 as u64) % num_partitions as u64) as usize
    }
}

/// Partitions nodes in contiguous identifier ranges.
///
/// Node `x` goes to partition `⌊x / num_nodes · num_partitions⌋ mod
/// num_partitions`, computed exactly in integer arithmetic. With this
/// partitioner every partition is a contiguous range of identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePartitioner {
    num_nodes: usize,
}

impl RangePartitioner {
    /// Creates a range partitioner for a graph with `num_nodes` nodes.
    ///
    /// # Panics
    ///
    /// If `num_nodes` is zero.
    pub fn new(num_nodes: usize) -> Self {
        assert!(num_nodes > 0, "Range partitioning needs a positive node count");
        Self { num_nodes }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }
}

impl Partitioner for RangePartitioner {
    #[inline(always)]
    fn partition(&self, node: NodeId, num_partitions: usize) -> usize {
        range_partition(node, self.num_nodes, num_partitions)
    }
}

#[inline(always)]
fn range_partition(node: NodeId, num_nodes: usize, num_partitions: usize) -> usize {
    let n = num_partitions as i128;
    (node as i128 * n)
        .div_euclid(num_nodes as i128)
        .rem_euclid(n) as usize
}

/// The partitioner chosen by configuration.
///
/// [`HitsBuilder::build`](super::HitsBuilder::build) rejects a range
/// partitioning with no nodes; routing with `num_nodes` zero panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionerKind {
    Hash,
    Range { num_nodes: usize },
}

impl Partitioner for PartitionerKind {
    #[inline(always)]
    fn partition(&self, node: NodeId, num_partitions: usize) -> usize {
        match *self {
            PartitionerKind::Hash => HashPartitioner.partition(node, num_partitions),
            PartitionerKind::Range { num_nodes } => {
                range_partition(node, num_nodes, num_partitions)
            }
        }
    }
}

impl<P: Partitioner + ?Sized> Partitioner for &P {
    #[inline(always)]
    fn partition(&self, node: NodeId, num_partitions: usize) -> usize {
        (**self).partition(node, num_partitions)
    }
}
