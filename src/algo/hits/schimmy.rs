//! The Schimmy merge-join reducer.
//!
//! The reducer of a partition receives the messages addressed to the nodes
//! of the partition grouped by node and sorted by node identifier, and reads
//! at the same time, sequentially, the static-structure file of the
//! partition, which is sorted in the same order. Advancing the two streams
//! in lock-step recovers the adjacency lists of the nodes without sending
//! them through the shuffle.
//!
//! The technique has been described by Jimmy Lin and Michael Schatz in
//! “[Design Patterns for Efficient Graph Algorithms in
//! MapReduce](https://doi.org/10.1145/1830252.1830263)”, *Proceedings of
//! the Eighth Workshop on Mining and Learning with Graphs*, ACM, 2010.

use super::{Emitter, HitsError, HitsResult, LogSum, NodeId, NodeRecord, Role};

/// The structure stream of a reducer that does not merge-join a file.
pub type NoStructure = std::iter::Empty<HitsResult<NodeRecord>>;

/// Statistics about a reduced partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceStats {
    /// The number of message groups reduced.
    pub groups: usize,
    /// The number of complete records written.
    pub records: usize,
    /// The number of nodes of the structure file that received no message
    /// group.
    pub unreached: usize,
}

/// A one-record lookahead over a structure stream that checks that keys
/// never decrease.
struct StructureCursor<S> {
    partition: usize,
    records: S,
    pending: Option<NodeRecord>,
    last: Option<NodeId>,
}

impl<S: Iterator<Item = HitsResult<NodeRecord>>> StructureCursor<S> {
    fn peek_key(&mut self) -> HitsResult<Option<NodeId>> {
        if self.pending.is_none() {
            if let Some(record) = self.records.next() {
                let record = record?;
                let key = record.node();
                if let Some(previous) = self.last {
                    if key < previous {
                        return Err(HitsError::UnsortedStructure {
                            partition: self.partition,
                            previous,
                            key,
                        });
                    }
                }
                self.last = Some(key);
                self.pending = Some(record);
            }
        }
        Ok(self.pending.as_ref().map(NodeRecord::node))
    }

    /// Consumes all records of `key`, returning the hub and authority
    /// adjacency lists found.
    fn take_node(&mut self, key: NodeId) -> HitsResult<(Option<Vec<NodeId>>, Option<Vec<NodeId>>)> {
        let mut hub = None;
        let mut authority = None;
        while self.peek_key()? == Some(key) {
            let Some(record) = self.pending.take() else {
                break;
            };
            let (role, adjacency) = match record {
                NodeRecord::Complete {
                    role, adjacency, ..
                }
                | NodeRecord::Structure {
                    role, adjacency, ..
                } => (role, adjacency),
                NodeRecord::Mass { .. } => {
                    return Err(HitsError::UnexpectedKind {
                        kind: record.kind(),
                        key,
                    })
                }
            };
            let slot = match role {
                Role::Hub => &mut hub,
                Role::Authority => &mut authority,
            };
            if slot.is_some() {
                return Err(HitsError::DuplicateStructure {
                    partition: self.partition,
                    key,
                    role,
                });
            }
            *slot = Some(adjacency);
        }
        Ok((hub, authority))
    }
}

/// The reducer of a partition.
///
/// Feed it with [`reduce`](SchimmyReducer::reduce), one message group at a
/// time in strictly ascending key order, and complete it with
/// [`finish`](SchimmyReducer::finish). For every node it writes a hub record
/// followed by an authority record, whose ranks are the log-domain sums of
/// the masses received and whose adjacency lists come from the structure
/// stream or from structure messages.
///
/// Nodes of the structure stream that receive no message group are written
/// as nodes without mass. At iteration 0 a node without mass in some role
/// gets rank 0 in that role; at later iterations it gets rank `-∞`.
pub struct SchimmyReducer<S> {
    partition: usize,
    iteration: usize,
    structure: Option<StructureCursor<S>>,
    last_key: Option<NodeId>,
    stats: ReduceStats,
}

impl<S: Iterator<Item = HitsResult<NodeRecord>>> SchimmyReducer<S> {
    /// Creates a reducer merge-joining the given structure stream, which
    /// must be sorted by node identifier.
    ///
    /// # Arguments
    /// - `partition`: the index of the partition, used in diagnostics.
    /// - `iteration`: the iteration whose records are being reduced.
    /// - `structure`: the records of the static-structure file of the
    ///   partition.
    pub fn new(partition: usize, iteration: usize, structure: S) -> Self {
        Self {
            partition,
            iteration,
            structure: Some(StructureCursor {
                partition,
                records: structure,
                pending: None,
                last: None,
            }),
            last_key: None,
            stats: ReduceStats::default(),
        }
    }

    /// Reduces the message group of node `key`.
    pub fn reduce(
        &mut self,
        key: NodeId,
        values: Vec<NodeRecord>,
        out: &mut impl Emitter,
    ) -> HitsResult<()> {
        if let Some(previous) = self.last_key {
            if key <= previous {
                return Err(HitsError::UnsortedMessages {
                    partition: self.partition,
                    previous,
                    key,
                });
            }
        }
        self.last_key = Some(key);
        self.stats.groups += 1;

        let mut hub = LogSum::new();
        let mut authority = LogSum::new();
        let mut hub_adjacency = None;
        let mut authority_adjacency = None;

        for value in values {
            match value {
                NodeRecord::Mass {
                    role: Role::Hub,
                    rank,
                    ..
                } => hub.add(rank),
                NodeRecord::Mass {
                    role: Role::Authority,
                    rank,
                    ..
                } => authority.add(rank),
                NodeRecord::Structure {
                    role, adjacency, ..
                } => {
                    let slot = match role {
                        Role::Hub => &mut hub_adjacency,
                        Role::Authority => &mut authority_adjacency,
                    };
                    if slot.is_some() {
                        return Err(HitsError::DuplicateStructure {
                            partition: self.partition,
                            key,
                            role,
                        });
                    }
                    *slot = Some(adjacency);
                }
                NodeRecord::Complete { .. } => {
                    return Err(HitsError::UnexpectedKind {
                        kind: value.kind(),
                        key,
                    })
                }
            }
        }

        let has_structure_messages = hub_adjacency.is_some() || authority_adjacency.is_some();
        let iteration = self.iteration;

        if let Some(cursor) = &mut self.structure {
            while let Some(next) = cursor.peek_key()? {
                if next >= key {
                    break;
                }
                let (h, a) = cursor.take_node(next)?;
                self.stats.records +=
                    write_node(iteration, next, LogSum::new(), LogSum::new(), h, a, out)?;
                self.stats.unreached += 1;
            }

            match cursor.peek_key()? {
                Some(next) if next == key => {
                    let (h, a) = cursor.take_node(key)?;
                    hub_adjacency = hub_adjacency.or(h);
                    authority_adjacency = authority_adjacency.or(a);
                }
                found if !has_structure_messages => {
                    return Err(HitsError::StructureMismatch {
                        partition: self.partition,
                        key,
                        found,
                    });
                }
                _ => {}
            }
        }

        if hub_adjacency.is_none() && authority_adjacency.is_none() {
            return Err(HitsError::MissingStructure {
                partition: self.partition,
                key,
            });
        }

        self.stats.records += write_node(
            iteration,
            key,
            hub,
            authority,
            hub_adjacency,
            authority_adjacency,
            out,
        )?;
        Ok(())
    }

    /// Writes the nodes left in the structure stream and returns the
    /// statistics of the partition.
    pub fn finish(mut self, out: &mut impl Emitter) -> HitsResult<ReduceStats> {
        if let Some(cursor) = &mut self.structure {
            while let Some(next) = cursor.peek_key()? {
                let (h, a) = cursor.take_node(next)?;
                self.stats.records +=
                    write_node(self.iteration, next, LogSum::new(), LogSum::new(), h, a, out)?;
                self.stats.unreached += 1;
            }
        }
        if self.stats.unreached > 0 {
            log::warn!(
                "Partition {}: {} node(s) received no messages at iteration {}",
                self.partition,
                self.stats.unreached,
                self.iteration
            );
        }
        Ok(self.stats)
    }
}

impl SchimmyReducer<NoStructure> {
    /// Creates a reducer that takes adjacency lists only from structure
    /// messages.
    pub fn without_structure(partition: usize, iteration: usize) -> Self {
        Self {
            partition,
            iteration,
            structure: None,
            last_key: None,
            stats: ReduceStats::default(),
        }
    }
}

/// Writes the hub and authority records of a node, returning the number of
/// records written.
fn write_node(
    iteration: usize,
    key: NodeId,
    hub: LogSum,
    authority: LogSum,
    hub_adjacency: Option<Vec<NodeId>>,
    authority_adjacency: Option<Vec<NodeId>>,
    out: &mut impl Emitter,
) -> HitsResult<usize> {
    // Only the first iteration turns missing mass into unit linear mass.
    let rank = |sum: LogSum| {
        if iteration == 0 && sum.is_empty() {
            0.0
        } else {
            sum.value()
        }
    };
    out.emit(
        key,
        NodeRecord::complete(key, Role::Hub, rank(hub), hub_adjacency.unwrap_or_default()),
    )?;
    out.emit(
        key,
        NodeRecord::complete(
            key,
            Role::Authority,
            rank(authority),
            authority_adjacency.unwrap_or_default(),
        ),
    )?;
    Ok(2)
}
