use super::{HitsError, HitsResult, NodeId, NodeRecord};
use crate::utils::shuffle::ShuffleWriter;

/// A sink of keyed records.
///
/// This is the only operation the kernel needs from the shuffle substrate
/// during the compute phase, and the one it needs from output files during
/// the reduce and normalize phases.
pub trait Emitter {
    fn emit(&mut self, key: NodeId, value: NodeRecord) -> HitsResult<()>;
}

impl Emitter for Vec<(NodeId, NodeRecord)> {
    fn emit(&mut self, key: NodeId, value: NodeRecord) -> HitsResult<()> {
        self.push((key, value));
        Ok(())
    }
}

impl<R: Fn(NodeId) -> usize> Emitter for ShuffleWriter<NodeId, NodeRecord, R> {
    #[inline(always)]
    fn emit(&mut self, key: NodeId, value: NodeRecord) -> HitsResult<()> {
        self.push(key, value);
        Ok(())
    }
}

impl<E: Emitter + ?Sized> Emitter for &mut E {
    #[inline(always)]
    fn emit(&mut self, key: NodeId, value: NodeRecord) -> HitsResult<()> {
        (**self).emit(key, value)
    }
}

/// Turns complete node records into propagation messages.
///
/// For a hub record of node `n` with rank `r` and out-neighbors
/// `a₁, …, aₖ` the emitter sends `r` as hub mass to `n` itself and as
/// authority mass to every `aᵢ`. Authority records, whose adjacency lists
/// contain in-neighbors, are handled symmetrically.
///
/// When structure shuffling is enabled, the adjacency list of every record
/// is also sent back to its own node; this is needed only when the reducer
/// does not merge-join a static-structure file.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageEmitter {
    shuffle_structure: bool,
}

impl MessageEmitter {
    pub fn new(shuffle_structure: bool) -> Self {
        Self { shuffle_structure }
    }

    pub fn shuffles_structure(&self) -> bool {
        self.shuffle_structure
    }

    /// Emits the messages of a single record, returning how many were
    /// emitted.
    pub fn emit(&self, record: &NodeRecord, out: &mut impl Emitter) -> HitsResult<usize> {
        let NodeRecord::Complete {
            node,
            role,
            rank,
            adjacency,
        } = record
        else {
            return Err(HitsError::UnexpectedKind {
                kind: record.kind(),
                key: record.node(),
            });
        };

        let mut emitted = 0;
        if self.shuffle_structure {
            out.emit(*node, NodeRecord::structure(*node, *role, adjacency.clone()))?;
            emitted += 1;
        }

        out.emit(*node, NodeRecord::mass(*node, *role, *rank))?;
        emitted += 1;

        let target_role = role.dual();
        for &target in adjacency {
            out.emit(target, NodeRecord::mass(target, target_role, *rank))?;
        }

        Ok(emitted + adjacency.len())
    }

    /// Emits the messages of all records of a shard, returning how many
    /// were emitted.
    pub fn emit_all(
        &self,
        records: impl IntoIterator<Item = HitsResult<NodeRecord>>,
        out: &mut impl Emitter,
    ) -> HitsResult<usize> {
        let mut emitted = 0;
        for record in records {
            emitted += self.emit(&record?, out)?;
        }
        Ok(emitted)
    }
}
