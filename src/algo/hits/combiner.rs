use super::{Emitter, HitsResult, LogSum, NodeId, NodeRecord, Role};
use std::collections::BTreeMap;

/// Pre-aggregates the mass messages of a single shard before they enter
/// the shuffle.
///
/// A combiner is created for each shard, receives the messages of a
/// [`MessageEmitter`](super::MessageEmitter) through its [`Emitter`]
/// implementation, and is consumed by [`flush`](InMapperCombiner::flush),
/// which emits the buffered structure messages followed by one mass
/// message per distinct key and role, in ascending key order.
#[derive(Debug, Default)]
pub struct InMapperCombiner {
    hub: BTreeMap<NodeId, LogSum>,
    authority: BTreeMap<NodeId, LogSum>,
    structure: Vec<(NodeId, NodeRecord)>,
    received: usize,
}

impl InMapperCombiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of messages received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Emits the combined messages, returning how many were emitted.
    pub fn flush(self, out: &mut impl Emitter) -> HitsResult<usize> {
        let mut emitted = 0;
        for (key, record) in self.structure {
            out.emit(key, record)?;
            emitted += 1;
        }
        for (role, sums) in [(Role::Hub, self.hub), (Role::Authority, self.authority)] {
            for (key, sum) in sums {
                out.emit(key, NodeRecord::mass(key, role, sum.value()))?;
                emitted += 1;
            }
        }
        Ok(emitted)
    }
}

impl Emitter for InMapperCombiner {
    fn emit(&mut self, key: NodeId, value: NodeRecord) -> HitsResult<()> {
        self.received += 1;
        match value {
            NodeRecord::Mass { role, rank, .. } => {
                let sums = match role {
                    Role::Hub => &mut self.hub,
                    Role::Authority => &mut self.authority,
                };
                sums.entry(key).or_default().add(rank);
            }
            other => self.structure.push((key, other)),
        }
        Ok(())
    }
}

/// Combines the values of a key group of a single map output.
///
/// All hub masses are folded into one message, and so are all authority
/// masses; any other record is passed through unchanged. Roles that
/// received no mass produce no message.
pub fn combine_group(key: NodeId, values: Vec<NodeRecord>) -> Vec<NodeRecord> {
    let mut hub = None::<LogSum>;
    let mut authority = None::<LogSum>;
    let mut combined = Vec::with_capacity(4);

    for value in values {
        match value {
            NodeRecord::Mass {
                role: Role::Hub,
                rank,
                ..
            } => hub.get_or_insert_with(LogSum::new).add(rank),
            NodeRecord::Mass {
                role: Role::Authority,
                rank,
                ..
            } => authority.get_or_insert_with(LogSum::new).add(rank),
            other => combined.push(other),
        }
    }

    if let Some(sum) = hub {
        combined.push(NodeRecord::mass(key, Role::Hub, sum.value()));
    }
    if let Some(sum) = authority {
        combined.push(NodeRecord::mass(key, Role::Authority, sum.value()));
    }
    combined
}
