use super::{HitsError, HitsResult};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

/// The identifier of a node, assigned once when the graph is loaded.
pub type NodeId = i32;

/// The two scores HITS computes for every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Hub,
    Authority,
}

impl Role {
    /// Returns the role receiving the mass sent along the adjacency list of
    /// a record of this role.
    pub fn dual(self) -> Role {
        match self {
            Role::Hub => Role::Authority,
            Role::Authority => Role::Hub,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Hub => f.write_str("hub"),
            Role::Authority => f.write_str("authority"),
        }
    }
}

/// The wire kind of a [`NodeRecord`], that is, its variant together with
/// its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    HubComplete,
    AuthComplete,
    HubMass,
    AuthMass,
    HubStructure,
    AuthStructure,
}

impl NodeKind {
    /// Returns the tag byte identifying this kind on disk.
    pub fn tag(self) -> u8 {
        match self {
            NodeKind::HubComplete => 1,
            NodeKind::AuthComplete => 2,
            NodeKind::HubMass => 3,
            NodeKind::AuthMass => 4,
            NodeKind::HubStructure => 5,
            NodeKind::AuthStructure => 6,
        }
    }

    pub fn role(self) -> Role {
        match self {
            NodeKind::HubComplete | NodeKind::HubMass | NodeKind::HubStructure => Role::Hub,
            NodeKind::AuthComplete | NodeKind::AuthMass | NodeKind::AuthStructure => {
                Role::Authority
            }
        }
    }

    /// Returns whether records of this kind carry a rank.
    pub fn has_rank(self) -> bool {
        !matches!(self, NodeKind::HubStructure | NodeKind::AuthStructure)
    }

    /// Returns whether records of this kind carry an adjacency list.
    pub fn has_adjacency(self) -> bool {
        !matches!(self, NodeKind::HubMass | NodeKind::AuthMass)
    }
}

impl TryFrom<u8> for NodeKind {
    type Error = HitsError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            1 => NodeKind::HubComplete,
            2 => NodeKind::AuthComplete,
            3 => NodeKind::HubMass,
            4 => NodeKind::AuthMass,
            5 => NodeKind::HubStructure,
            6 => NodeKind::AuthStructure,
            _ => return Err(HitsError::UnknownKind { tag }),
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The unit of HITS state, both on disk and in flight.
///
/// Persisted nodes are always [`NodeRecord::Complete`]; messages travelling
/// through the shuffle are [`NodeRecord::Mass`] or [`NodeRecord::Structure`].
/// Ranks are natural logarithms of the linear scores.
///
/// A hub record carries the out-neighbors of its node, an authority record
/// its in-neighbors.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRecord {
    /// The full state of a node in one role.
    Complete {
        node: NodeId,
        role: Role,
        rank: f32,
        adjacency: Vec<NodeId>,
    },
    /// A contribution to the rank of a node in one role.
    Mass { node: NodeId, role: Role, rank: f32 },
    /// The adjacency list of a node in one role.
    Structure {
        node: NodeId,
        role: Role,
        adjacency: Vec<NodeId>,
    },
}

impl NodeRecord {
    pub fn complete(node: NodeId, role: Role, rank: f32, adjacency: Vec<NodeId>) -> Self {
        NodeRecord::Complete {
            node,
            role,
            rank,
            adjacency,
        }
    }

    pub fn mass(node: NodeId, role: Role, rank: f32) -> Self {
        NodeRecord::Mass { node, role, rank }
    }

    pub fn structure(node: NodeId, role: Role, adjacency: Vec<NodeId>) -> Self {
        NodeRecord::Structure {
            node,
            role,
            adjacency,
        }
    }

    #[inline(always)]
    pub fn node(&self) -> NodeId {
        match self {
            NodeRecord::Complete { node, .. }
            | NodeRecord::Mass { node, .. }
            | NodeRecord::Structure { node, .. } => *node,
        }
    }

    #[inline(always)]
    pub fn role(&self) -> Role {
        match self {
            NodeRecord::Complete { role, .. }
            | NodeRecord::Mass { role, .. }
            | NodeRecord::Structure { role, .. } => *role,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match (self, self.role()) {
            (NodeRecord::Complete { .. }, Role::Hub) => NodeKind::HubComplete,
            (NodeRecord::Complete { .. }, Role::Authority) => NodeKind::AuthComplete,
            (NodeRecord::Mass { .. }, Role::Hub) => NodeKind::HubMass,
            (NodeRecord::Mass { .. }, Role::Authority) => NodeKind::AuthMass,
            (NodeRecord::Structure { .. }, Role::Hub) => NodeKind::HubStructure,
            (NodeRecord::Structure { .. }, Role::Authority) => NodeKind::AuthStructure,
        }
    }

    /// Returns the rank, if this kind of record carries one.
    pub fn rank(&self) -> Option<f32> {
        match self {
            NodeRecord::Complete { rank, .. } | NodeRecord::Mass { rank, .. } => Some(*rank),
            NodeRecord::Structure { .. } => None,
        }
    }

    /// Returns the adjacency list, if this kind of record carries one.
    pub fn adjacency(&self) -> Option<&[NodeId]> {
        match self {
            NodeRecord::Complete { adjacency, .. } | NodeRecord::Structure { adjacency, .. } => {
                Some(adjacency)
            }
            NodeRecord::Mass { .. } => None,
        }
    }

    /// Writes this record in big-endian binary form:
    /// `[kind: u8][node: i32][rank: f32]?[len: i32, len × i32]?`.
    pub fn write_to(&self, w: &mut impl Write) -> HitsResult<()> {
        w.write_all(&[self.kind().tag()])?;
        w.write_all(&self.node().to_be_bytes())?;
        if let Some(rank) = self.rank() {
            w.write_all(&rank.to_bits().to_be_bytes())?;
        }
        if let Some(adjacency) = self.adjacency() {
            let len = i32::try_from(adjacency.len()).map_err(|_| {
                HitsError::Corrupt(format!(
                    "adjacency list of node {} has {} entries",
                    self.node(),
                    adjacency.len()
                ))
            })?;
            w.write_all(&len.to_be_bytes())?;
            for &succ in adjacency {
                w.write_all(&succ.to_be_bytes())?;
            }
        }
        Ok(())
    }

    /// Reads a record written by [`NodeRecord::write_to`].
    ///
    /// Returns `Ok(None)` if the reader is at end of file before the first
    /// byte of the record; end of file anywhere else is an error.
    pub fn read_from(r: &mut impl Read) -> HitsResult<Option<NodeRecord>> {
        let mut tag = [0; 1];
        loop {
            match r.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let kind = NodeKind::try_from(tag[0])?;
        let node = read_i32(r)?;
        let rank = if kind.has_rank() {
            Some(f32::from_bits(read_i32(r)? as u32))
        } else {
            None
        };
        let adjacency = if kind.has_adjacency() {
            let len = read_i32(r)?;
            let len = usize::try_from(len).map_err(|_| {
                HitsError::Corrupt(format!("negative adjacency length {} for node {}", len, node))
            })?;
            let mut adjacency = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                adjacency.push(read_i32(r)?);
            }
            Some(adjacency)
        } else {
            None
        };

        let role = kind.role();
        Ok(Some(match (rank, adjacency) {
            (Some(rank), Some(adjacency)) => NodeRecord::complete(node, role, rank, adjacency),
            (Some(rank), None) => NodeRecord::mass(node, role, rank),
            (None, Some(adjacency)) => NodeRecord::structure(node, role, adjacency),
            (None, None) => unreachable!("every kind carries a rank or an adjacency list"),
        }))
    }
}

fn read_i32(r: &mut impl Read) -> HitsResult<i32> {
    let mut buffer = [0; 4];
    r.read_exact(&mut buffer).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            HitsError::Corrupt("truncated record".into())
        } else {
            e.into()
        }
    })?;
    Ok(i32::from_be_bytes(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let record = NodeRecord::mass(3, Role::Authority, -1.5);
        assert_eq!(record.kind(), NodeKind::AuthMass);
        assert_eq!(record.adjacency(), None);
        let record = NodeRecord::structure(3, Role::Hub, vec![1, 2]);
        assert_eq!(record.kind(), NodeKind::HubStructure);
        assert_eq!(record.rank(), None);
    }

    #[test]
    fn test_truncated_record() {
        let mut bytes = Vec::new();
        NodeRecord::complete(7, Role::Hub, 0.5, vec![1, 2, 3])
            .write_to(&mut bytes)
            .unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            NodeRecord::read_from(&mut bytes.as_slice()),
            Err(HitsError::Corrupt(_))
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let bytes = [42_u8, 0, 0, 0, 1];
        assert!(matches!(
            NodeRecord::read_from(&mut bytes.as_slice()),
            Err(HitsError::UnknownKind { tag: 42 })
        ));
    }
}
