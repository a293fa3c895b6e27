use super::{NodeId, NodeKind, Role};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the HITS kernel.
///
/// All variants but [`HitsError::Io`] signal a broken invariant of the
/// partitioned state, and abort the partition (and thus the run) in which
/// they are detected.
#[derive(Error, Debug)]
pub enum HitsError {
    /// The structure stream of a partition moved past a message key without
    /// finding a record for it: messages and structure files were not
    /// partitioned the same way.
    #[error(
        "partition {partition}: no structure record for node {key} (structure stream at {found:?})"
    )]
    StructureMismatch {
        partition: usize,
        key: NodeId,
        found: Option<NodeId>,
    },

    #[error("partition {partition}: message group {key} delivered after group {previous}")]
    UnsortedMessages {
        partition: usize,
        previous: NodeId,
        key: NodeId,
    },

    #[error("partition {partition}: structure record {key} follows record {previous}")]
    UnsortedStructure {
        partition: usize,
        previous: NodeId,
        key: NodeId,
    },

    #[error("partition {partition}: more than one {role} structure for node {key}")]
    DuplicateStructure {
        partition: usize,
        key: NodeId,
        role: Role,
    },

    #[error("partition {partition}: node {key} has neither hub nor authority structure")]
    MissingStructure { partition: usize, key: NodeId },

    /// Phase A of the normalization did not produce the sum of squares of
    /// the given role.
    #[error("missing {role} normalization scalar in {path}")]
    MissingNormalization { role: Role, path: PathBuf },

    #[error("shards {first} and {second} are both assigned to partition {partition}")]
    PartitionConflict {
        partition: usize,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("node {key} in {path} belongs to partition {expected}, not {partition}")]
    Misassigned {
        partition: usize,
        expected: usize,
        key: NodeId,
        path: PathBuf,
    },

    #[error("unknown record kind tag {tag}")]
    UnknownKind { tag: u8 },

    #[error("{kind} record for node {key} where a complete record was expected")]
    UnexpectedKind { kind: NodeKind, key: NodeId },

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type HitsResult<T> = Result<T, HitsError>;
