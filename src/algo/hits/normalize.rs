//! The two phases of the L2 normalization of hub and authority ranks.
//!
//! Phase A computes, for each role, the logarithm of the sum of the squares
//! of the linear ranks and stores the two scalars in the [`NORMS_FILE`] side
//! file of the directory. Phase B reloads them and divides every rank by the
//! corresponding norm, which in the log domain is a subtraction of half the
//! scalar.

use super::{
    list_shards, Emitter, HitsError, HitsResult, LogSum, NodeRecord, RecordReader, RecordWriter,
    Role,
};
use rayon::prelude::*;
use std::io::ErrorKind;
use std::path::Path;

/// The name of the side file holding the result of phase A.
pub const NORMS_FILE: &str = "_norms";

/// Log-domain sums of squared ranks, per role.
///
/// A role is `None` if no record of that role was seen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SquareSums {
    pub hub: Option<LogSum>,
    pub authority: Option<LogSum>,
}

impl SquareSums {
    /// Adds the square of a log-domain rank.
    pub fn add(&mut self, role: Role, rank: f32) {
        let sum = match role {
            Role::Hub => &mut self.hub,
            Role::Authority => &mut self.authority,
        };
        sum.get_or_insert_with(LogSum::new).add(2.0 * rank);
    }

    /// Merges another partial result into this one.
    pub fn merge(&mut self, other: &SquareSums) {
        for (sum, other) in [
            (&mut self.hub, &other.hub),
            (&mut self.authority, &other.authority),
        ] {
            if let Some(other) = other {
                sum.get_or_insert_with(LogSum::new).merge(other);
            }
        }
    }

    /// Accumulates the complete records of a shard.
    pub fn from_records(
        records: impl IntoIterator<Item = HitsResult<NodeRecord>>,
    ) -> HitsResult<Self> {
        let mut sums = SquareSums::default();
        for record in records {
            match record? {
                NodeRecord::Complete { role, rank, .. } => sums.add(role, rank),
                other => {
                    return Err(HitsError::UnexpectedKind {
                        kind: other.kind(),
                        key: other.node(),
                    })
                }
            }
        }
        Ok(sums)
    }
}

/// The scalars produced by phase A: the logarithms of the sums of squares of
/// hub and authority ranks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Norms {
    pub hub: f32,
    pub authority: f32,
}

impl Norms {
    /// Returns the scalar of a role.
    pub fn get(&self, role: Role) -> f32 {
        match role {
            Role::Hub => self.hub,
            Role::Authority => self.authority,
        }
    }

    /// Divides a complete record by the L2 norm of its role.
    ///
    /// A rank of `-∞` stays `-∞`, and so do all ranks of a role whose
    /// norm is zero.
    pub fn rescale(&self, record: NodeRecord) -> HitsResult<NodeRecord> {
        match record {
            NodeRecord::Complete {
                node,
                role,
                rank,
                adjacency,
            } => {
                let root_sum = self.get(role);
                let rank = if root_sum == f32::NEG_INFINITY {
                    rank
                } else {
                    rank - root_sum / 2.0
                };
                Ok(NodeRecord::complete(node, role, rank, adjacency))
            }
            other => Err(HitsError::UnexpectedKind {
                kind: other.kind(),
                key: other.node(),
            }),
        }
    }
}

/// Phase A: computes the sums of squares of the ranks of all shards of
/// `dir` and stores them in `dir/_norms`.
///
/// Shards are scanned in parallel on the current rayon thread pool; partial
/// sums are folded in shard order, so the result does not depend on the
/// number of threads.
pub fn compute_norms(dir: impl AsRef<Path>) -> HitsResult<SquareSums> {
    let dir = dir.as_ref();
    let shards = list_shards(dir)?;
    let partials = shards
        .par_iter()
        .map(|shard| SquareSums::from_records(RecordReader::open(shard)?))
        .collect::<HitsResult<Vec<_>>>()?;

    let mut sums = SquareSums::default();
    for partial in &partials {
        sums.merge(partial);
    }
    store_norms(dir, &sums)?;
    Ok(sums)
}

/// Stores the available scalars as mass records in `dir/_norms`.
pub fn store_norms(dir: impl AsRef<Path>, sums: &SquareSums) -> HitsResult<()> {
    let mut writer = RecordWriter::create(dir.as_ref().join(NORMS_FILE))?;
    for (role, sum) in [(Role::Hub, sums.hub), (Role::Authority, sums.authority)] {
        if let Some(sum) = sum {
            writer.emit(0, NodeRecord::mass(0, role, sum.value()))?;
        }
    }
    writer.finish()?;
    Ok(())
}

/// Loads the scalars stored by phase A in `dir/_norms`.
pub fn load_norms(dir: impl AsRef<Path>) -> HitsResult<Norms> {
    let path = dir.as_ref().join(NORMS_FILE);
    let reader = match RecordReader::open(&path) {
        Ok(reader) => reader,
        Err(HitsError::Io { source }) if source.kind() == ErrorKind::NotFound => {
            return Err(HitsError::MissingNormalization {
                role: Role::Hub,
                path,
            })
        }
        Err(e) => return Err(e),
    };

    let mut hub = None;
    let mut authority = None;
    for record in reader {
        match record? {
            NodeRecord::Mass {
                role: Role::Hub,
                rank,
                ..
            } => hub = Some(rank),
            NodeRecord::Mass {
                role: Role::Authority,
                rank,
                ..
            } => authority = Some(rank),
            other => {
                return Err(HitsError::UnexpectedKind {
                    kind: other.kind(),
                    key: other.node(),
                })
            }
        }
    }

    match (hub, authority) {
        (Some(hub), Some(authority)) => Ok(Norms { hub, authority }),
        (None, _) => Err(HitsError::MissingNormalization {
            role: Role::Hub,
            path,
        }),
        (_, None) => Err(HitsError::MissingNormalization {
            role: Role::Authority,
            path,
        }),
    }
}

/// Phase B: rescales every shard of `src` into a shard with the same name
/// in `dst`, using the scalars stored in `src/_norms`. Returns the number
/// of records written.
pub fn rescale(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> HitsResult<usize> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let norms = load_norms(src)?;
    let shards = list_shards(src)?;
    let written = shards
        .par_iter()
        .map(|shard| -> HitsResult<usize> {
            let name = shard
                .file_name()
                .ok_or_else(|| HitsError::Corrupt(format!("shard without name: {:?}", shard)))?;
            let mut writer = RecordWriter::create(dst.join(name))?;
            for record in RecordReader::open(shard)? {
                writer.write(&norms.rescale(record?)?)?;
            }
            writer.finish()
        })
        .collect::<HitsResult<Vec<_>>>()?;
    Ok(written.into_iter().sum())
}
