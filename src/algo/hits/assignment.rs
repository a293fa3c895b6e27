use super::{list_shards, HitsError, HitsResult, NodeId, Partitioner, RecordReader};
use std::path::{Path, PathBuf};

/// The static-structure file backing each partition in a given iteration.
///
/// The shuffle is free to name its output files as it pleases, so the
/// mapping from partitions to files is rediscovered at every iteration by
/// reading the first record of each shard and computing its partition with
/// the configured [`Partitioner`]. Empty shards are not assigned; a
/// partition without a file has no nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionAssignment {
    files: Vec<Option<PathBuf>>,
}

impl PartitionAssignment {
    /// Discovers the assignment of the shards of `dir`.
    ///
    /// # Arguments
    /// - `dir`: the directory of the iteration.
    /// - `partitioner`: the partitioner used to lay out the shards.
    /// - `num_partitions`: the number of partitions.
    /// - `verify`: if `true`, every record of every shard is checked to
    ///   belong to the partition of the shard and to follow the previous
    ///   record in identifier order.
    pub fn discover(
        dir: impl AsRef<Path>,
        partitioner: &impl Partitioner,
        num_partitions: usize,
        verify: bool,
    ) -> HitsResult<Self> {
        let mut files = vec![None::<PathBuf>; num_partitions];

        for shard in list_shards(dir)? {
            let mut records = RecordReader::open(&shard)?;
            let Some(first) = records.next().transpose()? else {
                continue;
            };
            let partition = partitioner.partition(first.node(), num_partitions);

            if verify {
                verify_shard(&shard, partition, first.node(), records, |node| {
                    partitioner.partition(node, num_partitions)
                })?;
            }

            match &files[partition] {
                Some(first) => {
                    return Err(HitsError::PartitionConflict {
                        partition,
                        first: first.clone(),
                        second: shard,
                    })
                }
                None => files[partition] = Some(shard),
            }
        }

        Ok(Self { files })
    }

    /// Returns the file of a partition, if any.
    pub fn get(&self, partition: usize) -> Option<&Path> {
        self.files.get(partition)?.as_deref()
    }

    pub fn num_partitions(&self) -> usize {
        self.files.len()
    }

    /// Returns the number of partitions backed by a file.
    pub fn num_assigned(&self) -> usize {
        self.files.iter().filter(|f| f.is_some()).count()
    }
}

fn verify_shard(
    shard: &Path,
    partition: usize,
    first: NodeId,
    records: impl Iterator<Item = HitsResult<super::NodeRecord>>,
    partition_of: impl Fn(NodeId) -> usize,
) -> HitsResult<()> {
    let mut previous = first;
    for record in records {
        let key = record?.node();
        if key < previous {
            return Err(HitsError::UnsortedStructure {
                partition,
                previous,
                key,
            });
        }
        let expected = partition_of(key);
        if expected != partition {
            return Err(HitsError::Misassigned {
                partition,
                expected,
                key,
                path: shard.to_owned(),
            });
        }
        previous = key;
    }
    Ok(())
}
