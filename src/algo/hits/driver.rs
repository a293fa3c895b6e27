use super::*;
use crate::utils::shuffle::{Partition, Shuffle, ShuffleWriter};
use crate::utils::{MmapFlags, MmapHelper, Threads};
use anyhow::{ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Returns the directory holding the records of an iteration.
pub fn iteration_dir(base: impl AsRef<Path>, iteration: usize) -> PathBuf {
    base.as_ref().join(format!("iter{:04}", iteration))
}

/// Returns the directory holding the records of an iteration before
/// normalization.
pub fn temp_iteration_dir(base: impl AsRef<Path>, iteration: usize) -> PathBuf {
    base.as_ref().join(format!("iter{:04}t", iteration))
}

/// Builder for [`Hits`].
///
/// Create a builder with [`HitsBuilder::new`], edit parameters with its
/// methods, then call [`HitsBuilder::build`] on it to create the [`Hits`]
/// driver as a [`Result`].
#[derive(Debug, Clone)]
pub struct HitsBuilder {
    base: PathBuf,
    num_nodes: usize,
    num_partitions: usize,
    range_partitioning: bool,
    combiner: bool,
    in_mapper_combiner: bool,
    schimmy: bool,
    verify_assignment: bool,
    threads: Threads,
}

impl HitsBuilder {
    const DEFAULT_NUM_PARTITIONS: usize = 1;

    /// Creates a new builder with default parameters.
    ///
    /// # Arguments
    /// - `base`: the directory containing the iteration directories.
    /// - `num_nodes`: the number of nodes of the graph.
    pub fn new(base: impl AsRef<Path>, num_nodes: usize) -> Self {
        Self {
            base: base.as_ref().to_owned(),
            num_nodes,
            num_partitions: Self::DEFAULT_NUM_PARTITIONS,
            range_partitioning: false,
            combiner: false,
            in_mapper_combiner: false,
            schimmy: true,
            verify_assignment: cfg!(debug_assertions),
            threads: Threads::Default,
        }
    }

    /// Sets the number of partitions, which must be the same used to build
    /// the records of the first iteration.
    pub fn with_num_partitions(mut self, num_partitions: usize) -> Self {
        self.num_partitions = num_partitions;
        self
    }

    /// Sets whether to partition nodes by identifier range instead of by
    /// hash.
    pub fn with_range_partitioning(mut self, range_partitioning: bool) -> Self {
        self.range_partitioning = range_partitioning;
        self
    }

    /// Sets whether to combine the output of every map task by key before
    /// the shuffle.
    pub fn with_combiner(mut self, combiner: bool) -> Self {
        self.combiner = combiner;
        self
    }

    /// Sets whether to pre-aggregate mass messages inside every map task.
    pub fn with_in_mapper_combiner(mut self, in_mapper_combiner: bool) -> Self {
        self.in_mapper_combiner = in_mapper_combiner;
        self
    }

    /// Sets whether reducers merge-join the static-structure files (the
    /// default) or receive adjacency lists through the shuffle.
    pub fn with_schimmy(mut self, schimmy: bool) -> Self {
        self.schimmy = schimmy;
        self
    }

    /// Sets whether partition assignment discovery checks every record of
    /// every shard. Enabled by default in debug builds.
    pub fn with_verify_assignment(mut self, verify_assignment: bool) -> Self {
        self.verify_assignment = verify_assignment;
        self
    }

    /// Sets the number of partition workers.
    pub fn with_threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    /// Checks the configuration and builds the driver.
    pub fn build(self) -> Result<Hits> {
        ensure!(
            self.num_partitions > 0,
            "The number of partitions must be positive"
        );
        let partitioner = if self.range_partitioning {
            ensure!(
                self.num_nodes > 0,
                "Range partitioning requires a positive number of nodes"
            );
            PartitionerKind::Range {
                num_nodes: self.num_nodes,
            }
        } else {
            PartitionerKind::Hash
        };

        Ok(Hits {
            base: self.base,
            num_partitions: self.num_partitions,
            partitioner,
            combiner: self.combiner,
            in_mapper_combiner: self.in_mapper_combiner,
            schimmy: self.schimmy,
            verify_assignment: self.verify_assignment,
            thread_pool: self
                .threads
                .build()
                .with_context(|| "Could not create partition workers")?,
        })
    }
}

/// Statistics about a compute phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeStats {
    /// The number of input shards.
    pub shards: usize,
    /// The number of messages produced by the emitters.
    pub emitted: usize,
    /// The number of messages that went through the shuffle, after
    /// combining.
    pub shuffled: usize,
    /// The number of message groups reduced.
    pub groups: usize,
    /// The number of complete records written.
    pub records: usize,
    /// The number of nodes that received no message.
    pub unreached: usize,
}

/// Statistics about a normalize phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeStats {
    /// The L2 norm of the hub ranks before normalization.
    pub hub_norm: f64,
    /// The L2 norm of the authority ranks before normalization.
    pub authority_norm: f64,
    /// The number of records written.
    pub records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    pub iteration: usize,
    pub compute: ComputeStats,
    pub normalize: NormalizeStats,
}

/// The HITS iteration driver.
///
/// Each iteration `i` is a compute phase, reading `iter<i>` and writing the
/// unnormalized records of `iter<i+1>t`, followed by a normalize phase,
/// reading `iter<i+1>t` and writing `iter<i+1>`. Both phases run their
/// tasks on the partition workers and complete before the next phase starts.
pub struct Hits {
    base: PathBuf,
    num_partitions: usize,
    partitioner: PartitionerKind,
    combiner: bool,
    in_mapper_combiner: bool,
    schimmy: bool,
    verify_assignment: bool,
    thread_pool: rayon::ThreadPool,
}

impl Hits {
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn partitioner(&self) -> PartitionerKind {
        self.partitioner
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// Runs iterations `start..end`.
    ///
    /// # Arguments
    /// - `start`: the first iteration; `iter<start>` must exist.
    /// - `end`: the iteration to stop at; `iter<end>` will contain the result.
    /// - `pl`: A progress logger that implements
    ///   [`dsi_progress_logger::ProgressLog`] may be passed to the method to
    ///   log the progress of the computation. If
    ///   `Option::<dsi_progress_logger::ProgressLogger>::None` is passed,
    ///   logging code should be optimized away by the compiler.
    pub fn run(
        &self,
        start: usize,
        end: usize,
        pl: &mut impl ProgressLog,
    ) -> Result<Vec<IterationStats>> {
        ensure!(
            start <= end,
            "The start iteration ({}) follows the end iteration ({})",
            start,
            end
        );

        pl.item_name("iteration");
        pl.expected_updates(Some(end - start));
        pl.start(format!(
            "Running HITS from iteration {} to iteration {} on {} partitions...",
            start, end, self.num_partitions
        ));

        let mut stats = Vec::with_capacity(end - start);
        for iteration in start..end {
            let compute = self
                .compute(iteration, pl)
                .with_context(|| format!("Could not compute iteration {}", iteration))?;
            let normalize = self
                .normalize(iteration, pl)
                .with_context(|| format!("Could not normalize iteration {}", iteration))?;
            stats.push(IterationStats {
                iteration,
                compute,
                normalize,
            });
            pl.update();
        }

        pl.done();
        Ok(stats)
    }

    /// Computes the unnormalized records of iteration `iteration + 1`.
    pub fn compute(&self, iteration: usize, pl: &mut impl ProgressLog) -> Result<ComputeStats> {
        let src = iteration_dir(&self.base, iteration);
        let dst = temp_iteration_dir(&self.base, iteration + 1);
        ensure!(src.is_dir(), "Missing iteration directory {}", src.display());
        recreate_dir(&dst)?;

        pl.info(format_args!(
            "Computing {} from {} (schimmy: {}, combiner: {}, in-mapper combiner: {})",
            dst.display(),
            src.display(),
            self.schimmy,
            self.combiner,
            self.in_mapper_combiner
        ));

        let stats = self
            .thread_pool
            .install(|| self.compute_parallel(iteration, &src, &dst))?;

        pl.info(format_args!(
            "Iteration {}: {} shard(s), {} message(s) emitted, {} shuffled, {} group(s), {} record(s)",
            iteration, stats.shards, stats.emitted, stats.shuffled, stats.groups, stats.records
        ));
        Ok(stats)
    }

    fn compute_parallel(&self, iteration: usize, src: &Path, dst: &Path) -> Result<ComputeStats> {
        let num_partitions = self.num_partitions;
        let partitioner = &self.partitioner;

        // The assignment must be known before any reducer opens a file.
        let assignment = if self.schimmy {
            let assignment = PartitionAssignment::discover(
                src,
                partitioner,
                num_partitions,
                self.verify_assignment,
            )
            .with_context(|| format!("Could not assign the shards of {}", src.display()))?;
            Some(assignment)
        } else {
            None
        };

        let shards = list_shards(src)?;
        let emitter = MessageEmitter::new(!self.schimmy);

        let mapped = shards
            .par_iter()
            .map(|shard| -> Result<_> {
                let mut writer: ShuffleWriter<NodeId, NodeRecord, _> =
                    ShuffleWriter::new(num_partitions, move |node: NodeId| {
                        partitioner.partition(node, num_partitions)
                    });
                let records = RecordReader::open(shard)
                    .with_context(|| format!("Could not open shard {}", shard.display()))?;
                let emitted = if self.in_mapper_combiner {
                    let mut combiner = InMapperCombiner::new();
                    let emitted = emitter.emit_all(records, &mut combiner)?;
                    combiner.flush(&mut writer)?;
                    emitted
                } else {
                    emitter.emit_all(records, &mut writer)?
                };
                if self.combiner {
                    writer.combine(combine_group);
                }
                Ok((writer, emitted))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut stats = ComputeStats {
            shards: shards.len(),
            ..ComputeStats::default()
        };
        let mut writers = Vec::with_capacity(mapped.len());
        for (writer, emitted) in mapped {
            stats.emitted += emitted;
            writers.push(writer);
        }

        let shuffle = Shuffle::collect(num_partitions, writers);
        stats.shuffled = shuffle.len();

        let reduced = shuffle
            .into_partitions()
            .into_par_iter()
            .map(|partition| self.reduce_partition(iteration, partition, assignment.as_ref(), dst))
            .collect::<Result<Vec<_>>>()?;

        for partition in reduced {
            stats.groups += partition.groups;
            stats.records += partition.records;
            stats.unreached += partition.unreached;
        }
        Ok(stats)
    }

    fn reduce_partition(
        &self,
        iteration: usize,
        partition: Partition<NodeId, NodeRecord>,
        assignment: Option<&PartitionAssignment>,
        dst: &Path,
    ) -> Result<ReduceStats> {
        let index = partition.index();
        let mut writer = RecordWriter::create(dst.join(shard_name(index)))?;

        let stats = match assignment {
            Some(assignment) => {
                let mmap = match assignment.get(index) {
                    Some(path) => Some(
                        MmapHelper::mmap(path, MmapFlags::SEQUENTIAL)
                            .with_context(|| format!("Could not map {}", path.display()))?,
                    ),
                    None => None,
                };
                let bytes: &[u8] = match &mmap {
                    Some(mmap) => mmap.as_ref(),
                    None => &[],
                };
                reduce_groups(
                    SchimmyReducer::new(index, iteration, RecordReader::new(bytes)),
                    partition,
                    &mut writer,
                )
            }
            None => reduce_groups(
                SchimmyReducer::without_structure(index, iteration),
                partition,
                &mut writer,
            ),
        }
        .with_context(|| format!("Could not reduce partition {}", index))?;

        writer.finish()?;
        Ok(stats)
    }

    /// Normalizes the records of iteration `iteration + 1`.
    pub fn normalize(&self, iteration: usize, pl: &mut impl ProgressLog) -> Result<NormalizeStats> {
        let src = temp_iteration_dir(&self.base, iteration + 1);
        let dst = iteration_dir(&self.base, iteration + 1);
        ensure!(src.is_dir(), "Missing directory {}", src.display());

        let sums = self
            .thread_pool
            .install(|| compute_norms(&src))
            .with_context(|| format!("Could not compute the norms of {}", src.display()))?;
        let norm = |sum: Option<LogSum>| sum.map_or(0.0, |s| (s.value_f64() / 2.0).exp());
        let (hub_norm, authority_norm) = (norm(sums.hub), norm(sums.authority));
        pl.info(format_args!(
            "Iteration {}: hub norm {}, authority norm {}",
            iteration, hub_norm, authority_norm
        ));

        recreate_dir(&dst)?;
        let records = self
            .thread_pool
            .install(|| rescale(&src, &dst))
            .with_context(|| format!("Could not rescale {} into {}", src.display(), dst.display()))?;
        std::fs::remove_dir_all(&src)
            .with_context(|| format!("Could not remove {}", src.display()))?;

        Ok(NormalizeStats {
            hub_norm,
            authority_norm,
            records,
        })
    }
}

fn reduce_groups<S: Iterator<Item = HitsResult<NodeRecord>>>(
    mut reducer: SchimmyReducer<S>,
    partition: Partition<NodeId, NodeRecord>,
    out: &mut RecordWriter,
) -> HitsResult<ReduceStats> {
    for (key, values) in partition.into_groups() {
        reducer.reduce(key, values, &mut *out)?;
    }
    reducer.finish(out)
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Could not remove {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))
}
