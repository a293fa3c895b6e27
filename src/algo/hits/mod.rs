/*
 * SPDX-FileCopyrightText: 2024 Matteo Dell'Acqua
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Iterative computation of HITS hub and authority scores over partitioned
//! record files.
//!
//! Every node of the graph is stored as two complete records, a hub record
//! listing its successors and an authority record listing its
//! predecessors, carrying a rank in the natural-log domain. The records of
//! an iteration live in the shards of a directory `iter<NNNN>`, each shard
//! holding the nodes of one partition sorted by identifier.
//!
//! An iteration has two phases:
//!
//! - the compute phase turns every record into mass messages with a
//!   [`MessageEmitter`], shuffles the messages by destination, and lets a
//!   [`SchimmyReducer`] per partition sum the mass of each node while
//!   merge-joining the shard of the partition to recover adjacency lists;
//! - the normalize phase scales hub and authority ranks to unit L2 norm,
//!   first computing the norms ([`compute_norms`]) and then rescaling every
//!   record ([`rescale`]).
//!
//! The [`Hits`] driver, built with [`HitsBuilder`], runs a range of
//! iterations; [`build_from_graph`] writes the records of the first one.
//!
//! Mass is combined with [`sum_log_probs`], so ranks never underflow.

mod error;
pub use error::{HitsError, HitsResult};

mod log_sum;
pub use log_sum::{sum_log_probs, LogSum};

mod node;
pub use node::{NodeId, NodeKind, NodeRecord, Role};

mod partitioner;
pub use partitioner::{HashPartitioner, Partitioner, PartitionerKind, RangePartitioner};

mod emitter;
pub use emitter::{Emitter, MessageEmitter};

mod combiner;
pub use combiner::{combine_group, InMapperCombiner};

mod record_io;
pub use record_io::{list_shards, shard_name, RecordReader, RecordWriter};

mod schimmy;
pub use schimmy::{NoStructure, ReduceStats, SchimmyReducer};

mod normalize;
pub use normalize::{
    compute_norms, load_norms, rescale, store_norms, Norms, SquareSums, NORMS_FILE,
};

mod assignment;
pub use assignment::PartitionAssignment;

mod init;
pub use init::{build_from_arcs, build_from_graph, INITIAL_RANK};

mod results;
pub use results::{read_ranks, top_nodes, NodeRanks};

mod driver;
pub use driver::{
    iteration_dir, temp_iteration_dir, ComputeStats, Hits, HitsBuilder, IterationStats,
    NormalizeStats,
};
