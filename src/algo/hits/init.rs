use super::{shard_name, NodeId, NodeRecord, Partitioner, RecordWriter, Role};
use anyhow::{ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use std::path::Path;
use webgraph::traits::RandomAccessGraph;

/// The rank of every node before the first iteration (linear mass 1).
pub const INITIAL_RANK: f32 = 0.0;

/// Writes the initial records of a graph into `dir`, one shard per
/// partition, returning the number of records written.
///
/// Every node gets a hub record listing its successors and an authority
/// record listing its predecessors, both with rank [`INITIAL_RANK`].
///
/// # Arguments
/// - `graph`: the graph.
/// - `dir`: the directory of the first iteration; it is created if needed.
/// - `partitioner`: the partitioner that will be used by the iterations.
/// - `num_partitions`: the number of partitions.
/// - `pl`: a progress logger.
pub fn build_from_graph(
    graph: &impl RandomAccessGraph,
    dir: impl AsRef<Path>,
    partitioner: &impl Partitioner,
    num_partitions: usize,
    pl: &mut impl ProgressLog,
) -> Result<usize> {
    let num_nodes = graph.num_nodes();
    pl.item_name("node");
    pl.expected_updates(Some(num_nodes));
    pl.start("Reading adjacency lists...");

    let mut successors = vec![Vec::new(); num_nodes];
    let mut predecessors = vec![Vec::new(); num_nodes];
    for node in 0..num_nodes {
        let id = to_node_id(node)?;
        for succ in graph.successors(node) {
            successors[node].push(to_node_id(succ)?);
            predecessors[succ].push(id);
        }
        pl.light_update();
    }
    pl.done();

    write_records(successors, predecessors, dir, partitioner, num_partitions, pl)
}

/// Writes the initial records of the graph with nodes `0..num_nodes` and the
/// given arcs; see [`build_from_graph`].
///
/// Successors are listed in arc order.
pub fn build_from_arcs(
    num_nodes: usize,
    arcs: impl IntoIterator<Item = (usize, usize)>,
    dir: impl AsRef<Path>,
    partitioner: &impl Partitioner,
    num_partitions: usize,
    pl: &mut impl ProgressLog,
) -> Result<usize> {
    to_node_id(num_nodes.saturating_sub(1))?;
    let mut successors = vec![Vec::new(); num_nodes];
    let mut predecessors = vec![Vec::new(); num_nodes];
    for (src, dst) in arcs {
        ensure!(
            src < num_nodes && dst < num_nodes,
            "Arc ({}, {}) out of range for {} nodes",
            src,
            dst,
            num_nodes
        );
        successors[src].push(dst as NodeId);
        predecessors[dst].push(src as NodeId);
    }
    for list in predecessors.iter_mut() {
        list.sort_unstable();
    }

    write_records(successors, predecessors, dir, partitioner, num_partitions, pl)
}

fn write_records(
    successors: Vec<Vec<NodeId>>,
    predecessors: Vec<Vec<NodeId>>,
    dir: impl AsRef<Path>,
    partitioner: &impl Partitioner,
    num_partitions: usize,
    pl: &mut impl ProgressLog,
) -> Result<usize> {
    ensure!(num_partitions > 0, "The number of partitions must be positive");
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create directory {}", dir.display()))?;

    let mut writers = (0..num_partitions)
        .map(|p| RecordWriter::create(dir.join(shard_name(p))))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Could not create shards in {}", dir.display()))?;

    pl.item_name("node");
    pl.expected_updates(Some(successors.len()));
    pl.start(format!(
        "Writing initial records to {} partitions...",
        num_partitions
    ));

    for (node, (succ, pred)) in successors.into_iter().zip(predecessors).enumerate() {
        let id = node as NodeId;
        let writer = &mut writers[partitioner.partition(id, num_partitions)];
        writer.write(&NodeRecord::complete(id, Role::Hub, INITIAL_RANK, succ))?;
        writer.write(&NodeRecord::complete(id, Role::Authority, INITIAL_RANK, pred))?;
        pl.light_update();
    }

    let mut written = 0;
    for writer in writers {
        let path = writer.path().to_owned();
        written += writer
            .finish()
            .with_context(|| format!("Could not write {}", path.display()))?;
    }
    pl.done();
    Ok(written)
}

fn to_node_id(node: usize) -> Result<NodeId> {
    NodeId::try_from(node).with_context(|| format!("Node {} does not fit a node identifier", node))
}
