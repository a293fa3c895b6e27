use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dsi_progress_logger::prelude::*;
use std::path::PathBuf;
use webgraph::prelude::BvGraph;
use webgraph::traits::SequentialLabeling;
use webgraph_hits::algo::hits::*;
use webgraph_hits::utils::Threads;

#[derive(Parser, Debug)]
#[command(
    name = "webgraph-hits",
    about = "Compute HITS hub and authority scores with Schimmy merge-join iterations.",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the records of iteration 0 from a BV graph.
    Build(BuildArgs),
    /// Run a range of iterations.
    Run(RunArgs),
    /// Print the nodes with the highest hub and authority scores.
    Top(TopArgs),
}

#[derive(Args, Debug)]
struct PartitioningArgs {
    #[arg(short, long)]
    /// The number of partitions.
    partitions: usize,

    #[arg(long, default_value_t = false)]
    /// Partition nodes by identifier range instead of by hash.
    range: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// The basename of the graph.
    basename: PathBuf,

    #[arg(short, long)]
    /// The directory containing the iteration directories.
    base: PathBuf,

    #[clap(flatten)]
    partitioning: PartitioningArgs,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(short, long)]
    /// The directory containing the iteration directories.
    base: PathBuf,

    #[arg(short, long)]
    /// The number of nodes of the graph.
    num_nodes: usize,

    #[arg(short, long)]
    /// The first iteration; its directory must exist.
    start: usize,

    #[arg(short, long)]
    /// The last iteration.
    end: usize,

    #[arg(long, default_value_t = false)]
    /// Combine the output of every map task before the shuffle.
    combiner: bool,

    #[arg(long, default_value_t = false)]
    /// Pre-aggregate mass messages inside map tasks.
    in_mapper_combiner: bool,

    #[arg(long, default_value_t = false)]
    /// Send adjacency lists through the shuffle instead of merge-joining
    /// the previous iteration.
    no_schimmy: bool,

    #[arg(short, long)]
    /// The number of partition workers (default: the number of cores).
    workers: Option<usize>,

    #[arg(long, default_value_t = false)]
    /// Check every record of every shard when assigning shards to
    /// partitions.
    verify: bool,

    #[clap(flatten)]
    partitioning: PartitioningArgs,
}

#[derive(Args, Debug)]
struct TopArgs {
    #[arg(short, long)]
    /// The directory containing the iteration directories.
    base: PathBuf,

    #[arg(short, long)]
    /// The iteration to read.
    iteration: usize,

    #[arg(short, long, default_value_t = 10)]
    /// The number of nodes to print per role.
    k: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    stderrlog::new()
        .verbosity(2)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    match cli.command {
        Command::Build(args) => build(args),
        Command::Run(args) => run(args),
        Command::Top(args) => top(args),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let graph = BvGraph::with_basename(&args.basename)
        .load()
        .with_context(|| format!("Could not load graph {}", args.basename.display()))?;
    let partitioner = if args.partitioning.range {
        PartitionerKind::Range {
            num_nodes: graph.num_nodes(),
        }
    } else {
        PartitionerKind::Hash
    };
    let dir = iteration_dir(&args.base, 0);
    let mut pl = progress_logger![display_memory = true];
    let written = build_from_graph(
        &graph,
        &dir,
        &partitioner,
        args.partitioning.partitions,
        &mut pl,
    )?;
    pl.info(format_args!("Wrote {} records to {}", written, dir.display()));
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let hits = HitsBuilder::new(&args.base, args.num_nodes)
        .with_num_partitions(args.partitioning.partitions)
        .with_range_partitioning(args.partitioning.range)
        .with_combiner(args.combiner)
        .with_in_mapper_combiner(args.in_mapper_combiner)
        .with_schimmy(!args.no_schimmy)
        .with_verify_assignment(args.verify || cfg!(debug_assertions))
        .with_threads(Threads::from(args.workers))
        .build()?;
    let mut pl = progress_logger![display_memory = true];
    hits.run(args.start, args.end, &mut pl)?;
    Ok(())
}

fn top(args: TopArgs) -> Result<()> {
    let dir = iteration_dir(&args.base, args.iteration);
    for role in [Role::Hub, Role::Authority] {
        println!("Top {} {} scores:", args.k, role);
        let nodes = top_nodes(&dir, role, args.k)
            .with_context(|| format!("Could not read {}", dir.display()))?;
        for (node, rank) in nodes {
            println!("{}\t{}\t{}", node, rank, rank.exp());
        }
    }
    Ok(())
}
