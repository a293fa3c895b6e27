use anyhow::Result;
use std::collections::BTreeMap;
use webgraph_hits::algo::hits::*;
use webgraph_hits::utils::shuffle::{Shuffle, ShuffleWriter};

fn shard() -> Vec<NodeRecord> {
    vec![
        NodeRecord::complete(0, Role::Hub, 0.0, vec![1, 2, 3]),
        NodeRecord::complete(0, Role::Authority, -1.0, vec![2]),
        NodeRecord::complete(1, Role::Hub, -0.5, vec![2, 3]),
        NodeRecord::complete(1, Role::Authority, 0.25, vec![0]),
        NodeRecord::complete(2, Role::Hub, -2.0, vec![3]),
        NodeRecord::complete(2, Role::Authority, 0.0, vec![0, 1]),
        NodeRecord::complete(3, Role::Hub, 0.0, vec![]),
        NodeRecord::complete(3, Role::Authority, 0.0, vec![0, 1, 2]),
    ]
}

/// Sums masses by key and role, and collects structure messages.
fn totals(
    messages: impl IntoIterator<Item = (NodeId, NodeRecord)>,
) -> (BTreeMap<(NodeId, Role), LogSum>, Vec<(NodeId, NodeRecord)>) {
    let mut sums: BTreeMap<(NodeId, Role), LogSum> = BTreeMap::new();
    let mut structure = Vec::new();
    for (key, message) in messages {
        match message {
            NodeRecord::Mass { node, role, rank } => {
                assert_eq!(node, key);
                sums.entry((key, role)).or_default().add(rank);
            }
            other => structure.push((key, other)),
        }
    }
    (sums, structure)
}

fn assert_same_totals(
    a: &BTreeMap<(NodeId, Role), LogSum>,
    b: &BTreeMap<(NodeId, Role), LogSum>,
) {
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (key, x) in a {
        let (x, y) = (x.value(), b[key].value());
        assert!((x - y).abs() <= 1e-5 * x.abs().max(1.0), "{:?}: {} != {}", key, x, y);
    }
}

#[test]
fn test_emitter_messages() -> Result<()> {
    let mut out = Vec::new();
    let emitted = MessageEmitter::new(false).emit(
        &NodeRecord::complete(5, Role::Hub, -1.0, vec![1, 7]),
        &mut out,
    )?;
    assert_eq!(emitted, 3);
    assert_eq!(
        out,
        vec![
            (5, NodeRecord::mass(5, Role::Hub, -1.0)),
            (1, NodeRecord::mass(1, Role::Authority, -1.0)),
            (7, NodeRecord::mass(7, Role::Authority, -1.0)),
        ]
    );

    let mut out = Vec::new();
    let emitted = MessageEmitter::new(true).emit(
        &NodeRecord::complete(5, Role::Authority, 0.5, vec![2]),
        &mut out,
    )?;
    assert_eq!(emitted, 3);
    assert_eq!(
        out,
        vec![
            (5, NodeRecord::structure(5, Role::Authority, vec![2])),
            (5, NodeRecord::mass(5, Role::Authority, 0.5)),
            (2, NodeRecord::mass(2, Role::Hub, 0.5)),
        ]
    );

    let err = MessageEmitter::new(false)
        .emit(&NodeRecord::mass(5, Role::Hub, 0.0), &mut out)
        .unwrap_err();
    assert!(matches!(
        err,
        HitsError::UnexpectedKind {
            kind: NodeKind::HubMass,
            key: 5
        }
    ));
    Ok(())
}

#[test]
fn test_in_mapper_combiner_transparency() -> Result<()> {
    for shuffle_structure in [false, true] {
        let emitter = MessageEmitter::new(shuffle_structure);
        let mut plain = Vec::new();
        let emitted = emitter.emit_all(shard().into_iter().map(Ok), &mut plain)?;
        assert_eq!(emitted, plain.len());

        let mut combiner = InMapperCombiner::new();
        emitter.emit_all(shard().into_iter().map(Ok), &mut combiner)?;
        assert_eq!(combiner.received(), emitted);
        let mut combined = Vec::new();
        let flushed = combiner.flush(&mut combined)?;
        assert_eq!(flushed, combined.len());
        assert!(flushed < emitted);

        let (plain_sums, plain_structure) = totals(plain);
        let (combined_sums, combined_structure) = totals(combined.clone());
        assert_same_totals(&plain_sums, &combined_sums);
        assert_eq!(plain_structure, combined_structure);

        // One mass message per key and role.
        let masses = combined
            .iter()
            .filter(|(_, m)| matches!(m, NodeRecord::Mass { .. }))
            .count();
        assert_eq!(masses, combined_sums.len());
    }
    Ok(())
}

#[test]
fn test_combine_group() -> Result<()> {
    let values = vec![
        NodeRecord::mass(3, Role::Hub, 0.0),
        NodeRecord::structure(3, Role::Hub, vec![1]),
        NodeRecord::mass(3, Role::Hub, 0.0),
        NodeRecord::mass(3, Role::Hub, 0.0),
    ];
    let combined = combine_group(3, values);
    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0], NodeRecord::structure(3, Role::Hub, vec![1]));
    assert_eq!(combined[1].kind(), NodeKind::HubMass);
    assert!((combined[1].rank().unwrap_or_default() - 3f32.ln()).abs() < 1e-6);

    assert!(combine_group(3, vec![]).is_empty());
    Ok(())
}

#[test]
fn test_substrate_combiner_transparency() -> Result<()> {
    let router = |node: NodeId| HashPartitioner.partition(node, 2);
    let emitter = MessageEmitter::new(false);

    let mut plain = ShuffleWriter::new(2, router);
    emitter.emit_all(shard().into_iter().map(Ok), &mut plain)?;
    let mut combined = ShuffleWriter::new(2, router);
    emitter.emit_all(shard().into_iter().map(Ok), &mut combined)?;
    let before = combined.len();
    combined.combine(combine_group);
    assert!(combined.len() < before);

    let flatten = |shuffle: Shuffle<NodeId, NodeRecord>| {
        shuffle
            .into_partitions()
            .into_iter()
            .flat_map(|p| p.into_groups())
            .flat_map(|(key, values)| values.into_iter().map(move |v| (key, v)))
            .collect::<Vec<_>>()
    };
    let (plain_sums, _) = totals(flatten(Shuffle::collect(2, [plain])));
    let (combined_sums, _) = totals(flatten(Shuffle::collect(2, [combined])));
    assert_same_totals(&plain_sums, &combined_sums);
    Ok(())
}
