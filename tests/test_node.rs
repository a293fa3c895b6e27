use anyhow::Result;
use webgraph_hits::algo::hits::*;

#[test]
fn test_round_trip_all_kinds() -> Result<()> {
    let records = vec![
        NodeRecord::complete(7, Role::Hub, -0.25, vec![1, 2, 3]),
        NodeRecord::complete(7, Role::Authority, f32::NEG_INFINITY, vec![]),
        NodeRecord::mass(-3, Role::Hub, 1.5),
        NodeRecord::mass(i32::MAX, Role::Authority, -1e-30),
        NodeRecord::structure(0, Role::Hub, vec![i32::MAX, 0]),
        NodeRecord::structure(1, Role::Authority, vec![]),
    ];

    let mut bytes = Vec::new();
    for record in &records {
        record.write_to(&mut bytes)?;
    }

    let decoded = RecordReader::new(bytes.as_slice()).collect::<HitsResult<Vec<_>>>()?;
    assert_eq!(decoded, records);
    for (decoded, record) in decoded.iter().zip(&records) {
        assert_eq!(decoded.kind(), record.kind());
        assert_eq!(
            decoded.rank().map(f32::to_bits),
            record.rank().map(f32::to_bits)
        );
    }
    Ok(())
}

#[test]
fn test_wire_layout() -> Result<()> {
    let mut bytes = Vec::new();
    NodeRecord::complete(258, Role::Hub, 1.0, vec![5]).write_to(&mut bytes)?;
    assert_eq!(
        bytes,
        [
            1, // HubComplete
            0, 0, 1, 2, // node
            0x3f, 0x80, 0, 0, // rank
            0, 0, 0, 1, // length
            0, 0, 0, 5, // adjacency
        ]
    );

    bytes.clear();
    NodeRecord::mass(1, Role::Authority, 0.0).write_to(&mut bytes)?;
    assert_eq!(bytes, [4, 0, 0, 0, 1, 0, 0, 0, 0]);

    bytes.clear();
    NodeRecord::structure(1, Role::Authority, vec![]).write_to(&mut bytes)?;
    assert_eq!(bytes, [6, 0, 0, 0, 1, 0, 0, 0, 0]);
    Ok(())
}

#[test]
fn test_kind_tags() -> Result<()> {
    for tag in 1..=6u8 {
        let kind = NodeKind::try_from(tag)?;
        assert_eq!(kind.tag(), tag);
    }
    assert!(matches!(
        NodeKind::try_from(0),
        Err(HitsError::UnknownKind { tag: 0 })
    ));
    assert!(matches!(
        NodeKind::try_from(7),
        Err(HitsError::UnknownKind { tag: 7 })
    ));
    assert_eq!(NodeKind::HubComplete.role(), Role::Hub);
    assert_eq!(NodeKind::AuthStructure.role(), Role::Authority);
    assert!(NodeKind::AuthMass.has_rank());
    assert!(!NodeKind::AuthMass.has_adjacency());
    assert!(!NodeKind::HubStructure.has_rank());
    Ok(())
}

#[test]
fn test_empty_stream() -> Result<()> {
    let empty: &[u8] = &[];
    assert_eq!(RecordReader::new(empty).count(), 0);
    Ok(())
}

#[test]
fn test_reader_stops_after_error() -> Result<()> {
    let mut bytes = Vec::new();
    NodeRecord::mass(1, Role::Hub, 0.0).write_to(&mut bytes)?;
    bytes.push(42);
    NodeRecord::mass(2, Role::Hub, 0.0).write_to(&mut bytes)?;

    let mut reader = RecordReader::new(bytes.as_slice());
    assert!(matches!(reader.next(), Some(Ok(_))));
    assert!(matches!(
        reader.next(),
        Some(Err(HitsError::UnknownKind { tag: 42 }))
    ));
    assert!(reader.next().is_none());
    Ok(())
}

#[test]
fn test_log_sum_identity() {
    for x in [0.0, -1.0, 3.5, f32::NEG_INFINITY] {
        assert_eq!(sum_log_probs(f32::NEG_INFINITY, x).to_bits(), x.to_bits());
        assert_eq!(sum_log_probs(x, f32::NEG_INFINITY).to_bits(), x.to_bits());
    }
    assert_eq!(LogSum::new().value(), f32::NEG_INFINITY);
    assert!(LogSum::new().is_empty());
}

#[test]
fn test_log_sum_values() {
    // ln(1 + 1) = ln 2
    assert!((sum_log_probs(0.0, 0.0) - 2f32.ln()).abs() < 1e-6);
    // ln(2 + 3) = ln 5
    let s = sum_log_probs(2f32.ln(), 3f32.ln());
    assert!((s - 5f32.ln()).abs() < 1e-6);
    // No underflow for tiny masses.
    let tiny = sum_log_probs(-200.0, -200.0);
    assert!((tiny - (-200.0 + 2f32.ln())).abs() < 1e-4);
}

#[test]
fn test_log_sum_associativity() {
    let values = [-3.0f32, 0.5, -0.25, 2.0, -10.0, 1.0, -1.5];
    let left = values.iter().copied().fold(f32::NEG_INFINITY, sum_log_probs);
    let right = values
        .iter()
        .rev()
        .copied()
        .fold(f32::NEG_INFINITY, sum_log_probs);
    let linear: f64 = values.iter().map(|&v| (v as f64).exp()).sum();
    assert!((left - right).abs() < 1e-5);
    assert!((left as f64 - linear.ln()).abs() < 1e-5);

    let mut halves = values[..3].iter().copied().collect::<LogSum>();
    halves.merge(&values[3..].iter().copied().collect::<LogSum>());
    assert!((halves.value() - left).abs() < 1e-5);
}

#[test]
fn test_log_sum_many_terms() {
    // Past 2²¹ equal terms an f32 running sum stops growing.
    let n = 4_000_000;
    let sum = std::iter::repeat(0.0f32).take(n).collect::<LogSum>();
    let ratio = (sum.value_f64() - (n as f64).ln()).exp();
    assert!((ratio - 1.0).abs() < 1e-4, "{}", ratio);

    let mut halves = std::iter::repeat(-1.0f32).take(n / 2).collect::<LogSum>();
    halves.merge(&std::iter::repeat(-1.0f32).take(n / 2).collect::<LogSum>());
    let ratio = (halves.value() as f64 - ((n as f64).ln() - 1.0)).exp();
    assert!((ratio - 1.0).abs() < 1e-4, "{}", ratio);
}
