use anyhow::Result;
use std::io::Write;
use webgraph_hits::algo::hits::*;
use webgraph_hits::utils::{MmapFlags, MmapHelper};

#[test]
fn test_mmap_records() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    let records = vec![
        NodeRecord::complete(1, Role::Hub, 0.0, vec![2, 3]),
        NodeRecord::complete(1, Role::Authority, -0.5, vec![]),
    ];
    for record in &records {
        record.write_to(&mut file)?;
    }
    file.flush()?;

    let mmap = MmapHelper::mmap(file.path(), MmapFlags::SEQUENTIAL)?;
    assert_eq!(mmap.len(), std::fs::metadata(file.path())?.len() as usize);
    let bytes: &[u8] = mmap.as_ref();
    let decoded = RecordReader::new(bytes).collect::<HitsResult<Vec<_>>>()?;
    assert_eq!(decoded, records);
    Ok(())
}

#[test]
fn test_mmap_empty_file() -> Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let mmap = MmapHelper::mmap(file.path(), MmapFlags::empty())?;
    assert!(mmap.is_empty());
    let bytes: &[u8] = mmap.as_ref();
    assert!(bytes.is_empty());
    assert_eq!(RecordReader::new(bytes).count(), 0);
    Ok(())
}

#[test]
fn test_mmap_missing_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(MmapHelper::mmap(dir.path().join("missing"), MmapFlags::empty()).is_err());
    Ok(())
}
