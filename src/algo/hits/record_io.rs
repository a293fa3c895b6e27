use super::{Emitter, HitsResult, NodeId, NodeRecord};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Iterates over the records of a byte stream.
///
/// After the first error the iterator is exhausted.
#[derive(Debug)]
pub struct RecordReader<R> {
    reader: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl RecordReader<BufReader<File>> {
    /// Opens a record file for sequential reading.
    pub fn open(path: impl AsRef<Path>) -> HitsResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = HitsResult<NodeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match NodeRecord::read_from(&mut self.reader) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Writes records to a file that appears at its final path only when
/// [`finish`](RecordWriter::finish) is called.
///
/// Records are buffered in a temporary file created in the same directory
/// as the final path, which is then atomically renamed. A writer dropped
/// without finishing leaves no file behind.
pub struct RecordWriter {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
    written: usize,
}

impl RecordWriter {
    pub fn create(path: impl AsRef<Path>) -> HitsResult<Self> {
        let path = path.as_ref().to_owned();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
            _ => PathBuf::from("."),
        };
        let file = NamedTempFile::new_in(dir)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, record: &NodeRecord) -> HitsResult<()> {
        record.write_to(&mut self.writer)?;
        self.written += 1;
        Ok(())
    }

    /// Returns the number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the records and moves the file to its final path, returning
    /// the number of records written.
    pub fn finish(mut self) -> HitsResult<usize> {
        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(self.written)
    }
}

impl Emitter for RecordWriter {
    fn emit(&mut self, _key: NodeId, value: NodeRecord) -> HitsResult<()> {
        self.write(&value)
    }
}

/// Returns the shard files of an iteration directory, sorted by name.
///
/// Directories and side files (whose names start with `_` or `.`) are
/// skipped.
pub fn list_shards(dir: impl AsRef<Path>) -> HitsResult<Vec<PathBuf>> {
    let mut shards = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        shards.push(entry.path());
    }
    shards.sort();
    Ok(shards)
}

/// Returns the canonical file name of the shard of a partition.
pub fn shard_name(partition: usize) -> String {
    format!("part-{:05}", partition)
}
