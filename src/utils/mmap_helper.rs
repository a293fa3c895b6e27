use anyhow::{Context, Result};
use core::fmt::Debug;
use mmap_rs::{Mmap, MmapOptions};
use std::path::Path;

#[doc(hidden)]
pub use mmap_rs::MmapFlags;

/// Read-only memory mapping of a file, accessed as a slice of bytes.
///
/// Empty files are not mapped at all (a mapping must have positive
/// length), and are seen as an empty slice.
pub struct MmapHelper {
    /// The underlying memory mapping, if the file is not empty.
    mmap: Option<Mmap>,
    /// The length of the file in bytes.
    len: usize,
}

impl Debug for MmapHelper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MmapHelper")
            .field("mmap", &self.mmap.as_ref().map(|m| m.as_ptr()))
            .field("len", &self.len)
            .finish()
    }
}

impl MmapHelper {
    /// Returns the length of the mapped file in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the mapped file is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maps a file into memory (read-only).
    ///
    /// # Arguments
    /// - `path`: The path to the file to be memory mapped.
    /// - `flags`: The flags to be used for the mmap.
    pub fn mmap(path: impl AsRef<Path>, flags: MmapFlags) -> Result<Self> {
        let file_len: usize = path
            .as_ref()
            .metadata()
            .with_context(|| format!("Cannot stat {}", path.as_ref().display()))?
            .len()
            .try_into()
            .with_context(|| "Cannot convert file length to usize")?;

        if file_len == 0 {
            return Ok(Self { mmap: None, len: 0 });
        }

        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Cannot open {} for MmapHelper", path.as_ref().display()))?;

        let mmap = unsafe {
            MmapOptions::new(file_len)
                .with_context(|| format!("Cannot initialize mmap of size {}", file_len))?
                .with_flags(flags)
                .with_file(&file, 0)
                .map()
                .with_context(|| {
                    format!("Cannot mmap {} (size {})", path.as_ref().display(), file_len)
                })?
        };

        Ok(Self {
            mmap: Some(mmap),
            len: file_len,
        })
    }
}

impl AsRef<[u8]> for MmapHelper {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..self.len],
            None => &[],
        }
    }
}
