mod mmap_helper;
#[doc(hidden)]
pub use mmap_helper::MmapFlags;
pub use mmap_helper::MmapHelper;

mod threadpool;
pub use threadpool::Threads;

mod jenkins;
pub use jenkins::jenkins_hash;

pub mod shuffle;
