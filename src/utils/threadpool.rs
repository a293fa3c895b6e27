use anyhow::{Context, Result};

/// The number of partition workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Threads {
    /// As many workers as rayon's default, usually the number of cores.
    #[default]
    Default,
    NumThreads(usize),
}

impl Threads {
    pub fn build(self) -> Result<rayon::ThreadPool> {
        match self {
            Self::Default => rayon::ThreadPoolBuilder::new()
                .build()
                .with_context(|| "Could not build default thread pool"),
            Self::NumThreads(num_threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .with_context(|| {
                    format!("Could not build thread pool with {} threads", num_threads)
                }),
        }
    }
}

impl From<Option<usize>> for Threads {
    fn from(num_threads: Option<usize>) -> Self {
        match num_threads {
            Some(n) => Threads::NumThreads(n),
            None => Threads::Default,
        }
    }
}

/// Shorthand for [`Threads`]: `threads![]` is [`Threads::Default`],
/// `threads![n]` is [`Threads::NumThreads`]`(n)`.
#[macro_export]
macro_rules! threads {
    () => {
        $crate::utils::Threads::Default
    };
    ($num_threads:expr) => {
        $crate::utils::Threads::NumThreads($num_threads)
    };
}
