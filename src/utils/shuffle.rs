//! An in-process sort-and-shuffle substrate.
//!
//! Map tasks write into their own [`ShuffleWriter`], which routes every
//! key-value pair to a partition. Once all map tasks are done,
//! [`Shuffle::collect`] concatenates the output of the writers partition by
//! partition, in writer order, and sorts each partition stably by key.
//! Each [`Partition`] then delivers its values grouped by key, in ascending
//! key order.

use rayon::prelude::*;
use std::iter::Peekable;

/// The map-side buffer of the shuffle.
pub struct ShuffleWriter<K, V, R> {
    router: R,
    buckets: Vec<Vec<(K, V)>>,
}

impl<K: Ord + Copy, V, R: Fn(K) -> usize> ShuffleWriter<K, V, R> {
    /// Creates a writer for `num_partitions` partitions.
    ///
    /// # Arguments
    /// - `num_partitions`: the number of partitions.
    /// - `router`: a function mapping keys to partitions in
    ///   `0..num_partitions`.
    pub fn new(num_partitions: usize, router: R) -> Self {
        Self {
            router,
            buckets: (0..num_partitions).map(|_| Vec::new()).collect(),
        }
    }

    /// Routes a key-value pair to its partition.
    #[inline(always)]
    pub fn push(&mut self, key: K, value: V) {
        let partition = (self.router)(key);
        self.buckets[partition].push((key, value));
    }

    /// Returns the number of pairs buffered.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Applies a combiner to the output of this writer.
    ///
    /// Each bucket is sorted stably by key, and the values of each key are
    /// replaced by those returned by `combiner`.
    pub fn combine(&mut self, mut combiner: impl FnMut(K, Vec<V>) -> Vec<V>) {
        for bucket in self.buckets.iter_mut() {
            bucket.sort_by_key(|(k, _)| *k);
            let mut combined = Vec::with_capacity(bucket.len());
            for (key, values) in Groups::new(std::mem::take(bucket)) {
                combined.extend(combiner(key, values).into_iter().map(|v| (key, v)));
            }
            *bucket = combined;
        }
    }
}

/// The reduce-side view of the shuffle.
pub struct Shuffle<K, V> {
    partitions: Vec<Vec<(K, V)>>,
}

impl<K: Ord + Copy + Send, V: Send> Shuffle<K, V> {
    /// Gathers the output of all writers, which must have the same number of
    /// partitions, and sorts every partition by key on the current rayon
    /// thread pool.
    pub fn collect<R>(
        num_partitions: usize,
        writers: impl IntoIterator<Item = ShuffleWriter<K, V, R>>,
    ) -> Self {
        let mut partitions: Vec<Vec<(K, V)>> = (0..num_partitions).map(|_| Vec::new()).collect();
        for writer in writers {
            debug_assert_eq!(writer.buckets.len(), num_partitions);
            for (partition, bucket) in partitions.iter_mut().zip(writer.buckets) {
                partition.extend(bucket);
            }
        }
        partitions
            .par_iter_mut()
            .for_each(|partition| partition.sort_by_key(|(k, _)| *k));
        Self { partitions }
    }

    /// Returns the total number of pairs in the shuffle.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }

    pub fn into_partitions(self) -> Vec<Partition<K, V>> {
        self.partitions
            .into_iter()
            .enumerate()
            .map(|(index, records)| Partition { index, records })
            .collect()
    }
}

/// The sorted input of one reduce task.
pub struct Partition<K, V> {
    index: usize,
    records: Vec<(K, V)>,
}

impl<K: Ord + Copy, V> Partition<K, V> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the values of the partition grouped by key, in ascending key
    /// order. Within a group, values keep the order in which they were
    /// written.
    pub fn into_groups(self) -> Groups<K, V> {
        Groups::new(self.records)
    }
}

/// Iterator over the runs of equal keys of a sorted vector.
pub struct Groups<K, V> {
    records: Peekable<std::vec::IntoIter<(K, V)>>,
}

impl<K: Ord + Copy, V> Groups<K, V> {
    fn new(records: Vec<(K, V)>) -> Self {
        Self {
            records: records.into_iter().peekable(),
        }
    }
}

impl<K: Ord + Copy, V> Iterator for Groups<K, V> {
    type Item = (K, Vec<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, first) = self.records.next()?;
        let mut values = vec![first];
        while let Some((_, value)) = self.records.next_if(|(k, _)| *k == key) {
            values.push(value);
        }
        Some((key, values))
    }
}
