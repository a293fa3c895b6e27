use std::num::Wrapping;

/// Hashes a single 64-bit word with Bob Jenkins' 64-bit mix, as used by the
/// [Java version](https://github.com/vigna/dsiutils/blob/master/src/it/unimi/dsi/util/HyperLogLogCounterArray.java#L263)
/// of HyperLogLog counters.
///
/// The result depends only on `seed` and `word`, so it is stable across
/// runs, processes and platforms.
pub fn jenkins_hash(seed: u64, word: u64) -> u64 {
    let mut a = Wrapping(seed) + Wrapping(word);
    let mut b = Wrapping(seed);
    let mut c = Wrapping(0x9e3779b97f4a7c13_u64);

    for (sa, sb, sc) in [(43, 9, 8), (38, 23, 5), (35, 49, 11), (12, 18, 22)] {
        a -= b;
        a -= c;
        a ^= c >> sa;

        b -= c;
        b -= a;
        b ^= a << sb;

        c -= a;
        c -= b;
        c ^= b >> sc;
    }

    c.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(jenkins_hash(0, 42), jenkins_hash(0, 42));
        assert_ne!(jenkins_hash(0, 42), jenkins_hash(0, 43));
        assert_ne!(jenkins_hash(0, 42), jenkins_hash(1, 42));
    }
}
