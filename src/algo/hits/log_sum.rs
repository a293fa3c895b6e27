/// Adds two values represented by their natural logarithm, returning the
/// logarithm of their sum.
///
/// `-∞` (the logarithm of zero) is the identity: `sum_log_probs(f32::NEG_INFINITY, x)`
/// is exactly `x`. The function is symmetric, so the result does not depend
/// on the order of the arguments.
#[inline(always)]
pub fn sum_log_probs(a: f32, b: f32) -> f32 {
    log_add(a as f64, b as f64) as f32
}

#[inline(always)]
fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (min, max) = if a < b { (a, b) } else { (b, a) };
    max + (min - max).exp().ln_1p()
}

/// A running sum in the log domain.
///
/// Used by the reducer, by both combiners and by the normalization, so
/// that partial and full aggregation follow the same rule.
///
/// The running value is kept in `f64`: in `f32` the increment of a term
/// falls below half an ulp once about 2²¹ equal terms have been added.
/// Values are rounded to `f32` only by [`value`](LogSum::value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSum {
    /// The logarithm of the sum so far
    value: f64,
}

impl Default for LogSum {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSum {
    /// Creates an empty sum, whose value is `-∞`.
    pub fn new() -> Self {
        Self {
            value: f64::NEG_INFINITY,
        }
    }

    /// Adds a log-domain value.
    #[inline(always)]
    pub fn add(&mut self, v: f32) {
        self.value = log_add(self.value, v as f64);
    }

    /// Merges another partial sum into this one.
    #[inline(always)]
    pub fn merge(&mut self, other: &LogSum) {
        self.value = log_add(self.value, other.value);
    }

    /// Returns the logarithm of the sum computed so far, rounded to `f32`.
    pub fn value(&self) -> f32 {
        self.value as f32
    }

    /// Returns the logarithm of the sum computed so far at full precision.
    pub fn value_f64(&self) -> f64 {
        self.value
    }

    /// Returns whether nothing but `-∞` was ever added.
    pub fn is_empty(&self) -> bool {
        self.value == f64::NEG_INFINITY
    }
}

impl Extend<f32> for LogSum {
    fn extend<T: IntoIterator<Item = f32>>(&mut self, iter: T) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f32> for LogSum {
    fn from_iter<T: IntoIterator<Item = f32>>(iter: T) -> Self {
        let mut sum = LogSum::new();
        sum.extend(iter);
        sum
    }
}
