//! Running aggregation over extracted observations.

/// summarize was called with zero observations folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no observations to summarize")]
pub struct EmptyAggregate;

/// Running reducible state. `observe` is O(1); in distribution mode every
/// sample is retained so summarize can produce exact order statistics.
///
/// The aggregator is never closed: summarize may be called at any point, any
/// number of times, and later observations show up in the next summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    count: u64,
    sum: i64,
    samples: Option<Vec<i64>>,
}

impl Aggregator {
    /// Count and sum only; enough for the mean.
    pub fn new() -> Self {
        Self { count: 0, sum: 0, samples: None }
    }

    /// Additionally retain every sample for min/quartiles/max.
    pub fn with_distribution() -> Self {
        Self { samples: Some(Vec::new()), ..Self::new() }
    }

    pub fn observe(&mut self, value: i64) {
        self.count += 1;
        self.sum += value;
        if let Some(samples) = &mut self.samples {
            samples.push(value);
        }
    }

    /// Associative, commutative combine of two partial aggregates. Merging a
    /// distribution aggregator with a count-only one degrades to count/sum,
    /// since the retained set would be incomplete either way.
    pub fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.sum += other.sum;
        self.samples = match (self.samples.take(), other.samples) {
            (Some(mut ours), Some(theirs)) => {
                ours.extend(theirs);
                Some(ours)
            }
            (Some(ours), None) if other.count == 0 => Some(ours),
            (None, theirs) if self.count == other.count => theirs,
            _ => None,
        };
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn summarize(&self) -> Result<Summary, EmptyAggregate> {
        if self.count == 0 {
            return Err(EmptyAggregate);
        }
        let mean = self.sum as f64 / self.count as f64;
        let distribution = self.samples.as_deref().map(| samples | {
            let mut sorted = samples.to_vec();
            sorted.sort_unstable();
            Distribution {
                min: sorted[0] as f64,
                q1: percentile(&sorted, 25.0),
                median: percentile(&sorted, 50.0),
                q3: percentile(&sorted, 75.0),
                max: sorted[sorted.len() - 1] as f64,
            }
        });
        Ok(Summary { count: self.count, mean, distribution })
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub mean: f64,
    pub distribution: Option<Distribution>,
}

/// Order statistics of the retained sample set. q1/median/q3 are the true
/// 25th/50th/75th percentiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear interpolation between order statistics: rank `p/100 * (n-1)` into
/// the sorted sample, interpolating between the two neighbouring values.
/// Matches scipy's `scoreatpercentile` with the default "fraction" method.
fn percentile(sorted: &[i64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lower = sorted[lo] as f64;
    let upper = sorted[hi] as f64;
    lower + (upper - lower) * (rank - lo as f64)
}
