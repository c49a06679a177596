//! Execution-time statistics
//!
//! Samples are grouped by exact value with an occurrence count, sorted
//! ascending, and summarized by a median over the configured number of
//! rounds.

use std::fmt;
use std::io::{self, Write};

use baron_core::SessionOutcome;

/// One distinct value and how often it was observed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub occurrences: u64,
}

/// Group equal values, keeping first-seen order
pub fn group(values: &[f64]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = Vec::new();
    for &value in values {
        match samples.iter_mut().find(|s| s.value == value) {
            Some(sample) => sample.occurrences += 1,
            None => samples.push(Sample { value, occurrences: 1 }),
        }
    }
    samples
}

/// Ascending by value, stable for equal values
pub fn sort(samples: &mut [Sample]) {
    samples.sort_by(|a, b| a.value.total_cmp(&b.value));
}

/// First value whose cumulative count reaches `(rounds - 1) / 2`
///
/// `samples` must already be sorted.
pub fn median(samples: &[Sample], rounds: usize) -> Option<f64> {
    let middle = rounds.saturating_sub(1) as u64 / 2;
    let mut count = 0u64;
    for sample in samples {
        if count + sample.occurrences >= middle {
            return Some(sample.value);
        }
        count += sample.occurrences;
    }
    None
}

/// Occurrence-weighted mean
pub fn mean(samples: &[Sample]) -> Option<f64> {
    let total: u64 = samples.iter().map(|s| s.occurrences).sum();
    if total == 0 {
        return None;
    }
    let sum: f64 = samples.iter().map(|s| s.value * s.occurrences as f64).sum();
    Some(sum / total as f64)
}

/// Write `value;occurrences` lines, value with nine decimals
pub fn write_csv<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    for sample in samples {
        writeln!(writer, "{:.9};{}", sample.value, sample.occurrences)?;
    }
    Ok(())
}

/// Grouped, sorted samples of one bucket plus their summary values
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub samples: Vec<Sample>,
    pub count: usize,
    pub median: Option<f64>,
    pub mean: Option<f64>,
}

impl Summary {
    pub fn from_values(values: &[f64], rounds: usize) -> Self {
        let mut samples = group(values);
        sort(&mut samples);
        Self {
            median: median(&samples, rounds),
            mean: mean(&samples),
            count: values.len(),
            samples,
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.first().map(|s| s.value)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }
}

/// Session outcome counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeTally {
    counts: [u64; 4],
}

impl OutcomeTally {
    fn index(outcome: SessionOutcome) -> usize {
        match outcome {
            SessionOutcome::Success => 0,
            SessionOutcome::RecoverySuccess => 1,
            SessionOutcome::RecoveryRejected => 2,
            SessionOutcome::RecoveryAborted => 3,
        }
    }

    pub fn record(&mut self, outcome: SessionOutcome) {
        self.counts[Self::index(outcome)] += 1;
    }

    pub fn get(&self, outcome: SessionOutcome) -> u64 {
        self.counts[Self::index(outcome)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sessions that went through recovery
    pub fn recoveries(&self) -> u64 {
        self.total() - self.get(SessionOutcome::Success)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SessionOutcome, u64)> + '_ {
        SessionOutcome::ALL.into_iter().map(|o| (o, self.get(o)))
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (outcome, count) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", outcome, count)?;
            first = false;
        }
        Ok(())
    }
}
