pub mod schema;

use once_cell::sync::Lazy;
use thiserror::Error;

pub use schema::{SchemaError, HISTOGRAM_SCHEMA};

// ─── Bucket edges ────────────────────────────────────────────────

/// Smallest positive edge.
const EDGE_START: f64 = 1e-12;
/// Edges grow geometrically until they reach this bound.
const EDGE_END: f64 = 1e20;
const EDGE_GROWTH: f64 = 1.1;

/// Shared, read-only edge sequence: `-big .. -1e-12, 0, 1e-12 .. big`.
static BUCKET_EDGES: Lazy<Vec<f64>> = Lazy::new(make_bucket_edges);

fn make_bucket_edges() -> Vec<f64> {
    let mut positive = Vec::new();
    let mut v = EDGE_START;
    while v < EDGE_END {
        positive.push(v);
        v *= EDGE_GROWTH;
    }

    let mut edges = Vec::with_capacity(positive.len() * 2 + 1);
    edges.extend(positive.iter().rev().map(|v| -v));
    edges.push(0.0);
    edges.extend_from_slice(&positive);
    edges
}

/// The fixed, ascending bucket edge sequence used by every histogram.
pub fn bucket_edges() -> &'static [f64] {
    &BUCKET_EDGES
}

// ─── Summary ─────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum HistogramError {
    #[error("cannot build a histogram from an empty list of values")]
    Empty,

    #[error("value {0} cannot be placed in a histogram bucket")]
    Unbucketable(f64),
}

/// TensorBoard-compatible histogram summary.
///
/// `bucket_limit[i]` is the upper edge of a bucket holding `bucket[i]`
/// samples; only non-empty buckets are listed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSummary {
    pub min: f64,
    pub max: f64,
    pub num: f64,
    pub sum: Option<f64>,
    pub sum_squares: Option<f64>,
    pub bucket_limit: Vec<f64>,
    pub bucket: Vec<f64>,
}

impl HistogramSummary {
    /// Bins `values` against [`bucket_edges`].
    ///
    /// Each value lands in the leftmost bucket whose edge is not less than
    /// the value. NaN and values above the last edge have no such bucket and
    /// are rejected.
    pub fn from_samples(values: &[f64]) -> Result<Self, HistogramError> {
        if values.is_empty() {
            return Err(HistogramError::Empty);
        }

        let edges = bucket_edges();
        let mut counts = vec![0u64; edges.len()];

        for &v in values {
            if v.is_nan() {
                return Err(HistogramError::Unbucketable(v));
            }
            let idx = edges.partition_point(|&edge| edge < v);
            match counts.get_mut(idx) {
                Some(count) => *count += 1,
                None => return Err(HistogramError::Unbucketable(v)),
            }
        }

        let (bucket_limit, bucket): (Vec<f64>, Vec<f64>) = edges
            .iter()
            .zip(&counts)
            .filter(|(_, count)| **count > 0)
            .map(|(&edge, &count)| (edge, count as f64))
            .unzip();

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            min,
            max,
            num: values.len() as f64,
            sum: Some(values.iter().sum()),
            sum_squares: Some(values.iter().map(|v| v * v).sum()),
            bucket_limit,
            bucket,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────
