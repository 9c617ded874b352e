//! `[wall_time, step, payload]` tuples sent to the relay.

use serde_json::{json, Map, Value};

use super::error::{ClientError, Result};
use crate::histogram::HistogramSummary;

/// Key sets a pre-built histogram may carry, each sorted.
pub const ACCEPTED_HISTOGRAM_KEYS: [&[&str]; 4] = [
    &["bucket", "bucket_limit", "max", "min", "num"],
    &["bucket", "bucket_limit", "max", "min", "num", "sum"],
    &["bucket", "bucket_limit", "max", "min", "num", "sum", "sum_squares"],
    &["bucket", "bucket_limit", "max", "min", "num", "sum_squares"],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarEvent {
    pub wall_time: f64,
    pub step: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistogramPayload {
    /// Raw samples; the relay builds the buckets (`tobuild=true`).
    Samples(Vec<f64>),
    /// Histogram fields as TensorBoard expects them (`tobuild=false`).
    Built(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramEvent {
    pub wall_time: f64,
    pub step: i64,
    pub payload: HistogramPayload,
}

/// JSON has no NaN or infinity; serde_json would send them as `null`.
fn check_finite(what: &str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ClientError::InvalidArgument(format!("{what} must be finite, got {v}")))
    }
}

fn split_tuple(values: &[Value]) -> Result<(f64, i64, &Value)> {
    let [wall_time, step, payload] = values else {
        return Err(ClientError::InvalidArgument(format!(
            "expected [wall_time, step, value] but got {} elements",
            values.len()
        )));
    };
    let wall_time = wall_time
        .as_f64()
        .ok_or_else(|| ClientError::InvalidArgument(format!("wall_time {wall_time} is not a number")))?;
    let step = step
        .as_i64()
        .ok_or_else(|| ClientError::InvalidArgument(format!("step {step} is not an integer")))?;
    Ok((wall_time, step, payload))
}

impl ScalarEvent {
    pub fn new(wall_time: f64, step: i64, value: f64) -> Self {
        Self { wall_time, step, value }
    }

    /// From an untyped tuple; it must have exactly 3 elements.
    pub fn from_values(values: &[Value]) -> Result<Self> {
        let (wall_time, step, value) = split_tuple(values)?;
        let value = value
            .as_f64()
            .ok_or_else(|| ClientError::InvalidArgument(format!("value {value} is not a number")))?;
        Ok(Self::new(wall_time, step, value))
    }

    pub fn validate(&self) -> Result<()> {
        check_finite("wall_time", self.wall_time)?;
        check_finite("value", self.value)
    }

    pub(crate) fn to_json(self) -> Value {
        json!([self.wall_time, self.step, self.value])
    }
}

impl HistogramEvent {
    pub fn new(wall_time: f64, step: i64, payload: HistogramPayload) -> Self {
        Self { wall_time, step, payload }
    }

    /// From an untyped tuple; it must have exactly 3 elements. With
    /// `tobuild` the payload is a list of samples, otherwise a histogram
    /// object.
    pub fn from_values(values: &[Value], tobuild: bool) -> Result<Self> {
        let (wall_time, step, payload) = split_tuple(values)?;
        let payload = if tobuild {
            let samples = payload
                .as_array()
                .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
                .ok_or_else(|| {
                    ClientError::InvalidArgument(format!("{payload} is not a list of numbers"))
                })?;
            HistogramPayload::Samples(samples)
        } else {
            let fields = payload
                .as_object()
                .cloned()
                .ok_or_else(|| ClientError::InvalidArgument(format!("{payload} is not an object")))?;
            HistogramPayload::Built(fields)
        };
        Ok(Self::new(wall_time, step, payload))
    }

    /// Rejects a non-finite wall time or sample. Pre-built fields are
    /// already JSON and cannot hold one.
    pub fn validate(&self) -> Result<()> {
        check_finite("wall_time", self.wall_time)?;
        if let HistogramPayload::Samples(samples) = &self.payload {
            samples.iter().try_for_each(|&v| check_finite("sample", v))?;
        }
        Ok(())
    }

    pub fn tobuild(&self) -> bool {
        matches!(self.payload, HistogramPayload::Samples(_))
    }

    pub(crate) fn to_json(&self) -> Value {
        let payload = match &self.payload {
            HistogramPayload::Samples(samples) => json!(samples),
            HistogramPayload::Built(fields) => Value::Object(fields.clone()),
        };
        json!([self.wall_time, self.step, payload])
    }
}

impl From<HistogramSummary> for HistogramPayload {
    fn from(summary: HistogramSummary) -> Self {
        let mut fields = Map::new();
        fields.insert("min".into(), json!(summary.min));
        fields.insert("max".into(), json!(summary.max));
        fields.insert("num".into(), json!(summary.num as u64));
        if let Some(sum) = summary.sum {
            fields.insert("sum".into(), json!(sum));
        }
        if let Some(sum_squares) = summary.sum_squares {
            fields.insert("sum_squares".into(), json!(sum_squares));
        }
        fields.insert("bucket_limit".into(), json!(summary.bucket_limit));
        fields.insert("bucket".into(), json!(summary.bucket));
        Self::Built(fields)
    }
}

/// Client-side shape check before anything is sent.
pub fn check_histogram_data(payload: &HistogramPayload) -> bool {
    match payload {
        HistogramPayload::Samples(samples) => !samples.is_empty(),
        HistogramPayload::Built(fields) => {
            let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
            keys.sort_unstable();
            ACCEPTED_HISTOGRAM_KEYS.iter().any(|accepted| *accepted == keys.as_slice())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(keys: &[&str]) -> HistogramPayload {
        HistogramPayload::Built(keys.iter().map(|k| (k.to_string(), json!(1))).collect())
    }

    #[test]
    fn scalar_tuple_needs_three_elements() {
        assert!(ScalarEvent::from_values(&[json!(1.0), json!(2)]).is_err());
        assert!(ScalarEvent::from_values(&[json!(1.0), json!(2), json!(3), json!(4)]).is_err());

        let event = ScalarEvent::from_values(&[json!(1.5), json!(2), json!(0.5)]).unwrap();
        assert_eq!(event, ScalarEvent::new(1.5, 2, 0.5));
        assert_eq!(event.to_json(), json!([1.5, 2, 0.5]));
    }

    #[test]
    fn non_finite_scalars_are_rejected() {
        assert!(ScalarEvent::new(1.0, 1, 0.5).validate().is_ok());
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ScalarEvent::new(1.0, 1, bad).validate(),
                Err(ClientError::InvalidArgument(_))
            ));
            assert!(ScalarEvent::new(bad, 1, 0.5).validate().is_err());
        }
    }

    #[test]
    fn non_finite_histogram_samples_are_rejected() {
        let ok = HistogramEvent::new(1.0, 0, HistogramPayload::Samples(vec![1.0, 2.0]));
        assert!(ok.validate().is_ok());

        let nan = HistogramEvent::new(1.0, 0, HistogramPayload::Samples(vec![1.0, f64::NAN]));
        assert!(matches!(nan.validate(), Err(ClientError::InvalidArgument(_))));

        let bad_time = HistogramEvent::new(f64::INFINITY, 0, built(ACCEPTED_HISTOGRAM_KEYS[0]));
        assert!(bad_time.validate().is_err());
    }

    #[test]
    fn histogram_tuple_follows_tobuild() {
        let samples = HistogramEvent::from_values(&[json!(1.0), json!(0), json!([1, 2, 3])], true)
            .unwrap();
        assert!(samples.tobuild());
        assert_eq!(samples.payload, HistogramPayload::Samples(vec![1.0, 2.0, 3.0]));

        assert!(HistogramEvent::from_values(&[json!(1.0), json!(0), json!({})], true).is_err());
        assert!(HistogramEvent::from_values(&[json!(1.0), json!(0), json!([1])], false).is_err());
        assert!(HistogramEvent::from_values(&[json!(1.0), json!(0)], false).is_err());
    }

    #[test]
    fn the_four_key_sets_are_accepted() {
        for keys in ACCEPTED_HISTOGRAM_KEYS {
            assert!(check_histogram_data(&built(keys)), "{keys:?}");
        }
        // order of insertion does not matter
        assert!(check_histogram_data(&built(&["num", "min", "max", "bucket", "bucket_limit"])));
    }

    #[test]
    fn other_key_sets_are_rejected() {
        assert!(!check_histogram_data(&built(&["bucket", "bucket_limit", "max", "min"])));
        assert!(!check_histogram_data(&built(&[
            "bucket", "bucket_limit", "max", "min", "num", "extra"
        ])));
        assert!(!check_histogram_data(&HistogramPayload::Samples(vec![])));
    }

    #[test]
    fn built_summary_passes_the_check() {
        let summary = HistogramSummary::from_samples(&[1.0, 2.0, 3.0]).unwrap();
        let payload = HistogramPayload::from(summary);
        assert!(check_histogram_data(&payload));

        let HistogramPayload::Built(fields) = &payload else {
            panic!("expected built payload");
        };
        assert_eq!(fields["num"], json!(3));
    }
}
