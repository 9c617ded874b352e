use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use super::record::encode_record;
use super::EventError;
use crate::histogram::HistogramSummary;
use crate::pb::{event, summary, Event, HistogramProto, Summary};

pub const FILE_VERSION: &str = "brain.Event:2";

/// Append-only TensorBoard event file for one experiment.
///
/// Every event is flushed as soon as it is written.
pub struct EventWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl EventWriter {
    /// Creates `dir` if needed, opens a fresh event file inside it and
    /// writes the file-version header record.
    pub fn create(dir: &Path) -> Result<Self, EventError> {
        fs::create_dir_all(dir)?;

        let now = chrono::Utc::now();
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into());
        let name = format!(
            "events.out.tfevents.{}.{}.{}.{}",
            now.timestamp(),
            host,
            std::process::id(),
            uuid::Uuid::new_v4().simple(),
        );
        let path = dir.join(name);
        let file = File::create(&path)?;

        let mut writer = Self {
            path,
            file: BufWriter::new(file),
        };
        writer.write_event(&Event {
            wall_time: now.timestamp_micros() as f64 / 1e6,
            step: 0,
            what: Some(event::What::FileVersion(FILE_VERSION.into())),
        })?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_scalar(
        &mut self,
        tag: &str,
        wall_time: f64,
        step: i64,
        value: f32,
    ) -> Result<(), EventError> {
        self.write_summary(tag, wall_time, step, summary::value::Value::SimpleValue(value))
    }

    pub fn add_histogram(
        &mut self,
        tag: &str,
        wall_time: f64,
        step: i64,
        histogram: &HistogramSummary,
    ) -> Result<(), EventError> {
        let histo = HistogramProto {
            min: histogram.min,
            max: histogram.max,
            num: histogram.num,
            sum: histogram.sum.unwrap_or_default(),
            sum_squares: histogram.sum_squares.unwrap_or_default(),
            bucket_limit: histogram.bucket_limit.clone(),
            bucket: histogram.bucket.clone(),
        };
        self.write_summary(tag, wall_time, step, summary::value::Value::Histo(histo))
    }

    fn write_summary(
        &mut self,
        tag: &str,
        wall_time: f64,
        step: i64,
        value: summary::value::Value,
    ) -> Result<(), EventError> {
        let summary = Summary {
            value: vec![summary::Value {
                tag: tag.to_owned(),
                value: Some(value),
            }],
        };
        self.write_event(&Event {
            wall_time,
            step,
            what: Some(event::What::Summary(summary)),
        })
    }

    fn write_event(&mut self, event: &Event) -> Result<(), EventError> {
        self.file.write_all(&encode_record(&event.encode_to_vec()))?;
        self.file.flush()?;
        Ok(())
    }
}
