pub mod record;
pub mod writer;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use thiserror::Error;

pub use writer::EventWriter;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid experiment name '{0}'")]
    InvalidExperiment(String),

    #[error("event file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

type SharedWriter = Arc<Mutex<EventWriter>>;

/// Open event writers, one per experiment, each under `{root}/{experiment}`.
///
/// Writers are created on first use and live as long as the registry. The
/// registry lock only guards the map; file creation runs under the
/// experiment's own cell, so it never stalls writes to other experiments.
pub struct WriterRegistry {
    root: PathBuf,
    writers: Mutex<HashMap<String, Arc<OnceCell<SharedWriter>>>>,
}

impl WriterRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, experiment: &str) -> Result<SharedWriter, EventError> {
        validate_experiment_name(experiment)?;

        let cell = self
            .writers
            .lock()
            .entry(experiment.to_owned())
            .or_default()
            .clone();

        // A failed creation leaves the cell empty; the next write retries.
        cell.get_or_try_init(|| {
            let writer = EventWriter::create(&self.root.join(experiment))?;
            tracing::info!(experiment, path = %writer.path().display(), "opened event file");
            Ok::<_, EventError>(Arc::new(Mutex::new(writer)))
        })
        .cloned()
    }
}

/// Experiment names become directory names.
fn validate_experiment_name(name: &str) -> Result<(), EventError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(EventError::InvalidExperiment(name.to_owned()));
    }
    Ok(())
}
