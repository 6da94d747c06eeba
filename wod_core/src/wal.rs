//! Write-Ahead Log (WAL) for workout records.
//!
//! Records are appended to a JSONL (JSON Lines) file under an exclusive lock
//! and rolled up into the CSV archive later.

use crate::{Result, WorkoutRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Destination for composed workout records.
pub trait WorkoutSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()>;
}

/// JSONL-based sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkoutSink for JsonlSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        tracing::debug!("Appended workout {} to WAL", record.id);
        Ok(())
    }
}

/// In-memory sink, mostly for tests.
impl WorkoutSink for Vec<WorkoutRecord> {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Read all records from a WAL file, skipping corrupt lines.
pub fn read_records(path: &Path) -> Result<Vec<WorkoutRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from WAL", records.len());
    Ok(records)
}
