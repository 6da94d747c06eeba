//! CSV rollup for archiving WAL workouts.
//!
//! Each workout is flattened to one row per assigned variation; a workout
//! without entries still gets a single row so its date, rotation and deload
//! flag survive the rollup.

use crate::{
    Frequency, IntensityLevel, Result, UserId, VariationId, WorkoutEntry, WorkoutKind,
    WorkoutRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub workout_id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub rotation: usize,
    pub is_deload: bool,
    pub kind: WorkoutKind,
    pub variation_id: Option<VariationId>,
    pub intensity: Option<IntensityLevel>,
}

impl CsvRow {
    fn header(record: &WorkoutRecord, entry: Option<&WorkoutEntry>) -> Self {
        CsvRow {
            workout_id: record.id,
            user_id: record.user_id,
            date: record.date,
            frequency: record.frequency,
            rotation: record.rotation,
            is_deload: record.is_deload,
            kind: record.kind,
            variation_id: entry.map(|e| e.variation_id),
            intensity: entry.map(|e| e.intensity),
        }
    }

    pub(crate) fn from_record(record: &WorkoutRecord) -> Vec<CsvRow> {
        if record.entries.is_empty() {
            return vec![CsvRow::header(record, None)];
        }
        record
            .entries
            .iter()
            .map(|entry| CsvRow::header(record, Some(entry)))
            .collect()
    }

    /// Start a record from this row; the entry, if any, is added by the caller.
    pub(crate) fn to_record(&self) -> WorkoutRecord {
        WorkoutRecord {
            id: self.workout_id,
            user_id: self.user_id,
            date: self.date,
            frequency: self.frequency,
            rotation: self.rotation,
            is_deload: self.is_deload,
            kind: self.kind,
            entries: Vec::new(),
        }
    }

    pub(crate) fn entry(&self) -> Option<WorkoutEntry> {
        match (self.variation_id, self.intensity) {
            (Some(variation_id), Some(intensity)) => Some(WorkoutEntry {
                variation_id,
                intensity,
            }),
            _ => None,
        }
    }
}

/// Roll up WAL workouts into CSV and archive the WAL.
///
/// The CSV is fsynced before the WAL is renamed to `.wal.processed`, so a
/// crash in between leaves the WAL in place; history loading deduplicates by
/// workout id. Returns the number of workouts processed.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(wal_path)?;
    if records.is_empty() {
        tracing::info!("No workouts in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for record in &records {
        for row in CsvRow::from_record(record) {
            writer.serialize(row)?;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;
    tracing::info!("Wrote {} workouts to CSV", records.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;
    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove every `.processed` WAL file in `dir`.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{JsonlSink, WorkoutSink};
    use std::fs::File;

    fn create_test_record(entries: &[(u32, IntensityLevel)]) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: UserId(1),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            frequency: Frequency::UpperLower4Day,
            rotation: 2,
            is_deload: true,
            kind: WorkoutKind::Strength,
            entries: entries
                .iter()
                .map(|(id, intensity)| WorkoutEntry {
                    variation_id: VariationId(*id),
                    intensity: *intensity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_rollup_writes_one_row_per_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_record(&[(101, IntensityLevel::Medium), (401, IntensityLevel::Heavy)]))
            .unwrap();
        sink.append(&create_test_record(&[])).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 2);
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let rows: Vec<CsvRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].variation_id, Some(VariationId(401)));
        assert_eq!(rows[1].intensity, Some(IntensityLevel::Heavy));
        assert!(rows[2].entry().is_none());
        assert!(rows[2].is_deload);
    }

    #[test]
    fn test_rollup_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_record(&[(101, IntensityLevel::Light)])).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_record(&[(201, IntensityLevel::Light)])).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &temp_dir.path().join("workouts.csv")).unwrap();
        assert_eq!(count, 0);
        assert!(wal_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("a.wal.processed")).unwrap();
        File::create(temp_dir.path().join("b.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        assert_eq!(cleanup_processed_wals(temp_dir.path()).unwrap(), 2);
        assert!(!temp_dir.path().join("a.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
