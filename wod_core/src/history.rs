//! Workout history loading from the WAL and the CSV archive.

use crate::csv_rollup::CsvRow;
use crate::{Result, UserId, WorkoutRecord};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Read access to a user's past workouts.
pub trait WorkoutHistory {
    /// Records dated on or after `since`, newest first.
    fn workouts_since(&self, user_id: UserId, since: NaiveDate) -> Result<Vec<WorkoutRecord>>;
}

impl WorkoutHistory for Vec<WorkoutRecord> {
    fn workouts_since(&self, user_id: UserId, since: NaiveDate) -> Result<Vec<WorkoutRecord>> {
        let mut records: Vec<_> = self
            .iter()
            .filter(|r| r.user_id == user_id && r.date >= since)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

/// History backed by the WAL plus its CSV archive.
pub struct FileHistory {
    wal_path: PathBuf,
    csv_path: PathBuf,
}

impl FileHistory {
    pub fn new(wal_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            wal_path: wal_path.into(),
            csv_path: csv_path.into(),
        }
    }
}

impl WorkoutHistory for FileHistory {
    fn workouts_since(&self, user_id: UserId, since: NaiveDate) -> Result<Vec<WorkoutRecord>> {
        load_records(&self.wal_path, &self.csv_path, user_id, since)
    }
}

/// Load a user's records since `since` from both WAL and CSV.
///
/// Records present in both are kept once, preferring the WAL copy.
pub fn load_records(
    wal_path: &Path,
    csv_path: &Path,
    user_id: UserId,
    since: NaiveDate,
) -> Result<Vec<WorkoutRecord>> {
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();
    let wanted = |r: &WorkoutRecord| r.user_id == user_id && r.date >= since;

    for record in crate::wal::read_records(wal_path)? {
        if wanted(&record) && seen_ids.insert(record.id) {
            records.push(record);
        }
    }
    let wal_count = records.len();
    tracing::debug!("Loaded {} workouts from WAL", wal_count);

    if csv_path.exists() {
        for record in load_records_from_csv(csv_path)? {
            if wanted(&record) && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", records.len() - wal_count);
    }

    records.sort_by(|a, b| b.date.cmp(&a.date));
    tracing::info!("Loaded {} workouts since {}", records.len(), since);
    Ok(records)
}

/// Regroup the one-row-per-entry archive into records.
fn load_records_from_csv(path: &Path) -> Result<Vec<WorkoutRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut order: Vec<Uuid> = Vec::new();
    let mut by_id: HashMap<Uuid, WorkoutRecord> = HashMap::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
                continue;
            }
        };
        let record = by_id.entry(row.workout_id).or_insert_with(|| {
            order.push(row.workout_id);
            row.to_record()
        });
        if let Some(entry) = row.entry() {
            record.entries.push(entry);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}
