//! User state persistence and the mark-seen write.
//!
//! Composition only reads user state. The one mutation, marking a workout's
//! selections as seen, is applied in a single batch after every section has
//! been composed.

use crate::config::MAX_WEEKS;
use crate::{Error, ExerciseId, Result, SeenState, UserId, UserState, VariationId};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// When a seen exercise becomes eligible to be marked seen again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Every workout updates last-seen.
    #[default]
    ResetDaily,
    /// Last-seen holds until the given weekday, `cadence_weeks` out.
    ResetAt { weekday: Weekday, cadence_weeks: u32 },
}

impl RefreshPolicy {
    /// The `refresh_after` date stamped on entries marked seen today.
    pub fn refresh_after(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            RefreshPolicy::ResetDaily => None,
            RefreshPolicy::ResetAt {
                weekday,
                cadence_weeks,
            } => {
                let target = i64::from(weekday.num_days_from_sunday());
                let current = i64::from(today.weekday().num_days_from_sunday());
                let mut days = (target - current).rem_euclid(7);
                if days == 0 {
                    days = 7;
                }
                let extra_weeks = i64::from(cadence_weeks.clamp(1, MAX_WEEKS) - 1);
                Some(today + Duration::days(days) + Duration::weeks(extra_weeks))
            }
        }
    }
}

/// An (exercise, variation) pair that made it into a workout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenSelection {
    pub exercise_id: ExerciseId,
    pub variation_id: VariationId,
}

fn refresh_entry(seen: &mut SeenState, today: NaiveDate, next: Option<NaiveDate>) {
    if seen.refresh_after.map_or(true, |after| today >= after) {
        seen.last_seen = Some(today);
        seen.refresh_after = next;
    }
}

impl UserState {
    /// Mark a batch of selections seen as of `today`.
    ///
    /// Entries still inside their refresh window are left unchanged.
    pub fn mark_seen(&mut self, selections: &[SeenSelection], policy: RefreshPolicy, today: NaiveDate) {
        let next = policy.refresh_after(today);
        for selection in selections {
            let exercise = self.exercises.entry(selection.exercise_id).or_default();
            refresh_entry(&mut exercise.seen, today, next);
            let variation = self.variations.entry(selection.variation_id).or_default();
            refresh_entry(&mut variation.seen, today, next);
        }
    }

    /// Load user state from a file with shared locking.
    ///
    /// Returns default state if the file doesn't exist or is corrupted.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file at {:?}, using default state", path);
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open state file {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock state file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        if let Err(e) = read {
            tracing::warn!("Failed to read state file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        match serde_json::from_str::<UserState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded user state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Failed to parse state file {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Atomically write state: temp file, fsync, rename over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(serde_json::to_string(self)?.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }
}

/// Read/write access to per-user state.
pub trait UserStateStore {
    fn load(&self, user_id: UserId) -> Result<UserState>;

    fn save(&mut self, user_id: UserId, state: &UserState) -> Result<()>;

    /// Apply one mark-seen batch. An empty batch writes nothing.
    fn mark_seen(
        &mut self,
        user_id: UserId,
        selections: &[SeenSelection],
        policy: RefreshPolicy,
        today: NaiveDate,
    ) -> Result<()> {
        if selections.is_empty() {
            return Ok(());
        }
        let mut state = self.load(user_id)?;
        state.mark_seen(selections, policy, today);
        self.save(user_id, &state)?;
        tracing::info!("Marked {} selections seen for user {}", selections.len(), user_id);
        Ok(())
    }
}

/// One JSON state file per user inside a directory.
pub struct JsonStateStore {
    dir: PathBuf,
}

impl JsonStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, user_id: UserId) -> PathBuf {
        self.dir.join(format!("user_{}.json", user_id))
    }

    /// Load, modify and save one user's state.
    pub fn update<F>(&mut self, user_id: UserId, f: F) -> Result<UserState>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = UserStateStore::load(self, user_id)?;
        f(&mut state)?;
        self.save(user_id, &state)?;
        Ok(state)
    }
}

impl UserStateStore for JsonStateStore {
    fn load(&self, user_id: UserId) -> Result<UserState> {
        UserState::load(&self.path_for(user_id))
    }

    fn save(&mut self, user_id: UserId, state: &UserState) -> Result<()> {
        state.save(&self.path_for(user_id))
    }
}

/// In-memory store for tests and previews.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore {
    pub states: HashMap<UserId, UserState>,
}

impl UserStateStore for MemoryStateStore {
    fn load(&self, user_id: UserId) -> Result<UserState> {
        Ok(self.states.get(&user_id).cloned().unwrap_or_default())
    }

    fn save(&mut self, user_id: UserId, state: &UserState) -> Result<()> {
        self.states.insert(user_id, state.clone());
        Ok(())
    }
}
