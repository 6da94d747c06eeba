//! Configuration file support for wod.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wod/config.toml`.

use crate::state::RefreshPolicy;
use crate::{
    Catalog, Error, Frequency, MuscleGroups, Result, SportsFocus, User, UserId, VolumePreference,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest week count accepted for any cadence or window (ten years).
pub const MAX_WEEKS: u32 = 520;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub periodization: PeriodizationConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,

    #[serde(default)]
    pub volume: VolumeConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("workouts.wal")
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("workouts.csv")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

/// The profile of the single local user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: u32,

    /// Account creation date; deload countdown starts from its week.
    #[serde(default)]
    pub created: Option<NaiveDate>,

    #[serde(default)]
    pub new_to_fitness: bool,

    #[serde(default)]
    pub demo: bool,

    /// Equipment names as listed in the catalog.
    #[serde(default = "default_equipment")]
    pub equipment: Vec<String>,

    #[serde(default)]
    pub frequency: Frequency,

    #[serde(default)]
    pub recovery_muscle: Option<MuscleGroups>,

    #[serde(default)]
    pub sports_focus: SportsFocus,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            created: None,
            new_to_fitness: false,
            demo: false,
            equipment: default_equipment(),
            frequency: Frequency::default(),
            recovery_muscle: None,
            sports_focus: SportsFocus::default(),
        }
    }
}

/// Deload, volume window and refresh settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodizationConfig {
    #[serde(default = "default_deload_cadence_weeks")]
    pub deload_cadence_weeks: u32,

    #[serde(default = "default_volume_window_weeks")]
    pub volume_window_weeks: u32,

    #[serde(default)]
    pub refresh: RefreshPolicy,
}

impl Default for PeriodizationConfig {
    fn default() -> Self {
        Self {
            deload_cadence_weeks: default_deload_cadence_weeks(),
            volume_window_weeks: default_volume_window_weeks(),
            refresh: RefreshPolicy::default(),
        }
    }
}

/// Per-section sizes and coverage thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutConfig {
    pub warmup_size: usize,
    pub main_size: usize,
    pub accessory_size: usize,
    pub sports_size: usize,
    pub rehab_size: usize,
    pub mobility_size: usize,
    pub cooldown_size: usize,
    /// First-pass unique-muscle threshold for the main lifts.
    pub main_unique_muscles: u32,
    /// Muscles a main lift must work at all.
    pub main_min_muscles: u32,
    pub accessory_unique_muscles: u32,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            warmup_size: 3,
            main_size: 3,
            accessory_size: 4,
            sports_size: 2,
            rehab_size: 2,
            mobility_size: 5,
            cooldown_size: 3,
            main_unique_muscles: 2,
            main_min_muscles: 2,
            accessory_unique_muscles: 1,
        }
    }
}

/// Preferred weekly volume ranges
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct VolumeConfig {
    #[serde(default)]
    pub preferences: Vec<VolumePreference>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wod")
}

fn default_user_id() -> u32 {
    1
}

fn default_equipment() -> Vec<String> {
    vec![
        "Pull-up Bar".into(),
        "Resistance Band".into(),
        "Dumbbells".into(),
    ]
}

fn default_deload_cadence_weeks() -> u32 {
    6
}

fn default_volume_window_weeks() -> u32 {
    4
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wod")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject settings the planner cannot work with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.periodization;
        check_weeks("deload_cadence_weeks", p.deload_cadence_weeks)?;
        check_weeks("volume_window_weeks", p.volume_window_weeks)?;
        if let RefreshPolicy::ResetAt { cadence_weeks, .. } = p.refresh {
            check_weeks("refresh cadence_weeks", cadence_weeks)?;
        }

        let w = &self.workout;
        if w.main_unique_muscles == 0 || w.accessory_unique_muscles == 0 {
            return Err(Error::Config(
                "unique muscle thresholds must be at least 1".into(),
            ));
        }

        if let Some(muscle) = self.user.recovery_muscle {
            if !muscle.is_single() {
                return Err(Error::Config(format!(
                    "recovery_muscle must be a single muscle group, got {:?}",
                    muscle
                )));
            }
        }

        for pref in &self.volume.preferences {
            if pref.muscle.is_empty() {
                return Err(Error::Config("volume preference without a muscle".into()));
            }
            if pref.min > pref.max {
                return Err(Error::Config(format!(
                    "volume preference for {:?}: min {} > max {}",
                    pref.muscle, pref.min, pref.max
                )));
            }
        }
        Ok(())
    }

    /// Build the engine's user profile, resolving equipment names.
    ///
    /// Unknown equipment names are logged and skipped. Without a configured
    /// creation date `fallback_created` is used.
    pub fn to_user(&self, catalog: &Catalog, fallback_created: NaiveDate) -> User {
        let equipment = self
            .user
            .equipment
            .iter()
            .filter_map(|name| {
                let id = catalog.equipment_by_name(name);
                if id.is_none() {
                    tracing::warn!("Unknown equipment '{}' in config, ignoring", name);
                }
                id
            })
            .collect();

        User {
            id: UserId(self.user.id),
            created: self.user.created.unwrap_or(fallback_created),
            is_new_to_fitness: self.user.new_to_fitness,
            is_demo: self.user.demo,
            equipment,
            frequency: self.user.frequency,
            recovery_muscle: self.user.recovery_muscle,
            sports_focus: self.user.sports_focus,
            deload_cadence_weeks: self.periodization.deload_cadence_weeks,
            volume_window_weeks: self.periodization.volume_window_weeks,
            volume_preferences: self.volume.preferences.clone(),
        }
    }
}

fn check_weeks(name: &str, weeks: u32) -> Result<()> {
    if !(1..=MAX_WEEKS).contains(&weeks) {
        return Err(Error::Config(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_WEEKS, weeks
        )));
    }
    Ok(())
}
