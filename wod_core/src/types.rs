//! Core domain types for the workout composition engine.
//!
//! This module defines:
//! - Catalog entities (exercises, variations, equipment, prerequisites)
//! - Per-user state (skill scores, ignore flags, last-seen dates)
//! - Workout history records and the intensity/proficiency table
//! - Workout-frequency tracks

use crate::flags::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ExerciseId);
id_type!(VariationId);
id_type!(EquipmentId);
id_type!(UserId);

// ============================================================================
// Catalog Types
// ============================================================================

/// Half-open difficulty interval `[min, max)`; either bound may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRange {
    pub min: Option<u8>,
    pub max: Option<u8>,
}

impl ProgressionRange {
    pub const fn new(min: Option<u8>, max: Option<u8>) -> Self {
        Self { min, max }
    }

    /// Lower bound satisfied: `min <= score`.
    pub fn min_in_range(&self, score: u8) -> bool {
        self.min.map_or(true, |min| min <= score)
    }

    /// Upper bound satisfied: `score < max`.
    pub fn max_in_range(&self, score: u8) -> bool {
        self.max.map_or(true, |max| score < max)
    }

    pub fn contains(&self, score: u8) -> bool {
        self.min_in_range(score) && self.max_in_range(score)
    }
}

/// Sport a variation is specific to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportsFocus {
    #[default]
    None,
    Climbing,
    Soccer,
    Running,
    Grappling,
}

/// A piece of equipment the user may own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
}

/// One way of performing a variation with interchangeable equipment.
///
/// An empty `equipment` list means the group needs nothing. Otherwise the user
/// must own one root item, plus one of `children` when the root is not
/// `standalone`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentGroup {
    pub name: String,
    #[serde(default)]
    pub equipment: Vec<EquipmentId>,
    #[serde(default)]
    pub children: Vec<EquipmentId>,
    #[serde(default = "default_true")]
    pub standalone: bool,
    #[serde(default)]
    pub is_weight: bool,
}

fn default_true() -> bool {
    true
}

impl EquipmentGroup {
    /// A group that needs no equipment.
    pub fn bodyweight() -> Self {
        Self {
            name: "Bodyweight".into(),
            equipment: vec![],
            children: vec![],
            standalone: true,
            is_weight: false,
        }
    }

    pub fn requires_equipment(&self) -> bool {
        !self.equipment.is_empty()
    }

    /// Whether the owned set satisfies this group.
    pub fn satisfied_by(&self, owned: &BTreeSet<EquipmentId>) -> bool {
        if !self.requires_equipment() {
            return true;
        }
        let root_owned = self.equipment.iter().any(|e| owned.contains(e));
        root_owned && (self.standalone || self.children.iter().any(|c| owned.contains(c)))
    }
}

/// An exercise that must be performed before another is suggested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub exercise_id: ExerciseId,
    pub proficiency: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub primary_muscles: MuscleGroups,
    pub secondary_muscles: MuscleGroups,
    /// Skill score above which the exercise counts as mastered.
    pub proficiency: u8,
    /// Set when this exercise exclusively serves one injured muscle group.
    pub recovery_muscle: Option<MuscleGroups>,
    pub groups: ExerciseGroup,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub disabled_reason: Option<String>,
}

impl Exercise {
    pub fn is_enabled(&self) -> bool {
        self.disabled_reason.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variation {
    pub id: VariationId,
    pub exercise_id: ExerciseId,
    pub name: String,
    pub progression: ProgressionRange,
    #[serde(default)]
    pub sports_focus: SportsFocus,
    pub exercise_type: ExerciseType,
    pub joints: Joints,
    pub exercise_focus: ExerciseFocus,
    pub stretch_muscles: MuscleGroups,
    pub muscle_contractions: MuscleContraction,
    pub muscle_movement: MuscleMovement,
    pub movement_patterns: MovementPattern,
    pub equipment_groups: Vec<EquipmentGroup>,
    #[serde(default)]
    pub disabled_reason: Option<String>,
}

impl Variation {
    pub fn is_enabled(&self) -> bool {
        self.disabled_reason.is_none()
    }

    /// Whether any equipment group is weight-based.
    pub fn is_weighted(&self) -> bool {
        self.equipment_groups.iter().any(|g| g.is_weight)
    }

    /// Whether the owned equipment satisfies at least one group.
    pub fn has_equipment(&self, owned: &BTreeSet<EquipmentId>) -> bool {
        self.equipment_groups.iter().any(|g| g.satisfied_by(owned))
    }
}

/// The complete catalog of exercises, variations and equipment
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: BTreeMap<ExerciseId, Exercise>,
    pub variations: BTreeMap<VariationId, Variation>,
    pub equipment: BTreeMap<EquipmentId, Equipment>,
}

// ============================================================================
// User State Types
// ============================================================================

/// Amount the skill score moves per progression step.
pub const PROGRESSION_STEP: u8 = 5;

/// Skill score assigned to exercises the user has no state for.
pub const DEFAULT_SKILL: u8 = 0;

/// Ignore/last-seen bookkeeping shared by exercises and variations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenState {
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
    #[serde(default)]
    pub refresh_after: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserExerciseState {
    #[serde(default)]
    pub skill: u8,
    #[serde(flatten)]
    pub seen: SeenState,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserVariationState {
    #[serde(flatten)]
    pub seen: SeenState,
    /// Last logged external load, independent of skill.
    #[serde(default)]
    pub last_weight: Option<f64>,
}

/// Per-user mutable state, keyed by catalog ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub exercises: HashMap<ExerciseId, UserExerciseState>,
    #[serde(default)]
    pub variations: HashMap<VariationId, UserVariationState>,
}

impl UserState {
    pub fn skill(&self, exercise: ExerciseId) -> u8 {
        self.exercises
            .get(&exercise)
            .map_or(DEFAULT_SKILL, |s| s.skill)
    }

    /// Move the skill score one step up or down, clamped to 0..=100.
    pub fn adjust_skill(&mut self, exercise: ExerciseId, harder: bool) -> u8 {
        let state = self.exercises.entry(exercise).or_default();
        state.skill = if harder {
            state.skill.saturating_add(PROGRESSION_STEP).min(100)
        } else {
            state.skill.saturating_sub(PROGRESSION_STEP)
        };
        state.skill
    }
}

/// Preferred weekly volume range for one muscle group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumePreference {
    pub muscle: MuscleGroups,
    pub min: f64,
    pub max: f64,
}

/// User profile as the engine sees it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub created: NaiveDate,
    pub is_new_to_fitness: bool,
    pub is_demo: bool,
    pub equipment: BTreeSet<EquipmentId>,
    pub frequency: Frequency,
    pub recovery_muscle: Option<MuscleGroups>,
    pub sports_focus: SportsFocus,
    pub deload_cadence_weeks: u32,
    pub volume_window_weeks: u32,
    pub volume_preferences: Vec<VolumePreference>,
}

/// A read snapshot of one user for a single composition call.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub user: User,
    pub state: UserState,
    pub today: NaiveDate,
}

impl UserContext {
    pub fn exercise_state(&self, id: ExerciseId) -> Option<&UserExerciseState> {
        self.state.exercises.get(&id)
    }

    pub fn variation_state(&self, id: VariationId) -> Option<&UserVariationState> {
        self.state.variations.get(&id)
    }
}

// ============================================================================
// Workout History Types
// ============================================================================

/// Workout-frequency track; each keeps its own rotation cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    FullBody2Day,
    #[default]
    UpperLower4Day,
    PushPullLegs3Day,
    PushPullLegs6Day,
}

/// Which volume source a workout contributes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    #[default]
    Strength,
    Mobility,
}

/// Intensity a variation was assigned at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Recovery,
    Endurance,
    Light,
    Medium,
    Heavy,
    Stretch,
}

/// Sets, reps and relative load for an intensity level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proficiency {
    pub sets: u8,
    pub reps: u8,
    pub load: f64,
}

impl Proficiency {
    /// Set x rep x load proxy used for weekly volume.
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.load
    }
}

impl IntensityLevel {
    pub fn proficiency(self) -> Proficiency {
        let (sets, reps, load) = match self {
            IntensityLevel::Recovery => (2, 10, 0.3),
            IntensityLevel::Endurance => (3, 15, 0.5),
            IntensityLevel::Light => (3, 12, 0.6),
            IntensityLevel::Medium => (3, 10, 0.75),
            IntensityLevel::Heavy => (5, 5, 0.85),
            IntensityLevel::Stretch => (1, 3, 0.25),
        };
        Proficiency { sets, reps, load }
    }

    /// Lighter level used during a deload week.
    pub fn deloaded(self) -> Self {
        match self {
            IntensityLevel::Heavy => IntensityLevel::Medium,
            IntensityLevel::Medium => IntensityLevel::Light,
            other => other,
        }
    }
}

/// A variation assigned in a workout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub variation_id: VariationId,
    pub intensity: IntensityLevel,
}

/// A workout that was composed and recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub rotation: usize,
    #[serde(default)]
    pub is_deload: bool,
    #[serde(default)]
    pub kind: WorkoutKind,
    #[serde(default)]
    pub entries: Vec<WorkoutEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_half_open() {
        let range = ProgressionRange::new(Some(40), Some(80));
        assert!(!range.contains(39));
        assert!(range.contains(40));
        assert!(range.contains(79));
        assert!(!range.contains(80));

        let open = ProgressionRange::new(None, None);
        assert!(open.contains(0) && open.contains(100));
    }

    #[test]
    fn test_equipment_group_needs_child_when_not_standalone() {
        let group = EquipmentGroup {
            name: "Barbell".into(),
            equipment: vec![EquipmentId(1)],
            children: vec![EquipmentId(2), EquipmentId(3)],
            standalone: false,
            is_weight: true,
        };
        let mut owned = BTreeSet::from([EquipmentId(1)]);
        assert!(!group.satisfied_by(&owned));
        owned.insert(EquipmentId(3));
        assert!(group.satisfied_by(&owned));
        assert!(!group.satisfied_by(&BTreeSet::from([EquipmentId(3)])));
    }

    #[test]
    fn test_adjust_skill_clamps() {
        let mut state = UserState::default();
        assert_eq!(state.adjust_skill(ExerciseId(1), false), 0);
        for _ in 0..30 {
            state.adjust_skill(ExerciseId(1), true);
        }
        assert_eq!(state.skill(ExerciseId(1)), 100);
        assert_eq!(state.adjust_skill(ExerciseId(1), false), 100 - PROGRESSION_STEP);
    }

    #[test]
    fn test_user_state_json_roundtrip_flattens_seen() {
        let mut state = UserState::default();
        state.exercises.insert(
            ExerciseId(7),
            UserExerciseState {
                skill: 45,
                seen: SeenState {
                    ignore: true,
                    last_seen: NaiveDate::from_ymd_opt(2024, 3, 1),
                    refresh_after: None,
                },
            },
        );
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"ignore\":true"));
        let parsed: UserState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_heavy_volume_exceeds_recovery() {
        let heavy = IntensityLevel::Heavy.proficiency().volume();
        let recovery = IntensityLevel::Recovery.proficiency().volume();
        assert!(heavy > recovery);
        assert_eq!(IntensityLevel::Heavy.deloaded(), IntensityLevel::Medium);
    }
}
