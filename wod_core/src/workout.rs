//! Workout planning: one call per day, section by section.
//!
//! The planner reads the history once, derives today's rotation bucket,
//! deload status and volume nudges, then composes each section in order.
//! Picks of earlier sections are excluded from later ones. Nothing is
//! persisted here; the caller records the workout and applies the mark-seen
//! batch afterwards.

use crate::compose::{compose_section, SectionConfig, SelectedExercise};
use crate::config::WorkoutConfig;
use crate::filter::{selectors, ExclusionLists, RecoveryTrack};
use crate::flags::*;
use crate::history::WorkoutHistory;
use crate::periodization::*;
use crate::selector::{uniform_targets, OrderBy};
use crate::state::SeenSelection;
use crate::types::*;
use crate::Result;
use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Warmup,
    Main,
    Accessory,
    Sports,
    Rehab,
    Mobility,
    Cooldown,
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::Warmup => "Warmup",
            Section::Main => "Main",
            Section::Accessory => "Accessory",
            Section::Sports => "Sports",
            Section::Rehab => "Rehab",
            Section::Mobility => "Mobility",
            Section::Cooldown => "Cooldown",
        }
    }

    /// Intensity assigned to every pick of the section.
    pub fn intensity(self, deload: bool) -> IntensityLevel {
        let level = match self {
            Section::Warmup => IntensityLevel::Light,
            Section::Main => IntensityLevel::Heavy,
            Section::Accessory | Section::Sports => IntensityLevel::Medium,
            Section::Rehab => IntensityLevel::Recovery,
            Section::Mobility => IntensityLevel::Endurance,
            Section::Cooldown => IntensityLevel::Stretch,
        };
        if deload {
            level.deloaded()
        } else {
            level
        }
    }

    /// Sections of a workout kind, in composition order.
    pub fn for_kind(kind: WorkoutKind) -> &'static [Section] {
        match kind {
            WorkoutKind::Strength => &[
                Section::Warmup,
                Section::Main,
                Section::Accessory,
                Section::Sports,
                Section::Rehab,
                Section::Cooldown,
            ],
            WorkoutKind::Mobility => &[
                Section::Warmup,
                Section::Mobility,
                Section::Rehab,
                Section::Cooldown,
            ],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Clone, Debug)]
pub struct ComposedSection<'a> {
    pub section: Section,
    pub exercises: Vec<SelectedExercise<'a>>,
}

#[derive(Clone, Debug)]
pub struct ComposedWorkout<'a> {
    pub rotation: RotationBucket,
    pub deload: DeloadStatus,
    pub volume: Option<WeeklyVolume>,
    pub sections: Vec<ComposedSection<'a>>,
    pub record: WorkoutRecord,
    /// One batch for `UserStateStore::mark_seen`.
    pub seen: Vec<SeenSelection>,
}

impl ComposedWorkout<'_> {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.exercises.is_empty())
    }
}

/// What every section config is derived from.
struct Plan<'p> {
    user: &'p User,
    bucket: RotationBucket,
    deload: bool,
    adjustments: VolumeAdjustments,
    settings: &'p WorkoutConfig,
}

impl Plan<'_> {
    /// Sections every user gets: no sport variations, no rehab exercises,
    /// nothing touching the injured muscle.
    fn general(&self, take: usize) -> SectionConfig {
        SectionConfig {
            sports_focus: Some(SportsFocus::None),
            recovery_track: Some(RecoveryTrack::Exclude),
            exclude_recovery_muscle: true,
            cap_at_proficiency: self.deload,
            unique_exercises: true,
            take: Some(take),
            ..Default::default()
        }
    }

    fn section_config(&self, section: Section) -> Option<SectionConfig> {
        let s = self.settings;
        let muscles = self.bucket.muscle_groups;

        let config = match section {
            Section::Warmup => SectionConfig {
                muscle_groups: muscles,
                exercise_type: Some(ExerciseType::MOBILITY | ExerciseType::CARDIO),
                muscle_contractions: Some(MuscleContraction::DYNAMIC),
                muscle_selector: selectors::all_muscles,
                ..self.general(s.warmup_size)
            },
            Section::Main => SectionConfig {
                muscle_groups: muscles,
                exercise_type: Some(ExerciseType::STRENGTH),
                movement_patterns: Some(self.bucket.movement_patterns),
                unique_movement_patterns: true,
                at_least_x_unique_muscles_per_exercise: s.main_unique_muscles,
                at_least_x_muscles_per_exercise: s.main_min_muscles,
                ..self.general(s.main_size)
            },
            Section::Accessory => {
                let mut targets = uniform_targets(muscles, 1);
                self.adjustments.apply(&mut targets);
                SectionConfig {
                    muscle_targets: targets,
                    exercise_type: Some(ExerciseType::STRENGTH),
                    at_least_x_unique_muscles_per_exercise: s.accessory_unique_muscles,
                    order_by: OrderBy::CoreLast,
                    ..self.general(s.accessory_size)
                }
            }
            Section::Sports => {
                if self.user.sports_focus == SportsFocus::None {
                    return None;
                }
                SectionConfig {
                    sports_focus: Some(self.user.sports_focus),
                    ..self.general(s.sports_size)
                }
            }
            Section::Rehab => {
                let recovery = self.user.recovery_muscle?;
                SectionConfig {
                    recovery_track: Some(RecoveryTrack::Only(recovery)),
                    exclude_recovery_muscle: false,
                    cap_at_proficiency: false,
                    ..self.general(s.rehab_size)
                }
            }
            Section::Mobility => SectionConfig {
                muscle_groups: muscles,
                exercise_type: Some(ExerciseType::MOBILITY | ExerciseType::STRETCHING),
                muscle_selector: selectors::primary_and_stretch,
                order_by: OrderBy::MuscleTarget,
                ..self.general(s.mobility_size)
            },
            Section::Cooldown => SectionConfig {
                muscle_groups: muscles,
                exercise_type: Some(ExerciseType::STRETCHING),
                muscle_contractions: Some(MuscleContraction::STATIC),
                muscle_selector: selectors::stretch,
                ..self.general(s.cooldown_size)
            },
        };
        Some(config)
    }
}

/// Plan today's workout for a user.
///
/// `user.today` is the planning date. The returned record and mark-seen batch
/// are left for the caller to persist.
pub fn plan_workout<'a>(
    catalog: &'a Catalog,
    user: &UserContext,
    history: &impl WorkoutHistory,
    kind: WorkoutKind,
    settings: &WorkoutConfig,
    rng: &mut impl Rng,
) -> Result<ComposedWorkout<'a>> {
    let today = user.today;
    let records = history.workouts_since(user.user.id, NaiveDate::MIN)?;

    let rotation = advance_rotation(user.user.frequency, &records);
    let deload = needs_deload(&user.user, &records, today);
    let volume = weekly_volume(&user.user, catalog, &records, today);
    let adjustments = VolumeAdjustments::from_volume(volume.as_ref(), &user.user.volume_preferences);
    tracing::info!(
        "Planning {:?} workout: rotation '{}', deload {} ({} days until next)",
        kind,
        rotation.name,
        deload.needs_deload,
        deload.time_until_deload.num_days()
    );

    let plan = Plan {
        user: &user.user,
        bucket: rotation,
        deload: deload.needs_deload,
        adjustments,
        settings,
    };

    let mut exclusions = ExclusionLists::default();
    let mut sections = Vec::new();
    for &section in Section::for_kind(kind) {
        let Some(mut config) = plan.section_config(section) else {
            continue;
        };
        config.exclusions = exclusions.clone();

        let exercises = compose_section(catalog, Some(user), &config, rng)?;
        if exercises.is_empty() {
            tracing::info!("{} section: nothing to recommend", section);
        } else {
            tracing::info!("{} section: {} exercises", section, exercises.len());
        }
        exclusions.exclude_selected(&exercises);
        sections.push(ComposedSection { section, exercises });
    }

    let entries = sections
        .iter()
        .flat_map(|s| {
            let intensity = s.section.intensity(deload.needs_deload);
            s.exercises.iter().map(move |e| WorkoutEntry {
                variation_id: e.variation.id,
                intensity,
            })
        })
        .collect();
    let seen = sections
        .iter()
        .flat_map(|s| s.exercises.iter().map(|e| e.seen()))
        .collect();

    let record = WorkoutRecord {
        id: Uuid::new_v4(),
        user_id: user.user.id,
        date: today,
        frequency: user.user.frequency,
        rotation: rotation.index,
        is_deload: deload.needs_deload,
        kind,
        entries,
    };

    Ok(ComposedWorkout {
        rotation,
        deload,
        volume,
        sections,
        record,
        seen,
    })
}
