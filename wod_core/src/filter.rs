//! Candidate filter pipeline.
//!
//! Narrows the catalog down to the (exercise, variation) pairs a user can do
//! right now. Every filter is an independent predicate over a single
//! candidate, so the pool is the same no matter which order filters run in,
//! and each filter is a no-op when its option is unset.
//!
//! Progression-range membership is annotated here but never filtered on; the
//! progression resolver decides which tier to surface.

use crate::flags::*;
use crate::types::*;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Picks which muscle fields of a candidate a muscle check looks at.
pub type MuscleSelector = fn(&Candidate<'_>) -> MuscleGroups;

/// Named muscle selectors.
pub mod selectors {
    use super::Candidate;
    use crate::flags::MuscleGroups;

    pub fn primary(c: &Candidate<'_>) -> MuscleGroups {
        c.exercise.primary_muscles
    }

    pub fn secondary(c: &Candidate<'_>) -> MuscleGroups {
        c.exercise.secondary_muscles
    }

    pub fn stretch(c: &Candidate<'_>) -> MuscleGroups {
        c.variation.stretch_muscles
    }

    pub fn primary_and_stretch(c: &Candidate<'_>) -> MuscleGroups {
        primary(c) | stretch(c)
    }

    pub fn all_muscles(c: &Candidate<'_>) -> MuscleGroups {
        primary(c) | secondary(c) | stretch(c)
    }
}

/// An (exercise, variation) pair annotated for one user.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    pub exercise: &'a Exercise,
    pub variation: &'a Variation,
    /// Skill score used for range checks, capped when requested.
    pub skill_score: u8,
    pub min_in_range: bool,
    pub max_in_range: bool,
    pub is_ignored: bool,
    pub has_equipment: bool,
    pub exercise_last_seen: Option<NaiveDate>,
    pub variation_last_seen: Option<NaiveDate>,
}

impl<'a> Candidate<'a> {
    /// Annotate a pair for an optional user.
    ///
    /// Without a user the candidate is treated as unignored, fully equipped and
    /// never seen.
    pub fn new(
        exercise: &'a Exercise,
        variation: &'a Variation,
        user: Option<&UserContext>,
        cap_at_proficiency: bool,
    ) -> Self {
        let exercise_state = user.and_then(|u| u.exercise_state(exercise.id));
        let variation_state = user.and_then(|u| u.variation_state(variation.id));

        let raw_skill = exercise_state.map_or(DEFAULT_SKILL, |s| s.skill);
        let skill_score = if cap_at_proficiency {
            raw_skill.min(exercise.proficiency)
        } else {
            raw_skill
        };

        let is_ignored = exercise_state.is_some_and(|s| s.seen.ignore)
            || variation_state.is_some_and(|s| s.seen.ignore);
        let has_equipment = user.map_or(true, |u| variation.has_equipment(&u.user.equipment));

        Self {
            exercise,
            variation,
            skill_score,
            min_in_range: variation.progression.min_in_range(skill_score),
            max_in_range: variation.progression.max_in_range(skill_score),
            is_ignored,
            has_equipment,
            exercise_last_seen: exercise_state.and_then(|s| s.seen.last_seen),
            variation_last_seen: variation_state.and_then(|s| s.seen.last_seen),
        }
    }

    pub fn in_range(&self) -> bool {
        self.min_in_range && self.max_in_range
    }

    /// Unusable for the user regardless of section options.
    pub fn is_unusable(&self) -> bool {
        self.is_ignored || !self.has_equipment
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuscleFilterMode {
    Include,
    Exclude,
}

/// Tests the selected muscles of a candidate against a target set.
#[derive(Clone, Copy, Debug)]
pub struct MuscleFilter {
    pub muscles: MuscleGroups,
    pub mode: MuscleFilterMode,
    pub selector: MuscleSelector,
}

impl MuscleFilter {
    pub fn include(muscles: MuscleGroups, selector: MuscleSelector) -> Self {
        Self {
            muscles,
            mode: MuscleFilterMode::Include,
            selector,
        }
    }

    pub fn exclude(muscles: MuscleGroups, selector: MuscleSelector) -> Self {
        Self {
            muscles,
            mode: MuscleFilterMode::Exclude,
            selector,
        }
    }

    pub fn matches(&self, candidate: &Candidate<'_>) -> bool {
        let overlaps = (self.selector)(candidate).intersects(self.muscles);
        match self.mode {
            MuscleFilterMode::Include => overlaps,
            MuscleFilterMode::Exclude => !overlaps,
        }
    }
}

/// Handling of exercises that exclusively serve an injured muscle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryTrack {
    /// Drop every exercise with a recovery marker.
    Exclude,
    /// Keep only exercises whose recovery marker overlaps these muscles.
    Only(MuscleGroups),
}

/// Ids already used elsewhere in today's workout.
#[derive(Clone, Debug)]
pub struct ExclusionLists {
    pub groups: ExerciseGroup,
    pub exercises: BTreeSet<ExerciseId>,
    pub exercise_variations: BTreeSet<(ExerciseId, VariationId)>,
    pub variations: BTreeSet<VariationId>,
}

impl Default for ExclusionLists {
    fn default() -> Self {
        Self {
            groups: ExerciseGroup::empty(),
            exercises: BTreeSet::new(),
            exercise_variations: BTreeSet::new(),
            variations: BTreeSet::new(),
        }
    }
}

impl ExclusionLists {
    pub fn excludes(&self, candidate: &Candidate<'_>) -> bool {
        let exercise = candidate.exercise.id;
        let variation = candidate.variation.id;
        candidate.exercise.groups.intersects(self.groups)
            || self.exercises.contains(&exercise)
            || self.exercise_variations.contains(&(exercise, variation))
            || self.variations.contains(&variation)
    }
}

/// Filter options recognized by the pipeline; unset options are no-ops.
#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    pub exclusions: ExclusionLists,
    pub exercise_type: Option<ExerciseType>,
    pub joints: Option<Joints>,
    pub exercise_focus: Option<ExerciseFocus>,
    pub sports_focus: Option<SportsFocus>,
    /// An empty pattern set means "variation declares no pattern".
    pub movement_patterns: Option<MovementPattern>,
    pub muscle_filters: Vec<MuscleFilter>,
    pub muscle_contractions: Option<MuscleContraction>,
    pub muscle_movement: Option<MuscleMovement>,
    pub only_weights: Option<bool>,
    pub recovery_track: Option<RecoveryTrack>,
    /// Cap the skill score at each exercise's proficiency (deload weeks).
    pub cap_at_proficiency: bool,
}

/// Build the candidate pool for a request.
///
/// `user = None` disables user-specific filtering (equipment, ignore flags,
/// prerequisites) for administrative previews.
pub fn candidate_pool<'a>(
    catalog: &'a Catalog,
    user: Option<&UserContext>,
    options: &FilterOptions,
) -> Vec<Candidate<'a>> {
    let pool: Vec<_> = catalog
        .exercises()
        .filter(|e| e.is_enabled())
        .filter(|e| user.map_or(true, |u| prerequisites_met(catalog, u, e)))
        .flat_map(|exercise| {
            catalog
                .variations_of(exercise.id)
                .filter(|v| v.is_enabled())
                .map(move |variation| {
                    Candidate::new(exercise, variation, user, options.cap_at_proficiency)
                })
        })
        .filter(|c| passes(c, user.is_some(), options))
        .collect();

    tracing::debug!("Candidate pool holds {} variations", pool.len());
    pool
}

/// Re-filter an existing pool with further options.
pub fn apply_filters<'a>(
    mut pool: Vec<Candidate<'a>>,
    user: Option<&UserContext>,
    options: &FilterOptions,
) -> Vec<Candidate<'a>> {
    pool.retain(|c| passes(c, user.is_some(), options));
    pool
}

fn passes(c: &Candidate<'_>, has_user: bool, options: &FilterOptions) -> bool {
    (!has_user || (!c.is_ignored && c.has_equipment))
        && !options.exclusions.excludes(c)
        && overlaps(options.exercise_type, c.variation.exercise_type)
        && overlaps(options.joints, c.variation.joints)
        && overlaps(options.exercise_focus, c.variation.exercise_focus)
        && options
            .sports_focus
            .map_or(true, |f| c.variation.sports_focus == f)
        && movement_pattern_matches(options.movement_patterns, c.variation.movement_patterns)
        && options.muscle_filters.iter().all(|f| f.matches(c))
        && overlaps(options.muscle_contractions, c.variation.muscle_contractions)
        && overlaps(options.muscle_movement, c.variation.muscle_movement)
        && options
            .only_weights
            .map_or(true, |w| c.variation.is_weighted() == w)
        && recovery_track_matches(options.recovery_track, c.exercise)
}

/// "Any-of" bit-set check; an unset option always passes.
fn overlaps<F: bitflags::Flags + Copy>(wanted: Option<F>, actual: F) -> bool {
    wanted.map_or(true, |w| w.intersects(actual))
}

fn movement_pattern_matches(wanted: Option<MovementPattern>, actual: MovementPattern) -> bool {
    match wanted {
        None => true,
        Some(w) if w.is_empty() => actual.is_empty(),
        Some(w) => w.intersects(actual),
    }
}

fn recovery_track_matches(track: Option<RecoveryTrack>, exercise: &Exercise) -> bool {
    match track {
        None => true,
        Some(RecoveryTrack::Exclude) => exercise.recovery_muscle.is_none(),
        Some(RecoveryTrack::Only(muscles)) => exercise
            .recovery_muscle
            .is_some_and(|m| m.intersects(muscles)),
    }
}

/// Whether the user has actually performed every foundational exercise.
///
/// A prerequisite only gates when some enabled variation of the prerequisite
/// covers the required proficiency. The user's raw skill on the prerequisite
/// is used, never the deload-capped one.
pub fn prerequisites_met(catalog: &Catalog, user: &UserContext, exercise: &Exercise) -> bool {
    exercise.prerequisites.iter().all(|prerequisite| {
        let enabled = catalog
            .exercise(prerequisite.exercise_id)
            .is_some_and(|e| e.is_enabled());
        if !enabled {
            return true;
        }

        let covering: Vec<_> = catalog
            .variations_of(prerequisite.exercise_id)
            .filter(|v| v.is_enabled() && v.progression.contains(prerequisite.proficiency))
            .collect();
        if covering.is_empty() {
            return true;
        }

        let Some(state) = user.exercise_state(prerequisite.exercise_id) else {
            return false;
        };
        state.skill >= prerequisite.proficiency
            && state.seen.last_seen.is_some()
            && covering.iter().any(|v| {
                user.variation_state(v.id)
                    .is_some_and(|s| s.seen.last_seen.is_some())
            })
    })
}
