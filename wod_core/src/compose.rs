//! Section composition: the validated entry point into the engine.
//!
//! `compose_section` turns one section's configuration into filter, resolver
//! and selector options and runs the three stages in order.

use crate::filter::{
    candidate_pool, selectors, ExclusionLists, FilterOptions, MuscleFilter, MuscleSelector,
    RecoveryTrack,
};
use crate::flags::*;
use crate::progression::{resolve, ProgressionFacts, ResolveOptions};
use crate::selector::{select, uniform_targets, OrderBy, SelectionOptions};
use crate::state::SeenSelection;
use crate::types::*;
use crate::{Error, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// Everything a section can ask of the engine. Unset options are no-ops.
#[derive(Clone, Debug)]
pub struct SectionConfig {
    /// Muscles to work; expands to a target of 1 each when
    /// `muscle_targets` is empty.
    pub muscle_groups: MuscleGroups,
    pub muscle_targets: BTreeMap<MuscleGroups, i32>,
    pub exclude_recovery_muscle: bool,
    pub exercise_type: Option<ExerciseType>,
    pub exercise_focus: Option<ExerciseFocus>,
    pub sports_focus: Option<SportsFocus>,
    pub joints: Option<Joints>,
    pub muscle_contractions: Option<MuscleContraction>,
    pub muscle_movement: Option<MuscleMovement>,
    pub movement_patterns: Option<MovementPattern>,
    pub unique_movement_patterns: bool,
    pub only_weights: Option<bool>,
    pub cap_at_proficiency: bool,
    pub progression_fallback: bool,
    pub order_by: OrderBy,
    pub skip: usize,
    pub take: Option<usize>,
    pub exclusions: ExclusionLists,
    pub unique_exercises: bool,
    pub at_least_x_unique_muscles_per_exercise: u32,
    pub at_least_x_muscles_per_exercise: u32,
    pub muscle_selector: MuscleSelector,
    pub recovery_track: Option<RecoveryTrack>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            muscle_groups: MuscleGroups::empty(),
            muscle_targets: BTreeMap::new(),
            exclude_recovery_muscle: false,
            exercise_type: None,
            exercise_focus: None,
            sports_focus: None,
            joints: None,
            muscle_contractions: None,
            muscle_movement: None,
            movement_patterns: None,
            unique_movement_patterns: false,
            only_weights: None,
            cap_at_proficiency: false,
            progression_fallback: true,
            order_by: OrderBy::Selection,
            skip: 0,
            take: None,
            exclusions: ExclusionLists::default(),
            unique_exercises: false,
            at_least_x_unique_muscles_per_exercise: 1,
            at_least_x_muscles_per_exercise: 0,
            muscle_selector: selectors::primary,
            recovery_track: None,
        }
    }
}

impl SectionConfig {
    /// Reject internally inconsistent options before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.at_least_x_unique_muscles_per_exercise == 0 {
            return Err(Error::Config(
                "at_least_x_unique_muscles_per_exercise must be at least 1".into(),
            ));
        }
        if let Some(muscle) = self.muscle_targets.keys().find(|m| !m.is_single()) {
            return Err(Error::Config(format!(
                "muscle target keys must be single muscle groups, got {:?}",
                muscle
            )));
        }
        if self.unique_movement_patterns
            && self.movement_patterns.map_or(true, |p| p.is_empty())
        {
            return Err(Error::Config(
                "unique_movement_patterns needs a non-empty movement_patterns".into(),
            ));
        }
        if self.at_least_x_muscles_per_exercise > MuscleGroups::all().count() {
            return Err(Error::Config(format!(
                "at_least_x_muscles_per_exercise {} exceeds the number of muscle groups",
                self.at_least_x_muscles_per_exercise
            )));
        }
        Ok(())
    }

    /// Effective per-muscle targets.
    pub fn targets(&self) -> BTreeMap<MuscleGroups, i32> {
        if self.muscle_targets.is_empty() {
            uniform_targets(self.muscle_groups, 1)
        } else {
            self.muscle_targets.clone()
        }
    }

    fn filter_options(&self, user: Option<&UserContext>) -> FilterOptions {
        let mut muscle_filters = Vec::new();

        let wanted = self
            .targets()
            .into_iter()
            .filter(|(_, target)| *target > 0)
            .fold(self.muscle_groups, |acc, (muscle, _)| acc | muscle);
        if !wanted.is_empty() {
            muscle_filters.push(MuscleFilter::include(wanted, self.muscle_selector));
        }

        if self.exclude_recovery_muscle {
            if let Some(recovery) = user.and_then(|u| u.user.recovery_muscle) {
                muscle_filters.push(MuscleFilter::exclude(recovery, selectors::all_muscles));
            }
        }

        FilterOptions {
            exclusions: self.exclusions.clone(),
            exercise_type: self.exercise_type,
            joints: self.joints,
            exercise_focus: self.exercise_focus,
            sports_focus: self.sports_focus,
            movement_patterns: self.movement_patterns,
            muscle_filters,
            muscle_contractions: self.muscle_contractions,
            muscle_movement: self.muscle_movement,
            only_weights: self.only_weights,
            recovery_track: self.recovery_track,
            cap_at_proficiency: self.cap_at_proficiency,
        }
    }

    fn selection_options(&self) -> SelectionOptions {
        SelectionOptions {
            unique_exercises: self.unique_exercises,
            at_least_x_unique_muscles_per_exercise: self.at_least_x_unique_muscles_per_exercise,
            at_least_x_muscles_per_exercise: self.at_least_x_muscles_per_exercise,
            muscle_targets: self.targets(),
            muscle_selector: self.muscle_selector,
            movement_patterns: self.movement_patterns,
            unique_movement_patterns: self.unique_movement_patterns,
            order_by: self.order_by,
            skip: self.skip,
            take: self.take,
        }
    }
}

/// One exercise picked for a section.
#[derive(Clone, Copy, Debug)]
pub struct SelectedExercise<'a> {
    pub exercise: &'a Exercise,
    pub variation: &'a Variation,
    pub skill_score: u8,
    pub facts: ProgressionFacts,
}

impl SelectedExercise<'_> {
    pub fn seen(&self) -> SeenSelection {
        SeenSelection {
            exercise_id: self.exercise.id,
            variation_id: self.variation.id,
        }
    }
}

impl ExclusionLists {
    /// Keep later sections from repeating these picks.
    pub fn exclude_selected(&mut self, selected: &[SelectedExercise<'_>]) {
        for s in selected {
            self.exercises.insert(s.exercise.id);
            self.exercise_variations.insert((s.exercise.id, s.variation.id));
            self.variations.insert(s.variation.id);
        }
    }
}

/// Compose one section: filter, resolve progressions, select.
///
/// An empty result is a valid outcome; only invalid configuration errors.
pub fn compose_section<'a>(
    catalog: &'a Catalog,
    user: Option<&UserContext>,
    config: &SectionConfig,
    rng: &mut impl Rng,
) -> Result<Vec<SelectedExercise<'a>>> {
    config.validate()?;

    let pool = candidate_pool(catalog, user, &config.filter_options(user));
    let resolved = resolve(
        catalog,
        user,
        pool,
        ResolveOptions {
            fallback: config.progression_fallback,
            cap_at_proficiency: config.cap_at_proficiency,
        },
    );
    let picked = select(resolved, &config.selection_options(), rng);

    Ok(picked
        .into_iter()
        .map(|rc| SelectedExercise {
            exercise: rc.candidate.exercise,
            variation: rc.candidate.variation,
            skill_score: rc.candidate.skill_score,
            facts: rc.facts,
        })
        .collect())
}
