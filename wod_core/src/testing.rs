//! Fixtures shared by the unit tests.

use crate::flags::*;
use crate::types::*;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// A Sunday, so week arithmetic in tests stays readable.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(7)
}

pub fn test_user(equipment: &[EquipmentId]) -> User {
    User {
        id: UserId(1),
        created: date(2024, 1, 1),
        is_new_to_fitness: false,
        is_demo: false,
        equipment: equipment.iter().copied().collect::<BTreeSet<_>>(),
        frequency: Frequency::UpperLower4Day,
        recovery_muscle: None,
        sports_focus: SportsFocus::None,
        deload_cadence_weeks: 6,
        volume_window_weeks: 4,
        volume_preferences: vec![],
    }
}

pub fn context_with_equipment(equipment: &[EquipmentId], state: UserState) -> UserContext {
    UserContext {
        user: test_user(equipment),
        state,
        today: today(),
    }
}

/// State in which the pull-up's row prerequisite has been performed.
pub fn pullup_unlocked() -> UserState {
    let mut state = UserState::default();
    let row = state.exercises.entry(ExerciseId(3)).or_default();
    row.skill = 45;
    row.seen.last_seen = Some(date(2024, 3, 1));
    state
        .variations
        .entry(VariationId(301))
        .or_default()
        .seen
        .last_seen = Some(date(2024, 3, 1));
    state
}

pub fn test_exercise(id: u32, primary: MuscleGroups, secondary: MuscleGroups) -> Exercise {
    Exercise {
        id: ExerciseId(id),
        name: format!("Exercise {}", id),
        primary_muscles: primary,
        secondary_muscles: secondary,
        proficiency: 100,
        recovery_muscle: None,
        groups: ExerciseGroup::empty(),
        prerequisites: vec![],
        disabled_reason: None,
    }
}

pub fn test_variation(id: u32, exercise: u32, min: Option<u8>, max: Option<u8>) -> Variation {
    Variation {
        id: VariationId(id),
        exercise_id: ExerciseId(exercise),
        name: format!("Variation {}", id),
        progression: ProgressionRange::new(min, max),
        sports_focus: SportsFocus::None,
        exercise_type: ExerciseType::STRENGTH,
        joints: Joints::empty(),
        exercise_focus: ExerciseFocus::STRENGTH,
        stretch_muscles: MuscleGroups::empty(),
        muscle_contractions: MuscleContraction::DYNAMIC,
        muscle_movement: MuscleMovement::ISOTONIC,
        movement_patterns: MovementPattern::empty(),
        equipment_groups: vec![EquipmentGroup::bodyweight()],
        disabled_reason: None,
    }
}

pub fn catalog_from(exercises: Vec<Exercise>, variations: Vec<Variation>) -> Catalog {
    let equipment = [EquipmentId(1), EquipmentId(2)]
        .into_iter()
        .map(|id| {
            (
                id,
                Equipment {
                    id,
                    name: format!("Equipment {}", id),
                },
            )
        })
        .collect();
    Catalog {
        exercises: exercises.into_iter().map(|e| (e.id, e)).collect(),
        variations: variations.into_iter().map(|v| (v.id, v)).collect(),
        equipment,
    }
}

/// One exercise with three contiguous tiers: [0,40) [40,80) [80,inf).
///
/// The middle tier needs equipment 1.
pub fn ladder_catalog() -> Catalog {
    let mut middle = test_variation(2, 1, Some(40), Some(80));
    middle.equipment_groups = vec![EquipmentGroup {
        name: "Equipment 1".into(),
        equipment: vec![EquipmentId(1)],
        children: vec![],
        standalone: true,
        is_weight: true,
    }];
    catalog_from(
        vec![test_exercise(1, MuscleGroups::PECTORALS, MuscleGroups::TRICEPS)],
        vec![
            test_variation(1, 1, Some(0), Some(40)),
            middle,
            test_variation(3, 1, Some(80), None),
        ],
    )
}

/// The ladder with a second middle variation, 4, that needs no equipment.
pub fn mixed_ladder_catalog() -> Catalog {
    let mut catalog = ladder_catalog();
    let extra = test_variation(4, 1, Some(40), Some(80));
    catalog.variations.insert(extra.id, extra);
    catalog
}

/// Context with a single exercise skill score and optional ignored variations.
pub fn ladder_context(skill: u8, ignored: &[u32], equipment: &[EquipmentId]) -> UserContext {
    let mut state = UserState::default();
    state.exercises.entry(ExerciseId(1)).or_default().skill = skill;
    for id in ignored {
        state
            .variations
            .entry(VariationId(*id))
            .or_default()
            .seen
            .ignore = true;
    }
    context_with_equipment(equipment, state)
}
