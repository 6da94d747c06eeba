//! Default catalog of exercises, variations and equipment.
//!
//! The catalog is authored out-of-band and read-only to the engine. The
//! built-in one covers a bodyweight-first home setup with a few weighted
//! alternatives, enough to compose every section of a workout.

use crate::flags::*;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

pub mod equipment {
    use crate::types::EquipmentId;

    pub const PULLUP_BAR: EquipmentId = EquipmentId(1);
    pub const DUMBBELLS: EquipmentId = EquipmentId(2);
    pub const BARBELL: EquipmentId = EquipmentId(3);
    pub const WEIGHT_PLATES: EquipmentId = EquipmentId(4);
    pub const RESISTANCE_BAND: EquipmentId = EquipmentId(5);
    pub const KETTLEBELL: EquipmentId = EquipmentId(6);
    pub const BENCH: EquipmentId = EquipmentId(7);
}

use equipment::*;

/// Chained construction of a variation, starting from a dynamic bodyweight
/// strength movement.
struct VariationBuilder(Variation);

impl VariationBuilder {
    fn new(id: u32, exercise: u32, name: &str, min: Option<u8>, max: Option<u8>) -> Self {
        Self(Variation {
            id: VariationId(id),
            exercise_id: ExerciseId(exercise),
            name: name.into(),
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
        })
    }

    fn kind(mut self, kind: ExerciseType, focus: ExerciseFocus) -> Self {
        self.0.exercise_type = kind;
        self.0.exercise_focus = focus;
        self
    }

    fn joints(mut self, joints: Joints) -> Self {
        self.0.joints = joints;
        self
    }

    fn patterns(mut self, patterns: MovementPattern) -> Self {
        self.0.movement_patterns = patterns;
        self
    }

    fn stretches(mut self, muscles: MuscleGroups) -> Self {
        self.0.stretch_muscles = muscles;
        self
    }

    fn isometric(mut self) -> Self {
        self.0.muscle_contractions = MuscleContraction::STATIC;
        self.0.muscle_movement = MuscleMovement::ISOMETRIC;
        self
    }

    fn plyometric(mut self) -> Self {
        self.0.muscle_movement = MuscleMovement::PLYOMETRIC;
        self
    }

    fn sport(mut self, sport: SportsFocus) -> Self {
        self.0.sports_focus = sport;
        self
    }

    fn equipment(mut self, groups: Vec<EquipmentGroup>) -> Self {
        self.0.equipment_groups = groups;
        self
    }

    fn build(self) -> Variation {
        self.0
    }
}

fn group(name: &str, equipment: &[EquipmentId], is_weight: bool) -> EquipmentGroup {
    EquipmentGroup {
        name: name.into(),
        equipment: equipment.to_vec(),
        children: vec![],
        standalone: true,
        is_weight,
    }
}

fn exercise(
    id: u32,
    name: &str,
    primary: MuscleGroups,
    secondary: MuscleGroups,
    proficiency: u8,
    groups: ExerciseGroup,
) -> Exercise {
    Exercise {
        id: ExerciseId(id),
        name: name.into(),
        primary_muscles: primary,
        secondary_muscles: secondary,
        proficiency,
        recovery_muscle: None,
        groups,
        prerequisites: vec![],
        disabled_reason: None,
    }
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    type M = MuscleGroups;
    type P = MovementPattern;

    let equipment = [
        (PULLUP_BAR, "Pull-up Bar"),
        (DUMBBELLS, "Dumbbells"),
        (BARBELL, "Barbell"),
        (WEIGHT_PLATES, "Weight Plates"),
        (RESISTANCE_BAND, "Resistance Band"),
        (KETTLEBELL, "Kettlebell"),
        (BENCH, "Bench"),
    ]
    .into_iter()
    .map(|(id, name)| {
        (
            id,
            Equipment {
                id,
                name: name.into(),
            },
        )
    })
    .collect();

    // ========================================================================
    // Exercises
    // ========================================================================

    let mut pullup = exercise(
        2,
        "Pull-up",
        M::LATS | M::BICEPS | M::RHOMBOIDS,
        M::FOREARMS | M::TRAPS | M::ABDOMINALS,
        50,
        ExerciseGroup::PULLUP,
    );
    pullup.prerequisites.push(Prerequisite {
        exercise_id: ExerciseId(3),
        proficiency: 30,
    });

    let mut pike = exercise(
        8,
        "Pike Press",
        M::DELTOIDS | M::TRICEPS,
        M::TRAPS | M::ABDOMINALS,
        50,
        ExerciseGroup::PUSHUP,
    );
    pike.prerequisites.push(Prerequisite {
        exercise_id: ExerciseId(1),
        proficiency: 40,
    });

    let mut external_rotation = exercise(
        18,
        "Shoulder External Rotation",
        M::ROTATOR_CUFF,
        M::RHOMBOIDS,
        30,
        ExerciseGroup::empty(),
    );
    external_rotation.recovery_muscle = Some(M::ROTATOR_CUFF);

    let mut knee_extension = exercise(
        19,
        "Terminal Knee Extension",
        M::QUADRICEPS,
        M::empty(),
        30,
        ExerciseGroup::empty(),
    );
    knee_extension.recovery_muscle = Some(M::QUADRICEPS);

    let exercises: BTreeMap<_, _> = [
        exercise(
            1,
            "Push-up",
            M::PECTORALS | M::TRICEPS | M::DELTOIDS,
            M::ABDOMINALS | M::OBLIQUES,
            60,
            ExerciseGroup::PUSHUP,
        ),
        pullup,
        exercise(
            3,
            "Row",
            M::LATS | M::RHOMBOIDS | M::TRAPS,
            M::BICEPS | M::FOREARMS,
            50,
            ExerciseGroup::ROW,
        ),
        exercise(
            4,
            "Squat",
            M::QUADRICEPS | M::GLUTES,
            M::HAMSTRINGS | M::ERECTOR_SPINAE | M::HIP_ADDUCTORS,
            60,
            ExerciseGroup::SQUAT,
        ),
        exercise(
            5,
            "Hip Hinge",
            M::HAMSTRINGS | M::GLUTES | M::ERECTOR_SPINAE,
            M::FOREARMS | M::TRAPS,
            50,
            ExerciseGroup::HINGE,
        ),
        exercise(
            6,
            "Split Squat",
            M::QUADRICEPS | M::GLUTES | M::HIP_ADDUCTORS,
            M::CALVES | M::HAMSTRINGS,
            50,
            ExerciseGroup::LUNGE,
        ),
        exercise(
            7,
            "Plank",
            M::ABDOMINALS | M::OBLIQUES,
            M::ERECTOR_SPINAE | M::DELTOIDS | M::GLUTES,
            50,
            ExerciseGroup::PLANK,
        ),
        pike,
        exercise(9, "Calf Raise", M::CALVES, M::empty(), 40, ExerciseGroup::empty()),
        exercise(
            10,
            "Biceps Curl",
            M::BICEPS,
            M::FOREARMS,
            40,
            ExerciseGroup::empty(),
        ),
        exercise(
            11,
            "Dead Bug",
            M::ABDOMINALS | M::HIP_FLEXORS,
            M::OBLIQUES,
            40,
            ExerciseGroup::PLANK,
        ),
        exercise(
            12,
            "Hip Flexor Stretch",
            M::HIP_FLEXORS,
            M::QUADRICEPS,
            30,
            ExerciseGroup::STRETCH,
        ),
        exercise(
            13,
            "Hamstring Stretch",
            M::HAMSTRINGS,
            M::CALVES,
            30,
            ExerciseGroup::STRETCH,
        ),
        exercise(
            14,
            "Chest Stretch",
            M::PECTORALS,
            M::DELTOIDS,
            30,
            ExerciseGroup::STRETCH,
        ),
        exercise(
            15,
            "Shoulder CARs",
            M::ROTATOR_CUFF | M::DELTOIDS,
            M::TRAPS,
            30,
            ExerciseGroup::CARS,
        ),
        exercise(
            16,
            "Hip CARs",
            M::HIP_FLEXORS | M::GLUTES,
            M::HIP_ADDUCTORS | M::HIP_ABDUCTORS,
            30,
            ExerciseGroup::CARS,
        ),
        exercise(
            17,
            "Cat-Cow",
            M::ERECTOR_SPINAE | M::ABDOMINALS,
            M::empty(),
            30,
            ExerciseGroup::empty(),
        ),
        external_rotation,
        knee_extension,
        exercise(
            20,
            "Jumping Jacks",
            M::CALVES | M::DELTOIDS,
            M::GLUTES | M::HIP_ABDUCTORS,
            30,
            ExerciseGroup::empty(),
        ),
    ]
    .into_iter()
    .map(|e| (e.id, e))
    .collect();

    // ========================================================================
    // Variations
    // ========================================================================

    let push = P::HORIZONTAL_PUSH;
    let push_joints = Joints::SHOULDER | Joints::ELBOW;
    let pull_joints = Joints::SHOULDER | Joints::ELBOW;
    let leg_joints = Joints::HIP | Joints::KNEE | Joints::ANKLE;
    let mobility = ExerciseType::MOBILITY;
    let stretching = ExerciseType::STRETCHING;
    let flex = ExerciseFocus::FLEXIBILITY;

    let assisted_pullup = EquipmentGroup {
        name: "Band-assisted".into(),
        equipment: vec![PULLUP_BAR],
        children: vec![RESISTANCE_BAND],
        standalone: false,
        is_weight: false,
    };
    let barbell = EquipmentGroup {
        name: "Loaded barbell".into(),
        equipment: vec![BARBELL],
        children: vec![WEIGHT_PLATES],
        standalone: false,
        is_weight: true,
    };

    let variations: BTreeMap<_, _> = [
        // Push-up
        VariationBuilder::new(101, 1, "Wall Push-up", None, Some(20))
            .patterns(push)
            .joints(push_joints)
            .build(),
        VariationBuilder::new(102, 1, "Incline Push-up", Some(20), Some(40))
            .patterns(push)
            .joints(push_joints)
            .build(),
        VariationBuilder::new(103, 1, "Push-up", Some(40), Some(70))
            .patterns(push)
            .joints(push_joints)
            .build(),
        VariationBuilder::new(104, 1, "Archer Push-up", Some(70), None)
            .patterns(push)
            .joints(push_joints)
            .build(),
        // Pull-up
        VariationBuilder::new(201, 2, "Band-Assisted Pull-up", None, Some(30))
            .patterns(P::VERTICAL_PULL)
            .joints(pull_joints)
            .equipment(vec![assisted_pullup])
            .build(),
        VariationBuilder::new(202, 2, "Negative Pull-up", Some(30), Some(50))
            .patterns(P::VERTICAL_PULL)
            .joints(pull_joints)
            .equipment(vec![group("Bar", &[PULLUP_BAR], false)])
            .build(),
        VariationBuilder::new(203, 2, "Pull-up", Some(50), None)
            .patterns(P::VERTICAL_PULL)
            .joints(pull_joints)
            .equipment(vec![group("Bar", &[PULLUP_BAR], false)])
            .build(),
        VariationBuilder::new(204, 2, "Campus Board Lock-off", Some(50), None)
            .patterns(P::VERTICAL_PULL)
            .joints(pull_joints)
            .isometric()
            .sport(SportsFocus::Climbing)
            .equipment(vec![group("Bar", &[PULLUP_BAR], false)])
            .build(),
        // Row
        VariationBuilder::new(301, 3, "Band Row", None, Some(40))
            .patterns(P::HORIZONTAL_PULL)
            .joints(pull_joints)
            .equipment(vec![group("Band", &[RESISTANCE_BAND], false)])
            .build(),
        VariationBuilder::new(302, 3, "Inverted Row", Some(40), None)
            .patterns(P::HORIZONTAL_PULL)
            .joints(pull_joints)
            .equipment(vec![group("Bar", &[PULLUP_BAR], false)])
            .build(),
        VariationBuilder::new(303, 3, "Dumbbell Row", None, None)
            .patterns(P::HORIZONTAL_PULL)
            .joints(pull_joints)
            .equipment(vec![group("Dumbbells", &[DUMBBELLS], true)])
            .build(),
        // Squat
        VariationBuilder::new(401, 4, "Box Squat", None, Some(30))
            .patterns(P::SQUAT)
            .joints(leg_joints)
            .build(),
        VariationBuilder::new(402, 4, "Bodyweight Squat", Some(30), Some(60))
            .patterns(P::SQUAT)
            .joints(leg_joints)
            .build(),
        VariationBuilder::new(403, 4, "Goblet Squat", Some(60), None)
            .patterns(P::SQUAT)
            .joints(leg_joints)
            .equipment(vec![
                group("Dumbbell", &[DUMBBELLS], true),
                group("Kettlebell", &[KETTLEBELL], true),
            ])
            .build(),
        VariationBuilder::new(404, 4, "Barbell Back Squat", Some(60), None)
            .patterns(P::SQUAT)
            .joints(leg_joints)
            .equipment(vec![barbell.clone()])
            .build(),
        // Hip hinge
        VariationBuilder::new(501, 5, "Glute Bridge", None, Some(30))
            .patterns(P::HIP_HINGE)
            .joints(Joints::HIP)
            .build(),
        VariationBuilder::new(502, 5, "Single-Leg Glute Bridge", Some(30), Some(60))
            .patterns(P::HIP_HINGE)
            .joints(Joints::HIP)
            .build(),
        VariationBuilder::new(503, 5, "Kettlebell Swing", Some(60), None)
            .patterns(P::HIP_HINGE)
            .joints(Joints::HIP | Joints::KNEE)
            .kind(ExerciseType::STRENGTH | ExerciseType::CARDIO, ExerciseFocus::POWER)
            .equipment(vec![group("Kettlebell", &[KETTLEBELL], true)])
            .build(),
        VariationBuilder::new(504, 5, "Romanian Deadlift", Some(30), None)
            .patterns(P::HIP_HINGE)
            .joints(Joints::HIP)
            .equipment(vec![group("Dumbbells", &[DUMBBELLS], true), barbell])
            .build(),
        // Split squat
        VariationBuilder::new(601, 6, "Split Squat", None, Some(40))
            .patterns(P::LUNGE)
            .joints(leg_joints)
            .build(),
        VariationBuilder::new(602, 6, "Reverse Lunge", Some(40), Some(70))
            .patterns(P::LUNGE)
            .joints(leg_joints)
            .build(),
        VariationBuilder::new(603, 6, "Bulgarian Split Squat", Some(70), None)
            .patterns(P::LUNGE)
            .joints(leg_joints)
            .equipment(vec![group("Bench", &[BENCH], false)])
            .build(),
        VariationBuilder::new(604, 6, "Jumping Lunge", Some(70), None)
            .patterns(P::LUNGE)
            .joints(leg_joints)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::POWER)
            .plyometric()
            .sport(SportsFocus::Soccer)
            .build(),
        // Plank
        VariationBuilder::new(701, 7, "Knee Plank", None, Some(25))
            .patterns(P::ANTI_ROTATION)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::SPINE)
            .isometric()
            .build(),
        VariationBuilder::new(702, 7, "Front Plank", Some(25), Some(50))
            .patterns(P::ANTI_ROTATION)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::SPINE)
            .isometric()
            .build(),
        VariationBuilder::new(703, 7, "Side Plank", Some(50), None)
            .patterns(P::ANTI_ROTATION)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::SPINE)
            .isometric()
            .build(),
        // Pike press
        VariationBuilder::new(801, 8, "Pike Push-up", None, Some(50))
            .patterns(P::VERTICAL_PUSH)
            .joints(push_joints)
            .build(),
        VariationBuilder::new(802, 8, "Elevated Pike Push-up", Some(50), None)
            .patterns(P::VERTICAL_PUSH)
            .joints(push_joints)
            .build(),
        VariationBuilder::new(803, 8, "Dumbbell Shoulder Press", None, None)
            .patterns(P::VERTICAL_PUSH)
            .joints(push_joints)
            .equipment(vec![group("Dumbbells", &[DUMBBELLS], true)])
            .build(),
        // Isolation
        VariationBuilder::new(901, 9, "Calf Raise", None, Some(40))
            .joints(Joints::ANKLE)
            .build(),
        VariationBuilder::new(902, 9, "Single-Leg Calf Raise", Some(40), None)
            .joints(Joints::ANKLE)
            .build(),
        VariationBuilder::new(1001, 10, "Band Curl", None, None)
            .joints(Joints::ELBOW)
            .equipment(vec![group("Band", &[RESISTANCE_BAND], false)])
            .build(),
        VariationBuilder::new(1002, 10, "Dumbbell Curl", None, None)
            .joints(Joints::ELBOW)
            .equipment(vec![group("Dumbbells", &[DUMBBELLS], true)])
            .build(),
        VariationBuilder::new(1101, 11, "Dead Bug", None, None)
            .patterns(P::ANTI_ROTATION)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::HIP | Joints::SPINE)
            .build(),
        // Stretches
        VariationBuilder::new(1201, 12, "Kneeling Hip Flexor Stretch", None, None)
            .kind(stretching, flex)
            .stretches(M::HIP_FLEXORS | M::QUADRICEPS)
            .joints(Joints::HIP)
            .isometric()
            .build(),
        VariationBuilder::new(1301, 13, "Standing Hamstring Stretch", None, None)
            .kind(stretching, flex)
            .stretches(M::HAMSTRINGS | M::CALVES)
            .joints(Joints::HIP | Joints::KNEE)
            .isometric()
            .build(),
        VariationBuilder::new(1401, 14, "Doorway Chest Stretch", None, None)
            .kind(stretching, flex)
            .stretches(M::PECTORALS | M::DELTOIDS)
            .joints(Joints::SHOULDER)
            .isometric()
            .build(),
        // Mobility
        VariationBuilder::new(1501, 15, "Shoulder CARs", None, None)
            .kind(mobility, flex)
            .stretches(M::ROTATOR_CUFF)
            .joints(Joints::SHOULDER)
            .build(),
        VariationBuilder::new(1601, 16, "Hip CARs", None, None)
            .kind(mobility, flex)
            .stretches(M::HIP_FLEXORS | M::HIP_ADDUCTORS)
            .joints(Joints::HIP)
            .build(),
        VariationBuilder::new(1701, 17, "Cat-Cow", None, None)
            .kind(mobility, flex)
            .stretches(M::ERECTOR_SPINAE)
            .joints(Joints::SPINE)
            .build(),
        // Rehab
        VariationBuilder::new(1801, 18, "Band External Rotation", None, None)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::SHOULDER)
            .equipment(vec![
                group("Band", &[RESISTANCE_BAND], false),
                EquipmentGroup::bodyweight(),
            ])
            .build(),
        VariationBuilder::new(1901, 19, "Terminal Knee Extension", None, None)
            .kind(ExerciseType::STRENGTH, ExerciseFocus::STABILITY)
            .joints(Joints::KNEE)
            .build(),
        // Cardio warmup
        VariationBuilder::new(2001, 20, "Jumping Jacks", None, None)
            .kind(ExerciseType::CARDIO, ExerciseFocus::ENDURANCE)
            .joints(Joints::SHOULDER | Joints::ANKLE)
            .plyometric()
            .build(),
    ]
    .into_iter()
    .map(|v| (v.id, v))
    .collect();

    Catalog {
        exercises,
        variations,
        equipment,
    }
}

impl Catalog {
    /// All exercises, enabled or not.
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.get(&id)
    }

    pub fn variation(&self, id: VariationId) -> Option<&Variation> {
        self.variations.get(&id)
    }

    /// Variations of one exercise, in id order.
    pub fn variations_of(&self, exercise: ExerciseId) -> impl Iterator<Item = &Variation> {
        self.variations
            .values()
            .filter(move |v| v.exercise_id == exercise)
    }

    pub fn prerequisites(&self, exercise: ExerciseId) -> &[Prerequisite] {
        self.exercises
            .get(&exercise)
            .map(|e| e.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    pub fn equipment_groups(&self, variation: VariationId) -> &[EquipmentGroup] {
        self.variations
            .get(&variation)
            .map(|v| v.equipment_groups.as_slice())
            .unwrap_or(&[])
    }

    /// Look up equipment by display name, case-insensitively.
    pub fn equipment_by_name(&self, name: &str) -> Option<EquipmentId> {
        self.equipment
            .values()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
            .map(|e| e.id)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if *id != exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
            if exercise.proficiency > 100 {
                errors.push(format!(
                    "Exercise '{}': proficiency {} > 100",
                    id, exercise.proficiency
                ));
            }
            if let Some(recovery) = exercise.recovery_muscle {
                if !recovery.is_single() {
                    errors.push(format!(
                        "Exercise '{}': recovery muscle must be a single muscle group",
                        id
                    ));
                }
            }
            for prerequisite in &exercise.prerequisites {
                if prerequisite.exercise_id == *id {
                    errors.push(format!("Exercise '{}' is its own prerequisite", id));
                } else if !self.exercises.contains_key(&prerequisite.exercise_id) {
                    errors.push(format!(
                        "Exercise '{}' references non-existent prerequisite '{}'",
                        id, prerequisite.exercise_id
                    ));
                }
            }
            if self.variations_of(*id).next().is_none() {
                errors.push(format!("Exercise '{}' has no variations", id));
            }
        }

        for (id, variation) in &self.variations {
            if *id != variation.id {
                errors.push(format!(
                    "Variation key '{}' doesn't match variation.id '{}'",
                    id, variation.id
                ));
            }
            if variation.name.is_empty() {
                errors.push(format!("Variation '{}' has empty name", id));
            }
            if !self.exercises.contains_key(&variation.exercise_id) {
                errors.push(format!(
                    "Variation '{}' references non-existent exercise '{}'",
                    id, variation.exercise_id
                ));
            }
            if let ProgressionRange {
                min: Some(min),
                max: Some(max),
            } = variation.progression
            {
                if min > max {
                    errors.push(format!(
                        "Variation '{}': progression min {} > max {}",
                        id, min, max
                    ));
                }
            }
            if variation.equipment_groups.is_empty() {
                errors.push(format!("Variation '{}' has no equipment groups", id));
            }
            for group in &variation.equipment_groups {
                for item in group.equipment.iter().chain(&group.children) {
                    if !self.equipment.contains_key(item) {
                        errors.push(format!(
                            "Variation '{}' references non-existent equipment '{}'",
                            id, item
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_every_exercise_has_a_variation() {
        let catalog = get_default_catalog();
        for exercise in catalog.exercises() {
            assert!(
                catalog.variations_of(exercise.id).next().is_some(),
                "Exercise {} has no variations",
                exercise.name
            );
        }
    }

    #[test]
    fn test_recovery_exercises_exist() {
        let catalog = get_default_catalog();
        let recovery: Vec<_> = catalog
            .exercises()
            .filter_map(|e| e.recovery_muscle)
            .collect();
        assert!(recovery.contains(&MuscleGroups::ROTATOR_CUFF));
        assert!(recovery.contains(&MuscleGroups::QUADRICEPS));
    }

    #[test]
    fn test_validate_flags_inverted_range_and_missing_parent() {
        let mut catalog = build_default_catalog();
        let variation = catalog.variations.get_mut(&VariationId(101)).unwrap();
        variation.progression = ProgressionRange::new(Some(50), Some(10));
        variation.exercise_id = ExerciseId(999);

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("min 50 > max 10")));
        assert!(errors.iter().any(|e| e.contains("non-existent exercise '999'")));
    }

    #[test]
    fn test_equipment_by_name_is_case_insensitive() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.equipment_by_name("pull-up bar"), Some(PULLUP_BAR));
        assert_eq!(catalog.equipment_by_name(" Dumbbells "), Some(DUMBBELLS));
        assert_eq!(catalog.equipment_by_name("rowing machine"), None);
    }

    #[test]
    fn test_prerequisite_lookup() {
        let catalog = get_default_catalog();
        let prerequisites = catalog.prerequisites(ExerciseId(2));
        assert_eq!(prerequisites.len(), 1);
        assert_eq!(prerequisites[0].exercise_id, ExerciseId(3));
        assert!(catalog.prerequisites(ExerciseId(999)).is_empty());
        assert_eq!(catalog.equipment_groups(VariationId(404))[0].children, vec![WEIGHT_PLATES]);
    }
}
