//! Bit-set types for muscles, movement patterns and the other catalog tags.
//!
//! Muscles and patterns are stored as fixed-width bit sets so coverage checks
//! reduce to `&`, `|`, and a popcount. Composite constants (e.g. `CORE`) are
//! unions of the single-bit members and are never stored on their own.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Popcount and single-bit decomposition for a bit-set type.
macro_rules! single_bit_helpers {
    ($name:ident, $bits:ty) => {
        impl $name {
            /// Number of single-bit members in the set.
            #[must_use]
            pub fn count(self) -> u32 {
                self.bits().count_ones()
            }

            /// Decompose into single-bit values, lowest bit first.
            pub fn single_flags(self) -> impl Iterator<Item = $name> {
                let bits = self.bits();
                (0..<$bits>::BITS)
                    .map(|i| (1 as $bits) << i)
                    .filter(move |bit| bits & bit != 0)
                    .map($name::from_bits_retain)
            }

            /// Whether the value holds exactly one bit.
            #[must_use]
            pub fn is_single(self) -> bool {
                self.count() == 1
            }
        }
    };
}

bitflags! {
    /// Muscle groups an exercise works.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MuscleGroups: u32 {
        const ABDOMINALS = 1 << 0;
        const OBLIQUES = 1 << 1;
        const ERECTOR_SPINAE = 1 << 2;
        const PECTORALS = 1 << 3;
        const LATS = 1 << 4;
        const TRAPS = 1 << 5;
        const RHOMBOIDS = 1 << 6;
        const DELTOIDS = 1 << 7;
        const ROTATOR_CUFF = 1 << 8;
        const BICEPS = 1 << 9;
        const TRICEPS = 1 << 10;
        const FOREARMS = 1 << 11;
        const GLUTES = 1 << 12;
        const HIP_FLEXORS = 1 << 13;
        const QUADRICEPS = 1 << 14;
        const HAMSTRINGS = 1 << 15;
        const HIP_ADDUCTORS = 1 << 16;
        const HIP_ABDUCTORS = 1 << 17;
        const CALVES = 1 << 18;

        const CORE = Self::ABDOMINALS.bits() | Self::OBLIQUES.bits() | Self::ERECTOR_SPINAE.bits();
        const UPPER_PUSH = Self::PECTORALS.bits() | Self::DELTOIDS.bits() | Self::TRICEPS.bits();
        const UPPER_PULL = Self::LATS.bits()
            | Self::TRAPS.bits()
            | Self::RHOMBOIDS.bits()
            | Self::ROTATOR_CUFF.bits()
            | Self::BICEPS.bits()
            | Self::FOREARMS.bits();
        const UPPER_BODY = Self::UPPER_PUSH.bits() | Self::UPPER_PULL.bits();
        const LOWER_BODY = Self::GLUTES.bits()
            | Self::HIP_FLEXORS.bits()
            | Self::QUADRICEPS.bits()
            | Self::HAMSTRINGS.bits()
            | Self::HIP_ADDUCTORS.bits()
            | Self::HIP_ABDUCTORS.bits()
            | Self::CALVES.bits();
    }
}

single_bit_helpers!(MuscleGroups, u32);

impl MuscleGroups {
    /// Human-readable name of a single muscle group.
    pub fn display_name(self) -> &'static str {
        match self {
            m if m == Self::ABDOMINALS => "Abdominals",
            m if m == Self::OBLIQUES => "Obliques",
            m if m == Self::ERECTOR_SPINAE => "Erector Spinae",
            m if m == Self::PECTORALS => "Pectorals",
            m if m == Self::LATS => "Lats",
            m if m == Self::TRAPS => "Traps",
            m if m == Self::RHOMBOIDS => "Rhomboids",
            m if m == Self::DELTOIDS => "Deltoids",
            m if m == Self::ROTATOR_CUFF => "Rotator Cuff",
            m if m == Self::BICEPS => "Biceps",
            m if m == Self::TRICEPS => "Triceps",
            m if m == Self::FOREARMS => "Forearms",
            m if m == Self::GLUTES => "Glutes",
            m if m == Self::HIP_FLEXORS => "Hip Flexors",
            m if m == Self::QUADRICEPS => "Quadriceps",
            m if m == Self::HAMSTRINGS => "Hamstrings",
            m if m == Self::HIP_ADDUCTORS => "Hip Adductors",
            m if m == Self::HIP_ABDUCTORS => "Hip Abductors",
            m if m == Self::CALVES => "Calves",
            _ => "Multiple",
        }
    }
}

bitflags! {
    /// Movement patterns a variation trains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MovementPattern: u16 {
        const HORIZONTAL_PUSH = 1 << 0;
        const HORIZONTAL_PULL = 1 << 1;
        const VERTICAL_PUSH = 1 << 2;
        const VERTICAL_PULL = 1 << 3;
        const SQUAT = 1 << 4;
        const LUNGE = 1 << 5;
        const HIP_HINGE = 1 << 6;
        const ROTATION = 1 << 7;
        const ANTI_ROTATION = 1 << 8;
        const CARRY = 1 << 9;

        const UPPER = Self::HORIZONTAL_PUSH.bits()
            | Self::HORIZONTAL_PULL.bits()
            | Self::VERTICAL_PUSH.bits()
            | Self::VERTICAL_PULL.bits();
        const LOWER = Self::SQUAT.bits() | Self::LUNGE.bits() | Self::HIP_HINGE.bits();
    }
}

single_bit_helpers!(MovementPattern, u16);

bitflags! {
    /// What kind of training a variation is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExerciseType: u8 {
        const STRENGTH = 1 << 0;
        const CARDIO = 1 << 1;
        const MOBILITY = 1 << 2;
        const STRETCHING = 1 << 3;
        const BALANCE = 1 << 4;
    }
}

bitflags! {
    /// Joints a variation loads through a range of motion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Joints: u8 {
        const SHOULDER = 1 << 0;
        const ELBOW = 1 << 1;
        const WRIST = 1 << 2;
        const SPINE = 1 << 3;
        const HIP = 1 << 4;
        const KNEE = 1 << 5;
        const ANKLE = 1 << 6;
    }
}

bitflags! {
    /// Training quality a variation develops.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExerciseFocus: u8 {
        const STRENGTH = 1 << 0;
        const STABILITY = 1 << 1;
        const ENDURANCE = 1 << 2;
        const FLEXIBILITY = 1 << 3;
        const SPEED = 1 << 4;
        const POWER = 1 << 5;
    }
}

bitflags! {
    /// Whether the working muscle changes length.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MuscleContraction: u8 {
        const STATIC = 1 << 0;
        const DYNAMIC = 1 << 1;
    }
}

bitflags! {
    /// How the working muscle moves under load.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MuscleMovement: u8 {
        const ISOMETRIC = 1 << 0;
        const ISOTONIC = 1 << 1;
        const ISOKINETIC = 1 << 2;
        const PLYOMETRIC = 1 << 3;
    }
}

bitflags! {
    /// Exercise families, used to exclude a whole family once one member is picked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExerciseGroup: u16 {
        const PUSHUP = 1 << 0;
        const PULLUP = 1 << 1;
        const SQUAT = 1 << 2;
        const HINGE = 1 << 3;
        const LUNGE = 1 << 4;
        const PLANK = 1 << 5;
        const ROW = 1 << 6;
        const STRETCH = 1 << 7;
        const CARS = 1 << 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flags_decomposes_composites() {
        let core: Vec<_> = MuscleGroups::CORE.single_flags().collect();
        assert_eq!(
            core,
            vec![
                MuscleGroups::ABDOMINALS,
                MuscleGroups::OBLIQUES,
                MuscleGroups::ERECTOR_SPINAE
            ]
        );
        assert!(core.iter().all(|m| m.is_single()));
    }

    #[test]
    fn test_count_is_popcount() {
        assert_eq!(MuscleGroups::empty().count(), 0);
        assert_eq!(MuscleGroups::UPPER_PUSH.count(), 3);
        assert_eq!(MovementPattern::UPPER.count(), 4);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(MuscleGroups::HAMSTRINGS.display_name(), "Hamstrings");
        assert_eq!(MuscleGroups::CORE.display_name(), "Multiple");
    }

    #[test]
    fn test_serde_uses_flag_names() {
        let json = serde_json::to_string(&(MuscleGroups::GLUTES | MuscleGroups::CALVES)).unwrap();
        let parsed: MuscleGroups = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MuscleGroups::GLUTES | MuscleGroups::CALVES);
    }
}
