//! Periodization: weekly muscle volume, deload timing and split rotation.
//!
//! Everything here is derived from the workout history on demand; nothing is
//! stored. Records are expected newest first, but the functions only rely on
//! record dates.

use crate::config::MAX_WEEKS;
use crate::flags::{MovementPattern, MuscleGroups};
use crate::types::*;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// One focus in a cyclic split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationBucket {
    pub index: usize,
    pub name: &'static str,
    pub muscle_groups: MuscleGroups,
    pub movement_patterns: MovementPattern,
}

const fn bucket(
    index: usize,
    name: &'static str,
    muscle_groups: MuscleGroups,
    movement_patterns: MovementPattern,
) -> RotationBucket {
    RotationBucket {
        index,
        name,
        muscle_groups,
        movement_patterns,
    }
}

const FULL_BODY: MuscleGroups = MuscleGroups::UPPER_BODY
    .union(MuscleGroups::LOWER_BODY)
    .union(MuscleGroups::CORE);
const PUSH: MuscleGroups = MuscleGroups::UPPER_PUSH;
const PULL: MuscleGroups = MuscleGroups::UPPER_PULL.union(MuscleGroups::ERECTOR_SPINAE);
const LEGS: MuscleGroups = MuscleGroups::LOWER_BODY.union(MuscleGroups::CORE);
const PUSH_PATTERNS: MovementPattern =
    MovementPattern::HORIZONTAL_PUSH.union(MovementPattern::VERTICAL_PUSH);
const PULL_PATTERNS: MovementPattern =
    MovementPattern::HORIZONTAL_PULL.union(MovementPattern::VERTICAL_PULL);
const LEG_PATTERNS: MovementPattern = MovementPattern::SQUAT
    .union(MovementPattern::LUNGE)
    .union(MovementPattern::HIP_HINGE);

const FULL_BODY_2_DAY: [RotationBucket; 2] = [
    bucket(
        0,
        "Full Body A",
        FULL_BODY,
        MovementPattern::HORIZONTAL_PUSH
            .union(MovementPattern::VERTICAL_PULL)
            .union(MovementPattern::SQUAT),
    ),
    bucket(
        1,
        "Full Body B",
        FULL_BODY,
        MovementPattern::VERTICAL_PUSH
            .union(MovementPattern::HORIZONTAL_PULL)
            .union(MovementPattern::HIP_HINGE),
    ),
];

const UPPER_LOWER_4_DAY: [RotationBucket; 4] = [
    bucket(
        0,
        "Upper A",
        MuscleGroups::UPPER_BODY,
        MovementPattern::HORIZONTAL_PUSH.union(MovementPattern::HORIZONTAL_PULL),
    ),
    bucket(
        1,
        "Lower A",
        LEGS,
        MovementPattern::SQUAT.union(MovementPattern::HIP_HINGE),
    ),
    bucket(
        2,
        "Upper B",
        MuscleGroups::UPPER_BODY,
        MovementPattern::VERTICAL_PUSH.union(MovementPattern::VERTICAL_PULL),
    ),
    bucket(
        3,
        "Lower B",
        LEGS,
        MovementPattern::LUNGE.union(MovementPattern::HIP_HINGE),
    ),
];

const PUSH_PULL_LEGS_3_DAY: [RotationBucket; 3] = [
    bucket(0, "Push", PUSH, PUSH_PATTERNS),
    bucket(1, "Pull", PULL, PULL_PATTERNS),
    bucket(2, "Legs", LEGS, LEG_PATTERNS),
];

const PUSH_PULL_LEGS_6_DAY: [RotationBucket; 6] = [
    bucket(0, "Push A", PUSH, MovementPattern::HORIZONTAL_PUSH),
    bucket(1, "Pull A", PULL, MovementPattern::VERTICAL_PULL),
    bucket(
        2,
        "Legs A",
        LEGS,
        MovementPattern::SQUAT.union(MovementPattern::HIP_HINGE),
    ),
    bucket(3, "Push B", PUSH, MovementPattern::VERTICAL_PUSH),
    bucket(4, "Pull B", PULL, MovementPattern::HORIZONTAL_PULL),
    bucket(
        5,
        "Legs B",
        LEGS,
        MovementPattern::LUNGE.union(MovementPattern::HIP_HINGE),
    ),
];

impl Frequency {
    /// The ordered split this track cycles through.
    pub fn rotation(self) -> &'static [RotationBucket] {
        match self {
            Frequency::FullBody2Day => &FULL_BODY_2_DAY,
            Frequency::UpperLower4Day => &UPPER_LOWER_4_DAY,
            Frequency::PushPullLegs3Day => &PUSH_PULL_LEGS_3_DAY,
            Frequency::PushPullLegs6Day => &PUSH_PULL_LEGS_6_DAY,
        }
    }
}

/// Most recent record matching `pred`; the earliest listed wins a date tie.
fn latest<'r>(
    records: &'r [WorkoutRecord],
    pred: impl Fn(&WorkoutRecord) -> bool,
) -> Option<&'r WorkoutRecord> {
    records
        .iter()
        .filter(|r| pred(r))
        .fold(None, |best: Option<&WorkoutRecord>, r| match best {
            Some(b) if b.date >= r.date => Some(b),
            _ => Some(r),
        })
}

/// Next bucket on a frequency track.
///
/// Only records of the same track count, so switching splits resumes each
/// track where it left off.
pub fn advance_rotation(frequency: Frequency, records: &[WorkoutRecord]) -> RotationBucket {
    let split = frequency.rotation();
    let next = match latest(records, |r| r.frequency == frequency) {
        Some(last) => (last.rotation + 1) % split.len(),
        None => 0,
    };
    split[next]
}

/// Start of the calendar week (Sunday) containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeloadStatus {
    pub needs_deload: bool,
    pub time_until_deload: Duration,
}

/// Whether this week should be a deload week.
pub fn needs_deload(user: &User, records: &[WorkoutRecord], today: NaiveDate) -> DeloadStatus {
    let this_week = week_start(today);
    let last_deload = latest(records, |r| r.is_deload);

    if last_deload.is_some_and(|r| week_start(r.date) == this_week) {
        return DeloadStatus {
            needs_deload: true,
            time_until_deload: Duration::zero(),
        };
    }

    let start = week_start(last_deload.map_or(user.created, |r| r.date));
    let cadence = Duration::weeks(i64::from(user.deload_cadence_weeks.min(MAX_WEEKS)));
    let countdown = start + cadence - this_week;

    DeloadStatus {
        needs_deload: countdown <= Duration::zero(),
        time_until_deload: countdown.max(Duration::zero()),
    }
}

/// Average weekly set volume per single muscle group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeeklyVolume {
    muscles: BTreeMap<MuscleGroups, f64>,
}

impl WeeklyVolume {
    /// `None` when no source in the window worked this muscle.
    pub fn get(&self, muscle: MuscleGroups) -> Option<f64> {
        self.muscles.get(&muscle).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MuscleGroups, f64)> + '_ {
        self.muscles.iter().map(|(m, v)| (*m, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.muscles.is_empty()
    }

    fn add(&mut self, other: BTreeMap<MuscleGroups, f64>) {
        for (muscle, volume) in other {
            *self.muscles.entry(muscle).or_default() += volume;
        }
    }
}

/// Trailing weekly volume per muscle, or `None` for new and demo users.
pub fn weekly_volume(
    user: &User,
    catalog: &Catalog,
    records: &[WorkoutRecord],
    today: NaiveDate,
) -> Option<WeeklyVolume> {
    if user.is_new_to_fitness || user.is_demo {
        return None;
    }

    let window = user.volume_window_weeks.clamp(1, MAX_WEEKS);
    let since = today - Duration::weeks(i64::from(window));
    let in_window: Vec<_> = records
        .iter()
        .filter(|r| r.date >= since && r.date <= today)
        .collect();

    let mut volume = WeeklyVolume::default();
    for kind in [WorkoutKind::Strength, WorkoutKind::Mobility] {
        let source: Vec<_> = in_window.iter().filter(|r| r.kind == kind).copied().collect();
        if let Some(per_muscle) = source_volume(catalog, &source, today, window) {
            volume.add(per_muscle);
        }
    }
    Some(volume)
}

/// Volume of one source divided by its elapsed span in weeks.
fn source_volume(
    catalog: &Catalog,
    records: &[&WorkoutRecord],
    today: NaiveDate,
    window: u32,
) -> Option<BTreeMap<MuscleGroups, f64>> {
    let oldest = records.iter().map(|r| r.date).min()?;
    let weeks = ((today - oldest).num_days() as f64 / 7.0).clamp(1.0, f64::from(window));

    let mut totals: BTreeMap<MuscleGroups, f64> = BTreeMap::new();
    for entry in records.iter().flat_map(|r| r.entries.iter()) {
        let Some(exercise) = catalog
            .variation(entry.variation_id)
            .and_then(|v| catalog.exercise(v.exercise_id))
        else {
            continue;
        };
        let set_volume = entry.intensity.proficiency().volume();
        for muscle in exercise.primary_muscles.single_flags() {
            *totals.entry(muscle).or_default() += set_volume;
        }
        for muscle in exercise.secondary_muscles.single_flags() {
            *totals.entry(muscle).or_default() += set_volume / 3.0;
        }
    }

    for total in totals.values_mut() {
        *total /= weeks;
    }
    Some(totals)
}

/// Per-muscle target nudges from comparing volume with preferences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VolumeAdjustments {
    pub adjustments: BTreeMap<MuscleGroups, i32>,
}

impl VolumeAdjustments {
    /// `+1` for muscles under their preferred minimum, `-1` over the maximum.
    ///
    /// A muscle with no recorded volume counts as zero.
    pub fn from_volume(volume: Option<&WeeklyVolume>, preferences: &[VolumePreference]) -> Self {
        let Some(volume) = volume else {
            return Self::default();
        };
        let mut adjustments = BTreeMap::new();
        for pref in preferences {
            for muscle in pref.muscle.single_flags() {
                let actual = volume.get(muscle).unwrap_or(0.0);
                if actual < pref.min {
                    adjustments.insert(muscle, 1);
                } else if actual > pref.max {
                    adjustments.insert(muscle, -1);
                }
            }
        }
        Self { adjustments }
    }

    /// Add the nudges onto a target map, creating entries as needed.
    pub fn apply(&self, targets: &mut BTreeMap<MuscleGroups, i32>) {
        for (muscle, delta) in &self.adjustments {
            *targets.entry(*muscle).or_default() += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::testing::*;
    use uuid::Uuid;

    fn record(date: NaiveDate, kind: WorkoutKind, entries: &[(u32, IntensityLevel)]) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: UserId(1),
            date,
            frequency: Frequency::UpperLower4Day,
            rotation: 0,
            is_deload: false,
            kind,
            entries: entries
                .iter()
                .map(|(id, intensity)| WorkoutEntry {
                    variation_id: VariationId(*id),
                    intensity: *intensity,
                })
                .collect(),
        }
    }

    fn rotation_record(date: NaiveDate, frequency: Frequency, rotation: usize) -> WorkoutRecord {
        WorkoutRecord {
            frequency,
            rotation,
            ..record(date, WorkoutKind::Strength, &[])
        }
    }

    fn deload_record(date: NaiveDate) -> WorkoutRecord {
        WorkoutRecord {
            is_deload: true,
            ..record(date, WorkoutKind::Strength, &[])
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("muscle volume present");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    const MEDIUM: f64 = 3.0 * 10.0 * 0.75;

    #[test]
    fn test_weekly_volume_is_none_for_new_and_demo_users() {
        let catalog = ladder_catalog();
        let history = vec![record(date(2024, 3, 8), WorkoutKind::Strength, &[(1, IntensityLevel::Medium)])];

        let mut user = test_user(&[]);
        user.is_new_to_fitness = true;
        assert!(weekly_volume(&user, &catalog, &history, today()).is_none());

        let mut user = test_user(&[]);
        user.is_demo = true;
        assert!(weekly_volume(&user, &catalog, &history, today()).is_none());
    }

    #[test]
    fn test_short_history_clamps_to_one_week() {
        let catalog = ladder_catalog();
        let history = vec![record(date(2024, 3, 8), WorkoutKind::Strength, &[(1, IntensityLevel::Medium)])];
        let volume = weekly_volume(&test_user(&[]), &catalog, &history, today()).unwrap();

        assert_close(volume.get(MuscleGroups::PECTORALS), MEDIUM);
        assert_close(volume.get(MuscleGroups::TRICEPS), MEDIUM / 3.0);
        assert_eq!(volume.get(MuscleGroups::QUADRICEPS), None);
    }

    #[test]
    fn test_span_is_fractional_weeks() {
        let catalog = ladder_catalog();
        let history = vec![
            record(date(2024, 3, 8), WorkoutKind::Strength, &[(1, IntensityLevel::Medium)]),
            record(date(2024, 2, 14), WorkoutKind::Strength, &[(2, IntensityLevel::Medium)]),
        ];
        let volume = weekly_volume(&test_user(&[]), &catalog, &history, today()).unwrap();

        let weeks = 25.0 / 7.0;
        assert_close(volume.get(MuscleGroups::PECTORALS), 2.0 * MEDIUM / weeks);
    }

    #[test]
    fn test_sources_add_and_stale_entries_skip() {
        let catalog = ladder_catalog();
        let history = vec![
            record(date(2024, 3, 9), WorkoutKind::Strength, &[(1, IntensityLevel::Medium), (999, IntensityLevel::Heavy)]),
            record(date(2024, 3, 9), WorkoutKind::Mobility, &[(3, IntensityLevel::Medium)]),
            record(date(2023, 12, 1), WorkoutKind::Strength, &[(1, IntensityLevel::Heavy)]),
        ];
        let volume = weekly_volume(&test_user(&[]), &catalog, &history, today()).unwrap();
        assert_close(volume.get(MuscleGroups::PECTORALS), 2.0 * MEDIUM);
    }

    #[test]
    fn test_empty_history_has_no_muscles() {
        let volume = weekly_volume(&test_user(&[]), &ladder_catalog(), &[], today()).unwrap();
        assert!(volume.is_empty());
    }

    #[test]
    fn test_deload_due_after_cadence() {
        let user = test_user(&[]);
        let history = vec![deload_record(date(2024, 1, 7))];
        assert_eq!(week_start(date(2024, 2, 18)), date(2024, 2, 18));
        let status = needs_deload(&user, &history, date(2024, 2, 18));
        assert!(status.needs_deload);
        assert_eq!(status.time_until_deload, Duration::zero());
    }

    #[test]
    fn test_oversized_week_counts_do_not_overflow() {
        let mut user = test_user(&[]);
        user.deload_cadence_weeks = u32::MAX;
        user.volume_window_weeks = u32::MAX;

        let status = needs_deload(&user, &[], today());
        assert!(!status.needs_deload);
        assert!(weekly_volume(&user, get_default_catalog(), &[], today())
            .is_some_and(|v| v.is_empty()));
    }

    #[test]
    fn test_deload_counts_down_from_account_creation() {
        let mut user = test_user(&[]);
        user.created = date(2024, 2, 7);
        let status = needs_deload(&user, &[], today());
        assert!(!status.needs_deload);
        // Created in the week of 2024-02-04, due in the week of 2024-03-17.
        assert_eq!(status.time_until_deload, Duration::weeks(1));
    }

    #[test]
    fn test_deload_continues_through_its_week() {
        let user = test_user(&[]);
        let history = vec![deload_record(date(2024, 3, 10))];
        let status = needs_deload(&user, &history, date(2024, 3, 14));
        assert!(status.needs_deload);
        assert_eq!(status.time_until_deload, Duration::zero());

        let status = needs_deload(&user, &history, date(2024, 3, 17));
        assert!(!status.needs_deload);
        assert_eq!(status.time_until_deload, Duration::weeks(5));
    }

    #[test]
    fn test_week_starts_on_sunday() {
        assert_eq!(week_start(date(2024, 2, 18)), date(2024, 2, 18));
        assert_eq!(week_start(date(2024, 2, 24)), date(2024, 2, 18));
    }

    #[test]
    fn test_rotation_starts_at_zero_and_cycles() {
        let freq = Frequency::PushPullLegs3Day;
        assert_eq!(advance_rotation(freq, &[]).index, 0);

        let history = vec![
            rotation_record(date(2024, 3, 8), freq, 2),
            rotation_record(date(2024, 3, 6), freq, 1),
        ];
        assert_eq!(advance_rotation(freq, &history).name, "Push");

        let history = vec![rotation_record(date(2024, 3, 6), freq, 0)];
        assert_eq!(advance_rotation(freq, &history).name, "Pull");
    }

    #[test]
    fn test_rotation_tracks_are_independent() {
        let history = vec![
            rotation_record(date(2024, 3, 9), Frequency::FullBody2Day, 0),
            rotation_record(date(2024, 3, 7), Frequency::UpperLower4Day, 1),
        ];
        assert_eq!(advance_rotation(Frequency::UpperLower4Day, &history).index, 2);
        assert_eq!(advance_rotation(Frequency::FullBody2Day, &history).index, 1);
        assert_eq!(advance_rotation(Frequency::PushPullLegs6Day, &history).index, 0);
    }

    #[test]
    fn test_rotation_buckets_are_indexed_in_order() {
        for freq in [
            Frequency::FullBody2Day,
            Frequency::UpperLower4Day,
            Frequency::PushPullLegs3Day,
            Frequency::PushPullLegs6Day,
        ] {
            for (i, bucket) in freq.rotation().iter().enumerate() {
                assert_eq!(bucket.index, i);
                assert!(!bucket.muscle_groups.is_empty());
                assert!(!bucket.movement_patterns.is_empty());
            }
        }
    }

    #[test]
    fn test_volume_adjustments() {
        let catalog = ladder_catalog();
        let history = vec![record(date(2024, 3, 8), WorkoutKind::Strength, &[(1, IntensityLevel::Medium)])];
        let volume = weekly_volume(&test_user(&[]), &catalog, &history, today());

        let prefs = [
            VolumePreference { muscle: MuscleGroups::PECTORALS, min: 5.0, max: 10.0 },
            VolumePreference { muscle: MuscleGroups::TRICEPS | MuscleGroups::BICEPS, min: 10.0, max: 40.0 },
        ];
        let adjustments = VolumeAdjustments::from_volume(volume.as_ref(), &prefs);
        assert_eq!(adjustments.adjustments.get(&MuscleGroups::PECTORALS), Some(&-1));
        assert_eq!(adjustments.adjustments.get(&MuscleGroups::TRICEPS), Some(&1));
        assert_eq!(adjustments.adjustments.get(&MuscleGroups::BICEPS), Some(&1));

        let mut targets = BTreeMap::from([(MuscleGroups::PECTORALS, 1)]);
        adjustments.apply(&mut targets);
        assert_eq!(targets[&MuscleGroups::PECTORALS], 0);
        assert_eq!(targets[&MuscleGroups::BICEPS], 1);

        assert!(VolumeAdjustments::from_volume(None, &prefs).adjustments.is_empty());
    }
}
