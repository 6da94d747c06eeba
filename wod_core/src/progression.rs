//! Progression resolver: which variation of an exercise fits the user's skill.
//!
//! Per exercise, the variation(s) whose range contains the skill score win.
//! When that tier is unusable because it is ignored or needs missing
//! equipment, the exercise falls back one tier: first to the closest easier
//! tier, then to the closest harder tier, never skipping an intermediate
//! variation.

use crate::filter::Candidate;
use crate::types::*;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

/// Why the tier containing the skill score cannot be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnusableReason {
    Ignored,
    MissingEquipment,
}

impl fmt::Display for UnusableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnusableReason::Ignored => write!(f, "Ignored"),
            UnusableReason::MissingEquipment => write!(f, "Missing Equipment"),
        }
    }
}

/// The nearest easier or harder variation of an exercise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdjacentVariation {
    pub variation_id: VariationId,
    pub reason: Option<UnusableReason>,
}

/// Per-exercise facts computed over every enabled variation of the exercise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressionFacts {
    pub all_current_ignored: bool,
    pub all_current_missing_equipment: bool,
    /// Every in-range variation is ignored or missing equipment, for any mix
    /// of the two.
    pub all_current_unusable: bool,
    pub easier: Option<AdjacentVariation>,
    pub harder: Option<AdjacentVariation>,
    /// Nearest range boundary above the score among non-ignored variations.
    pub next_progression: Option<u8>,
}

impl ProgressionFacts {
    pub fn current_reason(&self) -> Option<UnusableReason> {
        if self.all_current_ignored {
            Some(UnusableReason::Ignored)
        } else if self.all_current_missing_equipment {
            Some(UnusableReason::MissingEquipment)
        } else {
            None
        }
    }

    pub fn current_unusable(&self) -> bool {
        self.all_current_unusable
    }
}

/// A candidate chosen by the resolver, with the facts that explain it.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedCandidate<'a> {
    pub candidate: Candidate<'a>,
    pub facts: ProgressionFacts,
}

#[derive(Clone, Copy, Debug)]
pub struct ResolveOptions {
    /// Allow falling back one tier when the current tier is unusable.
    pub fallback: bool,
    pub cap_at_proficiency: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fallback: true,
            cap_at_proficiency: false,
        }
    }
}

/// Compute the progression facts of one exercise for a user.
pub fn progression_facts(
    catalog: &Catalog,
    user: &UserContext,
    exercise: &Exercise,
    cap_at_proficiency: bool,
) -> ProgressionFacts {
    let all: Vec<_> = catalog
        .variations_of(exercise.id)
        .filter(|v| v.is_enabled())
        .map(|v| Candidate::new(exercise, v, Some(user), cap_at_proficiency))
        .collect();
    let score = all.first().map_or(DEFAULT_SKILL, |c| c.skill_score);

    let current: Vec<_> = all.iter().filter(|c| c.in_range()).collect();
    let all_current_ignored = current.iter().all(|c| c.is_ignored);
    let all_current_missing_equipment = current.iter().all(|c| !c.has_equipment);
    let all_current_unusable = current.iter().all(|c| c.is_unusable());
    let reason = if all_current_ignored {
        Some(UnusableReason::Ignored)
    } else if all_current_missing_equipment {
        Some(UnusableReason::MissingEquipment)
    } else {
        None
    };

    let easier = all
        .iter()
        .filter_map(|c| c.variation.progression.max.map(|max| (max, c)))
        .filter(|(max, _)| *max <= score)
        .min_by_key(|(max, c)| (Reverse(*max), c.variation.id))
        .map(|(_, c)| AdjacentVariation {
            variation_id: c.variation.id,
            reason,
        });

    let harder = all
        .iter()
        .filter_map(|c| c.variation.progression.min.map(|min| (min, c)))
        .filter(|(min, _)| *min > score)
        .min_by_key(|(min, c)| (*min, c.variation.id))
        .map(|(_, c)| AdjacentVariation {
            variation_id: c.variation.id,
            reason,
        });

    let next_progression = all
        .iter()
        .filter(|c| !c.is_ignored)
        .flat_map(|c| [c.variation.progression.min, c.variation.progression.max])
        .flatten()
        .filter(|bound| *bound > score)
        .min();

    ProgressionFacts {
        all_current_ignored,
        all_current_missing_equipment,
        all_current_unusable,
        easier,
        harder,
        next_progression,
    }
}

/// Pick the variation(s) to surface for every exercise in a filtered pool.
///
/// Without a user there is no skill score, so every candidate surfaces.
pub fn resolve<'a>(
    catalog: &'a Catalog,
    user: Option<&UserContext>,
    pool: Vec<Candidate<'a>>,
    options: ResolveOptions,
) -> Vec<ResolvedCandidate<'a>> {
    let Some(user) = user else {
        return pool
            .into_iter()
            .map(|candidate| ResolvedCandidate {
                candidate,
                facts: ProgressionFacts::default(),
            })
            .collect();
    };

    let mut by_exercise: BTreeMap<ExerciseId, Vec<Candidate<'a>>> = BTreeMap::new();
    for candidate in pool {
        by_exercise
            .entry(candidate.exercise.id)
            .or_default()
            .push(candidate);
    }

    let mut resolved = Vec::new();
    for candidates in by_exercise.values() {
        let exercise = candidates[0].exercise;
        let facts = progression_facts(catalog, user, exercise, options.cap_at_proficiency);
        let chosen = resolve_exercise(catalog, exercise, candidates, &facts, options);

        if chosen.is_empty() {
            tracing::debug!(
                "No usable variation of '{}' ({:?})",
                exercise.name,
                facts.current_reason()
            );
        }
        resolved.extend(
            chosen
                .into_iter()
                .map(|candidate| ResolvedCandidate { candidate, facts }),
        );
    }
    resolved
}

fn resolve_exercise<'a>(
    catalog: &Catalog,
    exercise: &Exercise,
    candidates: &[Candidate<'a>],
    facts: &ProgressionFacts,
    options: ResolveOptions,
) -> Vec<Candidate<'a>> {
    let current: Vec<_> = candidates.iter().filter(|c| c.in_range()).copied().collect();
    if !current.is_empty() {
        return current;
    }
    if !options.fallback || !facts.current_unusable() {
        return current;
    }

    let score = candidates[0].skill_score;
    let ranges: Vec<_> = catalog
        .variations_of(exercise.id)
        .filter(|v| v.is_enabled())
        .map(|v| v.progression)
        .collect();

    // Closest easier tier: the largest max bound at or below the score.
    let closest_max = ranges
        .iter()
        .filter_map(|r| r.max)
        .filter(|max| *max <= score)
        .max();
    if let Some(max) = closest_max {
        let easier: Vec<_> = candidates
            .iter()
            .filter(|c| c.variation.progression.max == Some(max))
            .copied()
            .collect();
        if !easier.is_empty() {
            return easier;
        }
    }

    // Closest harder tier, never past the next non-ignored boundary.
    let Some(next) = facts.next_progression else {
        return Vec::new();
    };
    let closest_min = ranges
        .iter()
        .filter_map(|r| r.min)
        .filter(|min| *min > score && *min <= next)
        .min();
    match closest_min {
        Some(min) => candidates
            .iter()
            .filter(|c| c.variation.progression.min == Some(min))
            .copied()
            .collect(),
        None => Vec::new(),
    }
}
