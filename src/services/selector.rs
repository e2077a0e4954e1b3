//! Candidate selector.
//!
//! Pure selection policies over an already-produced candidate list. Fallback
//! between strategies is an explicit ordered chain tried in sequence, so the
//! policy is inspectable and each link independently testable.

use crate::domain::models::{
    CandidateResult, SelectionMetadata, SelectionOptions, SelectionResult, SelectionStrategy,
};
use tracing::debug;

const DEFAULT_MIN_AGREEMENT: f64 = 0.5;

/// Ordered fallback chain for a requested strategy.
fn fallback_chain(strategy: SelectionStrategy) -> &'static [SelectionStrategy] {
    match strategy {
        SelectionStrategy::FirstPass => {
            &[SelectionStrategy::FirstPass, SelectionStrategy::HighestProgress]
        }
        SelectionStrategy::ShortestCorrect => &[
            SelectionStrategy::ShortestCorrect,
            SelectionStrategy::HighestProgress,
        ],
        SelectionStrategy::MajorityVote => &[
            SelectionStrategy::MajorityVote,
            SelectionStrategy::ShortestCorrect,
            SelectionStrategy::HighestProgress,
        ],
        SelectionStrategy::HighestProgress => &[SelectionStrategy::HighestProgress],
    }
}

/// Select a single candidate using the requested strategy.
///
/// `selected` is `None` only for an empty input list. The reported strategy
/// is the link in the fallback chain that actually decided.
#[must_use]
pub fn select_candidate(
    candidates: &[CandidateResult],
    options: &SelectionOptions,
) -> SelectionResult {
    let min_agreement = options.min_agreement.unwrap_or(DEFAULT_MIN_AGREEMENT);
    let passing_count = candidates.iter().filter(|c| c.passed).count();
    let mut agreement_score: Option<f64> = None;

    for &strategy in fallback_chain(options.strategy) {
        let decision = match strategy {
            SelectionStrategy::FirstPass => try_first_pass(candidates),
            SelectionStrategy::ShortestCorrect => try_shortest_correct(candidates),
            SelectionStrategy::MajorityVote => {
                try_majority_vote(candidates, min_agreement, &mut agreement_score)
            }
            SelectionStrategy::HighestProgress => try_highest_progress(candidates),
        };

        if let Some((selected, reason)) = decision {
            debug!(strategy = %strategy, reason = %reason, "Candidate selected");
            return SelectionResult {
                metadata: SelectionMetadata {
                    passing_count,
                    total_considered: candidates.len(),
                    agreement_score,
                    solution_length: selected.solution.as_ref().map(String::len),
                },
                selected: Some(selected.clone()),
                strategy,
                reason,
            };
        }
    }

    SelectionResult {
        selected: None,
        strategy: SelectionStrategy::HighestProgress,
        reason: "No candidates to select from".to_string(),
        metadata: SelectionMetadata {
            passing_count,
            total_considered: candidates.len(),
            agreement_score,
            solution_length: None,
        },
    }
}

/// Policy-of-policies: pick the strategy that fits the sample size.
///
/// With zero passes only progress ranking is meaningful; with at least
/// three candidates majority vote has enough samples to be worth consulting
/// (relaxed agreement of 0.4); in between, shortest-correct.
#[must_use]
pub fn auto_select(candidates: &[CandidateResult]) -> SelectionResult {
    let passing_count = candidates.iter().filter(|c| c.passed).count();

    let options = if passing_count == 0 {
        SelectionOptions::new(SelectionStrategy::HighestProgress)
    } else if candidates.len() >= 3 {
        SelectionOptions {
            strategy: SelectionStrategy::MajorityVote,
            min_agreement: Some(0.4),
        }
    } else {
        SelectionOptions::new(SelectionStrategy::ShortestCorrect)
    };

    select_candidate(candidates, &options)
}

fn try_first_pass(candidates: &[CandidateResult]) -> Option<(&CandidateResult, String)> {
    candidates.iter().find(|c| c.passed).map(|c| {
        (
            c,
            format!("First passing candidate in execution order ({})", c.id),
        )
    })
}

fn try_shortest_correct(candidates: &[CandidateResult]) -> Option<(&CandidateResult, String)> {
    candidates
        .iter()
        .filter(|c| c.passed)
        .min_by_key(|c| (c.turns, c.duration_ms))
        .map(|c| {
            (
                c,
                format!(
                    "Passing candidate with fewest resources ({} turns, {}ms)",
                    c.turns, c.duration_ms
                ),
            )
        })
}

/// Group passing candidates by progress rounded to one decimal place and
/// take the largest group.
///
/// Rounded progress is a proxy for "same solution family" since solution
/// content is not compared directly. Two genuinely different solutions that
/// pass the same fraction of tests land in the same bucket, so this is a
/// known approximation, not a correctness guarantee.
fn try_majority_vote<'a>(
    candidates: &'a [CandidateResult],
    min_agreement: f64,
    agreement_score: &mut Option<f64>,
) -> Option<(&'a CandidateResult, String)> {
    let passing: Vec<&CandidateResult> = candidates.iter().filter(|c| c.passed).collect();
    if passing.is_empty() {
        return None;
    }

    // Buckets keep first-seen order so ties resolve toward earlier groups.
    let mut groups: Vec<(i64, Vec<&CandidateResult>)> = Vec::new();
    for &candidate in &passing {
        #[allow(clippy::cast_possible_truncation)]
        let key = (candidate.progress * 10.0).round() as i64;
        if let Some((_, members)) = groups.iter_mut().find(|(k, _)| *k == key) {
            members.push(candidate);
        } else {
            groups.push((key, vec![candidate]));
        }
    }

    let mut largest: &(i64, Vec<&CandidateResult>) = &groups[0];
    for group in &groups[1..] {
        if group.1.len() > largest.1.len() {
            largest = group;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let agreement = largest.1.len() as f64 / passing.len() as f64;
    *agreement_score = Some(agreement);

    if agreement < min_agreement {
        debug!(
            agreement,
            min_agreement, "Majority group below agreement threshold, falling back"
        );
        return None;
    }

    largest
        .1
        .iter()
        .min_by_key(|c| c.turns)
        .map(|c| {
            (
                *c,
                format!(
                    "Majority group of {} of {} passing candidates (agreement {agreement:.2})",
                    largest.1.len(),
                    passing.len()
                ),
            )
        })
}

fn try_highest_progress(candidates: &[CandidateResult]) -> Option<(&CandidateResult, String)> {
    candidates
        .iter()
        .min_by(|a, b| {
            b.progress
                .partial_cmp(&a.progress)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.turns.cmp(&b.turns))
        })
        .map(|c| {
            (
                c,
                format!("Highest progress across all candidates ({:.2})", c.progress),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{candidate_id, candidate_seed};
    use proptest::prelude::*;

    fn candidate(index: usize, passed: bool, progress: f64, turns: u32) -> CandidateResult {
        CandidateResult {
            id: candidate_id(index),
            seed: candidate_seed("task", index),
            passed,
            progress,
            turns,
            duration_ms: u64::from(turns) * 10,
            error: None,
            solution: Some("solution".to_string()),
        }
    }

    #[test]
    fn empty_input_selects_nothing() {
        let result = select_candidate(
            &[],
            &SelectionOptions::new(SelectionStrategy::ShortestCorrect),
        );
        assert!(result.selected.is_none());
        assert_eq!(result.metadata.total_considered, 0);
    }

    #[test]
    fn first_pass_picks_list_order() {
        let candidates = vec![
            candidate(0, false, 0.5, 1),
            candidate(1, true, 1.0, 9),
            candidate(2, true, 1.0, 1),
        ];
        let result = select_candidate(
            &candidates,
            &SelectionOptions::new(SelectionStrategy::FirstPass),
        );
        assert_eq!(result.selected.unwrap().id, "candidate-1");
        assert_eq!(result.strategy, SelectionStrategy::FirstPass);
    }

    #[test]
    fn first_pass_falls_back_to_highest_progress() {
        let candidates = vec![
            candidate(0, false, 0.3, 1),
            candidate(1, false, 0.8, 2),
            candidate(2, false, 0.5, 1),
        ];
        let via_first_pass = select_candidate(
            &candidates,
            &SelectionOptions::new(SelectionStrategy::FirstPass),
        );
        let via_highest = select_candidate(
            &candidates,
            &SelectionOptions::new(SelectionStrategy::HighestProgress),
        );
        assert_eq!(via_first_pass.strategy, SelectionStrategy::HighestProgress);
        assert_eq!(
            via_first_pass.selected.unwrap().id,
            via_highest.selected.unwrap().id
        );
    }

    #[test]
    fn shortest_correct_orders_by_turns_then_duration() {
        let mut slow = candidate(0, true, 1.0, 2);
        slow.duration_ms = 500;
        let mut fast = candidate(1, true, 1.0, 2);
        fast.duration_ms = 100;
        let more_turns = candidate(2, true, 1.0, 5);

        let result = select_candidate(
            &[slow, fast, more_turns],
            &SelectionOptions::new(SelectionStrategy::ShortestCorrect),
        );
        assert_eq!(result.selected.unwrap().id, "candidate-1");
    }

    #[test]
    fn majority_vote_agreement_math() {
        // Three passing at 1.0, one passing at 0.5: group of three wins,
        // agreement 0.75, fewest turns within the group.
        let candidates = vec![
            candidate(0, true, 1.0, 5),
            candidate(1, true, 1.0, 2),
            candidate(2, true, 1.0, 8),
            candidate(3, true, 0.5, 1),
        ];
        let result = select_candidate(
            &candidates,
            &SelectionOptions {
                strategy: SelectionStrategy::MajorityVote,
                min_agreement: Some(0.5),
            },
        );
        assert_eq!(result.strategy, SelectionStrategy::MajorityVote);
        assert_eq!(result.selected.unwrap().id, "candidate-1");
        let agreement = result.metadata.agreement_score.unwrap();
        assert!((agreement - 0.75).abs() < 1e-9);
    }

    #[test]
    fn majority_vote_below_threshold_falls_back() {
        // Two groups of one: agreement 0.5 < 0.6 threshold, so
        // shortest_correct over the full set decides.
        let candidates = vec![
            candidate(0, true, 1.0, 5),
            candidate(1, true, 0.5, 2),
            candidate(2, false, 0.2, 1),
        ];
        let result = select_candidate(
            &candidates,
            &SelectionOptions {
                strategy: SelectionStrategy::MajorityVote,
                min_agreement: Some(0.6),
            },
        );
        assert_eq!(result.strategy, SelectionStrategy::ShortestCorrect);
        assert_eq!(result.selected.unwrap().id, "candidate-1");
        assert!(result.metadata.agreement_score.is_some());
    }

    #[test]
    fn highest_progress_considers_failures() {
        let candidates = vec![
            candidate(0, false, 0.4, 3),
            candidate(1, false, 0.9, 7),
            candidate(2, false, 0.9, 2),
        ];
        let result = select_candidate(
            &candidates,
            &SelectionOptions::new(SelectionStrategy::HighestProgress),
        );
        // Ties on progress break toward fewer turns.
        assert_eq!(result.selected.unwrap().id, "candidate-2");
    }

    #[test]
    fn auto_select_zero_passing_uses_highest_progress() {
        let candidates = vec![candidate(0, false, 0.1, 1), candidate(1, false, 0.7, 1)];
        let result = auto_select(&candidates);
        assert_eq!(result.strategy, SelectionStrategy::HighestProgress);
        assert_eq!(result.selected.unwrap().id, "candidate-1");
    }

    #[test]
    fn auto_select_single_pass_among_many_is_its_own_majority() {
        // Four failing at 0.8, one passing at 1.0: majority vote filters to
        // the single pass, which is a majority group of one.
        let candidates = vec![
            candidate(0, false, 0.8, 4),
            candidate(1, false, 0.8, 4),
            candidate(2, false, 0.8, 4),
            candidate(3, false, 0.8, 4),
            candidate(4, true, 1.0, 6),
        ];
        let result = auto_select(&candidates);
        assert_eq!(result.strategy, SelectionStrategy::MajorityVote);
        let selected = result.selected.unwrap();
        assert!((selected.progress - 1.0).abs() < f64::EPSILON);
        let agreement = result.metadata.agreement_score.unwrap();
        assert!((agreement - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn auto_select_two_candidates_uses_shortest_correct() {
        let candidates = vec![candidate(0, true, 1.0, 5), candidate(1, true, 1.0, 2)];
        let result = auto_select(&candidates);
        assert_eq!(result.strategy, SelectionStrategy::ShortestCorrect);
        assert_eq!(result.selected.unwrap().id, "candidate-1");
    }

    #[test]
    fn auto_select_empty_input() {
        let result = auto_select(&[]);
        assert!(result.selected.is_none());
    }

    proptest! {
        #[test]
        fn highest_progress_dominates(progresses in proptest::collection::vec(0.0f64..=1.0, 1..16)) {
            let candidates: Vec<CandidateResult> = progresses
                .iter()
                .enumerate()
                .map(|(i, &p)| candidate(i, false, p, 1))
                .collect();
            let result = select_candidate(
                &candidates,
                &SelectionOptions::new(SelectionStrategy::HighestProgress),
            );
            let selected = result.selected.unwrap();
            prop_assert!(candidates.iter().all(|c| c.progress <= selected.progress));
        }
    }
}
