//! Overlap handling before rewriting
//!
//! Three passes run in order: same-type merge, cross-type conflict
//! resolution, and merging of same-type neighbours separated only by
//! whitespace. With [`ConflictResolutionStrategy::RemoveIntersections`]
//! the remaining partial overlaps are trimmed before the whitespace pass.

use serde::{Deserialize, Serialize};
use tracing::debug;
use veil_core::RecognizerResult;

/// How overlapping spans of different types are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolutionStrategy {
    /// Merge same-type overlaps and drop contained results; partial overlaps
    /// of different types are kept
    #[default]
    MergeSimilarOrContained,
    /// As above, then trim every remaining overlap so no two spans share text
    RemoveIntersections,
}

/// Spans that survived conflict resolution, in text order
#[derive(Debug, Clone, Default)]
pub struct ResolvedSpans {
    pub spans: Vec<RecognizerResult>,
    /// Candidates dropped by cross-type conflict resolution
    pub dropped: usize,
}

/// Run all passes for `strategy`
pub fn resolve(
    text: &str,
    results: &[RecognizerResult],
    strategy: ConflictResolutionStrategy,
) -> ResolvedSpans {
    let merged = merge_same_type(results);
    let (mut survivors, mut dropped) = remove_conflicts(merged);
    if strategy == ConflictResolutionStrategy::RemoveIntersections {
        let (trimmed, emptied) = remove_intersections(survivors);
        survivors = trimmed;
        dropped += emptied;
    }
    ResolvedSpans {
        spans: merge_whitespace_neighbours(text, survivors),
        dropped,
    }
}

/// Merge intersecting results of the same entity type
///
/// Each result is compared with every other candidate still in play (in
/// original order, merged ones no longer count). On the first same-type
/// intersection the other candidate grows to the union, keeps the higher
/// score, and this result is absorbed.
pub fn merge_same_type(results: &[RecognizerResult]) -> Vec<RecognizerResult> {
    let mut spans = results.to_vec();
    let mut in_play: Vec<usize> = (0..spans.len()).collect();
    let mut kept = Vec::with_capacity(spans.len());

    for i in 0..spans.len() {
        in_play.retain(|&j| j != i);

        let target = in_play.iter().copied().find(|&j| {
            spans[j].entity_type == spans[i].entity_type && spans[i].intersects(&spans[j]) > 0
        });

        match target {
            Some(j) => {
                let (start, end, score) = (spans[i].start, spans[i].end, spans[i].score);
                let other = &mut spans[j];
                other.start = other.start.min(start);
                other.end = other.end.max(end);
                other.score = other.score.max(score);
                debug!(
                    entity_type = %other.entity_type,
                    start = other.start,
                    end = other.end,
                    "Merged same-type result"
                );
            }
            None => {
                in_play.push(i);
                kept.push(i);
            }
        }
    }

    kept.into_iter().map(|i| spans[i].clone()).collect()
}

/// Drop results that lose to an overlapping result of another type
///
/// A result conflicts with another candidate when the other contains it, or
/// when both have equal indices and it scores lower (or equal, if the other
/// was already accepted). Dropped results stop competing. Returns the
/// survivors in input order and the number dropped.
pub fn remove_conflicts(results: Vec<RecognizerResult>) -> (Vec<RecognizerResult>, usize) {
    let mut accepted: Vec<RecognizerResult> = Vec::with_capacity(results.len());
    let mut dropped = 0;

    for (i, result) in results.iter().enumerate() {
        let loses_to_pending = results[i + 1..]
            .iter()
            .any(|other| has_conflict(result, other, false));
        let loses_to_accepted = accepted
            .iter()
            .any(|other| has_conflict(result, other, true));

        if loses_to_pending || loses_to_accepted {
            debug!(
                entity_type = %result.entity_type,
                start = result.start,
                end = result.end,
                "Dropped conflicting result"
            );
            dropped += 1;
        } else {
            accepted.push(result.clone());
        }
    }

    (accepted, dropped)
}

fn has_conflict(result: &RecognizerResult, other: &RecognizerResult, other_accepted: bool) -> bool {
    if result.equal_indices(other) {
        return if other_accepted {
            result.score <= other.score
        } else {
            result.score < other.score
        };
    }
    other.contains(result)
}

/// Trim overlapping spans until none share text
///
/// Walking neighbours in start order, the lower-scoring span of an
/// overlapping pair gives up the shared range (the earlier span wins ties).
/// Spans trimmed to nothing are dropped. Returns the survivors sorted by
/// start and the number dropped.
pub fn remove_intersections(
    mut results: Vec<RecognizerResult>,
) -> (Vec<RecognizerResult>, usize) {
    let before = results.len();
    results.sort_by_key(|r| r.start);

    let mut i = 0;
    while i + 1 < results.len() {
        let (current, next) = (&results[i], &results[i + 1]);
        if current.end <= next.start {
            i += 1;
            continue;
        }

        let loser = if current.score >= next.score {
            let end = results[i].end;
            results[i + 1].start = end;
            i + 1
        } else {
            let start = results[i + 1].start;
            results[i].end = start;
            i
        };
        let trimmed = &results[loser];
        debug!(
            entity_type = %trimmed.entity_type,
            start = trimmed.start,
            end = trimmed.end,
            "Trimmed intersecting result"
        );
        if trimmed.start >= trimmed.end {
            results.remove(loser);
            i = i.saturating_sub(1);
        }
        results.sort_by_key(|r| r.start);
    }

    let dropped = before - results.len();
    (results, dropped)
}

/// Merge consecutive same-type spans whose gap is non-empty whitespace
///
/// Returns the spans sorted by start.
pub fn merge_whitespace_neighbours(
    text: &str,
    mut results: Vec<RecognizerResult>,
) -> Vec<RecognizerResult> {
    results.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<RecognizerResult> = Vec::with_capacity(results.len());
    for result in results {
        if let Some(previous) = merged.last_mut() {
            let gap = if previous.end < result.start {
                text.get(previous.end..result.start)
            } else {
                None
            };
            let whitespace_gap = gap.is_some_and(|g| g.chars().all(char::is_whitespace));
            if previous.entity_type == result.entity_type && whitespace_gap {
                previous.end = result.end;
                previous.score = previous.score.max(result.score);
                continue;
            }
        }
        merged.push(result);
    }

    merged
}
