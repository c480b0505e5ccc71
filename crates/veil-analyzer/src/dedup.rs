//! Duplicate and overlap elimination across recognizer output

use veil_core::RecognizerResult;

/// Drop zero-score results and results contained in a stronger result of the same type
///
/// Results are ordered by score (descending), then start (ascending), then
/// length (ascending). A result survives unless an already accepted result of
/// the same entity type contains it. Different entity types never suppress
/// each other here.
pub fn remove_duplicates(mut results: Vec<RecognizerResult>) -> Vec<RecognizerResult> {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.start.cmp(&b.start))
            .then(a.span_len().cmp(&b.span_len()))
    });

    let mut accepted: Vec<RecognizerResult> = Vec::with_capacity(results.len());
    for result in results {
        if result.score == 0.0 {
            continue;
        }
        let contained = accepted
            .iter()
            .any(|kept| kept.entity_type == result.entity_type && kept.contains(&result));
        if !contained {
            accepted.push(result);
        }
    }

    accepted
}
