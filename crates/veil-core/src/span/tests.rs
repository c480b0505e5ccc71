use super::*;
use proptest::prelude::*;

#[test]
fn test_score_is_clamped() {
    assert_eq!(RecognizerResult::new("A", 0, 1, 1.7).score, 1.0);
    assert_eq!(RecognizerResult::new("A", 0, 1, -0.2).score, 0.0);
    assert_eq!(RecognizerResult::new("A", 0, 1, f64::NAN).score, 0.0);

    let mut result = RecognizerResult::new("A", 0, 1, 0.5);
    result.set_score(2.0);
    assert_eq!(result.score, 1.0);
}

#[test]
fn test_score_sum_matches_literal() {
    let mut result = RecognizerResult::new("A", 0, 1, 0.3);
    result.set_score(result.score + 0.35);
    assert_eq!(result.score, 0.65);
    assert_eq!(normalize_score(0.1 + 0.2), 0.3);
}

#[test]
fn test_contains() {
    let outer = RecognizerResult::new("A", 0, 10, 0.5);
    let inner = RecognizerResult::new("A", 2, 8, 0.5);
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert!(outer.contains(&outer.clone()));
}

#[test]
fn test_intersects() {
    let a = RecognizerResult::new("A", 0, 10, 0.5);
    let b = RecognizerResult::new("B", 5, 15, 0.5);
    let c = RecognizerResult::new("C", 10, 12, 0.5);
    assert_eq!(a.intersects(&b), 5);
    assert_eq!(b.intersects(&a), 5);
    // Touching spans do not intersect
    assert_eq!(a.intersects(&c), 0);
}

#[test]
fn test_equal_indices_ignores_type_and_score() {
    let a = RecognizerResult::new("A", 3, 7, 0.1);
    let b = RecognizerResult::new("B", 3, 7, 0.9);
    assert!(a.equal_indices(&b));
}

#[test]
fn test_text_in() {
    let text = "call 555-0100 now";
    let result = RecognizerResult::new("PHONE_NUMBER", 5, 13, 0.4);
    assert_eq!(result.text_in(text), Some("555-0100"));
    assert_eq!(RecognizerResult::new("X", 5, 99, 0.4).text_in(text), None);
}

#[test]
fn test_serde_defaults() {
    let json = r#"{"entity_type":"EMAIL_ADDRESS","start":0,"end":5,"score":0.5}"#;
    let result: RecognizerResult = serde_json::from_str(json).unwrap();
    assert!(result.analysis_explanation.is_none());
    assert!(!result.is_score_enhanced_by_context());
}

fn span() -> impl Strategy<Value = (usize, usize)> {
    (0usize..100, 1usize..50).prop_map(|(start, len)| (start, start + len))
}

proptest! {
    #[test]
    fn intersection_is_symmetric((s1, e1) in span(), (s2, e2) in span()) {
        let a = RecognizerResult::new("A", s1, e1, 0.5);
        let b = RecognizerResult::new("B", s2, e2, 0.5);
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn containment_implies_full_intersection((s1, e1) in span(), (s2, e2) in span()) {
        let a = RecognizerResult::new("A", s1, e1, 0.5);
        let b = RecognizerResult::new("B", s2, e2, 0.5);
        if a.contains(&b) {
            prop_assert_eq!(a.intersects(&b), b.span_len());
        }
    }
}
