use super::*;
use proptest::prelude::*;

const LICENSE_TEXT: &str = "John Smith drivers license is AC432223";
const NAME_TEXT: &str = "hello world, my name is Jane Doe. My number is: 034453334";

fn r(entity_type: &str, start: usize, end: usize, score: f64) -> RecognizerResult {
    RecognizerResult::new(entity_type, start, end, score)
}

fn ops(entries: Vec<(&str, OperatorConfig)>) -> HashMap<String, OperatorConfig> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn license_results() -> Vec<RecognizerResult> {
    vec![
        r("PERSON", 0, 10, 0.85),
        r("US_DRIVER_LICENSE", 30, 38, 0.65),
    ]
}

#[test]
fn test_replace_and_mask() {
    let operators = ops(vec![
        ("PERSON", OperatorConfig::replace("<PERSON>")),
        ("US_DRIVER_LICENSE", OperatorConfig::mask('*', 4, true)),
    ]);
    let result = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap();

    assert_eq!(result.text, "<PERSON> drivers license is AC43****");
    assert_eq!(
        result.items,
        vec![
            OperatorResult {
                start: 30,
                end: 38,
                entity_type: "US_DRIVER_LICENSE".to_string(),
                text: "AC43****".to_string(),
                operator: "mask".to_string(),
            },
            OperatorResult {
                start: 0,
                end: 10,
                entity_type: "PERSON".to_string(),
                text: "<PERSON>".to_string(),
                operator: "replace".to_string(),
            },
        ]
    );
}

#[test]
fn test_default_operator_is_replace() {
    let result = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &HashMap::new())
        .unwrap();
    assert_eq!(result.text, "<PERSON> drivers license is <US_DRIVER_LICENSE>");
}

#[test]
fn test_keep_exempts_from_default() {
    let operators = ops(vec![
        (DEFAULT, OperatorConfig::redact()),
        ("PERSON", OperatorConfig::keep()),
    ]);
    let result = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap();
    assert_eq!(result.text, "John Smith drivers license is ");
    assert_eq!(result.items[1].operator, "keep");
}

#[test]
fn test_overlapping_names_are_clipped() {
    let results = vec![
        r("FULL_NAME", 24, 32, 0.6),
        r("FIRST_NAME", 24, 28, 0.9),
        r("LAST_NAME", 29, 33, 0.6),
        r("NAME", 24, 30, 0.8),
    ];
    let result = AnonymizerEngine::new()
        .anonymize(NAME_TEXT, &results, &HashMap::new())
        .unwrap();

    assert_eq!(
        result.text,
        "hello world, my name is <FULL_NAME><LAST_NAME> My number is: 034453334"
    );
    let ranges: Vec<_> = result
        .items
        .iter()
        .map(|i| (i.entity_type.as_str(), i.start, i.end))
        .collect();
    assert_eq!(ranges, vec![("LAST_NAME", 29, 33), ("FULL_NAME", 24, 29)]);
}

#[test]
fn test_operator_sees_full_span_text_when_clipped() {
    let results = vec![r("FULL_NAME", 24, 32, 0.6), r("LAST_NAME", 29, 33, 0.6)];
    let operators = ops(vec![(DEFAULT, OperatorConfig::custom(|t| format!("[{t}]")))]);
    let result = AnonymizerEngine::new()
        .anonymize(NAME_TEXT, &results, &operators)
        .unwrap();
    assert_eq!(
        result.text,
        "hello world, my name is [Jane Doe][Doe.] My number is: 034453334"
    );
}

#[test]
fn test_remove_intersections_gives_overlap_to_one_span() {
    let results = vec![r("FULL_NAME", 24, 32, 0.6), r("LAST_NAME", 29, 33, 0.6)];
    let operators = ops(vec![(DEFAULT, OperatorConfig::custom(|t| format!("[{t}]")))]);
    let result = AnonymizerEngine::new()
        .anonymize_with_strategy(
            NAME_TEXT,
            &results,
            &operators,
            ConflictResolutionStrategy::RemoveIntersections,
        )
        .unwrap();
    assert_eq!(
        result.text,
        "hello world, my name is [Jane Doe][.] My number is: 034453334"
    );
}

#[test]
fn test_remove_intersections_with_keep() {
    let text = "Fake card number 4151 3217 6243 3448.com that overlaps with nonexisting URL.";
    let operators = ops(vec![(DEFAULT, OperatorConfig::keep())]);
    let engine = AnonymizerEngine::new();

    let items = |results: Vec<RecognizerResult>| {
        let result = engine
            .anonymize_with_strategy(
                text,
                &results,
                &operators,
                ConflictResolutionStrategy::RemoveIntersections,
            )
            .unwrap();
        assert_eq!(result.text, text);
        let mut items: Vec<_> = result
            .items
            .into_iter()
            .map(|i| (i.start, i.end, i.entity_type, i.text))
            .collect();
        items.sort();
        items
    };

    assert_eq!(
        items(vec![r("CREDIT_CARD", 17, 36, 0.8), r("URL", 32, 40, 1.0)]),
        vec![
            (17, 32, "CREDIT_CARD".to_string(), "4151 3217 6243 ".to_string()),
            (32, 40, "URL".to_string(), "3448.com".to_string()),
        ]
    );
    assert_eq!(
        items(vec![r("CREDIT_CARD", 17, 36, 1.0), r("URL", 32, 40, 0.5)]),
        vec![
            (17, 36, "CREDIT_CARD".to_string(), "4151 3217 6243 3448".to_string()),
            (36, 40, "URL".to_string(), ".com".to_string()),
        ]
    );
}

#[test]
fn test_unknown_operator_rejected() {
    let operators = ops(vec![("PERSON", OperatorConfig::new("scramble"))]);
    let err = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperator(_)));
}

#[test]
fn test_invalid_params_fail_before_rewrite() {
    let operators = ops(vec![
        ("PERSON", OperatorConfig::replace("<PERSON>")),
        ("US_DRIVER_LICENSE", OperatorConfig::encrypt("too short")),
    ]);
    let err = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_span_validation() {
    let engine = AnonymizerEngine::new();
    let operators = HashMap::new();

    let err = engine
        .anonymize(LICENSE_TEXT, &[r("PERSON", 30, 60, 0.5)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let err = engine
        .anonymize(LICENSE_TEXT, &[r("PERSON", 5, 5, 0.5)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let err = engine
        .anonymize("", &[r("PERSON", 0, 1, 0.5)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    // 'ë' is two bytes
    let err = engine
        .anonymize("Zoë", &[r("PERSON", 0, 3, 0.5)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_no_results() {
    let result = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &[], &HashMap::new())
        .unwrap();
    assert_eq!(result.text, LICENSE_TEXT);
    assert!(result.items.is_empty());

    let result = AnonymizerEngine::new()
        .anonymize("", &[], &HashMap::new())
        .unwrap();
    assert_eq!(result.text, "");
}

#[test]
fn test_whitespace_separated_spans_merge() {
    let text = "Call Jane  Doe now";
    let results = vec![r("PERSON", 5, 9, 0.9), r("PERSON", 11, 14, 0.6)];
    let result = AnonymizerEngine::new()
        .anonymize(text, &results, &HashMap::new())
        .unwrap();
    assert_eq!(result.text, "Call <PERSON> now");
    assert_eq!(result.items.len(), 1);
}

#[test]
fn test_multibyte_text() {
    let text = "Zoë Ünal wohnt in Köln";
    let results = vec![r("PERSON", 0, 10, 0.9), r("LOCATION", 20, 25, 0.9)];
    let result = AnonymizerEngine::new()
        .anonymize(text, &results, &HashMap::new())
        .unwrap();
    assert_eq!(result.text, "<PERSON> wohnt in <LOCATION>");
}

#[test]
fn test_encrypt_then_deanonymize() {
    let key = "WmZq4t7w!z%C&F)J";
    let operators = ops(vec![(DEFAULT, OperatorConfig::encrypt(key))]);
    let anonymized = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap();
    assert!(!anonymized.text.contains("John Smith"));

    let entities = anonymized.output_entities();
    assert!(entities.windows(2).all(|w| w[0].start < w[1].start));
    for entity in &entities {
        assert_eq!(&anonymized.text[entity.start..entity.end], entity.text);
    }

    let restored = DeanonymizeEngine::new()
        .deanonymize(
            &anonymized.text,
            &entities,
            &ops(vec![(DEFAULT, OperatorConfig::decrypt(key))]),
        )
        .unwrap();
    assert_eq!(restored.text, LICENSE_TEXT);
    assert!(restored.items.iter().all(|i| i.operator == "decrypt"));
}

#[test]
fn test_output_entities() {
    let operators = ops(vec![
        ("PERSON", OperatorConfig::replace("<PERSON>")),
        ("US_DRIVER_LICENSE", OperatorConfig::mask('*', 4, true)),
    ]);
    let result = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap();
    let ranges: Vec<_> = result
        .output_entities()
        .iter()
        .map(|e| (e.start, e.end))
        .collect();
    assert_eq!(ranges, vec![(0, 8), (28, 36)]);
}

#[test]
fn test_deanonymize_errors() {
    let engine = DeanonymizeEngine::new();
    let entity = |start, end| OperatorResult {
        start,
        end,
        entity_type: "PERSON".to_string(),
        text: String::new(),
        operator: "encrypt".to_string(),
    };

    let err = engine
        .deanonymize("abcdef", &[entity(0, 3)], &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperator(_)));

    let operators = ops(vec![("PERSON", OperatorConfig::replace("x"))]);
    let err = engine
        .deanonymize("abcdef", &[entity(0, 3)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperator(_)));

    let operators = ops(vec![("PERSON", OperatorConfig::keep())]);
    let err = engine
        .deanonymize("abcdef", &[entity(0, 3), entity(2, 5)], &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_engine_operator_registry() {
    let mut engine = AnonymizerEngine::new();
    assert!(engine.get_anonymizers().contains(&"mask".to_string()));
    assert!(engine.remove_anonymizer("mask"));
    assert!(!engine.get_anonymizers().contains(&"mask".to_string()));

    let operators = ops(vec![(DEFAULT, OperatorConfig::mask('*', 2, false))]);
    let err = engine
        .anonymize(LICENSE_TEXT, &license_results(), &operators)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperator(_)));

    assert_eq!(DeanonymizeEngine::new().get_deanonymizers(), vec!["decrypt", "keep"]);
}

#[test]
fn test_metrics_recorded() {
    let metrics = Arc::new(PipelineMetrics::new().unwrap());
    let engine = AnonymizerEngine::new().with_metrics(Arc::clone(&metrics));
    let results = vec![
        r("FULL_NAME", 24, 32, 0.6),
        r("FIRST_NAME", 24, 28, 0.9),
        r("LAST_NAME", 29, 33, 0.6),
    ];
    engine.anonymize(NAME_TEXT, &results, &HashMap::new()).unwrap();

    assert_eq!(metrics.anonymize_requests_total.get(), 1);
    assert_eq!(metrics.anonymize_conflicts_dropped_total.get(), 1);
    assert_eq!(
        metrics
            .anonymize_operations_total
            .with_label_values(&["replace", "LAST_NAME"])
            .get(),
        1.0
    );
}

fn arb_case() -> impl Strategy<Value = (String, Vec<RecognizerResult>)> {
    "[a-z ]{10,40}".prop_flat_map(|text| {
        let len = text.len();
        let spans = prop::collection::vec(
            (0usize..3, 0..len, 1usize..8, 0.01f64..1.0),
            0..8,
        )
        .prop_map(move |raw| {
            raw.into_iter()
                .map(|(t, start, span, score)| {
                    r(["A", "B", "C"][t], start, (start + span).min(len), score)
                })
                .collect::<Vec<_>>()
        });
        (Just(text), spans)
    })
}

fn apply_edit_log(text: &str, items: &[OperatorResult]) -> String {
    let mut output = text.to_string();
    for item in items {
        output.replace_range(item.start..item.end, &item.text);
    }
    output
}

proptest! {
    #[test]
    fn prop_edit_log_is_ordered_and_disjoint((text, results) in arb_case()) {
        let result = AnonymizerEngine::new()
            .anonymize(&text, &results, &HashMap::new())
            .unwrap();
        for pair in result.items.windows(2) {
            prop_assert!(pair[0].start > pair[1].start);
            prop_assert!(pair[1].end <= pair[0].start);
        }
        for item in &result.items {
            prop_assert!(item.start < item.end);
        }
    }

    #[test]
    fn prop_edit_log_reproduces_text((text, results) in arb_case()) {
        let result = AnonymizerEngine::new()
            .anonymize(&text, &results, &HashMap::new())
            .unwrap();
        prop_assert_eq!(apply_edit_log(&text, &result.items), result.text.clone());

        for entity in result.output_entities() {
            prop_assert_eq!(&result.text[entity.start..entity.end], entity.text.as_str());
        }
    }
}
