//! Recognizer that turns NLP named-entity spans into results

use crate::nlp::NlpArtifacts;
use crate::recognizer::{EntityRecognizer, next_recognizer_id};
use std::collections::HashMap;
use tracing::warn;
use veil_core::{AnalysisExplanation, RecognizerResult, Result};

/// Default confidence for NLP-detected entities
pub const DEFAULT_NER_STRENGTH: f64 = 0.85;

/// Maps coarse NLP labels onto entity types
pub struct NlpRecognizer {
    id: String,
    supported_entities: Vec<String>,
    supported_language: String,
    ner_strength: f64,
    /// entity type -> NLP labels that produce it
    label_map: HashMap<String, Vec<String>>,
}

impl NlpRecognizer {
    pub fn new(supported_language: impl Into<String>) -> Self {
        let label_map: HashMap<String, Vec<String>> = [
            ("PERSON", vec!["PERSON", "PER"]),
            ("LOCATION", vec!["GPE", "LOC", "FAC"]),
            ("DATE_TIME", vec!["DATE", "TIME"]),
            ("NRP", vec!["NORP"]),
        ]
        .into_iter()
        .map(|(entity, labels)| {
            (
                entity.to_string(),
                labels.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();

        let mut supported_entities: Vec<String> = label_map.keys().cloned().collect();
        supported_entities.sort();

        Self {
            id: next_recognizer_id("NlpRecognizer"),
            supported_entities,
            supported_language: supported_language.into(),
            ner_strength: DEFAULT_NER_STRENGTH,
            label_map,
        }
    }

    pub fn with_ner_strength(mut self, score: f64) -> Self {
        self.ner_strength = score;
        self
    }

    /// Route an extra NLP label to `entity_type`
    pub fn with_label(mut self, entity_type: impl Into<String>, label: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        self.label_map
            .entry(entity_type.clone())
            .or_default()
            .push(label.into());
        if !self.supported_entities.contains(&entity_type) {
            self.supported_entities.push(entity_type);
        }
        self
    }

    fn label_matches(&self, entity_type: &str, label: &str) -> bool {
        self.label_map
            .get(entity_type)
            .is_some_and(|labels| labels.iter().any(|l| l == label))
    }
}

impl EntityRecognizer for NlpRecognizer {
    fn name(&self) -> &str {
        "NlpRecognizer"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn supported_entities(&self) -> &[String] {
        &self.supported_entities
    }

    fn supported_language(&self) -> &str {
        &self.supported_language
    }

    fn analyze(
        &self,
        _text: &str,
        entities: &[String],
        nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>> {
        let Some(nlp_artifacts) = nlp_artifacts else {
            warn!("Skipping NLP recognizer, no NLP artifacts were provided");
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for entity_type in entities {
            if !self.supported_entities.contains(entity_type) {
                continue;
            }
            for nlp_entity in &nlp_artifacts.entities {
                if !self.label_matches(entity_type, &nlp_entity.label) {
                    continue;
                }
                let explanation = AnalysisExplanation::new(self.name(), self.ner_strength)
                    .with_textual_explanation(format!(
                        "Identified as {} by the NLP engine's named entity recognition",
                        entity_type
                    ));
                results.push(
                    RecognizerResult::new(
                        entity_type.clone(),
                        nlp_entity.start,
                        nlp_entity.end,
                        self.ner_strength,
                    )
                    .with_explanation(explanation)
                    .with_metadata(self.recognition_metadata()),
                );
            }
        }

        Ok(results)
    }
}
