//! Anonymize and deanonymize engines
//!
//! Both rewrite right to left so that every edit is expressed in the input
//! text's coordinates. All spans and operator configs are checked before any
//! operator runs, and the output string is only assembled once every
//! operator succeeded.

use crate::conflict::{self, ConflictResolutionStrategy};
use crate::operators::{Operator, OperatorConfig, OperatorType, OperatorsFactory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use veil_core::{Error, RecognizerResult, Result};
use veil_observability::PipelineMetrics;

/// Operator key used when an entity type has no entry of its own
pub const DEFAULT: &str = "DEFAULT";

/// One edit applied to the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorResult {
    pub start: usize,
    pub end: usize,
    pub entity_type: String,
    /// Replacement text
    pub text: String,
    pub operator: String,
}

/// Rewritten text and the edits that produced it
///
/// `items` are in the input text's coordinates, non-overlapping, with
/// strictly decreasing `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    pub text: String,
    pub items: Vec<OperatorResult>,
}

impl EngineResult {
    /// The edits located in the output text, ascending
    ///
    /// Suitable as the entity list for [`DeanonymizeEngine::deanonymize`].
    pub fn output_entities(&self) -> Vec<OperatorResult> {
        let mut shift: isize = 0;
        let mut entities = Vec::with_capacity(self.items.len());
        for item in self.items.iter().rev() {
            let start = item.start.saturating_add_signed(shift);
            entities.push(OperatorResult {
                start,
                end: start + item.text.len(),
                ..item.clone()
            });
            shift += item.text.len() as isize - (item.end - item.start) as isize;
        }
        entities
    }
}

struct Target<'a> {
    start: usize,
    end: usize,
    entity_type: &'a str,
}

/// Rewrite `text` by applying an operator to each target
fn rewrite(
    factory: &OperatorsFactory,
    operator_type: OperatorType,
    text: &str,
    mut targets: Vec<Target<'_>>,
    operators: &HashMap<String, OperatorConfig>,
) -> Result<EngineResult> {
    // Resolve and validate everything up front
    let mut plan: Vec<(Arc<dyn Operator>, &OperatorConfig)> = Vec::with_capacity(targets.len());
    targets.sort_by(|a, b| (b.start, b.end).cmp(&(a.start, a.end)));
    for target in &targets {
        let config = operators
            .get(target.entity_type)
            .or_else(|| operators.get(DEFAULT))
            .ok_or_else(|| {
                Error::InvalidOperator(format!(
                    "No operator configured for entity type '{}'",
                    target.entity_type
                ))
            })?;
        let operator = factory.create_operator(&config.operator_name, operator_type)?;
        operator.validate(config)?;
        plan.push((operator, config));
    }

    let mut pieces: Vec<&str> = Vec::with_capacity(targets.len() * 2 + 1);
    let mut replacements: Vec<String> = Vec::with_capacity(targets.len());
    let mut items = Vec::with_capacity(targets.len());
    let mut cursor = text.len();

    for (target, (operator, config)) in targets.iter().zip(&plan) {
        let original = &text[target.start..target.end];
        let replacement = operator.operate(original, config, target.entity_type)?;
        let end = target.end.min(cursor);

        trace!(
            entity_type = target.entity_type,
            operator = operator.operator_name(),
            start = target.start,
            end,
            "Applying operator"
        );

        items.push(OperatorResult {
            start: target.start,
            end,
            entity_type: target.entity_type.to_string(),
            text: replacement.clone(),
            operator: operator.operator_name().to_string(),
        });
        pieces.push(&text[end..cursor]);
        replacements.push(replacement);
        cursor = target.start;
    }

    let mut output = String::with_capacity(text.len());
    output.push_str(&text[..cursor]);
    for (piece, replacement) in pieces.iter().zip(&replacements).rev() {
        output.push_str(replacement);
        output.push_str(piece);
    }

    Ok(EngineResult { text: output, items })
}

/// Reject spans that do not address `text`
fn check_span(text: &str, start: usize, end: usize, entity_type: &str) -> Result<()> {
    if start >= end || end > text.len() {
        return Err(Error::InvalidParameter(format!(
            "Invalid span [{}, {}) for {} in text of length {}",
            start,
            end,
            entity_type,
            text.len()
        )));
    }
    if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(Error::InvalidParameter(format!(
            "Span [{}, {}) for {} does not fall on character boundaries",
            start, end, entity_type
        )));
    }
    Ok(())
}

fn check_text(text: &str, span_count: usize) -> Result<()> {
    if text.is_empty() && span_count > 0 {
        return Err(Error::InvalidParameter(
            "Text must not be empty when spans are given".to_string(),
        ));
    }
    Ok(())
}

/// Replaces detected PII using per-entity-type operators
#[derive(Default)]
pub struct AnonymizerEngine {
    factory: OperatorsFactory,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl std::fmt::Debug for AnonymizerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymizerEngine")
            .field("factory", &self.factory)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AnonymizerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn operators_factory(&self) -> &OperatorsFactory {
        &self.factory
    }

    pub fn add_anonymizer(&mut self, operator: Arc<dyn Operator>) {
        self.factory.add_operator(operator);
    }

    pub fn remove_anonymizer(&mut self, name: &str) -> bool {
        self.factory
            .remove_operator(name, OperatorType::Anonymize)
            .is_some()
    }

    pub fn get_anonymizers(&self) -> Vec<String> {
        self.factory.anonymizers()
    }

    /// Rewrite `text`, applying `operators[entity_type]` (or `operators["DEFAULT"]`,
    /// itself defaulting to `replace`) to every span that survives conflict resolution
    ///
    /// # Errors
    /// - `Error::InvalidParameter` for spans outside `text`, or operator parameters
    /// - `Error::InvalidOperator` for unknown operator names
    pub fn anonymize(
        &self,
        text: &str,
        results: &[RecognizerResult],
        operators: &HashMap<String, OperatorConfig>,
    ) -> Result<EngineResult> {
        self.anonymize_with_strategy(
            text,
            results,
            operators,
            ConflictResolutionStrategy::default(),
        )
    }

    /// Like [`Self::anonymize`], settling overlaps with `strategy`
    pub fn anonymize_with_strategy(
        &self,
        text: &str,
        results: &[RecognizerResult],
        operators: &HashMap<String, OperatorConfig>,
        strategy: ConflictResolutionStrategy,
    ) -> Result<EngineResult> {
        check_text(text, results.len())?;
        for result in results {
            check_span(text, result.start, result.end, &result.entity_type)?;
        }

        let resolved = conflict::resolve(text, results, strategy);
        debug!(
            ?strategy,
            input = results.len(),
            survivors = resolved.spans.len(),
            dropped = resolved.dropped,
            "Resolved span conflicts"
        );

        let with_default;
        let operators = if operators.contains_key(DEFAULT) {
            operators
        } else {
            with_default = {
                let mut map = operators.clone();
                map.insert(DEFAULT.to_string(), OperatorConfig::new("replace"));
                map
            };
            &with_default
        };

        let targets = resolved
            .spans
            .iter()
            .map(|r| Target {
                start: r.start,
                end: r.end,
                entity_type: &r.entity_type,
            })
            .collect();
        let result = rewrite(&self.factory, OperatorType::Anonymize, text, targets, operators)?;

        if let Some(metrics) = &self.metrics {
            metrics.record_anonymize(resolved.dropped);
            for item in &result.items {
                metrics.record_operation(&item.operator, &item.entity_type);
            }
        }
        debug!(items = result.items.len(), "Anonymize completed");

        Ok(result)
    }
}

/// Reverses reversible operators (`decrypt`) over an anonymized text
#[derive(Debug, Default)]
pub struct DeanonymizeEngine {
    factory: OperatorsFactory,
}

impl DeanonymizeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_deanonymizer(&mut self, operator: Arc<dyn Operator>) {
        self.factory.add_operator(operator);
    }

    pub fn remove_deanonymizer(&mut self, name: &str) -> bool {
        self.factory
            .remove_operator(name, OperatorType::Deanonymize)
            .is_some()
    }

    pub fn get_deanonymizers(&self) -> Vec<String> {
        self.factory.deanonymizers()
    }

    /// Apply deanonymize operators to `entities`, given in `text` coordinates
    ///
    /// Every entity type needs an entry in `operators` (or a `DEFAULT`).
    /// Overlapping entities are rejected.
    pub fn deanonymize(
        &self,
        text: &str,
        entities: &[OperatorResult],
        operators: &HashMap<String, OperatorConfig>,
    ) -> Result<EngineResult> {
        check_text(text, entities.len())?;
        for entity in entities {
            check_span(text, entity.start, entity.end, &entity.entity_type)?;
        }

        let mut targets: Vec<Target<'_>> = entities
            .iter()
            .map(|e| Target {
                start: e.start,
                end: e.end,
                entity_type: &e.entity_type,
            })
            .collect();
        targets.sort_by_key(|t| t.start);
        if targets.windows(2).any(|pair| pair[0].end > pair[1].start) {
            return Err(Error::InvalidParameter(
                "Entities to deanonymize must not overlap".to_string(),
            ));
        }

        let result = rewrite(&self.factory, OperatorType::Deanonymize, text, targets, operators)?;
        debug!(items = result.items.len(), "Deanonymize completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests;
