use super::{Operator, OperatorConfig, OperatorType};
use veil_core::Result;

pub const NAME: &str = "redact";

/// Delete the span
pub struct Redact;

impl Operator for Redact {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, _config: &OperatorConfig) -> Result<()> {
        Ok(())
    }

    fn operate(&self, _text: &str, _config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        Ok(String::new())
    }
}
