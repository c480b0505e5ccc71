use super::{Operator, OperatorConfig, OperatorType};
use veil_core::Result;

pub const NAME: &str = "replace";
pub const NEW_VALUE: &str = "new_value";

/// Substitute a fixed value, `<ENTITY_TYPE>` when none is given
pub struct Replace;

impl Operator for Replace {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        config.str_param(NEW_VALUE).map(|_| ())
    }

    fn operate(&self, _text: &str, config: &OperatorConfig, entity_type: &str) -> Result<String> {
        Ok(match config.str_param(NEW_VALUE)? {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => format!("<{}>", entity_type),
        })
    }
}
