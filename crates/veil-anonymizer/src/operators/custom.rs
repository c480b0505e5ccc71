use super::{Operator, OperatorConfig, OperatorType, missing};
use veil_core::Result;

pub const NAME: &str = "custom";
const LAMBDA: &str = "lambda";

/// Run the caller's function from [`OperatorConfig::custom`]
pub struct Custom;

impl Operator for Custom {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        match config.custom {
            Some(_) => Ok(()),
            None => Err(missing(NAME, LAMBDA)),
        }
    }

    fn operate(&self, text: &str, config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        let f = config.custom.as_ref().ok_or_else(|| missing(NAME, LAMBDA))?;
        Ok(f(text))
    }
}
