use super::{Operator, OperatorConfig, OperatorType};
use veil_core::Result;

pub const NAME: &str = "keep";

/// Leave the span as is; used to exempt an entity type from `DEFAULT`
pub struct Keep {
    operator_type: OperatorType,
}

impl Keep {
    pub fn new(operator_type: OperatorType) -> Self {
        Self { operator_type }
    }
}

impl Operator for Keep {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        self.operator_type
    }

    fn validate(&self, _config: &OperatorConfig) -> Result<()> {
        Ok(())
    }

    fn operate(&self, text: &str, _config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        Ok(text.to_string())
    }
}
