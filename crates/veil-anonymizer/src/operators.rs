//! Operators: named, parameterised transforms applied to a span's text

mod custom;
mod encrypt;
mod hash;
mod keep;
mod mask;
mod redact;
mod replace;

pub use custom::Custom;
pub use encrypt::{Decrypt, Encrypt};
pub use hash::Hash;
pub use keep::Keep;
pub use mask::Mask;
pub use redact::Redact;
pub use replace::Replace;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use veil_core::{Error, Result};

/// Caller-supplied transform for the `custom` operator
pub type CustomFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    Anonymize,
    Deanonymize,
}

/// Which operator to run on an entity type, and its parameters
#[derive(Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub operator_name: String,

    #[serde(default)]
    pub params: Map<String, Value>,

    /// Transform for the `custom` operator
    #[serde(skip)]
    pub custom: Option<CustomFn>,
}

impl fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("operator_name", &self.operator_name)
            .field("params", &self.params)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl OperatorConfig {
    pub fn new(operator_name: impl Into<String>) -> Self {
        Self {
            operator_name: operator_name.into(),
            params: Map::new(),
            custom: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn replace(new_value: impl Into<String>) -> Self {
        Self::new(replace::NAME).with_param(replace::NEW_VALUE, new_value.into())
    }

    pub fn redact() -> Self {
        Self::new(redact::NAME)
    }

    pub fn mask(masking_char: char, chars_to_mask: u64, from_end: bool) -> Self {
        Self::new(mask::NAME)
            .with_param(mask::MASKING_CHAR, masking_char.to_string())
            .with_param(mask::CHARS_TO_MASK, chars_to_mask)
            .with_param(mask::FROM_END, from_end)
    }

    /// Hash with a random salt per call
    pub fn hash(hash_type: &str) -> Self {
        Self::new(hash::NAME).with_param(hash::HASH_TYPE, hash_type)
    }

    /// Deterministic hash keyed by `salt`
    pub fn hash_with_salt(hash_type: &str, salt: impl Into<String>) -> Self {
        Self::hash(hash_type).with_param(hash::SALT, salt.into())
    }

    pub fn encrypt(key: impl Into<String>) -> Self {
        Self::new(encrypt::ENCRYPT).with_param(encrypt::KEY, key.into())
    }

    pub fn decrypt(key: impl Into<String>) -> Self {
        Self::new(encrypt::DECRYPT).with_param(encrypt::KEY, key.into())
    }

    pub fn keep() -> Self {
        Self::new(keep::NAME)
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            custom: Some(Arc::new(f)),
            ..Self::new(custom::NAME)
        }
    }

    /// Optional string parameter
    pub fn str_param(&self, key: &str) -> Result<Option<&str>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(invalid_type(&self.operator_name, key, "a string", other)),
        }
    }

    /// Optional non-negative integer parameter
    pub fn u64_param(&self, key: &str) -> Result<Option<u64>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "{}: '{}' must be a non-negative integer, got {}",
                    self.operator_name, key, n
                ))
            }),
            Some(other) => Err(invalid_type(&self.operator_name, key, "an integer", other)),
        }
    }

    /// Optional boolean parameter
    pub fn bool_param(&self, key: &str) -> Result<Option<bool>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid_type(&self.operator_name, key, "a boolean", other)),
        }
    }
}

fn invalid_type(operator: &str, key: &str, expected: &str, got: &Value) -> Error {
    Error::InvalidParameter(format!(
        "{}: '{}' must be {}, got {}",
        operator, key, expected, got
    ))
}

/// A required parameter that is absent
pub(crate) fn missing(operator: &str, key: &str) -> Error {
    Error::InvalidParameter(format!("{}: missing required parameter '{}'", operator, key))
}

/// A text transform applied to one span
pub trait Operator: Send + Sync {
    fn operator_name(&self) -> &str;

    fn operator_type(&self) -> OperatorType;

    /// Check `config` before any text is touched
    fn validate(&self, config: &OperatorConfig) -> Result<()>;

    /// Transform `text`, the full original text of a span of `entity_type`
    fn operate(&self, text: &str, config: &OperatorConfig, entity_type: &str) -> Result<String>;
}

/// Operator lookup by name and type
#[derive(Clone)]
pub struct OperatorsFactory {
    anonymizers: HashMap<String, Arc<dyn Operator>>,
    deanonymizers: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorsFactory {
    /// Factory holding the built-in operators
    pub fn new() -> Self {
        let mut factory = Self {
            anonymizers: HashMap::new(),
            deanonymizers: HashMap::new(),
        };
        let builtins: [Arc<dyn Operator>; 9] = [
            Arc::new(Replace),
            Arc::new(Redact),
            Arc::new(Mask),
            Arc::new(Hash),
            Arc::new(Encrypt),
            Arc::new(Keep::new(OperatorType::Anonymize)),
            Arc::new(Custom),
            Arc::new(Decrypt),
            Arc::new(Keep::new(OperatorType::Deanonymize)),
        ];
        for operator in builtins {
            factory.insert(operator);
        }
        factory
    }

    fn table(&self, operator_type: OperatorType) -> &HashMap<String, Arc<dyn Operator>> {
        match operator_type {
            OperatorType::Anonymize => &self.anonymizers,
            OperatorType::Deanonymize => &self.deanonymizers,
        }
    }

    fn insert(&mut self, operator: Arc<dyn Operator>) {
        let table = match operator.operator_type() {
            OperatorType::Anonymize => &mut self.anonymizers,
            OperatorType::Deanonymize => &mut self.deanonymizers,
        };
        table.insert(operator.operator_name().to_string(), operator);
    }

    /// Register `operator`, replacing any operator of the same name and type
    pub fn add_operator(&mut self, operator: Arc<dyn Operator>) {
        info!(
            operator = operator.operator_name(),
            operator_type = ?operator.operator_type(),
            "Added operator"
        );
        self.insert(operator);
    }

    pub fn remove_operator(&mut self, name: &str, operator_type: OperatorType) -> Option<Arc<dyn Operator>> {
        let table = match operator_type {
            OperatorType::Anonymize => &mut self.anonymizers,
            OperatorType::Deanonymize => &mut self.deanonymizers,
        };
        let removed = table.remove(name);
        if removed.is_some() {
            info!(operator = name, ?operator_type, "Removed operator");
        }
        removed
    }

    /// # Errors
    /// - `Error::InvalidOperator` if no operator of this name and type exists
    pub fn create_operator(&self, name: &str, operator_type: OperatorType) -> Result<Arc<dyn Operator>> {
        self.table(operator_type).get(name).cloned().ok_or_else(|| {
            Error::InvalidOperator(format!(
                "Invalid operator class '{}' for {:?}",
                name, operator_type
            ))
        })
    }

    /// Names of the anonymize operators, sorted
    pub fn anonymizers(&self) -> Vec<String> {
        sorted_names(&self.anonymizers)
    }

    /// Names of the deanonymize operators, sorted
    pub fn deanonymizers(&self) -> Vec<String> {
        sorted_names(&self.deanonymizers)
    }
}

fn sorted_names(table: &HashMap<String, Arc<dyn Operator>>) -> Vec<String> {
    let mut names: Vec<String> = table.keys().cloned().collect();
    names.sort();
    names
}

impl Default for OperatorsFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorsFactory")
            .field("anonymizers", &self.anonymizers())
            .field("deanonymizers", &self.deanonymizers())
            .finish()
    }
}
