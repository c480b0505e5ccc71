use super::{Operator, OperatorConfig, OperatorType, missing};
use veil_core::{Error, Result};

pub const NAME: &str = "mask";
pub const MASKING_CHAR: &str = "masking_char";
pub const CHARS_TO_MASK: &str = "chars_to_mask";
pub const FROM_END: &str = "from_end";

/// Replace up to `chars_to_mask` characters from the start (or end) with `masking_char`
pub struct Mask;

struct MaskParams {
    masking_char: char,
    chars_to_mask: usize,
    from_end: bool,
}

fn params(config: &OperatorConfig) -> Result<MaskParams> {
    let masking_char = config
        .str_param(MASKING_CHAR)?
        .ok_or_else(|| missing(NAME, MASKING_CHAR))?;
    let mut chars = masking_char.chars();
    let (Some(masking_char), None) = (chars.next(), chars.next()) else {
        return Err(Error::InvalidParameter(format!(
            "{}: '{}' must be a single character",
            NAME, MASKING_CHAR
        )));
    };

    let chars_to_mask = config
        .u64_param(CHARS_TO_MASK)?
        .ok_or_else(|| missing(NAME, CHARS_TO_MASK))?;
    let from_end = config
        .bool_param(FROM_END)?
        .ok_or_else(|| missing(NAME, FROM_END))?;

    Ok(MaskParams {
        masking_char,
        chars_to_mask: usize::try_from(chars_to_mask).unwrap_or(usize::MAX),
        from_end,
    })
}

impl Operator for Mask {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        params(config).map(|_| ())
    }

    fn operate(&self, text: &str, config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        let params = params(config)?;
        let len = text.chars().count();
        let count = params.chars_to_mask.min(len);
        let masked_range = if params.from_end {
            len - count..len
        } else {
            0..count
        };

        Ok(text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if masked_range.contains(&i) {
                    params.masking_char
                } else {
                    c
                }
            })
            .collect())
    }
}
