//! IPv4 and IPv6 addresses

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use std::net::IpAddr;

pub const NAME: &str = "IpRecognizer";
pub const ENTITY: &str = "IP_ADDRESS";

pub struct IpValidator;

impl PatternValidator for IpValidator {
    fn invalidate_result(&self, pattern_text: &str) -> Option<bool> {
        Some(pattern_text.parse::<IpAddr>().is_err())
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .patterns([
            Pattern::new(
                "IPv4",
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
                0.6,
            ),
            Pattern::new(
                "IPv6",
                r"(?:[0-9A-F]{1,4}|:)(?:[0-9A-F]{0,4}:){1,7}[0-9A-F]{0,4}",
                0.6,
            ),
        ])
        .context(["ip", "ipv4", "ipv6"])
        .validator(IpValidator)
}
