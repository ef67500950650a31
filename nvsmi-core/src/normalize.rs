use crate::registry::{MetricDescriptor, ValueKind};
use std::fmt;
use tracing::debug;

/// Literal the diagnostic tool emits when a feature is absent on this
/// hardware/driver combination.
pub const NOT_SUPPORTED_SENTINEL: &str = "[Not Supported]";

const MIB: i64 = 1024 * 1024;

/// A typed, scaled metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// Validated hexadecimal token, kept in its original textual base.
    Hex(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Text(s) => write!(f, "{}", s),
            MetricValue::Integer(i) => write!(f, "{}", i),
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Hex(s) => write!(f, "{}", s),
        }
    }
}

/// One realized value for one device in one collection pass.
///
/// Instances borrow their descriptor from the registry and are built
/// fresh per row, so a disabled state never leaks across devices.
#[derive(Debug, Clone)]
pub struct MetricInstance<'a> {
    pub descriptor: &'a MetricDescriptor,
    pub raw: String,
    value: Option<MetricValue>,
}

impl MetricInstance<'_> {
    /// A disabled instance contributes nothing to the output.
    pub fn enabled(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&MetricValue> {
        self.value.as_ref()
    }
}

/// Normalizes one raw field against its descriptor.
///
/// The `[Not Supported]` sentinel and malformed or empty fields disable
/// the instance without raising an error; a single bad field silences
/// one metric for one device, never the whole pass.
pub fn normalize<'a>(descriptor: &'a MetricDescriptor, raw: &str) -> MetricInstance<'a> {
    let trimmed = raw.trim();

    if trimmed == NOT_SUPPORTED_SENTINEL {
        debug!("{}: not supported on this device", descriptor.name);
        return MetricInstance {
            descriptor,
            raw: raw.to_string(),
            value: None,
        };
    }

    let value = match descriptor.kind {
        ValueKind::Text => {
            if trimmed.is_empty() {
                None
            } else {
                Some(MetricValue::Text(trimmed.to_string()))
            }
        }
        ValueKind::Integer | ValueKind::Celsius => first_token(trimmed)
            .and_then(|t| t.parse::<i64>().ok())
            .map(MetricValue::Integer),
        ValueKind::PercentRatio => first_token(trimmed)
            .and_then(|t| t.parse::<f64>().ok())
            .map(|v| MetricValue::Float(v / 100.0)),
        ValueKind::MebibytesToBytes => first_token(trimmed)
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(|v| v.checked_mul(MIB))
            .map(MetricValue::Integer),
        ValueKind::Watts => first_token(trimmed)
            .and_then(|t| t.parse::<f64>().ok())
            .map(MetricValue::Float),
        ValueKind::Hex => first_token(trimmed).and_then(parse_hex),
    };

    if value.is_none() {
        debug!(
            "{}: unparsable field {:?}, metric disabled for this device",
            descriptor.name, trimmed
        );
    }

    MetricInstance {
        descriptor,
        raw: raw.to_string(),
        value,
    }
}

/// Leading token of the trimmed field; strips vendor-appended unit
/// suffixes such as "MiB", "W", "%".
fn first_token(trimmed: &str) -> Option<&str> {
    match trimmed.split(' ').next() {
        Some("") | None => None,
        Some(token) => Some(token),
    }
}

/// Validates a base-16 token, keeping its textual form for display.
fn parse_hex(token: &str) -> Option<MetricValue> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    i64::from_str_radix(digits, 16).ok()?;
    Some(MetricValue::Hex(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: ValueKind) -> MetricDescriptor {
        MetricDescriptor {
            name: "test.metric",
            description: "test metric",
            kind,
        }
    }

    #[test]
    fn test_mebibytes_scaled_to_bytes() {
        let d = descriptor(ValueKind::MebibytesToBytes);
        let instance = normalize(&d, "16130 MiB");

        assert_eq!(
            instance.value(),
            Some(&MetricValue::Integer(16130 * 1024 * 1024))
        );
    }

    #[test]
    fn test_percent_scaled_to_ratio() {
        let d = descriptor(ValueKind::PercentRatio);
        let instance = normalize(&d, "97 %");

        assert_eq!(instance.value(), Some(&MetricValue::Float(0.97)));
    }

    #[test]
    fn test_watts_parsed_as_float() {
        let d = descriptor(ValueKind::Watts);
        let instance = normalize(&d, "30.65 W");

        assert_eq!(instance.value(), Some(&MetricValue::Float(30.65)));
    }

    #[test]
    fn test_celsius_parsed_as_integer() {
        let d = descriptor(ValueKind::Celsius);
        let instance = normalize(&d, "36");

        assert_eq!(instance.value(), Some(&MetricValue::Integer(36)));
    }

    #[test]
    fn test_not_supported_sentinel_disables() {
        let d = descriptor(ValueKind::Integer);
        let instance = normalize(&d, "  [Not Supported]  ");

        assert!(!instance.enabled());
    }

    #[test]
    fn test_unparsable_field_disables() {
        let d = descriptor(ValueKind::Integer);
        let instance = normalize(&d, "N/A");

        assert!(!instance.enabled());
    }

    #[test]
    fn test_empty_field_disables() {
        let d = descriptor(ValueKind::Watts);
        assert!(!normalize(&d, "").enabled());
        assert!(!normalize(&d, "   ").enabled());
    }

    #[test]
    fn test_empty_text_field_disables() {
        let d = descriptor(ValueKind::Text);
        let instance = normalize(&d, "  ");

        assert!(!instance.enabled());
    }

    #[test]
    fn test_text_keeps_embedded_spaces() {
        let d = descriptor(ValueKind::Text);
        let instance = normalize(&d, "  Tesla M10  ");

        assert_eq!(
            instance.value(),
            Some(&MetricValue::Text("Tesla M10".to_string()))
        );
    }

    #[test]
    fn test_hex_keeps_textual_base() {
        let d = descriptor(ValueKind::Hex);
        let instance = normalize(&d, "0x13B210DE");

        assert_eq!(
            instance.value(),
            Some(&MetricValue::Hex("0x13B210DE".to_string()))
        );
    }

    #[test]
    fn test_hex_rejects_non_hex_token() {
        let d = descriptor(ValueKind::Hex);
        let instance = normalize(&d, "0xZZ");

        assert!(!instance.enabled());
    }

    #[test]
    fn test_unit_suffix_stripped() {
        let d = descriptor(ValueKind::Integer);
        let instance = normalize(&d, " 42 % ");

        assert_eq!(instance.value(), Some(&MetricValue::Integer(42)));
    }

    #[test]
    fn test_overflow_disables() {
        let d = descriptor(ValueKind::MebibytesToBytes);
        let instance = normalize(&d, &i64::MAX.to_string());

        assert!(!instance.enabled());
    }
}
