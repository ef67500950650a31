use crate::error::{ExporterError, Result};
use crate::normalize::{MetricInstance, MetricValue};
use std::collections::HashMap;

/// One metric family in exposition format: HELP/TYPE header plus the
/// sample lines accumulated across device rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpositionRecord {
    pub exposed_name: String,
    pub help_line: String,
    pub type_line: String,
    pub sample_lines: Vec<String>,
}

/// Renders one instance into a record carrying a single sample line.
///
/// Returns `None` for a disabled instance. Text-kind metrics use the
/// info pattern: the value travels as an extra label appended after the
/// base set, and the sample value is the constant `1`.
pub fn format_instance(
    instance: &MetricInstance<'_>,
    label_string: &str,
) -> Option<ExpositionRecord> {
    let value = instance.value()?;
    let descriptor = instance.descriptor;
    let exposed_name = descriptor.exposed_name();

    let (labels, rendered) = match value {
        MetricValue::Text(text) => {
            let pair = format!(
                "{}=\"{}\"",
                descriptor.label_key(),
                escape_label_value(text)
            );
            let labels = if label_string.is_empty() {
                pair
            } else {
                format!("{}, {}", label_string, pair)
            };
            (labels, "1".to_string())
        }
        other => (label_string.to_string(), other.to_string()),
    };

    Some(ExpositionRecord {
        help_line: format!("# HELP {} {}", exposed_name, descriptor.description),
        type_line: format!("# TYPE {} gauge", exposed_name),
        sample_lines: vec![format!("{}{{{}}} {}", exposed_name, labels, rendered)],
        exposed_name,
    })
}

/// Escapes an exposition label value: backslash, double-quote, newline.
pub fn escape_label_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Accumulates records across device rows, collapsing repeated
/// HELP/TYPE headers into one per metric name.
///
/// Output order is first-seen insertion order, held by an explicit
/// index map; nothing in the output path iterates a hash map.
#[derive(Debug, Default)]
pub struct Collection {
    records: Vec<ExpositionRecord>,
    index: HashMap<String, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a record in. A known exposed name only contributes its
    /// sample lines; its HELP/TYPE text must match what is stored, a
    /// mismatch means the registry itself is inconsistent.
    pub fn add(&mut self, record: ExpositionRecord) -> Result<()> {
        match self.index.get(&record.exposed_name) {
            Some(&i) => {
                let existing = &mut self.records[i];
                if existing.help_line != record.help_line
                    || existing.type_line != record.type_line
                {
                    return Err(ExporterError::ExpositionConflict(record.exposed_name));
                }
                existing.sample_lines.extend(record.sample_lines);
            }
            None => {
                self.index.insert(record.exposed_name.clone(), self.records.len());
                self.records.push(record);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flattens the collection to the final text blob, each line
    /// newline-terminated.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for record in &self.records {
            output.push_str(&record.help_line);
            output.push('\n');
            output.push_str(&record.type_line);
            output.push('\n');
            for line in &record.sample_lines {
                output.push_str(line);
                output.push('\n');
            }
        }
        output
    }
}
