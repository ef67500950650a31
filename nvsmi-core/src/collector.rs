use crate::error::{ExporterError, Result};
use crate::exposition::{escape_label_value, format_instance, Collection};
use crate::normalize::{normalize, MetricInstance};
use crate::registry::Registry;
use tracing::debug;

/// Runs one collection pass: every device row from a single diagnostic
/// tool invocation is normalized, labeled, and folded into one text
/// blob. A fatal error yields no output at all.
pub struct Collector<'a> {
    registry: &'a Registry,
}

impl<'a> Collector<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn collect(&self, rows: &[Vec<String>]) -> Result<String> {
        let mut collection = Collection::new();

        for row in rows {
            if is_blank_row(row) {
                continue;
            }
            if self.is_header_row(row) {
                debug!("discarding header row");
                continue;
            }
            self.process_row(row, &mut collection)?;
        }

        Ok(collection.render())
    }

    /// The CSV header leads with the first query column name; no data
    /// row can, since position 0 holds a driver version string.
    fn is_header_row(&self, row: &[String]) -> bool {
        match (row.first(), self.registry.descriptors().first()) {
            (Some(field), Some(descriptor)) => field.trim() == descriptor.name,
            _ => false,
        }
    }

    /// One device row: positional normalization, label assembly, and
    /// one formatted sample per enabled non-label metric.
    fn process_row(&self, row: &[String], collection: &mut Collection) -> Result<()> {
        let expected = self.registry.field_count();
        if row.len() != expected {
            return Err(ExporterError::FieldCount {
                expected,
                actual: row.len(),
            });
        }

        // Fresh instances per row; the registry itself is never mutated.
        let instances: Vec<MetricInstance<'_>> = self
            .registry
            .descriptors()
            .iter()
            .zip(row)
            .map(|(descriptor, raw)| normalize(descriptor, raw))
            .collect();

        let label_string = build_label_string(self.registry, &instances);

        for instance in &instances {
            if self.registry.is_label(instance.descriptor.name) {
                continue;
            }
            if let Some(record) = format_instance(instance, &label_string) {
                collection.add(record)?;
            }
        }

        Ok(())
    }
}

/// Label pairs in registry declaration order; a disabled label-bearing
/// instance is omitted entirely, never rendered with an empty value.
fn build_label_string(registry: &Registry, instances: &[MetricInstance<'_>]) -> String {
    let pairs: Vec<String> = instances
        .iter()
        .filter(|instance| registry.is_label(instance.descriptor.name))
        .filter_map(|instance| {
            instance.value().map(|value| {
                format!(
                    "{}=\"{}\"",
                    instance.descriptor.label_key(),
                    escape_label_value(&value.to_string())
                )
            })
        })
        .collect();
    pairs.join(", ")
}

fn is_blank_row(row: &[String]) -> bool {
    row.is_empty() || (row.len() == 1 && row[0].trim().is_empty())
}
