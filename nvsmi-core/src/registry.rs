use crate::error::{ExporterError, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Namespace prefix carried by every exposed metric name.
pub const METRIC_NAMESPACE: &str = "nvsmi_";

/// How a raw field is interpreted, scaled, and suffixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free-form text, exposed through the info-metric pattern.
    Text,
    /// Plain integer, no scaling.
    Integer,
    /// Percentage scaled down to a 0.0-1.0 ratio.
    PercentRatio,
    /// MiB figure converted to bytes.
    MebibytesToBytes,
    /// Temperature in degrees Celsius.
    Celsius,
    /// Power figure in Watts.
    Watts,
    /// Hexadecimal token, validated but kept in its textual base.
    Hex,
}

impl ValueKind {
    /// Unit suffix appended to the exposed metric name.
    pub fn suffix(self) -> &'static str {
        match self {
            ValueKind::Text => "_info",
            ValueKind::Integer | ValueKind::Hex => "",
            ValueKind::PercentRatio => "_ratio",
            ValueKind::MebibytesToBytes => "_bytes",
            ValueKind::Celsius => "_celsius",
            ValueKind::Watts => "_watts",
        }
    }
}

/// Immutable definition of one queried metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ValueKind,
}

impl MetricDescriptor {
    const fn new(name: &'static str, description: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            description,
            kind,
        }
    }

    /// Exposition-format metric name: namespaced, dots replaced by
    /// underscores, kind suffix appended.
    pub fn exposed_name(&self) -> String {
        format!(
            "{}{}{}",
            METRIC_NAMESPACE,
            self.name.replace('.', "_"),
            self.kind.suffix()
        )
    }

    /// Label key used when this metric's value travels as a label
    /// (dots are not legal in exposition label names).
    pub fn label_key(&self) -> String {
        self.name.replace('.', "_")
    }
}

/// Ordered, read-only table of metric definitions plus the subset of
/// names whose values travel as labels instead of standalone metrics.
///
/// The descriptor order is the query column order; the row processor
/// relies on that positional alignment.
#[derive(Debug)]
pub struct Registry {
    descriptors: Vec<MetricDescriptor>,
    label_names: Vec<&'static str>,
}

impl Registry {
    /// Builds a registry, rejecting duplicate metric names, duplicate
    /// exposed names among emitted metrics, and label designations that
    /// point at no descriptor.
    pub fn new(
        descriptors: Vec<MetricDescriptor>,
        label_names: Vec<&'static str>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name) {
                return Err(ExporterError::RegistryConfig(format!(
                    "duplicate metric name {}",
                    descriptor.name
                )));
            }
        }

        let registry = Self {
            descriptors,
            label_names,
        };

        for name in &registry.label_names {
            registry.describe(name)?;
        }

        let mut exposed = HashSet::new();
        for descriptor in registry.emitted_descriptors() {
            if !exposed.insert(descriptor.exposed_name()) {
                return Err(ExporterError::RegistryConfig(format!(
                    "duplicate exposed name {}",
                    descriptor.exposed_name()
                )));
            }
        }

        Ok(registry)
    }

    /// Looks up a descriptor by its dotted name.
    pub fn describe(&self, name: &str) -> Result<&MetricDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ExporterError::UnknownMetric(name.to_string()))
    }

    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    /// Descriptors emitted as standalone metrics, in declaration order.
    pub fn emitted_descriptors(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter().filter(|d| !self.is_label(d.name))
    }

    /// Whether this metric's value travels as a label.
    pub fn is_label(&self, name: &str) -> bool {
        self.label_names.iter().any(|n| *n == name)
    }

    /// Query column names in positional order.
    pub fn query_fields(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    /// Number of fields every data row must carry.
    pub fn field_count(&self) -> usize {
        self.descriptors.len()
    }
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new(
        vec![
            MetricDescriptor::new(
                "driver_version",
                "NVIDIA display driver version",
                ValueKind::Text,
            ),
            MetricDescriptor::new(
                "gpu_serial",
                "the serial number physically printed on the board",
                ValueKind::Text,
            ),
            MetricDescriptor::new(
                "gpu_name",
                "official product name of the GPU",
                ValueKind::Text,
            ),
            MetricDescriptor::new(
                "index",
                "zero-based index of the GPU as enumerated by the driver",
                ValueKind::Integer,
            ),
            MetricDescriptor::new(
                "utilization.gpu",
                "percent of time the GPU was busy",
                ValueKind::PercentRatio,
            ),
            MetricDescriptor::new(
                "utilization.memory",
                "percent of time GPU RAM was read / written",
                ValueKind::PercentRatio,
            ),
            MetricDescriptor::new(
                "memory.total",
                "total installed GPU RAM",
                ValueKind::MebibytesToBytes,
            ),
            MetricDescriptor::new(
                "memory.free",
                "total free GPU RAM",
                ValueKind::MebibytesToBytes,
            ),
            MetricDescriptor::new(
                "memory.used",
                "total GPU RAM allocated by active contexts",
                ValueKind::MebibytesToBytes,
            ),
            MetricDescriptor::new(
                "temperature.gpu",
                "core GPU temperature in degrees C",
                ValueKind::Celsius,
            ),
            MetricDescriptor::new(
                "fan.speed",
                "intended (NOT MEASURED!) fan speed in percent",
                ValueKind::Integer,
            ),
            MetricDescriptor::new(
                "power.draw",
                "power draw for the entire board in Watts",
                ValueKind::Watts,
            ),
            MetricDescriptor::new(
                "power.limit",
                "software power limit in Watts",
                ValueKind::Watts,
            ),
            MetricDescriptor::new("pci.domain", "PCI domain number", ValueKind::Hex),
            MetricDescriptor::new("pci.bus", "PCI bus number", ValueKind::Hex),
            MetricDescriptor::new("pci.device", "PCI device number", ValueKind::Hex),
            MetricDescriptor::new("pci.device_id", "PCI vendor device id", ValueKind::Hex),
            MetricDescriptor::new(
                "pcie.link.gen.current",
                "current PCI-E link generation",
                ValueKind::Integer,
            ),
            MetricDescriptor::new(
                "pcie.link.gen.max",
                "maximum PCI-E link generation possible with this GPU and system",
                ValueKind::Integer,
            ),
            MetricDescriptor::new(
                "pcie.link.width.current",
                "current PCI-E link width",
                ValueKind::Integer,
            ),
            MetricDescriptor::new(
                "pcie.link.width.max",
                "maximum PCI-E link width possible with this GPU and system configuration",
                ValueKind::Integer,
            ),
        ],
        vec![
            "gpu_serial",
            "gpu_name",
            "index",
            "pci.domain",
            "pci.bus",
            "pci.device",
            "pci.device_id",
        ],
    )
    .expect("compiled-in registry is valid")
});

/// Process-wide read-only registry; concurrent reads need no locking.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}
