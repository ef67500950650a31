pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod normalize;
pub mod registry;
pub mod smi;

pub use collector::Collector;
pub use config::ExporterConfig;
pub use error::{ExporterError, Result};
pub use registry::{default_registry, MetricDescriptor, Registry, ValueKind};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nvsmi_core=debug"))
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
