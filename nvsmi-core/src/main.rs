use nvsmi_core::{default_registry, init_logging, smi, Collector, ExporterConfig};
use std::io::Write;
use tracing::{error, info};

fn main() {
    init_logging();

    info!("nvsmi-exporter - GPU metrics in textfile exposition format");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match ExporterConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            info!("Using default configuration");
            ExporterConfig::default()
        }
    };

    let registry = default_registry();

    let rows = match smi::query_devices(&config.smi, registry) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to query devices: {}", e);
            std::process::exit(1);
        }
    };

    let blob = match Collector::new(registry).collect(&rows) {
        Ok(blob) => blob,
        Err(e) => {
            error!("Collection pass failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_output(&config, &blob) {
        error!("Failed to write metrics: {}", e);
        std::process::exit(1);
    }
}

fn write_output(config: &ExporterConfig, blob: &str) -> nvsmi_core::Result<()> {
    match &config.output.textfile_path {
        Some(path) => {
            std::fs::write(path, blob)?;
            info!("Wrote metrics to {}", path.display());
        }
        None => {
            std::io::stdout().write_all(blob.as_bytes())?;
        }
    }
    Ok(())
}
