use crate::config::SmiConfig;
use crate::error::{ExporterError, Result};
use crate::registry::Registry;
use std::process::Command;
use tracing::debug;

/// Arguments for one diagnostic query, column order matching the
/// registry's descriptor order 1:1.
pub fn query_args(registry: &Registry) -> Vec<String> {
    vec![
        format!("--query-gpu={}", registry.query_fields().join(",")),
        "--format=csv".to_string(),
    ]
}

/// Runs the diagnostic tool once and splits its output into raw field
/// rows, header included.
pub fn query_devices(config: &SmiConfig, registry: &Registry) -> Result<Vec<Vec<String>>> {
    let args = query_args(registry);
    debug!("running {} {}", config.binary, args.join(" "));

    let output = Command::new(&config.binary)
        .args(&args)
        .output()
        .map_err(|e| ExporterError::Smi(format!("failed to run {}: {}", config.binary, e)))?;

    if !output.status.success() {
        return Err(ExporterError::Smi(format!(
            "{} exited with {}",
            config.binary, output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_rows(&stdout))
}

/// Splits raw tool output into rows of trimmed comma-separated fields.
/// None of the queried columns can contain a comma.
pub fn parse_rows(stdout: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .map(|line| line.split(',').map(|f| f.trim().to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_registry;

    #[test]
    fn test_query_args_match_registry_order() {
        let args = query_args(default_registry());

        assert_eq!(args.len(), 2);
        assert!(args[0].starts_with("--query-gpu=driver_version,gpu_serial,gpu_name,index,"));
        assert!(args[0].ends_with(",pcie.link.width.max"));
        assert_eq!(args[1], "--format=csv");
    }

    #[test]
    fn test_parse_rows_trims_fields() {
        let rows = parse_rows("a, b ,c\n 1,2 , 3 \n");

        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_keeps_blank_lines_as_blank_rows() {
        let rows = parse_rows("a,b\n\nc,d\n");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![String::new()]);
    }

    #[test]
    fn test_missing_binary_is_an_smi_error() {
        let config = SmiConfig {
            binary: "/nonexistent/nvidia-smi".to_string(),
        };
        let err = query_devices(&config, default_registry()).unwrap_err();

        assert!(matches!(err, ExporterError::Smi(_)));
    }
}
