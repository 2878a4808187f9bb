//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::StationConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    port: String,
    baud_rate: u32,
    store: String,
    table: String,
    validate_domain: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(station) => {
            let warnings = collect_warnings(&station);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", station.version),
                    port: station
                        .serial
                        .port
                        .clone()
                        .unwrap_or_else(|| "auto".to_string()),
                    baud_rate: station.serial.baud_rate,
                    store: station.store.path.display().to_string(),
                    table: station.store.table.clone(),
                    validate_domain: station.ingest.validate_domain,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(station: &StationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if station.serial.baud_rate != 57_600 {
        warnings.push(format!(
            "serial.baud_rate is {}, the device firmware talks at 57600",
            station.serial.baud_rate
        ));
    }

    if !station.ingest.echo_lines && !station.ingest.validate_domain {
        warnings.push(
            "ingest.echo_lines is off and domain validation is off - bad readings are stored silently"
                .to_string(),
        );
    }

    if station.simulator.fault_probability > 0.5 {
        warnings.push(format!(
            "simulator.fault_probability {} makes fault bursts the normal state",
            station.simulator.fault_probability
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Port: {} @ {} baud", summary.port, summary.baud_rate);
            println!("  Store: {} (table {})", summary.store, summary.table);
            println!("  Domain validation: {}", summary.validate_domain);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
