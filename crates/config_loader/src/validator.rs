//! Configuration validation
//!
//! Rules:
//! - field-level ranges declared on the config types (`validator` derive)
//! - fault_probability is a finite number
//! - fault_min_cycles <= fault_max_cycles
//! - store path not empty
//! - table name is a plain SQL identifier

use contracts::{ContractError, StationConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a StationConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &StationConfig) -> Result<(), ContractError> {
    validate_field_rules(config)?;
    validate_fault_window(config)?;
    validate_store(config)?;
    Ok(())
}

/// Run the derived per-field rules
fn validate_field_rules(config: &StationConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|errors| first_violation(&errors, String::new()))
}

/// Flatten nested validator output into a dotted field path
fn first_violation(errors: &ValidationErrors, prefix: String) -> ContractError {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .first()
                    .map(|e| format!("failed '{}' check", e.code))
                    .unwrap_or_else(|| "invalid value".to_string());
                return ContractError::config_validation(path, message);
            }
            ValidationErrorsKind::Struct(inner) => return first_violation(inner, path),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_violation(inner, format!("{path}[{idx}]"));
                }
            }
        }
    }
    ContractError::config_validation(prefix, "invalid value")
}

/// Check the fault probability and burst range
///
/// NaN slips through the derived range rule, so it is caught here.
fn validate_fault_window(config: &StationConfig) -> Result<(), ContractError> {
    let sim = &config.simulator;
    if !sim.fault_probability.is_finite() {
        return Err(ContractError::config_validation(
            "simulator.fault_probability",
            format!("{} is not a probability", sim.fault_probability),
        ));
    }
    if sim.fault_min_cycles > sim.fault_max_cycles {
        return Err(ContractError::config_validation(
            "simulator.fault_min_cycles / simulator.fault_max_cycles",
            format!(
                "fault_min_cycles ({}) must be <= fault_max_cycles ({})",
                sim.fault_min_cycles, sim.fault_max_cycles
            ),
        ));
    }
    Ok(())
}

/// Check store path and table name
fn validate_store(config: &StationConfig) -> Result<(), ContractError> {
    let store = &config.store;
    if store.path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "store.path",
            "store path cannot be empty",
        ));
    }

    if !store.has_plain_table_name() {
        return Err(ContractError::config_validation(
            "store.table",
            format!("'{}' is not a plain SQL identifier", store.table),
        ));
    }
    Ok(())
}
