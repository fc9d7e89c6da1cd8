//! Configuration validation.
//!
//! Validates all config fields before a run starts, so a bad file fails
//! up front rather than mid-simulation.

use crate::domain::error::QuantscreenError;
use crate::domain::strategy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    validate_dates(config)?;
    validate_data_dir(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    validate_strategy_name(config)?;
    validate_capacity(config)?;
    validate_gross_leverage(config)?;
    validate_max_position_size(config)?;
    validate_safety_margin(config)?;
    Ok(())
}

pub fn validate_costs_config(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    validate_slippage(config)?;
    validate_volume_limit(config)?;
    validate_commission(config)?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let start_str = config.get_string("run", "start_date");
    let end_str = config.get_string("run", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(QuantscreenError::ConfigInvalid {
            section: "run".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, QuantscreenError> {
    match value {
        None => Err(QuantscreenError::ConfigMissing {
            section: "run".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            QuantscreenError::ConfigInvalid {
                section: "run".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    match config.get_string("run", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(QuantscreenError::ConfigMissing {
            section: "run".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    match config.get_string("strategy", "name") {
        Some(s) if !s.trim().is_empty() => {
            strategy::by_name(s.trim())?;
            Ok(())
        }
        _ => Err(QuantscreenError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

fn validate_capacity(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_int("strategy", "capacity", 25);
    if value < 1 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "capacity".to_string(),
            reason: "capacity must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_gross_leverage(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_double("strategy", "gross_leverage", 1.0);
    if value <= 0.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "gross_leverage".to_string(),
            reason: "gross_leverage must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_max_position_size(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_double("strategy", "max_position_size", 0.04);
    if value <= 0.0 || value > 1.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "max_position_size".to_string(),
            reason: "max_position_size must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_safety_margin(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_double("strategy", "safety_margin", 0.99);
    if value <= 0.0 || value > 1.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "safety_margin".to_string(),
            reason: "safety_margin must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_slippage(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_double("costs", "slippage_bps", 0.0);
    if value < 0.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "costs".to_string(),
            key: "slippage_bps".to_string(),
            reason: "slippage_bps must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_volume_limit(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let value = config.get_double("costs", "volume_limit", 0.1);
    if value <= 0.0 || value > 1.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "costs".to_string(),
            key: "volume_limit".to_string(),
            reason: "volume_limit must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), QuantscreenError> {
    let per_share = config.get_double("costs", "commission_per_share", 0.0);
    if per_share < 0.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "costs".to_string(),
            key: "commission_per_share".to_string(),
            reason: "commission_per_share must be non-negative".to_string(),
        });
    }
    let minimum = config.get_double("costs", "min_commission", 0.0);
    if minimum < 0.0 {
        return Err(QuantscreenError::ConfigInvalid {
            section: "costs".to_string(),
            key: "min_commission".to_string(),
            reason: "min_commission must be non-negative".to_string(),
        });
    }
    Ok(())
}
