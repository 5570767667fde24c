//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Keys that are absent
//! fall back to their defaults; keys that are present must parse.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::backtest::EndOfDataPolicy;
use crate::domain::error::TraderError;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::{parse_bool, ConfigPort};

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_data_config(config)?;
    validate_strategy_config(config)?;
    validate_broker_config(config)?;
    validate_end_of_data(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_ema_periods(config)?;
    validate_atr_period(config)?;
    for key in ["atr_tp_factor", "atr_sl_factor", "atr_trail_factor"] {
        validate_positive_factor(config, key)?;
    }
    Ok(())
}

pub fn validate_broker_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_initial_cash(config)?;
    validate_commission_rate(config)?;
    validate_order_size(config)?;
    validate_margin_check(config)?;
    Ok(())
}

/// Parse `[section] key` if present.
pub fn parse_key<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim()))),
    }
}

/// Parse an optional `YYYY-MM-DD` date from `[data]`.
pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, TraderError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_ema_periods(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let defaults = StrategyParams::default();
    let fast = parse_key::<i64>(config, "strategy", "ema_fast")?.unwrap_or(defaults.ema_fast as i64);
    let medium =
        parse_key::<i64>(config, "strategy", "ema_medium")?.unwrap_or(defaults.ema_medium as i64);
    let slow = parse_key::<i64>(config, "strategy", "ema_slow")?.unwrap_or(defaults.ema_slow as i64);

    for (key, value) in [("ema_fast", fast), ("ema_medium", medium), ("ema_slow", slow)] {
        if value < 1 {
            return Err(invalid("strategy", key, format!("{key} must be at least 1")));
        }
    }
    if fast >= medium {
        return Err(invalid(
            "strategy",
            "ema_fast",
            "ema_fast must be shorter than ema_medium".to_string(),
        ));
    }
    if medium >= slow {
        return Err(invalid(
            "strategy",
            "ema_medium",
            "ema_medium must be shorter than ema_slow".to_string(),
        ));
    }
    Ok(())
}

fn validate_atr_period(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = parse_key::<i64>(config, "strategy", "atr_period")?
        .unwrap_or(StrategyParams::default().atr_period as i64);
    if value < 1 {
        return Err(invalid(
            "strategy",
            "atr_period",
            "atr_period must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_positive_factor(config: &dyn ConfigPort, key: &str) -> Result<(), TraderError> {
    if let Some(value) = parse_key::<f64>(config, "strategy", key)? {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid("strategy", key, format!("{key} must be positive")));
        }
    }
    Ok(())
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(value) = parse_key::<f64>(config, "broker", "initial_cash")? {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid(
                "broker",
                "initial_cash",
                "initial_cash must be positive".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_commission_rate(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(value) = parse_key::<f64>(config, "broker", "commission_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "broker",
                "commission_rate",
                "commission_rate must be in [0, 1)".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_order_size(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(value) = parse_key::<i64>(config, "broker", "order_size")? {
        if value < 1 {
            return Err(invalid(
                "broker",
                "order_size",
                "order_size must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_margin_check(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("broker", "margin_check") {
        None => Ok(()),
        Some(raw) => parse_bool(&raw).map(|_| ()).ok_or_else(|| {
            invalid(
                "broker",
                "margin_check",
                "margin_check must be true or false".to_string(),
            )
        }),
    }
}

fn validate_end_of_data(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("backtest", "end_of_data") {
        None => Ok(()),
        Some(raw) => raw
            .parse::<EndOfDataPolicy>()
            .map(|_| ())
            .map_err(|reason| invalid("backtest", "end_of_data", reason)),
    }
}
