use config::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;
use crate::models::storage_drawer::{DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// Storage slot advisor configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdvisorConfig {
    /// When set, the client-clustering rule refuses to recommend a slot
    /// that is already occupied and falls through the cascade instead.
    /// Off by default: the source system allows slot sharing.
    #[serde(default)]
    pub strict_slot_assignment: bool,

    /// Grid defaults applied to drawers with no explicit capacity.
    #[serde(default = "default_rows")]
    #[validate(range(min = 1))]
    pub default_rows: u32,

    #[serde(default = "default_columns")]
    #[validate(range(min = 1))]
    pub default_columns: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            strict_slot_assignment: false,
            default_rows: default_rows(),
            default_columns: default_columns(),
        }
    }
}

/// One shipping zone and its per-kilogram rate in MRU.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShippingZoneRate {
    #[validate(length(min = 1, max = 64))]
    pub zone: String,

    pub rate_per_kg: Decimal,
}

/// Pricing settings consumed by the quick price calculator.
///
/// Passed explicitly into the calculator so the computation stays pure and
/// testable; nothing in the core reads these from ambient state.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Commission charged as a fraction of the product price.
    #[serde(default = "default_commission_rate")]
    #[validate(custom = "validate_commission_rate")]
    pub commission_rate: Decimal,

    /// Per-zone international shipping rates.
    #[serde(default)]
    #[validate]
    pub shipping_zones: Vec<ShippingZoneRate>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            shipping_zones: Vec::new(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    #[validate]
    pub advisor: AdvisorConfig,

    #[serde(default)]
    #[validate]
    pub pricing: PricingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            advisor: AdvisorConfig::default(),
            pricing: PricingConfig::default(),
        }
    }
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_rows() -> u32 {
    DEFAULT_ROWS
}

fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

fn default_commission_rate() -> Decimal {
    dec!(0.10)
}

fn validate_commission_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE {
        return Err(ValidationError::new("commission_rate_out_of_range"));
    }
    Ok(())
}

/// Loads configuration from layered sources: built-in defaults, then
/// `config/default.toml`, then `config/{RUN_ENV}.toml`, then `APP__*`
/// environment variables (e.g. `APP__ADVISOR__STRICT_SLOT_ASSIGNMENT=true`).
pub fn load_config() -> Result<AppConfig, ServiceError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config.validate()?;

    info!(environment = %app_config.environment, "configuration loaded");
    Ok(app_config)
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// configured level. Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("cargodesk_core={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter_directive));
    if json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer()).try_init();
    }
}
