use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{BasePortfolio, DataSettings, Evaluation, Frequency, Logging, Universe};

/// Prefix for environment overrides, e.g. `DIVERSIFIER__EVALUATION__RISK_FREE_RATE=0.03`.
pub const ENV_PREFIX: &str = "DIVERSIFIER";

/// Loads the application configuration from the `config.toml` file.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Reads the file at `path`, applies environment overrides, deserializes it
/// into our strongly-typed `Config` struct and validates it.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), tickers = config.universe.tickers.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[evaluation]
risk_free_rate = 0.01
financing_rate = 0.02
weight_asset = 0.25
weight_base_portfolio = 1.0
frequency = "daily"

[base_portfolio]
stock_ticker = "spy"
bond_ticker = "ief"
stock_weight = 0.6
bond_weight = 0.4

[universe]
tickers = ["qqq", "gld"]
start_date = "2008-01-01"
end_date = "2020-12-31"

[data]
directory = "data"
timeout_secs = 30
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_derives_engine_inputs() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();

        assert_eq!(config.universe.tickers, vec!["qqq", "gld"]);
        assert_eq!(config.periodicity().periods_per_year(), 252);
        assert_eq!(config.weights().unwrap().fractions(), (0.2, 0.8));
        assert_eq!(config.data.max_concurrency, 8);
        assert_eq!(config.data.timeout_secs, Some(30));
        assert!(config.logging.directory.is_none());
        assert_eq!(config.base_portfolio.display_name(), "stock_60_bond_40");
    }

    #[test]
    fn rejects_zero_weights() {
        let file = write_config(&SAMPLE.replace("weight_asset = 0.25", "weight_asset = 0.0")
            .replace("weight_base_portfolio = 1.0", "weight_base_portfolio = 0.0"));
        assert!(matches!(
            load_config_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_inverted_dates() {
        let file = write_config(&SAMPLE.replace("2008-01-01", "2021-01-01"));
        assert!(matches!(
            load_config_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn monthly_frequency_maps_to_twelve_periods() {
        let file = write_config(&SAMPLE.replace("\"daily\"", "\"monthly\""));
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.periodicity().periods_per_year(), 12);
    }
}
