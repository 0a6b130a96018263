//! Application settings: optional TOML file merged with `SENTINEL_*`
//! environment variables (env wins). `.env` is loaded by the binary before
//! this runs, so local development can keep overrides in a dotfile.

use serde::Deserialize;
use std::path::Path;

use crate::decision::Thresholds;

pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";
pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG_PATH";

const ENV_PORT: &str = "SENTINEL_PORT";
const ENV_SPAM_THRESHOLD: &str = "SENTINEL_SPAM_CONFIDENCE_THRESHOLD";
const ENV_RISK_THRESHOLD: &str = "SENTINEL_HIGH_RISK_THRESHOLD";
const ENV_STRICT_MODE: &str = "SENTINEL_STRICT_MODE";
const ENV_FAILURE_RATE: &str = "SENTINEL_DELIVERY_FAILURE_RATE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub spam_confidence_threshold: f32,
    pub high_risk_threshold: f32,
    pub strict_mode: bool,
    /// Simulated gateway failure rate in [0, 1]; 0.0 is deterministic.
    pub delivery_failure_rate: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let t = Thresholds::default();
        Self {
            port: 8000,
            spam_confidence_threshold: t.spam_confidence,
            high_risk_threshold: t.high_risk,
            strict_mode: false,
            delivery_failure_rate: 0.02,
        }
    }
}

impl Settings {
    /// Load settings: defaults <- optional TOML file <- env overrides.
    ///
    /// A missing config file is fine (defaults apply); a present but invalid
    /// file is an error so a typo does not silently run with defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut settings = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str::<Settings>(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config file {path}: {e}"))?
        } else {
            Settings::default()
        };
        settings.apply_env();
        settings.sanitize();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Some(p) = parse_env::<u16>(ENV_PORT) {
            self.port = p;
        }
        if let Some(v) = parse_env::<f32>(ENV_SPAM_THRESHOLD) {
            self.spam_confidence_threshold = v;
        }
        if let Some(v) = parse_env::<f32>(ENV_RISK_THRESHOLD) {
            self.high_risk_threshold = v;
        }
        if let Some(v) = std::env::var(ENV_STRICT_MODE).ok().map(|s| s == "1") {
            self.strict_mode = v;
        }
        if let Some(v) = parse_env::<f32>(ENV_FAILURE_RATE) {
            self.delivery_failure_rate = v;
        }
    }

    fn sanitize(&mut self) {
        self.spam_confidence_threshold = self.spam_confidence_threshold.clamp(0.0, 1.0);
        self.high_risk_threshold = self.high_risk_threshold.clamp(0.0, 1.0);
        self.delivery_failure_rate = self.delivery_failure_rate.clamp(0.0, 1.0);
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            spam_confidence: self.spam_confidence_threshold,
            high_risk: self.high_risk_threshold,
            strict_mode: self.strict_mode,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_decision_defaults() {
        let s = Settings::default();
        assert_eq!(s.thresholds(), Thresholds::default());
        assert_eq!(s.port, 8000);
    }

    #[test]
    fn toml_round_trip_with_partial_file() {
        let s: Settings = toml::from_str(
            r#"
            port = 9100
            strict_mode = true
            "#,
        )
        .unwrap();
        assert_eq!(s.port, 9100);
        assert!(s.strict_mode);
        // Unspecified keys keep defaults.
        assert_eq!(s.spam_confidence_threshold, 0.5);
        assert_eq!(s.delivery_failure_rate, 0.02);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut s = Settings {
            spam_confidence_threshold: 1.7,
            high_risk_threshold: -0.2,
            delivery_failure_rate: 3.0,
            ..Settings::default()
        };
        s.sanitize();
        assert_eq!(s.spam_confidence_threshold, 1.0);
        assert_eq!(s.high_risk_threshold, 0.0);
        assert_eq!(s.delivery_failure_rate, 1.0);
    }
}
