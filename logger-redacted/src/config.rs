// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development terminals
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_ansi: true,
        }
    }
}

impl LoggerConfig {
    /// Pretty logs in development, JSON everywhere else
    pub fn for_environment(environment: &str) -> Self {
        if environment.eq_ignore_ascii_case("development") {
            Self::default()
        } else {
            Self {
                format: LogFormat::Json,
                with_ansi: false,
                ..Self::default()
            }
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_logs_are_json() {
        assert_eq!(LoggerConfig::for_environment("production").format, LogFormat::Json);
        assert_eq!(
            LoggerConfig::for_environment("Development").format,
            LogFormat::Pretty
        );
    }
}
