//! Endpoint and limit settings shared by the HTTP clients and the lookup pipeline

use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "globeguide/0.1.0 (https://github.com/globeguide/globeguide)";

/// Settings for one lookup session
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub endpoints: Endpoints,
    pub user_agent: String,
    /// Request timeout applied by the HTTP client
    pub timeout_seconds: u64,
    /// Number of daily records kept from a forecast response
    pub forecast_days: usize,
    /// Maximum number of excerpts kept per wiki section
    pub excerpt_limit: usize,
    /// Wiki section headings to pull excerpts from, in display order
    pub sections: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub geocoding: String,
    pub forecast: String,
    pub wikivoyage: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
            wikivoyage: "https://en.wikivoyage.org/w/api.php".to_string(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
            forecast_days: 3,
            excerpt_limit: 6,
            sections: vec!["See".to_string(), "Eat".to_string()],
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Override the number of forecast days, ignoring zero.
    pub fn with_forecast_days(mut self, days: usize) -> Self {
        if days > 0 {
            self.forecast_days = days;
        }
        self
    }
}
