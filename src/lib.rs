//! # GlobeGuide
//!
//! Travel essentials for a destination: outbound links to booking and search
//! providers, a short Open-Meteo forecast, and "See"/"Eat" highlights pulled
//! from Wikivoyage.
//!
//! The weather and wiki lookups run as two independent pipelines that are
//! restarted whenever the destination changes; results from a superseded
//! destination are dropped before they reach the view state.

pub mod config;
pub mod extract;
pub mod i18n;
pub mod links;
pub mod pipeline;
pub mod render;
pub mod weather;
pub mod wikivoyage;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

// Re-export main types for convenience
pub use config::LookupConfig;
pub use extract::{ExcerptExtractor, ListItemExtractor};
pub use i18n::{translate, Language};
pub use links::{build_provider_links, Provider};
pub use pipeline::{Dispatch, Generation, LookupPipeline, LookupState, WeatherPanel, WikiPanel};
pub use weather::{OpenMeteoClient, PlaceLookup};
pub use wikivoyage::{
    fetch_travel_excerpts, ExcerptStage, SectionRef, TravelWiki, WikivoyageClient, WikivoyageError,
};

/// Destination used when the search box is submitted empty
pub const DEFAULT_DESTINATION: &str = "Paris";

/// Party size used when none is given
pub const DEFAULT_PARTY_SIZE: u32 = 2;

/// Errors from the remote lookups
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Weather failed: {0}")]
    Weather(String),

    #[error("Wikivoyage lookup failed: {0}")]
    Wikivoyage(#[from] WikivoyageError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LookupError {
    /// Short text shown next to the forecast panel
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Geocoding(_) => "Geocoding failed".to_string(),
            LookupError::Weather(_) => "Weather failed".to_string(),
            LookupError::Wikivoyage(_) => "Wikivoyage search failed".to_string(),
            LookupError::HttpError(e) => e.to_string(),
        }
    }
}

/// Errors from editing a query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid date format: {0}")]
    DateParseError(String),

    #[error("Check-out {checkout} is before check-in {checkin}")]
    DateOrder { checkin: NaiveDate, checkout: NaiveDate },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// A committed search. Replaced wholesale on every search, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub destination: String,
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
    pub party_size: u32,
}

impl Query {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            checkin: None,
            checkout: None,
            party_size: DEFAULT_PARTY_SIZE,
        }
    }

    pub fn with_dates(mut self, checkin: Option<NaiveDate>, checkout: Option<NaiveDate>) -> Self {
        self.checkin = checkin;
        self.checkout = checkout;
        self
    }

    pub fn with_party_size(mut self, party_size: u32) -> Self {
        self.party_size = party_size;
        self
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new(DEFAULT_DESTINATION)
    }
}

/// Editable form state behind the search panel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryDraft {
    pub destination: String,
    pub checkin: String,
    pub checkout: String,
    pub party_size: u32,
}

impl From<&Query> for QueryDraft {
    fn from(query: &Query) -> Self {
        Self {
            destination: query.destination.clone(),
            checkin: query.checkin.map(|d| d.to_string()).unwrap_or_default(),
            checkout: query.checkout.map(|d| d.to_string()).unwrap_or_default(),
            party_size: query.party_size,
        }
    }
}

impl QueryDraft {
    /// Turn the form into a new committed query
    pub fn submit(&self) -> Result<Query, QueryError> {
        let destination = match self.destination.trim() {
            "" => DEFAULT_DESTINATION.to_string(),
            trimmed => trimmed.to_string(),
        };
        let checkin = parse_optional_date(&self.checkin)?;
        let checkout = parse_optional_date(&self.checkout)?;

        if let (Some(checkin), Some(checkout)) = (checkin, checkout) {
            if checkout < checkin {
                return Err(QueryError::DateOrder { checkin, checkout });
            }
        }

        let party_size = if self.party_size == 0 {
            DEFAULT_PARTY_SIZE
        } else {
            self.party_size
        };

        Ok(Query {
            destination,
            checkin,
            checkout,
            party_size,
        })
    }
}

/// Parse a `YYYY-MM-DD` date; blank input means "unset".
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, QueryError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| QueryError::DateParseError(value.to_string()))
}

/// Best geocoding match for a destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl GeoResult {
    /// "Name, Country", or just the name when the country is unknown
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

/// One day of the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Celsius; the provider may leave a day blank
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    /// Millimetres, zero when the provider reports nothing
    pub precipitation: f64,
}

/// Conditions at request time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastResult {
    pub days: Vec<DailyForecast>,
    pub current: Option<CurrentWeather>,
    pub timezone: Option<String>,
}

/// "See"/"Eat" style excerpts for one wiki page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WikiExtract {
    pub page_title: Option<String>,
    pub sections: BTreeMap<String, Vec<String>>,
}

impl WikiExtract {
    pub fn section(&self, label: &str) -> &[String] {
        self.sections.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }
}

/// Build the production pipeline: Open-Meteo for weather, Wikivoyage for excerpts.
pub fn default_pipeline(config: &LookupConfig) -> Result<LookupPipeline, LookupError> {
    let places = OpenMeteoClient::new(config)?;
    let wiki = WikivoyageClient::new(config)?;
    let extractor = ListItemExtractor::new()?;
    Ok(LookupPipeline::new(
        Arc::new(places),
        Arc::new(wiki),
        Arc::new(extractor),
        config,
    ))
}

/// Run both pipelines once for a destination and return the settled state.
///
/// # Example
/// ```rust,no_run
/// use globeguide::{lookup_destination, Language, LookupConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let state = lookup_destination("Lisbon", Language::En, &LookupConfig::default()).await?;
/// if let Some(geo) = &state.weather.geo {
///     println!("Forecast for {}", geo.display_name());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn lookup_destination(
    destination: &str,
    language: Language,
    config: &LookupConfig,
) -> Result<LookupState, LookupError> {
    let pipeline = default_pipeline(config)?;
    pipeline.dispatch(destination, language).finished().await;
    Ok(pipeline.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_query_defaults() {
        let query = Query::default();
        assert_eq!(query.destination, "Paris");
        assert_eq!(query.party_size, 2);
        assert!(query.checkin.is_none());
        assert!(query.checkout.is_none());
    }

    #[test]
    fn test_draft_submit_trims_and_defaults() {
        let draft = QueryDraft {
            destination: "   ".to_string(),
            checkin: String::new(),
            checkout: String::new(),
            party_size: 0,
        };
        let query = draft.submit().unwrap();
        assert_eq!(query.destination, DEFAULT_DESTINATION);
        assert_eq!(query.party_size, DEFAULT_PARTY_SIZE);

        let draft = QueryDraft {
            destination: "  Kyoto ".to_string(),
            checkin: "2025-04-01".to_string(),
            checkout: "2025-04-05".to_string(),
            party_size: 3,
        };
        let query = draft.submit().unwrap();
        assert_eq!(query.destination, "Kyoto");
        assert_eq!(query.checkin, Some(date("2025-04-01")));
        assert_eq!(query.checkout, Some(date("2025-04-05")));
        assert_eq!(query.party_size, 3);
    }

    #[test]
    fn test_draft_rejects_bad_dates() {
        let mut draft = QueryDraft::from(&Query::default());
        draft.checkin = "01/04/2025".to_string();
        assert!(matches!(draft.submit(), Err(QueryError::DateParseError(_))));

        draft.checkin = "2025-04-05".to_string();
        draft.checkout = "2025-04-01".to_string();
        assert!(matches!(draft.submit(), Err(QueryError::DateOrder { .. })));
    }

    #[test]
    fn test_draft_round_trips_committed_query() {
        let query = Query::new("Rome")
            .with_dates(Some(date("2025-06-01")), None)
            .with_party_size(4);
        let draft = QueryDraft::from(&query);
        assert_eq!(draft.checkin, "2025-06-01");
        assert_eq!(draft.checkout, "");
        assert_eq!(draft.submit().unwrap(), query);
    }

    #[test]
    fn test_geo_display_name() {
        let mut geo = GeoResult {
            latitude: 48.85,
            longitude: 2.35,
            name: "Paris".to_string(),
            country: Some("France".to_string()),
            timezone: Some("Europe/Paris".to_string()),
        };
        assert_eq!(geo.display_name(), "Paris, France");
        geo.country = None;
        assert_eq!(geo.display_name(), "Paris");
    }

    #[test]
    fn test_wiki_extract_section_lookup() {
        let mut extract = WikiExtract::default();
        assert!(extract.is_empty());
        extract
            .sections
            .insert("See".to_string(), vec!["Louvre".to_string()]);
        assert_eq!(extract.section("See"), &["Louvre".to_string()]);
        assert!(extract.section("Eat").is_empty());
        assert!(!extract.is_empty());
    }

    #[test]
    fn test_lookup_error_user_messages() {
        assert_eq!(
            LookupError::Geocoding("status 500".to_string()).user_message(),
            "Geocoding failed"
        );
        assert_eq!(
            LookupError::Weather("status 502".to_string()).user_message(),
            "Weather failed"
        );
    }
}
