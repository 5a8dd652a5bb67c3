//! Open-Meteo geocoding and forecast client

use crate::config::LookupConfig;
use crate::{CurrentWeather, DailyForecast, ForecastResult, GeoResult, Language, LookupError};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

/// Place resolution and forecast, the two steps of the weather lookup
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Best match for a place name, `None` when nothing matches
    async fn resolve_place(&self, name: &str, lang: Language) -> Result<Option<GeoResult>, LookupError>;

    /// Daily forecast for a coordinate pair
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResult, LookupError>;
}

/// Open-Meteo client; no API key required
pub struct OpenMeteoClient {
    http_client: Client,
    geocoding_url: String,
    forecast_url: String,
    forecast_days: usize,
}

impl OpenMeteoClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        debug!("Creating new Open-Meteo client");
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            geocoding_url: config.endpoints.geocoding.clone(),
            forecast_url: config.endpoints.forecast.clone(),
            forecast_days: config.forecast_days,
        })
    }
}

#[async_trait]
impl PlaceLookup for OpenMeteoClient {
    #[instrument(level = "info", skip(self))]
    async fn resolve_place(&self, name: &str, lang: Language) -> Result<Option<GeoResult>, LookupError> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&self.geocoding_url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", lang.code()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Geocoding(e.to_string()))?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Geocoding request completed"
        );

        if !status.is_success() {
            error!(status = %status, "Geocoding request failed");
            return Err(LookupError::Geocoding(format!("status {}", status)));
        }

        let body: openmeteo::GeocodingResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Geocoding(e.to_string()))?;

        let place = body.into_best_match();
        match &place {
            Some(geo) => debug!(
                "Found location: {} ({:.4}, {:.4})",
                geo.name, geo.latitude, geo.longitude
            ),
            None => debug!("No geocoding match for {}", name),
        }
        Ok(place)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResult, LookupError> {
        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&self.forecast_url)
            .query(&[("latitude", latitude), ("longitude", longitude)])
            .query(&[
                ("current_weather", "true"),
                ("daily", "temperature_2m_max,temperature_2m_min,precipitation_sum"),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Weather(e.to_string()))?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Forecast request completed"
        );

        if !status.is_success() {
            error!(status = %status, "Forecast request failed");
            return Err(LookupError::Weather(format!("status {}", status)));
        }

        let body: openmeteo::ForecastResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Weather(e.to_string()))?;

        Ok(body.into_forecast(self.forecast_days))
    }
}

/// Convert a WMO weather code to a human-readable description
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Open-Meteo response shapes
mod openmeteo {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub timezone: Option<String>,
    }

    impl GeocodingResponse {
        pub fn into_best_match(self) -> Option<GeoResult> {
            self.results
                .unwrap_or_default()
                .into_iter()
                .next()
                .map(|r| GeoResult {
                    latitude: r.latitude,
                    longitude: r.longitude,
                    name: r.name,
                    country: r.country,
                    timezone: r.timezone,
                })
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub timezone: Option<String>,
        pub current_weather: Option<CurrentWeatherData>,
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeatherData {
        pub temperature: f64,
        pub windspeed: f64,
        pub winddirection: f64,
        pub weathercode: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max", default)]
        pub temperature_max: Vec<Option<f64>>,
        #[serde(rename = "temperature_2m_min", default)]
        pub temperature_min: Vec<Option<f64>>,
        #[serde(rename = "precipitation_sum", default)]
        pub precipitation: Vec<Option<f64>>,
    }

    impl ForecastResponse {
        /// Keep at most `max_days` days, in provider order
        pub fn into_forecast(self, max_days: usize) -> ForecastResult {
            let mut days = Vec::new();

            if let Some(daily) = &self.daily {
                for (i, time) in daily.time.iter().enumerate() {
                    if days.len() >= max_days {
                        break;
                    }
                    let date = match NaiveDate::parse_from_str(time, "%Y-%m-%d") {
                        Ok(date) => date,
                        Err(_) => {
                            warn!(time = %time, "Skipping forecast day with unparseable date");
                            continue;
                        }
                    };
                    days.push(DailyForecast {
                        date,
                        max_temp: daily.temperature_max.get(i).copied().flatten(),
                        min_temp: daily.temperature_min.get(i).copied().flatten(),
                        precipitation: daily.precipitation.get(i).copied().flatten().unwrap_or(0.0),
                    });
                }
            }

            let current = self.current_weather.map(|c| CurrentWeather {
                temperature: c.temperature,
                wind_speed: c.windspeed,
                wind_direction: c.winddirection,
                weather_code: c.weathercode,
                description: weather_code_to_description(c.weathercode).to_string(),
            });

            ForecastResult {
                days,
                current,
                timezone: self.timezone,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::openmeteo::{ForecastResponse, GeocodingResponse};
    use super::*;

    #[test]
    fn test_geocoding_best_match() {
        let body: GeocodingResponse = serde_json::from_str(
            r#"{"results":[
                {"id":2988507,"name":"Paris","latitude":48.85341,"longitude":2.3488,
                 "country":"France","timezone":"Europe/Paris","admin1":"Île-de-France"},
                {"id":4717560,"name":"Paris","latitude":33.66094,"longitude":-95.55551,
                 "country":"United States","timezone":"America/Chicago"}
            ],"generationtime_ms":0.7}"#,
        )
        .unwrap();
        let geo = body.into_best_match().unwrap();
        assert_eq!(geo.name, "Paris");
        assert_eq!(geo.country.as_deref(), Some("France"));
        assert_eq!(geo.timezone.as_deref(), Some("Europe/Paris"));
        assert!((geo.latitude - 48.85341).abs() < 1e-9);
    }

    #[test]
    fn test_geocoding_no_results() {
        let body: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms":0.3}"#).unwrap();
        assert!(body.into_best_match().is_none());
    }

    #[test]
    fn test_forecast_conversion() {
        let body: ForecastResponse = serde_json::from_str(
            r#"{
                "latitude": 48.86, "longitude": 2.34, "timezone": "Europe/Paris",
                "current_weather": {"time":"2025-08-15T10:00","temperature":21.4,"windspeed":9.7,
                                    "winddirection":250,"weathercode":3,"is_day":1},
                "daily": {
                    "time": ["2025-08-15","2025-08-16","2025-08-17","2025-08-18"],
                    "temperature_2m_max": [24.1, null, 26.0, 22.0],
                    "temperature_2m_min": [15.2, 14.8, 16.1, 13.0],
                    "precipitation_sum": [0.0, 2.4, null, 1.0]
                }
            }"#,
        )
        .unwrap();
        let forecast = body.into_forecast(3);

        assert_eq!(forecast.days.len(), 3);
        assert_eq!(forecast.days[0].date, NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
        assert_eq!(forecast.days[0].max_temp, Some(24.1));
        assert_eq!(forecast.days[1].max_temp, None);
        assert_eq!(forecast.days[1].precipitation, 2.4);
        assert_eq!(forecast.days[2].precipitation, 0.0);
        assert_eq!(forecast.timezone.as_deref(), Some("Europe/Paris"));

        let current = forecast.current.unwrap();
        assert_eq!(current.weather_code, 3);
        assert_eq!(current.description, "Overcast");
    }

    #[test]
    fn test_forecast_without_daily_series() {
        let body: ForecastResponse = serde_json::from_str(r#"{"timezone":"GMT"}"#).unwrap();
        let forecast = body.into_forecast(3);
        assert!(forecast.days.is_empty());
        assert!(forecast.current.is_none());
    }

    #[test]
    fn test_weather_code_descriptions() {
        assert_eq!(weather_code_to_description(0), "Clear sky");
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(42), "Unknown");
    }

    #[test]
    fn test_client_creation() {
        let client = OpenMeteoClient::new(&LookupConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_empty_name_skips_request() {
        let mut config = LookupConfig::default();
        config.endpoints.geocoding = "http://127.0.0.1:9/unreachable".to_string();
        let client = OpenMeteoClient::new(&config).unwrap();
        let result = client.resolve_place("   ", Language::En).await;
        assert!(matches!(result, Ok(None)));
    }
}
