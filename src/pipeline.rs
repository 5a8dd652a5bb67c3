//! Destination lookup pipeline
//!
//! Two sub-pipelines run side by side for each destination:
//!
//! - weather: resolve the place, then fetch its forecast. Keyed on
//!   (destination, language) since the geocoder localizes place names.
//! - wiki: title search, section index, section content. Keyed on the
//!   destination alone.
//!
//! Each sub-pipeline carries a [`Generation`] captured when it is dispatched.
//! Every write to the shared [`LookupState`] compares that generation with the
//! current one inside the same `watch` update, so an invocation that has been
//! superseded can never write, at any step. Superseded invocations also stop
//! issuing requests at the next step boundary; requests already in flight are
//! left to finish and their results dropped.

use crate::extract::ExcerptExtractor;
use crate::weather::PlaceLookup;
use crate::wikivoyage::{fetch_travel_excerpts_observed, ExcerptStage, TravelWiki};
use crate::{ForecastResult, GeoResult, Language, LookupConfig, WikiExtract};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identifies one dispatch of a sub-pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// View state of the forecast panel
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherPanel {
    pub generation: Generation,
    /// (destination, language) this panel was last dispatched for
    pub key: Option<(String, Language)>,
    pub loading: bool,
    pub geo: Option<GeoResult>,
    pub forecast: Option<ForecastResult>,
    /// Short user-facing error text
    pub error: Option<String>,
}

impl WeatherPanel {
    fn restart(&mut self, key: (String, Language)) -> Generation {
        self.generation = self.generation.next();
        self.key = Some(key);
        self.loading = true;
        self.geo = None;
        self.forecast = None;
        self.error = None;
        self.generation
    }
}

/// View state of the See/Eat panels
#[derive(Debug, Clone, Default, Serialize)]
pub struct WikiPanel {
    pub generation: Generation,
    pub key: Option<String>,
    pub stage: ExcerptStage,
    pub extract: WikiExtract,
}

impl WikiPanel {
    fn restart(&mut self, key: String) -> Generation {
        self.generation = self.generation.next();
        self.key = Some(key);
        // Loading from the moment of dispatch, before the task is first polled
        self.stage = ExcerptStage::Searching;
        self.extract = WikiExtract::default();
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.stage.is_loading()
    }
}

/// Everything the destination panels display
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupState {
    pub destination: String,
    pub language: Language,
    pub weather: WeatherPanel,
    pub wiki: WikiPanel,
}

/// Handles of the sub-pipelines started by one [`LookupPipeline::dispatch`].
/// `None` means that sub-pipeline's key was unchanged and nothing was started.
#[derive(Debug)]
pub struct Dispatch {
    pub weather: Option<JoinHandle<()>>,
    pub wiki: Option<JoinHandle<()>>,
}

impl Dispatch {
    /// Wait for the started sub-pipelines to return, whether they applied
    /// their results or were superseded.
    pub async fn finished(self) {
        for handle in [self.weather, self.wiki].into_iter().flatten() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Lookup task ended abnormally");
            }
        }
    }
}

type StateSender = Arc<watch::Sender<LookupState>>;

/// Runs the weather and wiki lookups for the current destination
pub struct LookupPipeline {
    places: Arc<dyn PlaceLookup>,
    wiki: Arc<dyn TravelWiki>,
    extractor: Arc<dyn ExcerptExtractor>,
    sections: Arc<Vec<String>>,
    excerpt_limit: usize,
    state: StateSender,
}

impl LookupPipeline {
    pub fn new(
        places: Arc<dyn PlaceLookup>,
        wiki: Arc<dyn TravelWiki>,
        extractor: Arc<dyn ExcerptExtractor>,
        config: &LookupConfig,
    ) -> Self {
        let (state, _) = watch::channel(LookupState::default());
        Self {
            places,
            wiki,
            extractor,
            sections: Arc::new(config.sections.clone()),
            excerpt_limit: config.excerpt_limit,
            state: Arc::new(state),
        }
    }

    /// Receiver notified after every applied state change
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// Point the panels at `destination` shown in `language`.
    ///
    /// Restarts each sub-pipeline whose key changed, clearing its panel and
    /// superseding whatever it was doing. Must be called within a Tokio runtime.
    pub fn dispatch(&self, destination: &str, language: Language) -> Dispatch {
        let mut weather_ticket = None;
        let mut wiki_ticket = None;

        self.state.send_modify(|state| {
            state.destination = destination.to_string();
            state.language = language;

            let weather_key = (destination.to_string(), language);
            if state.weather.key.as_ref() != Some(&weather_key) {
                weather_ticket = Some(state.weather.restart(weather_key));
            }
            if state.wiki.key.as_deref() != Some(destination) {
                wiki_ticket = Some(state.wiki.restart(destination.to_string()));
            }
        });

        let weather = weather_ticket.map(|generation| {
            info!(destination, %language, generation = generation.0, "Starting weather lookup");
            tokio::spawn(run_weather(
                Arc::clone(&self.places),
                Arc::clone(&self.state),
                generation,
                destination.to_string(),
                language,
            ))
        });

        let wiki = wiki_ticket.map(|generation| {
            info!(destination, generation = generation.0, "Starting wiki lookup");
            tokio::spawn(run_wiki(
                Arc::clone(&self.wiki),
                Arc::clone(&self.extractor),
                Arc::clone(&self.sections),
                self.excerpt_limit,
                Arc::clone(&self.state),
                generation,
                destination.to_string(),
            ))
        });

        Dispatch { weather, wiki }
    }
}

/// Apply `update` to the weather panel if `generation` is still current.
/// Returns `false` when the invocation has been superseded.
fn apply_weather(
    state: &StateSender,
    generation: Generation,
    update: impl FnOnce(&mut WeatherPanel),
) -> bool {
    state.send_if_modified(|s| {
        if s.weather.generation != generation {
            return false;
        }
        update(&mut s.weather);
        true
    })
}

fn apply_wiki(state: &StateSender, generation: Generation, update: impl FnOnce(&mut WikiPanel)) -> bool {
    state.send_if_modified(|s| {
        if s.wiki.generation != generation {
            return false;
        }
        update(&mut s.wiki);
        true
    })
}

async fn run_weather(
    places: Arc<dyn PlaceLookup>,
    state: StateSender,
    generation: Generation,
    destination: String,
    language: Language,
) {
    let geo = match places.resolve_place(&destination, language).await {
        Ok(geo) => geo,
        Err(e) => {
            warn!(destination = %destination, error = %e, "Place resolution failed");
            apply_weather(&state, generation, |w| {
                w.error = Some(e.user_message());
                w.loading = false;
            });
            return;
        }
    };

    let Some(geo) = geo else {
        debug!(destination = %destination, "No place matched");
        apply_weather(&state, generation, |w| w.loading = false);
        return;
    };

    let (latitude, longitude) = (geo.latitude, geo.longitude);
    if !apply_weather(&state, generation, |w| w.geo = Some(geo)) {
        debug!(destination = %destination, generation = generation.0, "Discarding superseded place result");
        return;
    }

    let applied = match places.fetch_forecast(latitude, longitude).await {
        Ok(forecast) => apply_weather(&state, generation, |w| {
            w.forecast = Some(forecast);
            w.loading = false;
        }),
        Err(e) => {
            warn!(destination = %destination, error = %e, "Forecast fetch failed");
            apply_weather(&state, generation, |w| {
                w.error = Some(e.user_message());
                w.loading = false;
            })
        }
    };
    if !applied {
        debug!(destination = %destination, generation = generation.0, "Discarding superseded forecast");
    }
}

async fn run_wiki(
    wiki: Arc<dyn TravelWiki>,
    extractor: Arc<dyn ExcerptExtractor>,
    sections: Arc<Vec<String>>,
    limit: usize,
    state: StateSender,
    generation: Generation,
    destination: String,
) {
    let outcome = fetch_travel_excerpts_observed(
        wiki.as_ref(),
        extractor.as_ref(),
        &destination,
        &sections,
        limit,
        |stage| {
            let stage = stage.clone();
            apply_wiki(&state, generation, |w| w.stage = stage)
        },
    )
    .await;

    match outcome {
        Ok(Some(extract)) => {
            let stage = if extract.page_title.is_some() {
                ExcerptStage::Done
            } else {
                ExcerptStage::Empty
            };
            apply_wiki(&state, generation, |w| {
                w.extract = extract;
                w.stage = stage;
            });
        }
        Ok(None) => {
            debug!(destination = %destination, generation = generation.0, "Wiki lookup superseded");
        }
        Err(e) => {
            // Shown to the user exactly like "no page found"
            warn!(destination = %destination, error = %e, "Wiki lookup failed, showing no excerpts");
            apply_wiki(&state, generation, |w| {
                w.extract = WikiExtract::default();
                w.stage = ExcerptStage::Failed;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_increments() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().next(), Generation(2));
    }

    #[test]
    fn test_weather_restart_clears_panel() {
        let mut panel = WeatherPanel {
            error: Some("Weather failed".to_string()),
            geo: Some(GeoResult {
                latitude: 1.0,
                longitude: 2.0,
                name: "Old".to_string(),
                country: None,
                timezone: None,
            }),
            ..Default::default()
        };
        let generation = panel.restart(("Rome".to_string(), Language::En));
        assert_eq!(generation, Generation(1));
        assert!(panel.loading);
        assert!(panel.geo.is_none());
        assert!(panel.error.is_none());
        assert_eq!(panel.key, Some(("Rome".to_string(), Language::En)));
    }

    #[test]
    fn test_wiki_restart_is_loading() {
        let mut panel = WikiPanel {
            stage: ExcerptStage::Empty,
            ..Default::default()
        };
        assert!(!panel.is_loading());
        panel.restart("Rome".to_string());
        assert!(panel.is_loading());
        assert!(panel.extract.is_empty());
    }

    #[test]
    fn test_stale_write_is_rejected() {
        let (tx, _rx) = watch::channel(LookupState::default());
        let state = Arc::new(tx);
        let mut first = Generation::default();
        let mut second = Generation::default();
        state.send_modify(|s| first = s.weather.restart(("Tokyo".to_string(), Language::En)));
        state.send_modify(|s| second = s.weather.restart(("Rome".to_string(), Language::En)));

        assert!(!apply_weather(&state, first, |w| w.error = Some("stale".to_string())));
        assert!(apply_weather(&state, second, |w| w.loading = false));
        assert!(state.borrow().weather.error.is_none());
        assert!(!state.borrow().weather.loading);
    }

    #[test]
    fn test_wiki_generation_is_independent() {
        let (tx, _rx) = watch::channel(LookupState::default());
        let state = Arc::new(tx);
        let mut wiki_generation = Generation::default();
        state.send_modify(|s| {
            wiki_generation = s.wiki.restart("Rome".to_string());
            s.weather.restart(("Rome".to_string(), Language::En));
            s.weather.restart(("Rome".to_string(), Language::Fr));
        });

        assert!(apply_wiki(&state, wiki_generation, |w| w.stage = ExcerptStage::Done));
        assert_eq!(state.borrow().wiki.stage, ExcerptStage::Done);
    }
}
