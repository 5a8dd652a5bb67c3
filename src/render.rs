//! Plain-text rendering of the essentials and destination panels

use crate::i18n::{translate, Language};
use crate::links::{build_provider_links, Provider};
use crate::pipeline::LookupState;
use crate::Query;
use std::fmt;

/// Provider links with localized captions
pub struct EssentialsView<'a> {
    pub query: &'a Query,
    pub lang: Language,
}

impl fmt::Display for EssentialsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = build_provider_links(self.query);
        let t = |key: &'static str| translate(self.lang, key);

        writeln!(f, "== {} ==", t("essentials"))?;
        for provider in Provider::ALL.iter().filter(|p| p.is_booking()) {
            writeln!(f, "{}: {}", t(provider.label_key()), links[provider])?;
        }

        writeln!(f, "\n-- {} --", t("localTransport"))?;
        writeln!(f, "{}", t("getAround"))?;
        for provider in Provider::ALL.iter().filter(|p| !p.is_booking()) {
            writeln!(f, "{}: {}", t(provider.label_key()), links[provider])?;
        }
        Ok(())
    }
}

/// Weather panel plus one list per wiki section
pub struct LookupView<'a> {
    pub state: &'a LookupState,
    pub lang: Language,
    pub sections: &'a [String],
}

impl LookupView<'_> {
    fn fmt_weather(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = |key: &'static str| translate(self.lang, key);
        let weather = &self.state.weather;

        writeln!(f, "== {} ==", t("weather"))?;
        match &weather.geo {
            None if weather.loading => writeln!(f, "{}", t("loading"))?,
            None if weather.error.is_none() => writeln!(f, "{}", t("noResults"))?,
            None => {}
            Some(geo) => {
                writeln!(f, "{}", geo.display_name())?;
                match &weather.forecast {
                    Some(forecast) => {
                        if let Some(current) = &forecast.current {
                            writeln!(
                                f,
                                "  now {}° {}, wind {:.0} km/h",
                                current.temperature.round(),
                                current.description,
                                current.wind_speed
                            )?;
                        }
                        for day in &forecast.days {
                            writeln!(
                                f,
                                "  {}  {}°  min {}°  💧{}mm",
                                day.date.format("%Y-%m-%d"),
                                format_temp(day.max_temp),
                                format_temp(day.min_temp),
                                day.precipitation.round()
                            )?;
                        }
                    }
                    None if weather.error.is_none() => writeln!(f, "{}", t("loading"))?,
                    None => {}
                }
            }
        }
        if let Some(error) = &weather.error {
            writeln!(f, "! {}", error)?;
        }
        Ok(())
    }

    fn fmt_sections(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wiki = &self.state.wiki;

        writeln!(f, "== {} ==", translate(self.lang, "explorer"))?;
        for label in self.sections {
            writeln!(f, "-- {} --", translate(self.lang, section_title_key(label)))?;
            let items = wiki.extract.section(label);
            if items.is_empty() {
                let key = if wiki.is_loading() { "loading" } else { "noResults" };
                writeln!(f, "  • {}", translate(self.lang, key))?;
            }
            for item in items {
                writeln!(f, "  • {}", item)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for LookupView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_weather(f)?;
        writeln!(f)?;
        self.fmt_sections(f)
    }
}

pub fn render_essentials(query: &Query, lang: Language) -> String {
    EssentialsView { query, lang }.to_string()
}

pub fn render_lookup(state: &LookupState, lang: Language, sections: &[String]) -> String {
    LookupView { state, lang, sections }.to_string()
}

/// Heading key for a wiki section; unknown sections show their own label
fn section_title_key(label: &str) -> &str {
    match label {
        "See" => "bestPlaces",
        "Eat" => "bestRestaurants",
        other => other,
    }
}

fn format_temp(value: Option<f64>) -> String {
    value
        .map(|v| format!("{}", v.round()))
        .unwrap_or_else(|| "–".to_string())
}
