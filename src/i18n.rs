//! Static label tables for the supported display languages

use crate::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language. Also sent to the geocoder so place names come back localized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    Hi,
}

impl Language {
    /// Every language the label tables cover, in menu order.
    pub const SUPPORTED: [Language; 4] = [Language::En, Language::Es, Language::Fr, Language::Hi];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Hi => "hi",
        }
    }

    /// Name of the language in the language itself, for the language picker.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Español",
            Language::Fr => "Français",
            Language::Hi => "हिन्दी",
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::En => EN,
            Language::Es => ES,
            Language::Fr => FR,
            Language::Hi => HI,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "hi" => Ok(Language::Hi),
            _ => Err(QueryError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Look up `key` in the table for `lang`, then in the English table, then
/// hand the key back unchanged.
pub fn translate<'a>(lang: Language, key: &'a str) -> &'a str {
    let label: Option<&'a str> =
        lookup(lang.table(), key).or_else(|| lookup(Language::default().table(), key));
    label.unwrap_or(key)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

const EN: &[(&str, &str)] = &[
    ("title", "GlobeGuide"),
    ("tagline", "Authentic travel essentials in your language"),
    ("language", "Lang"),
    ("destination", "Destination city"),
    ("checkin", "Check-in"),
    ("checkout", "Check-out"),
    ("adults", "Adults"),
    ("search", "Search"),
    ("essentials", "Essentials"),
    ("flights", "Flights"),
    ("hotels", "Hotels"),
    ("airbnb", "Airbnb"),
    ("localTransport", "Local transportation"),
    ("open", "Open"),
    ("explorer", "Local insights"),
    ("weather", "Weather forecast"),
    ("bestPlaces", "Best places to visit"),
    ("bestRestaurants", "Best restaurants"),
    ("getAround", "Get around"),
    ("viewMore", "View more"),
    ("loading", "Loading..."),
    ("noResults", "No results found"),
    ("transitLink", "Google Maps Transit"),
    ("rideshareLink", "Uber"),
    ("footer", "Built for travelers. Data from Open-Meteo and Wikivoyage. External links to official providers."),
];

const ES: &[(&str, &str)] = &[
    ("title", "GlobeGuide"),
    ("tagline", "Esenciales de viaje auténticos en tu idioma"),
    ("destination", "Ciudad de destino"),
    ("checkin", "Entrada"),
    ("checkout", "Salida"),
    ("adults", "Adultos"),
    ("search", "Buscar"),
    ("essentials", "Esenciales"),
    ("flights", "Vuelos"),
    ("hotels", "Hoteles"),
    ("airbnb", "Airbnb"),
    ("localTransport", "Transporte local"),
    ("open", "Abrir"),
    ("explorer", "Guía local"),
    ("weather", "Pronóstico del tiempo"),
    ("bestPlaces", "Mejores lugares para visitar"),
    ("bestRestaurants", "Mejores restaurantes"),
    ("getAround", "Cómo moverse"),
    ("viewMore", "Ver más"),
    ("loading", "Cargando..."),
    ("noResults", "No se encontraron resultados"),
];

const FR: &[(&str, &str)] = &[
    ("title", "GlobeGuide"),
    ("tagline", "Essentiels de voyage authentiques dans votre langue"),
    ("destination", "Ville de destination"),
    ("checkin", "Arrivée"),
    ("checkout", "Départ"),
    ("adults", "Adultes"),
    ("search", "Rechercher"),
    ("essentials", "Essentiels"),
    ("flights", "Vols"),
    ("hotels", "Hôtels"),
    ("airbnb", "Airbnb"),
    ("localTransport", "Transports locaux"),
    ("open", "Ouvrir"),
    ("explorer", "Aperçus locaux"),
    ("weather", "Prévisions météo"),
    ("bestPlaces", "Meilleurs lieux à visiter"),
    ("bestRestaurants", "Meilleurs restaurants"),
    ("getAround", "Se déplacer"),
    ("viewMore", "Voir plus"),
    ("loading", "Chargement..."),
    ("noResults", "Aucun résultat"),
];

const HI: &[(&str, &str)] = &[
    ("title", "GlobeGuide"),
    ("tagline", "आपकी भाषा में प्रामाणिक यात्रा जानकारी"),
    ("destination", "गंतव्य शहर"),
    ("checkin", "चेक-इन"),
    ("checkout", "चेक-आउट"),
    ("adults", "वयस्क"),
    ("search", "खोजें"),
    ("essentials", "जरूरी"),
    ("flights", "उड़ानें"),
    ("hotels", "होटल"),
    ("airbnb", "एयरबीएनबी"),
    ("localTransport", "स्थानीय परिवहन"),
    ("open", "खोलें"),
    ("explorer", "स्थानीय जानकारी"),
    ("weather", "मौसम पूर्वानुमान"),
    ("bestPlaces", "घूमने की जगहें"),
    ("bestRestaurants", "सबसे अच्छे रेस्तरां"),
    ("getAround", "कैसे घूमें"),
    ("viewMore", "और देखें"),
    ("loading", "लोड हो रहा है..."),
    ("noResults", "कोई परिणाम नहीं मिला"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_uses_selected_language() {
        assert_eq!(translate(Language::Fr, "weather"), "Prévisions météo");
        assert_eq!(translate(Language::Es, "search"), "Buscar");
        assert_eq!(translate(Language::En, "noResults"), "No results found");
    }

    #[test]
    fn test_translate_falls_back_to_english() {
        // Only the English table carries the footer attribution
        for lang in Language::SUPPORTED {
            assert_eq!(
                translate(lang, "footer"),
                "Built for travelers. Data from Open-Meteo and Wikivoyage. External links to official providers."
            );
            assert_eq!(translate(lang, "transitLink"), "Google Maps Transit");
        }
    }

    #[test]
    fn test_translate_falls_back_to_raw_key() {
        for lang in Language::SUPPORTED {
            assert_eq!(translate(lang, "definitelyNotAKey"), "definitelyNotAKey");
        }
    }

    #[test]
    fn test_every_language_covers_the_core_keys() {
        for lang in Language::SUPPORTED {
            for (key, _) in ES {
                assert!(
                    lookup(lang.table(), key).is_some(),
                    "{} is missing {}",
                    lang,
                    key
                );
            }
        }
    }

    #[test]
    fn test_language_parsing() {
        assert!(matches!("en".parse::<Language>(), Ok(Language::En)));
        assert!(matches!("FR".parse::<Language>(), Ok(Language::Fr)));
        assert!(matches!(" hi ".parse::<Language>(), Ok(Language::Hi)));
        assert!(matches!(
            "de".parse::<Language>(),
            Err(QueryError::UnsupportedLanguage(code)) if code == "de"
        ));
    }

    #[test]
    fn test_default_language_is_english() {
        assert_eq!(Language::default(), Language::En);
        assert_eq!(Language::Hi.native_name(), "हिन्दी");
    }
}
