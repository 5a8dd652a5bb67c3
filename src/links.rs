//! Outbound provider links for a query
//!
//! The links are only rendered for the user to open; nothing here touches the
//! network.

use crate::{Query, DEFAULT_PARTY_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use urlencoding::encode;

/// Third-party destinations a query is linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Flights,
    Hotels,
    Airbnb,
    Transit,
    Rideshare,
    CitySearch,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::Flights,
        Provider::Hotels,
        Provider::Airbnb,
        Provider::Transit,
        Provider::Rideshare,
        Provider::CitySearch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Provider::Flights => "flights",
            Provider::Hotels => "hotels",
            Provider::Airbnb => "airbnb",
            Provider::Transit => "transit",
            Provider::Rideshare => "rideshare",
            Provider::CitySearch => "city_search",
        }
    }

    /// Label-table key for the link caption
    pub fn label_key(self) -> &'static str {
        match self {
            Provider::Flights => "flights",
            Provider::Hotels => "hotels",
            Provider::Airbnb => "airbnb",
            Provider::Transit => "transitLink",
            Provider::Rideshare => "rideshareLink",
            Provider::CitySearch => "viewMore",
        }
    }

    /// Booking cards as opposed to the local-transport buttons
    pub fn is_booking(self) -> bool {
        matches!(self, Provider::Flights | Provider::Hotels | Provider::Airbnb)
    }
}

/// Build every provider link for `query`.
///
/// Unset dates render as empty parameters and a zero party size falls back to
/// the default of two.
pub fn build_provider_links(query: &Query) -> BTreeMap<Provider, String> {
    let destination = query.destination.as_str();
    let city = encode(destination);
    let checkin = query.checkin.map(|d| d.to_string()).unwrap_or_default();
    let checkout = query.checkout.map(|d| d.to_string()).unwrap_or_default();
    let adults = if query.party_size == 0 {
        DEFAULT_PARTY_SIZE
    } else {
        query.party_size
    };

    let flight_phrase = if checkin.is_empty() {
        format!("flights to {} ", destination)
    } else {
        format!("flights to {} on {}", destination, checkin)
    };

    let mut links = BTreeMap::new();
    links.insert(
        Provider::Flights,
        format!("https://www.google.com/travel/flights?q={}", encode(&flight_phrase)),
    );
    links.insert(
        Provider::Hotels,
        format!(
            "https://www.booking.com/searchresults.html?ss={}&checkin={}&checkout={}&group_adults={}",
            city, checkin, checkout, adults
        ),
    );
    links.insert(
        Provider::Airbnb,
        format!(
            "https://www.airbnb.com/s/{}/homes?checkin={}&checkout={}&adults={}",
            city, checkin, checkout, adults
        ),
    );
    links.insert(
        Provider::Transit,
        format!(
            "https://www.google.com/maps/search/{}",
            encode(&format!("public transport in {}", destination))
        ),
    );
    links.insert(
        Provider::Rideshare,
        format!("https://m.uber.com/looking?search={}", city),
    );
    links.insert(
        Provider::CitySearch,
        format!(
            "https://www.google.com/search?q={}",
            encode(&format!("{} public transport", destination))
        ),
    );
    links
}
