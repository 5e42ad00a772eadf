// User-facing texts

use crate::session::Session;

pub const HELP: &str = "Choose a command:\n\
/lowprice - the cheapest hotels in a city\n\
/highprice - the most expensive hotels in a city\n\
/bestdeal - hotels best matching price and distance from the center";

pub const ASK_CITY: &str = "Enter the city to search hotels in";
pub const CHOOSE_CITY: &str = "Choose a city:";
pub const ASK_COUNT: &str = "Enter the number of hotels:";
pub const DIGITS_ONLY: &str = "Please try again using digits";
pub const NOTHING_FOUND: &str = "No hotels matched the search";
pub const STALE_CHOICE: &str = "This list is no longer active";

pub const ASK_MIN_PRICE: &str = "Enter the minimum price:";
pub const ASK_MAX_PRICE: &str = "Enter the maximum price:";
pub const ASK_MIN_DISTANCE: &str = "Enter the minimum distance from the center (km):";
pub const ASK_MAX_DISTANCE: &str = "Enter the maximum distance from the center (km):";

const NOT_SET: &str = "not set";

pub fn city_not_found(query: &str) -> String {
    format!("City - {} not found", query.trim())
}

pub fn request_failed(err: &impl std::fmt::Display) -> String {
    format!("Request failed: {}", err)
}

pub fn max_price_too_low(min_price: f64, currency: &str) -> String {
    format!(
        "The maximum price must be greater than the minimum.\nMinimum price: {} {}",
        min_price, currency
    )
}

pub fn max_distance_too_low(min_distance: f64) -> String {
    format!(
        "The maximum distance must be greater than the minimum.\nMinimum distance: {} km",
        min_distance
    )
}

// Summary of the parameters a search is about to run with
pub fn search_summary(session: &Session) -> String {
    let value = |v: Option<f64>| v.map_or_else(|| NOT_SET.to_string(), |v| v.to_string());

    format!(
        "Searching hotels with parameters:\n\
         City: {}\n\
         Number of hotels: {}\n\
         Minimum price: {}\n\
         Maximum price: {}\n\
         Minimum distance from the center (km): {}\n\
         Maximum distance from the center (km): {}",
        session.location.as_ref().map_or(NOT_SET, |l| l.name.as_str()),
        session
            .desired_count
            .map_or_else(|| NOT_SET.to_string(), |c| c.to_string()),
        value(session.bounds.min_price),
        value(session.bounds.max_price),
        value(session.bounds.min_distance),
        value(session.bounds.max_distance),
    )
}

pub fn numbered(position: usize, hotel: &str) -> String {
    format!("{}: {}", position, hotel)
}
