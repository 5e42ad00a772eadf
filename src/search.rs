// Paginated hotel search: walks upstream pages, filters by distance and stops once enough results are collected

use crate::api::{ApiError, HotelsApi, Listing, PropertiesQuery, SortOrder, DEFAULT_PAGE_SIZE};
use crate::locale::Locale;
use crate::messages;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NO_INFORMATION: &str = "no information";

// Price and distance bounds of a best-deal search. Distances are in upstream units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_price: f64,
    pub max_price: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Bounds {
    pub fn admits_distance(&self, distance: f64) -> bool {
        self.min_distance <= distance && distance <= self.max_distance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelQuery {
    pub destination_id: String,
    pub sort_order: SortOrder,
    pub locale: Locale,
    pub bounds: Option<Bounds>,
    pub desired_count: usize,
}

impl HotelQuery {
    fn first_page(&self, page_size: u32) -> PropertiesQuery {
        PropertiesQuery {
            page_number: 1,
            page_size,
            destination_id: self.destination_id.clone(),
            sort_order: self.sort_order,
            locale: self.locale,
            currency: self.locale.currency().to_string(),
            price_min: self.bounds.map(|b| b.min_price),
            price_max: self.bounds.map(|b| b.max_price),
            landmark_ids: self.bounds.map(|_| self.locale.landmark().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    // Formatted listings in upstream order, possibly fewer than requested
    Found(Vec<String>),
    // The whole search is dropped on the first failed page
    Failed(ApiError),
}

impl SearchOutcome {
    // Lines to show the user; a failure becomes a single line carrying the upstream error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SearchOutcome::Found(hotels) => hotels.clone(),
            SearchOutcome::Failed(err) => vec![messages::request_failed(err)],
        }
    }
}

pub struct HotelQueryExecutor {
    api: Arc<dyn HotelsApi>,
    page_size: u32,
}

impl HotelQueryExecutor {
    pub fn new(api: Arc<dyn HotelsApi>) -> Self {
        Self::with_page_size(api, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(api: Arc<dyn HotelsApi>, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
        }
    }

    // Collects at most `query.desired_count` formatted listings.
    //
    // Pages are requested one at a time and no further page is fetched once
    // the count is reached. A catalog that runs out early yields a shorter list.
    pub async fn search(&self, query: &HotelQuery) -> SearchOutcome {
        let mut found = Vec::new();
        if query.desired_count == 0 {
            return SearchOutcome::Found(found);
        }

        let mut request = query.first_page(self.page_size);
        debug!(?request, "starting hotel search");

        loop {
            let page = match self.api.list_properties(&request).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(page = request.page_number, %err, "hotel listing request failed");
                    return SearchOutcome::Failed(err);
                }
            };

            for listing in &page.results {
                let distance = listing.landmark_distance().and_then(parse_distance);

                if let Some(bounds) = &query.bounds {
                    if !distance.is_some_and(|d| bounds.admits_distance(d)) {
                        debug!(hotel = %listing.name, ?distance, "outside distance bounds");
                        continue;
                    }
                }

                found.push(format_listing(listing, distance, query.locale));
                if found.len() >= query.desired_count {
                    info!(count = found.len(), page = request.page_number, "hotel search complete");
                    return SearchOutcome::Found(found);
                }
            }

            if !page.has_next_page() {
                info!(count = found.len(), page = request.page_number, "catalog exhausted");
                return SearchOutcome::Found(found);
            }
            request.page_number += 1;
        }
    }
}

// Extracts the numeric part of an upstream distance string such as
// `"1,2 miles"`: everything but digits and separators is dropped and a
// comma is read as the decimal point.
pub fn parse_distance(raw: &str) -> Option<f64> {
    let numeric: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    numeric.parse().ok()
}

pub fn format_listing(listing: &Listing, distance: Option<f64>, locale: Locale) -> String {
    let distance = match distance {
        Some(distance) => format!("{} km", locale.display_distance(distance)),
        None => NO_INFORMATION.to_string(),
    };
    let address = &listing.address;

    format!(
        "hotel name: {}\naddress: {}; {}; {}\ndistance from center: {}\nprice: {}",
        listing.name,
        address.country_name,
        address.locality,
        address.street_address.as_deref().unwrap_or(""),
        distance,
        listing.current_price().unwrap_or(NO_INFORMATION),
    )
}
