// City lookup against the upstream location search endpoint

use crate::api::{ApiError, HotelsApi, LocationEntity};
use crate::locale::Locale;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Location),
    Ambiguous(Vec<Location>),
    NotFound,
    UpstreamError(ApiError),
}

pub struct LocationResolver {
    api: Arc<dyn HotelsApi>,
}

impl LocationResolver {
    pub fn new(api: Arc<dyn HotelsApi>) -> Self {
        Self { api }
    }

    // Looks up city candidates for free-text input.
    //
    // Only `CITY` entities are kept, in upstream order. The locale sent
    // upstream is inferred from the input itself.
    pub async fn resolve(&self, text: &str) -> Resolution {
        let query = text.trim();
        let locale = Locale::detect(query);

        let response = match self.api.search_locations(query, locale).await {
            Ok(response) => response,
            Err(err) => {
                warn!(query, %err, "location search failed");
                return Resolution::UpstreamError(err);
            }
        };

        let mut cities: Vec<Location> = response
            .suggestions
            .iter()
            .flat_map(|group| group.entities.iter())
            .filter(|entity| entity.is_city())
            .map(|entity| to_location(entity, query))
            .collect();
        debug!(query, %locale, candidates = cities.len(), "resolved location candidates");

        match cities.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Resolved(cities.remove(0)),
            _ => Resolution::Ambiguous(cities),
        }
    }
}

fn to_location(entity: &LocationEntity, query: &str) -> Location {
    Location {
        id: entity.destination_id.clone(),
        name: display_name(&entity.caption, query),
    }
}

// Replaces the markup span of an upstream caption (first `<` to last `>`)
// with the user's own input, capitalized.
pub fn display_name(caption: &str, query: &str) -> String {
    let (Some(start), Some(end)) = (caption.find('<'), caption.rfind('>')) else {
        return caption.to_string();
    };
    if end < start {
        return caption.to_string();
    }

    format!(
        "{}{}{}",
        &caption[..start],
        capitalize(query),
        &caption[end + 1..]
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
