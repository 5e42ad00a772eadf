// Locale inference and the per-locale presentation rules (currency, units, landmark)

use serde::{Deserialize, Serialize};
use std::fmt;

// Factor applied to upstream distances for en_US display
pub const DISTANCE_DISPLAY_FACTOR: f64 = 1.61;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "ru_RU")]
    RuRu,
}

impl Locale {
    // Infers the locale from the script of the user's input: ASCII-only text
    // is treated as `en_US`, anything else as `ru_RU`.
    pub fn detect(text: &str) -> Self {
        if text.is_ascii() {
            Locale::EnUs
        } else {
            Locale::RuRu
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::EnUs => "en_US",
            Locale::RuRu => "ru_RU",
        }
    }

    pub fn currency(self) -> &'static str {
        match self {
            Locale::EnUs => "USD",
            Locale::RuRu => "RUB",
        }
    }

    // Landmark qualifier sent along with bounded searches
    pub fn landmark(self) -> &'static str {
        match self {
            Locale::EnUs => "City center",
            Locale::RuRu => "Центр города",
        }
    }

    // Converts an upstream distance into the value shown to the user.
    // Filtering always uses the raw upstream value.
    pub fn display_distance(self, distance: f64) -> f64 {
        match self {
            Locale::RuRu => distance,
            Locale::EnUs => (distance * DISTANCE_DISPLAY_FACTOR * 100.0).round() / 100.0,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
