// Per-user dialog sessions and the process-wide store that owns them

use crate::api::SortOrder;
use crate::locale::Locale;
use crate::location::Location;
use crate::search::{Bounds, HotelQuery};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl From<i64> for UserKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "/lowprice")]
    LowPrice,
    #[serde(rename = "/highprice")]
    HighPrice,
    #[serde(rename = "/bestdeal")]
    BestDeal,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/lowprice" => Some(Command::LowPrice),
            "/highprice" => Some(Command::HighPrice),
            "/bestdeal" => Some(Command::BestDeal),
            _ => None,
        }
    }

    pub fn sort_order(self) -> SortOrder {
        match self {
            Command::LowPrice | Command::BestDeal => SortOrder::Price,
            Command::HighPrice => SortOrder::PriceHighestFirst,
        }
    }

    pub fn collects_bounds(self) -> bool {
        self == Command::BestDeal
    }
}

// Dialog position. Bound steps are only visited by /bestdeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    AwaitingCommand,
    AwaitingCity,
    AwaitingCityChoice,
    AwaitingMinPrice,
    AwaitingMaxPrice,
    AwaitingMinDistance,
    AwaitingMaxDistance,
    AwaitingCount,
    Completed,
}

// Bound values collected so far, in upstream units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundsDraft {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
}

impl BoundsDraft {
    pub fn complete(&self) -> Option<Bounds> {
        Some(Bounds {
            min_price: self.min_price?,
            max_price: self.max_price?,
            min_distance: self.min_distance?,
            max_distance: self.max_distance?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserKey,
    pub step: Step,
    pub command: Option<Command>,
    pub location: Option<Location>,
    pub locale: Locale,
    pub bounds: BoundsDraft,
    pub desired_count: Option<u32>,
    // City candidates offered as a choice set
    pub candidates: Vec<Location>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserKey) -> Self {
        Self {
            user,
            step: Step::AwaitingCommand,
            command: None,
            location: None,
            locale: Locale::default(),
            bounds: BoundsDraft::default(),
            desired_count: None,
            candidates: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    // Clears everything collected for the current search and returns to
    // `AwaitingCommand`. The user key is kept.
    pub fn reset(&mut self) {
        self.step = Step::AwaitingCommand;
        self.command = None;
        self.location = None;
        self.locale = Locale::default();
        self.bounds = BoundsDraft::default();
        self.desired_count = None;
        self.candidates.clear();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // The fully specified search, or `None` while any required field is missing.
    pub fn query(&self) -> Option<HotelQuery> {
        let command = self.command?;
        let location = self.location.as_ref()?;
        let bounds = if command.collects_bounds() {
            Some(self.bounds.complete()?)
        } else {
            None
        };

        Some(HotelQuery {
            destination_id: location.id.clone(),
            sort_order: command.sort_order(),
            locale: self.locale,
            bounds,
            desired_count: self.desired_count? as usize,
        })
    }
}

// Sessions keyed by user. Each session sits behind its own async mutex so
// one user's events are handled one at a time, in arrival order, while
// other users proceed independently.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserKey, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns the user's session, creating it on first contact
    pub fn session(&self, user: &UserKey) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.get(user) {
            return existing.value().clone();
        }

        self.sessions
            .entry(user.clone())
            .or_insert_with(|| {
                debug!(%user, "created session");
                Arc::new(Mutex::new(Session::new(user.clone())))
            })
            .value()
            .clone()
    }

    pub async fn snapshot(&self, user: &UserKey) -> Option<Session> {
        let session = self.sessions.get(user)?.value().clone();
        let snapshot = session.lock().await.clone();
        Some(snapshot)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
