// Hotel search bot: a per-user dialog that collects search parameters and
// pages through an upstream hotel catalog

pub mod api;
pub mod bot;
pub mod config;
pub mod dialog;
pub mod locale;
pub mod location;
pub mod logging;
pub mod messages;
pub mod search;
pub mod session;

// Re-export key types for convenience
pub use api::{ApiError, ClientError, ClientStats, HotelsApi, RapidApiClient, SortOrder};
pub use bot::{HotelBot, Inbound, Outbound};
pub use config::{ApiConfig, BotConfig, ConfigError, SearchConfig};
pub use dialog::{transition, ChoiceOption, ChoicePayload, Effect, Event};
pub use locale::Locale;
pub use location::{Location, LocationResolver, Resolution};
pub use search::{Bounds, HotelQuery, HotelQueryExecutor, SearchOutcome};
pub use session::{Command, Session, SessionStore, Step, UserKey};
