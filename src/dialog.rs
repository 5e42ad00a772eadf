// Dialog state machine
//
// `transition` is pure: it takes the current session and one event and returns
// the next session plus the effects to run. Upstream calls are requested as
// effects and their results come back as events.

use crate::locale::Locale;
use crate::location::{Location, Resolution};
use crate::messages;
use crate::search::{HotelQuery, SearchOutcome};
use crate::session::{Command, Session, Step};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// Callback data attached to a city choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePayload {
    #[serde(rename = "id_city")]
    pub location_id: String,
    #[serde(rename = "call_method")]
    pub command: Command,
}

impl ChoicePayload {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub label: String,
    pub payload: ChoicePayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Text(String),
    Selection(ChoicePayload),
    LocationResolved { query: String, outcome: Resolution },
    SearchFinished(SearchOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Reply(String),
    PresentChoices {
        prompt: String,
        options: Vec<ChoiceOption>,
    },
    ResolveLocation {
        query: String,
    },
    SearchHotels(HotelQuery),
}

fn reply(text: impl Into<String>) -> Effect {
    Effect::Reply(text.into())
}

pub fn transition(mut session: Session, event: Event) -> (Session, Vec<Effect>) {
    let before = session.step;
    let effects = apply(&mut session, event);
    if session.step != before {
        debug!(user = %session.user, from = ?before, to = ?session.step, "dialog step changed");
    }
    (session, effects)
}

fn apply(session: &mut Session, event: Event) -> Vec<Effect> {
    // A command restarts the dialog from any step
    if let Event::Text(text) = &event {
        if let Some(command) = Command::parse(text) {
            return start(session, command);
        }
    }

    match (session.step, event) {
        (Step::AwaitingCommand, Event::Text(_)) => vec![reply(messages::HELP)],
        (Step::AwaitingCity, Event::Text(text)) => {
            if text.trim().is_empty() {
                vec![reply(messages::ASK_CITY)]
            } else {
                vec![Effect::ResolveLocation { query: text }]
            }
        }
        (Step::AwaitingCity, Event::LocationResolved { query, outcome }) => {
            located(session, &query, outcome)
        }
        (Step::AwaitingCityChoice, Event::Selection(payload)) => choose(session, payload),
        (Step::AwaitingCityChoice, Event::Text(_)) => choices(session),
        (
            Step::AwaitingMinPrice
            | Step::AwaitingMaxPrice
            | Step::AwaitingMinDistance
            | Step::AwaitingMaxDistance,
            Event::Text(text),
        ) => collect_bound(session, &text),
        (Step::AwaitingCount, Event::Text(text)) => collect_count(session, &text),
        (Step::Completed, Event::SearchFinished(outcome)) => deliver(session, outcome),
        (Step::Completed, Event::Text(_)) => {
            session.reset();
            vec![reply(messages::HELP)]
        }
        (_, Event::Selection(_)) => vec![reply(messages::STALE_CHOICE)],
        (step, event) => {
            debug!(user = %session.user, ?step, ?event, "event does not apply to step");
            Vec::new()
        }
    }
}

fn start(session: &mut Session, command: Command) -> Vec<Effect> {
    session.reset();
    session.command = Some(command);
    session.step = Step::AwaitingCity;
    vec![reply(messages::ASK_CITY)]
}

fn located(session: &mut Session, query: &str, outcome: Resolution) -> Vec<Effect> {
    match outcome {
        Resolution::Resolved(location) => {
            session.locale = Locale::detect(query);
            accept_location(session, location)
        }
        Resolution::Ambiguous(candidates) => {
            session.locale = Locale::detect(query);
            session.candidates = candidates;
            session.step = Step::AwaitingCityChoice;
            choices(session)
        }
        Resolution::NotFound => vec![
            reply(messages::city_not_found(query)),
            reply(messages::ASK_CITY),
        ],
        Resolution::UpstreamError(err) => {
            warn!(user = %session.user, %err, "city lookup failed");
            vec![reply(messages::request_failed(&err))]
        }
    }
}

fn choices(session: &Session) -> Vec<Effect> {
    let Some(command) = session.command else {
        return vec![reply(messages::HELP)];
    };

    let options = session
        .candidates
        .iter()
        .map(|candidate| ChoiceOption {
            label: candidate.name.clone(),
            payload: ChoicePayload {
                location_id: candidate.id.clone(),
                command,
            },
        })
        .collect();

    vec![Effect::PresentChoices {
        prompt: messages::CHOOSE_CITY.to_string(),
        options,
    }]
}

fn choose(session: &mut Session, payload: ChoicePayload) -> Vec<Effect> {
    let Some(location) = session
        .candidates
        .iter()
        .find(|candidate| candidate.id == payload.location_id)
        .cloned()
    else {
        let mut effects = vec![reply(messages::STALE_CHOICE)];
        effects.extend(choices(session));
        return effects;
    };

    session.command = Some(payload.command);
    session.candidates.clear();
    accept_location(session, location)
}

fn accept_location(session: &mut Session, location: Location) -> Vec<Effect> {
    let announce = reply(location.name.clone());
    session.location = Some(location);

    let prompt = if session.command.is_some_and(Command::collects_bounds) {
        session.step = Step::AwaitingMinPrice;
        messages::ASK_MIN_PRICE
    } else {
        session.step = Step::AwaitingCount;
        messages::ASK_COUNT
    };

    vec![announce, reply(prompt)]
}

fn prompt(step: Step) -> &'static str {
    match step {
        Step::AwaitingMinPrice => messages::ASK_MIN_PRICE,
        Step::AwaitingMaxPrice => messages::ASK_MAX_PRICE,
        Step::AwaitingMinDistance => messages::ASK_MIN_DISTANCE,
        Step::AwaitingMaxDistance => messages::ASK_MAX_DISTANCE,
        Step::AwaitingCount => messages::ASK_COUNT,
        Step::AwaitingCity => messages::ASK_CITY,
        _ => messages::HELP,
    }
}

// Bound steps take one value per turn; a rejected value leaves the step and earlier values as they were
fn collect_bound(session: &mut Session, text: &str) -> Vec<Effect> {
    let Some(value) = parse_amount(text) else {
        return vec![reply(messages::DIGITS_ONLY), reply(prompt(session.step))];
    };

    let bounds = &mut session.bounds;
    match session.step {
        Step::AwaitingMinPrice => {
            bounds.min_price = Some(value);
            session.step = Step::AwaitingMaxPrice;
        }
        Step::AwaitingMaxPrice => match bounds.min_price {
            Some(min) if value <= min => {
                return vec![
                    reply(messages::max_price_too_low(min, session.locale.currency())),
                    reply(messages::ASK_MAX_PRICE),
                ];
            }
            _ => {
                bounds.max_price = Some(value);
                session.step = Step::AwaitingMinDistance;
            }
        },
        Step::AwaitingMinDistance => {
            bounds.min_distance = Some(value);
            session.step = Step::AwaitingMaxDistance;
        }
        Step::AwaitingMaxDistance => match bounds.min_distance {
            Some(min) if value <= min => {
                return vec![
                    reply(messages::max_distance_too_low(min)),
                    reply(messages::ASK_MAX_DISTANCE),
                ];
            }
            _ => {
                bounds.max_distance = Some(value);
                session.step = Step::AwaitingCount;
            }
        },
        _ => return Vec::new(),
    }

    vec![reply(prompt(session.step))]
}

fn collect_count(session: &mut Session, text: &str) -> Vec<Effect> {
    let Some(count) = parse_count(text) else {
        return vec![reply(messages::DIGITS_ONLY), reply(messages::ASK_COUNT)];
    };
    session.desired_count = Some(count);

    let Some(query) = session.query() else {
        warn!(user = %session.user, "search parameters incomplete, restarting dialog");
        session.reset();
        return vec![reply(messages::HELP)];
    };

    session.step = Step::Completed;
    vec![
        reply(messages::search_summary(session)),
        Effect::SearchHotels(query),
    ]
}

fn deliver(session: &mut Session, outcome: SearchOutcome) -> Vec<Effect> {
    let mut effects: Vec<Effect> = match &outcome {
        SearchOutcome::Found(hotels) if hotels.is_empty() => vec![reply(messages::NOTHING_FOUND)],
        SearchOutcome::Found(hotels) => hotels
            .iter()
            .enumerate()
            .map(|(index, hotel)| reply(messages::numbered(index + 1, hotel)))
            .collect(),
        SearchOutcome::Failed(_) => outcome.messages().into_iter().map(Effect::Reply).collect(),
    };
    effects.push(reply(messages::HELP));

    session.reset();
    effects
}

// Non-negative decimal, as accepted for prices and distances.
pub fn parse_amount(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

// Positive whole number written with ASCII digits only.
pub fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|count| *count > 0)
}
