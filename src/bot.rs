// Drives the dialog for one inbound event: runs transitions, performs upstream
// calls requested as effects and collects what has to be shown to the user

use crate::api::HotelsApi;
use crate::config::SearchConfig;
use crate::dialog::{transition, ChoiceOption, ChoicePayload, Effect, Event};
use crate::location::LocationResolver;
use crate::search::HotelQueryExecutor;
use crate::session::{SessionStore, UserKey};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Selection(ChoicePayload),
}

impl From<Inbound> for Event {
    fn from(inbound: Inbound) -> Self {
        match inbound {
            Inbound::Text(text) => Event::Text(text),
            Inbound::Selection(payload) => Event::Selection(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Choices {
        prompt: String,
        options: Vec<ChoiceOption>,
    },
}

pub struct HotelBot {
    sessions: Arc<SessionStore>,
    resolver: LocationResolver,
    executor: HotelQueryExecutor,
}

impl HotelBot {
    pub fn new(api: Arc<dyn HotelsApi>, sessions: Arc<SessionStore>, config: &SearchConfig) -> Self {
        Self {
            sessions,
            resolver: LocationResolver::new(api.clone()),
            executor: HotelQueryExecutor::with_page_size(api, config.page_size),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    // Handles one inbound event for `user` to completion.
    //
    // The user's session stays locked for the whole call, including upstream
    // requests, so a user's events are applied strictly one after another.
    pub async fn handle(&self, user: &UserKey, inbound: Inbound) -> Vec<Outbound> {
        let handle = self.sessions.session(user);
        let mut session = handle.lock().await;
        session.touch();
        debug!(%user, step = ?session.step, "handling inbound event");

        let mut outbound = Vec::new();
        let mut pending = VecDeque::from([Event::from(inbound)]);

        while let Some(event) = pending.pop_front() {
            let (next, effects) = transition(session.clone(), event);
            *session = next;

            for effect in effects {
                match effect {
                    Effect::Reply(text) => outbound.push(Outbound::Text(text)),
                    Effect::PresentChoices { prompt, options } => {
                        outbound.push(Outbound::Choices { prompt, options })
                    }
                    Effect::ResolveLocation { query } => {
                        let outcome = self.resolver.resolve(&query).await;
                        pending.push_back(Event::LocationResolved { query, outcome });
                    }
                    Effect::SearchHotels(query) => {
                        info!(%user, destination = %query.destination_id, count = query.desired_count, "running hotel search");
                        let outcome = self.executor.search(&query).await;
                        pending.push_back(Event::SearchFinished(outcome));
                    }
                }
            }
        }

        outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::{city, listing, MockHotelsApi};
    use crate::messages;
    use crate::session::Step;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn bot(api: &Arc<MockHotelsApi>) -> HotelBot {
        HotelBot::new(api.clone(), Arc::new(SessionStore::new()), &SearchConfig::default())
    }

    fn say(text: &str) -> Inbound {
        Inbound::Text(text.to_string())
    }

    fn texts(outbound: &[Outbound]) -> Vec<&str> {
        outbound
            .iter()
            .filter_map(|message| match message {
                Outbound::Text(text) => Some(text.as_str()),
                Outbound::Choices { .. } => None,
            })
            .collect()
    }

    fn catalog() -> Arc<MockHotelsApi> {
        let api = Arc::new(MockHotelsApi::new());
        api.add_locations("moscow", vec![city("1153093", "<b>Moscow</b>, Russia")]);
        api.add_locations(
            "springfield",
            vec![
                city("1", "<b>Springfield</b>, Illinois"),
                city("2", "<b>Springfield</b>, Missouri"),
                city("3", "<b>Springfield</b>, Oregon"),
            ],
        );
        api
    }

    #[tokio::test]
    async fn test_low_price_flow() {
        let api = catalog();
        api.add_page(
            vec![
                listing("A", "0.5 km", Some("$50")),
                listing("B", "1.5 km", Some("$60")),
                listing("C", "2.5 km", Some("$70")),
            ],
            true,
        );
        let bot = bot(&api);
        let user = UserKey::from(1);

        bot.handle(&user, say("/lowprice")).await;
        let reply = bot.handle(&user, say("moscow")).await;
        assert_eq!(texts(&reply), vec!["Moscow, Russia", messages::ASK_COUNT]);

        let reply = bot.handle(&user, say("2")).await;
        let lines = texts(&reply);
        assert!(lines[0].starts_with("Searching hotels with parameters:"));
        assert!(lines[1].starts_with("1: hotel name: A"));
        assert!(lines[2].starts_with("2: hotel name: B"));
        assert_eq!(lines[3], messages::HELP);
        assert_eq!(lines.len(), 4);

        let session = bot.sessions().snapshot(&user).await.unwrap();
        assert_eq!(session.step, Step::AwaitingCommand);
        assert_eq!(session.location, None);
        assert_eq!(api.property_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_best_deal_flow_through_choice_set() {
        let api = catalog();
        api.add_page(
            vec![
                listing("Near", "0.1 km", None),
                listing("Good", "1.0 km", Some("$80")),
            ],
            false,
        );
        let bot = bot(&api);
        let user = UserKey::from("chat-9");

        bot.handle(&user, say("/bestdeal")).await;
        let reply = bot.handle(&user, say("springfield")).await;
        let [Outbound::Choices { options, .. }] = reply.as_slice() else {
            panic!("expected a choice set, got {:?}", reply);
        };
        assert_eq!(options.len(), 3);

        let chosen = options[1].payload.clone();
        let reply = bot.handle(&user, Inbound::Selection(chosen)).await;
        assert_eq!(
            texts(&reply),
            vec!["Springfield, Missouri", messages::ASK_MIN_PRICE]
        );

        for value in ["10", "200", "0.5", "2"] {
            bot.handle(&user, say(value)).await;
        }
        let reply = bot.handle(&user, say("5")).await;
        let lines = texts(&reply);
        assert!(lines[1].starts_with("1: hotel name: Good"));
        assert_eq!(lines[2], messages::HELP);

        let request = &api.property_requests()[0];
        assert_eq!(request.destination_id, "2");
        assert_eq!(request.price_min, Some(10.0));
        assert_eq!(request.price_max, Some(200.0));
        assert_eq!(request.landmark_ids.as_deref(), Some("City center"));
    }

    #[tokio::test]
    async fn test_inverted_price_keeps_min() {
        let api = catalog();
        let bot = bot(&api);
        let user = UserKey::from(3);

        for text in ["/bestdeal", "moscow", "100"] {
            bot.handle(&user, say(text)).await;
        }
        let reply = bot.handle(&user, say("50")).await;

        assert!(texts(&reply)[0].contains("Minimum price: 100"));
        let session = bot.sessions().snapshot(&user).await.unwrap();
        assert_eq!(session.step, Step::AwaitingMaxPrice);
        assert_eq!(session.bounds.min_price, Some(100.0));
        assert_eq!(session.bounds.max_price, None);
    }

    #[tokio::test]
    async fn test_search_failure_is_reported_to_user() {
        let api = catalog();
        api.fail_page(500);
        let bot = bot(&api);
        let user = UserKey::from(4);

        for text in ["/highprice", "moscow"] {
            bot.handle(&user, say(text)).await;
        }
        let reply = bot.handle(&user, say("3")).await;

        assert_eq!(
            &texts(&reply)[1..],
            &["Request failed: status 500", messages::HELP]
        );
        let session = bot.sessions().snapshot(&user).await.unwrap();
        assert_eq!(session.step, Step::AwaitingCommand);
    }

    #[tokio::test]
    async fn test_users_do_not_block_each_other() {
        let api = catalog();
        api.add_locations("slowtown", vec![city("77", "<b>Slowtown</b>, Nowhere")]);
        api.set_location_delay("slowtown", Duration::from_millis(500));
        let bot = Arc::new(bot(&api));
        let slow_user = UserKey::from("slow");
        let fast_user = UserKey::from("fast");

        bot.handle(&slow_user, say("/lowprice")).await;
        let slow = {
            let bot = bot.clone();
            tokio::spawn(async move { bot.handle(&slow_user, say("slowtown")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = tokio::time::timeout(Duration::from_millis(200), async {
            bot.handle(&fast_user, say("/lowprice")).await;
            bot.handle(&fast_user, say("moscow")).await
        })
        .await;
        let fast = assert_ok!(fast);
        assert_eq!(texts(&fast)[0], "Moscow, Russia");

        let slow = assert_ok!(slow.await);
        assert_eq!(texts(&slow)[0], "Slowtown, Nowhere");
    }

    #[tokio::test]
    async fn test_same_user_events_are_serialized() {
        let api = catalog();
        api.add_locations("slowtown", vec![city("77", "<b>Slowtown</b>, Nowhere")]);
        api.set_location_delay("slowtown", Duration::from_millis(200));
        api.add_page(vec![listing("A", "1 km", None)], false);
        let bot = Arc::new(bot(&api));
        let user = UserKey::from(5);

        bot.handle(&user, say("/lowprice")).await;
        let city_reply = {
            let (bot, user) = (bot.clone(), user.clone());
            tokio::spawn(async move { bot.handle(&user, say("slowtown")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let count_reply = {
            let (bot, user) = (bot.clone(), user.clone());
            tokio::spawn(async move { bot.handle(&user, say("1")).await })
        };

        let (city_reply, count_reply) = futures::future::join(city_reply, count_reply).await;
        assert_eq!(
            texts(&assert_ok!(city_reply)),
            vec!["Slowtown, Nowhere", messages::ASK_COUNT]
        );
        let count_reply = assert_ok!(count_reply);
        assert!(texts(&count_reply)[1].starts_with("1: hotel name: A"));
    }

    #[tokio::test]
    async fn test_many_users_get_independent_sessions() {
        let api = catalog();
        let bot = Arc::new(bot(&api));

        let handles: Vec<_> = (0..20)
            .map(|id| {
                let bot = bot.clone();
                tokio::spawn(async move {
                    let user = UserKey::from(id as i64);
                    bot.handle(&user, say("/highprice")).await;
                    bot.handle(&user, say("moscow")).await
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            let reply = assert_ok!(result);
            assert_eq!(texts(&reply), vec!["Moscow, Russia", messages::ASK_COUNT]);
        }
        assert_eq!(bot.sessions().len(), 20);
        assert_eq!(api.location_requests(), 20);
    }
}
