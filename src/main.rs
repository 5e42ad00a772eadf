// Console front end: one line in, bot replies out

use anyhow::{Context, Result};
use clap::Parser;
use hotel_search_bot::logging::init_tracing;
use hotel_search_bot::{
    BotConfig, ChoiceOption, ChoicePayload, HotelBot, HotelsApi, Inbound, Outbound,
    RapidApiClient, SessionStore, UserKey,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "hotel-search-bot", about = "Search hotels by city, price and distance")]
struct Cli {
    #[arg(short, long, env = "HOTEL_BOT_CONFIG", help = "TOML configuration file")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "console",
        help = "Identity the console conversation runs under"
    )]
    user: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(config.log_filter.as_deref());

    let api: Arc<dyn HotelsApi> =
        Arc::new(RapidApiClient::new(config.api.clone()).context("creating upstream client")?);
    let bot = Arc::new(HotelBot::new(
        api.clone(),
        Arc::new(SessionStore::new()),
        &config.search,
    ));
    let user = UserKey::new(cli.user);
    info!(%user, "hotel search bot started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Callback data of the last choice set, as a chat client would hold it
    let mut choices: Vec<String> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let inbound = to_inbound(&line, &choices);

        // A failure while handling one message must not stop the bot
        let task = {
            let (bot, user) = (bot.clone(), user.clone());
            tokio::spawn(async move { bot.handle(&user, inbound).await })
        };
        let outbound = match task.await {
            Ok(outbound) => outbound,
            Err(err) => {
                error!(%err, "message handling failed");
                continue;
            }
        };

        choices.clear();
        for message in outbound {
            match message {
                Outbound::Text(text) => println!("{}\n", text),
                Outbound::Choices { prompt, options } => {
                    println!("{}", prompt);
                    for (index, option) in options.iter().enumerate() {
                        println!("  {}) {}", index + 1, option.label);
                    }
                    println!();
                    choices = match callback_data(&options) {
                        Ok(data) => data,
                        Err(err) => {
                            error!(%err, "encoding choice set failed");
                            Vec::new()
                        }
                    };
                }
            }
        }
    }

    info!(stats = ?api.stats(), "input closed, shutting down");
    Ok(())
}

fn callback_data(options: &[ChoiceOption]) -> serde_json::Result<Vec<String>> {
    options.iter().map(|option| option.payload.encode()).collect()
}

// A number picks from the last choice set; anything else is plain text
fn to_inbound(line: &str, choices: &[String]) -> Inbound {
    line.trim()
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| choices.get(index))
        .and_then(|data| ChoicePayload::decode(data).ok())
        .map(Inbound::Selection)
        .unwrap_or_else(|| Inbound::Text(line.to_string()))
}
