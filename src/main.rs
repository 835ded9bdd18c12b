use dotenvy::dotenv;
use sg_news_bot::article::ArticleExtractor;
use sg_news_bot::bot::handlers::{self, Command};
use sg_news_bot::config::Settings;
use sg_news_bot::imagegen::ImageClient;
use sg_news_bot::news::NewsClient;
use sg_news_bot::summarize::SummaryClient;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    init_logging();

    info!("Starting SG News bot...");

    let settings = init_settings();

    let news = Arc::new(NewsClient::new(&settings));
    let extractor = Arc::new(ArticleExtractor::new());
    let summarizer = Arc::new(SummaryClient::new(&settings));
    let imagegen = Arc::new(ImageClient::new(&settings));

    let bot = Bot::new(settings.telegram_token.clone());

    info!("Bot is running...");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![news, extractor, summarizer, imagegen])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            // Anything else with text falls through to the echo
            dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_echo),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    news: Arc<NewsClient>,
    extractor: Arc<ArticleExtractor>,
    summarizer: Arc<SummaryClient>,
    imagegen: Arc<ImageClient>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(&bot, &msg).await,
        Command::Help => handlers::help(&bot, &msg).await,
        Command::Fetchnews => handlers::fetch_news(&bot, &msg, &news).await,
        Command::SummarizeTextUrl(url) => {
            Box::pin(handlers::summarize_url(
                &bot,
                &msg,
                &url,
                &extractor,
                &summarizer,
                &imagegen,
            ))
            .await
        }
    };
    if let Err(e) = res {
        report_error(&bot, &msg, &e).await;
    }
    respond(())
}

async fn handle_echo(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::echo(&bot, &msg).await {
        report_error(&bot, &msg, &e).await;
    }
    respond(())
}

/// Every failure escaping a handler is relayed to the originating chat.
async fn report_error(bot: &Bot, msg: &Message, error: &anyhow::Error) {
    error!("Command handler error: {error}");

    let text = format!("An error occurred: {error}");
    if let Err(send_err) = bot
        .send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
    {
        error!("Failed to send error reply: {send_err}");
    }
}
