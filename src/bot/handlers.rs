//! Command handlers: greeting, help, headline relay, and the
//! summarize-and-illustrate pipeline.

use crate::article::ArticleExtractor;
use crate::bot::messaging;
use crate::config;
use crate::imagegen::ImageClient;
use crate::news::{self, Headline, NewsClient};
use crate::summarize::SummaryClient;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

/// Supported chat commands
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "Show the welcome message.")]
    Start,
    #[command(description = "Show the available commands.")]
    Help,
    #[command(description = "Send the top 5 news from Singapore.")]
    Fetchnews,
    #[command(
        rename = "summarize_Text_url",
        description = "Summarize the news article at the given URL."
    )]
    SummarizeTextUrl(String),
}

pub const WELCOME_MESSAGE: &str = "Hello, Welcome to SG News";

pub const HELP_MESSAGE: &str = "\
Sure, the following commands are available:
/start ---> You will be greeted with the welcome message.
/help ---> You will be shown various commands available.
/fetchnews ---> Top 5 news from Singapore will be sent.
/summarize_Text_url ---> News content of the given URL will be summarized and sent.
Command format: /summarize_Text_url URL";

pub const USAGE_MESSAGE: &str = "Please provide a valid URL after the command, e.g., /summarize_Text_url https://example.com/news-article-url";

pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to extract article content from the provided URL";

pub const CHUNK_FAILED_MESSAGE: &str = "Failed to generate a summary for the provided URL";

pub const PHOTO_CAPTION: &str = "Click the news URL to access the news";

pub async fn start(bot: &Bot, msg: &Message) -> Result<()> {
    reply(bot, msg, WELCOME_MESSAGE).await
}

pub async fn help(bot: &Bot, msg: &Message) -> Result<()> {
    reply(bot, msg, HELP_MESSAGE).await
}

/// Relays the top headlines, one message per article.
pub async fn fetch_news(bot: &Bot, msg: &Message, news: &NewsClient) -> Result<()> {
    let articles = news.top_headlines().await?;
    for article in articles.iter().take(config::TOP_HEADLINES_LIMIT) {
        bot.send_message(msg.chat.id, format_headline(article))
            .await?;
    }
    Ok(())
}

/// One relayed headline: title, link, reformatted publish timestamp.
#[must_use]
pub fn format_headline(article: &Headline) -> String {
    let title = article.title.as_deref().unwrap_or_default();
    let published = article
        .published_at
        .as_deref()
        .map(news::format_published_at)
        .unwrap_or_default();
    format!("{title}\n{}\nPublished on {published}", article.url)
}

/// Extract the article behind `url`, summarize it slice by slice, send the
/// assembled summary, then illustrate it with a generated image.
pub async fn summarize_url(
    bot: &Bot,
    msg: &Message,
    url: &str,
    extractor: &ArticleExtractor,
    summarizer: &SummaryClient,
    imagegen: &ImageClient,
) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return reply(bot, msg, USAGE_MESSAGE).await;
    }

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let Some(article) = extractor.extract(url).await? else {
        return reply(bot, msg, EXTRACTION_FAILED_MESSAGE).await;
    };

    let chunks = SummaryClient::chunk(&article.content);
    let mut summaries = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        match summarizer.summarize(chunk).await {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                // Remaining slices still get their chance
                warn!("slice summarization failed: {e}");
                reply(bot, msg, CHUNK_FAILED_MESSAGE).await?;
            }
        }
    }
    info!(
        slices = chunks.len(),
        summarized = summaries.len(),
        "article summarized"
    );

    let summary_message = format!(
        "Title: {}\n\nSummary: {}",
        article.title,
        summaries.join("\n")
    );
    messaging::send_long_message(bot, msg.chat.id, &summary_message).await?;

    let prompt = summarizer.condense(&summaries).await?;

    bot.send_chat_action(msg.chat.id, ChatAction::UploadPhoto)
        .await?;
    let jpeg = imagegen.generate(&prompt).await?;
    bot.send_photo(msg.chat.id, InputFile::memory(jpeg))
        .caption(PHOTO_CAPTION)
        .await?;

    Ok(())
}

/// Catch-all for any text that is not a known command.
pub async fn echo(bot: &Bot, msg: &Message) -> Result<()> {
    let text = msg.text().unwrap_or_default();
    reply(bot, msg, echo_reply(text)).await
}

#[must_use]
pub fn echo_reply(text: &str) -> String {
    format!("You said {text}")
}

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) -> Result<()> {
    bot.send_message(msg.chat.id, text.into())
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_quotes_the_original_text() {
        assert_eq!(echo_reply("hi there"), "You said hi there");
        assert_eq!(echo_reply(""), "You said ");
    }

    #[test]
    fn headline_message_has_title_link_and_timestamp() {
        let article = Headline {
            title: Some("Rain expected".to_string()),
            url: "https://example.com/rain".to_string(),
            published_at: Some("2024-03-09T08:15:00Z".to_string()),
        };
        assert_eq!(
            format_headline(&article),
            "Rain expected\nhttps://example.com/rain\nPublished on 2024-03-09 08:15:00"
        );
    }

    #[test]
    fn headline_message_tolerates_missing_fields() {
        let article = Headline {
            title: None,
            url: "https://example.com/x".to_string(),
            published_at: None,
        };
        assert_eq!(
            format_headline(&article),
            "\nhttps://example.com/x\nPublished on "
        );
    }
}
