//! Echo Bot Demo
//!
//! A small demonstration of the BotX SDK: a cooperative bot with three
//! commands, fed canned webhook payloads instead of a live chat server.
//!
//! # Commands
//!
//! - `/echo <text>` - echoes the text back
//! - `/ping`       - answers "Pong!"
//! - `/help`       - lists the commands
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use anyhow::Result;
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use botx::logging::LoggingBuilder;
use botx::prelude::*;

// ============================================================================
// Handler Functions
// ============================================================================

/// Echoes everything after the command word back to the sender.
async fn echo_handler(message: IncomingMessage, bot: BoxedBot) {
    let text = message
        .body()
        .split_once(' ')
        .map(|(_, rest)| rest)
        .unwrap_or("(nothing to echo)");

    if let Err(e) = bot
        .answer_message(text, &message, SendOptions::default())
        .await
    {
        error!("Failed to send echo reply: {e}");
    }
}

/// Answers with a pong.
async fn ping_handler(message: IncomingMessage, bot: BoxedBot) {
    if let Err(e) = bot
        .answer_message("Pong!", &message, SendOptions::default())
        .await
    {
        error!("Failed to send ping reply: {e}");
    }
}

/// Sends the command list.
async fn help_handler(message: IncomingMessage, bot: BoxedBot) {
    let help_text = "Echo Bot commands:\n\
        /echo <text> - echo text back\n\
        /ping        - Pong!\n\
        /help        - this help";

    if let Err(e) = bot
        .answer_message(help_text, &message, SendOptions::default())
        .await
    {
        error!("Failed to send help message: {e}");
    }
}

// ============================================================================
// Canned Webhook Payloads
// ============================================================================

fn command_payload(body: &str) -> Value {
    json!({
        "sync_id": Uuid::new_v4(),
        "command": {"body": body},
        "from": {
            "user_huid": Uuid::new_v4(),
            "group_chat_id": Uuid::new_v4(),
            "chat_type": "chat",
            "host": "cts.example.com"
        },
        "bot_id": Uuid::new_v4()
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    LoggingBuilder::new()
        .with_level(tracing::Level::DEBUG)
        .directive("botx_core=debug")
        .init();

    let bot = Bot::builder()
        .cooperative()
        .add_cts("cts.example.com", "demo-secret-key")
        .build()?;

    bot.add_handler(
        CommandHandler::builder("echo", Callable::cooperative(echo_handler))
            .description("echo text back")
            .build(),
    )?;
    bot.add_handler(
        CommandHandler::builder("ping", Callable::cooperative(ping_handler))
            .description("Pong!")
            .build(),
    )?;
    bot.add_handler(
        CommandHandler::builder("help", Callable::cooperative(help_handler))
            .description("list commands")
            .build(),
    )?;

    bot.start()?;

    // A status probe, as the platform would send before enabling the bot.
    let status = bot.status();
    info!(
        "Status menu: {}",
        serde_json::to_string_pretty(&status)?
    );

    // Feed a few command payloads through the dispatcher. The outbound
    // callbacks will fail (there is no real chat server behind the host),
    // which the handlers log and survive.
    for body in ["/help", "/ping", "/echo hello from botx", "/unknown"] {
        let handled = bot.execute_command(command_payload(body)).await?;
        info!(body, handled, "Dispatched");
    }

    // Give the scheduled handlers a moment before tearing down.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    bot.shutdown().await;
    Ok(())
}
