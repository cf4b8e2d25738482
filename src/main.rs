use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;

use kadai::canvas::CanvasClient;
use kadai::grades::GradeWatcher;
use kadai::reminder::ReminderLoop;
use kadai::telegram::Notifier;
use kadai::tracker::{ReminderTracker, ScoreTracker};
use kadai::{config, llm};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::from_env()?;

    let canvas = CanvasClient::new(&cfg.canvas);

    let mut notifier = Notifier::new(&cfg.telegram);
    notifier
        .ensure_recipients()
        .await
        .context("Failed to resolve Telegram recipients")?;
    if notifier.recipient_count() == 0 {
        anyhow::bail!(
            "No Telegram recipients: set TELEGRAM_CHAT_IDS or message the bot so it can discover a chat"
        );
    }
    let notifier = Arc::new(notifier);

    let rephraser = llm::create_rephraser(cfg.llm.as_ref());
    if cfg.llm.is_some() {
        tracing::info!("Reminder rephrasing enabled");
    } else {
        tracing::info!("Reminder rephrasing disabled, sending raw prompts");
    }

    notifier.broadcast("Server updated").await;

    let course_ids = canvas
        .favorite_course_ids()
        .await
        .context("Failed to fetch favorite course ids")?;
    tracing::info!(course_ids = ?course_ids, "Resolved favorite courses");

    let score_tracker = Arc::new(ScoreTracker::new());
    let reminder_tracker = Arc::new(ReminderTracker::new());

    let watcher = GradeWatcher::new(
        canvas.clone(),
        Arc::clone(&notifier),
        Arc::clone(&score_tracker),
    );
    tokio::spawn(watcher.run());

    for course_id in course_ids {
        let reminders = ReminderLoop::new(
            canvas.clone(),
            Arc::clone(&notifier),
            Arc::clone(&rephraser),
            Arc::clone(&reminder_tracker),
            course_id,
            cfg.reminders.daily_hour,
        );
        tokio::spawn(reminders.run());
    }

    // The loops run until the process is stopped.
    signal::ctrl_c().await.ok();
    tracing::info!("Shutting down");
    Ok(())
}
