use std::collections::HashSet;

use serde::Deserialize;
use serde_json::json;

use crate::config::TelegramConfig;
use crate::error::NotifyError;

pub struct Notifier {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessage {
    chat: Chat,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl Notifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_ids: config.chat_ids.clone(),
        }
    }

    pub fn recipient_count(&self) -> usize {
        self.chat_ids.len()
    }

    /// Fill the recipient list from recent bot updates when no explicit
    /// chat ids were configured.
    pub async fn ensure_recipients(&mut self) -> Result<(), NotifyError> {
        if !self.chat_ids.is_empty() {
            return Ok(());
        }
        self.chat_ids = self.discover_chat_ids().await?;
        tracing::info!(count = self.chat_ids.len(), "Discovered chat ids from bot updates");
        Ok(())
    }

    /// Distinct chat ids seen in the bot's recent updates.
    pub async fn discover_chat_ids(&self) -> Result<Vec<String>, NotifyError> {
        let url = format!("{}/bot{}/getUpdates", self.base_url, self.bot_token);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        let updates: UpdatesResponse = response.json().await?;
        Ok(collect_chat_ids(updates))
    }

    /// Best-effort delivery to every recipient. A failed recipient is
    /// logged and the remaining recipients are still attempted.
    pub async fn broadcast(&self, text: &str) {
        for chat_id in &self.chat_ids {
            match self.send(chat_id, text).await {
                Ok(()) => tracing::info!(%chat_id, "Notification delivered"),
                Err(e) => tracing::error!(%chat_id, error = %e, "Failed to deliver notification"),
            }
        }
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let response = self
            .http
            .post(&url)
            .json(&json!({"chat_id": chat_id, "text": text}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }
        Ok(())
    }
}

fn collect_chat_ids(updates: UpdatesResponse) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut chat_ids = Vec::new();
    for update in updates.result {
        if let Some(message) = update.message {
            let id = message.chat.id.to_string();
            if seen.insert(id.clone()) {
                chat_ids.push(id);
            }
        }
    }
    chat_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_chat_ids_dedupes_and_keeps_order() {
        let updates: UpdatesResponse = serde_json::from_str(
            r#"{"result": [
                {"message": {"chat": {"id": 42}}},
                {"update_id": 9},
                {"message": {"chat": {"id": 7}}},
                {"message": {"chat": {"id": 42}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(collect_chat_ids(updates), vec!["42", "7"]);
    }

    #[test]
    fn test_collect_chat_ids_empty_result() {
        let updates: UpdatesResponse = serde_json::from_str(r#"{"ok": true, "result": []}"#).unwrap();
        assert!(collect_chat_ids(updates).is_empty());
    }
}
