//! Telegram notification sink
//!
//! sendMessage přes Bot API, HTML parse mode. Rendering typovaných
//! notifikací na text žije tady — core posílá jen data.

use anyhow::{Context, Result};
use async_trait::async_trait;
use logger::{now_iso, EventLogger, NotificationSentEvent};
use match_watcher::{DispatchError, Notification, NotificationKind, NotificationSink, Side};
use std::env;
use tracing::warn;

pub struct TelegramSink {
    client: reqwest::Client,
    token: String,
    chat_id: String,
    event_log: EventLogger,
}

impl TelegramSink {
    /// BOT_TOKEN + CHAT_ID z env (stejná jména jako původní bot).
    pub fn from_env(event_log: EventLogger) -> Result<Self> {
        let token = env::var("BOT_TOKEN").context("BOT_TOKEN not set")?;
        let chat_id = env::var("CHAT_ID").context("CHAT_ID not set")?;
        Ok(Self {
            client: reqwest::Client::new(),
            token,
            chat_id,
            event_log,
        })
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendMessage failed: {} — {}", status, body);
        }
        Ok(())
    }

    /// Jedna zpráva při startu, ať je vidět že bot žije.
    pub async fn announce_startup(&self) {
        if let Err(e) = self
            .send_text("✅ Tennis observer started — watching live ATP/Challenger singles.")
            .await
        {
            warn!("startup announcement failed: {e}");
        }
    }
}

fn side_name(n: &Notification, side: Side) -> &str {
    match side {
        Side::Home => &n.home_name,
        Side::Away => &n.away_name,
    }
}

fn render(n: &Notification) -> String {
    let match_label = format!("{} x {}", n.home_name, n.away_name);
    let game_label = format!("game {} (set {})", n.game.game_number, n.game.set_number);
    match n.kind {
        NotificationKind::EarlyBreakThreat => format!(
            "⚠️ {} lost the FIRST TWO points on serve in {} — {}.",
            n.server_name, game_label, match_label
        ),
        NotificationKind::GameCompleted => {
            let held = n.server_held().unwrap_or(false);
            let emoji = if held { "✅" } else { "❌" };
            let winner_name = n
                .winner
                .map(|w| side_name(n, w).to_string())
                .unwrap_or_default();
            let outcome = if held {
                format!("{} held serve", n.server_name)
            } else {
                format!("{} was broken, game to {}", n.server_name, winner_name)
            };
            format!("{emoji} {game_label} finished: {outcome} — {match_label}.")
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn emit(&self, notification: &Notification) -> Result<(), DispatchError> {
        let result = self.send_text(&render(notification)).await;

        let _ = self.event_log.log(&NotificationSentEvent {
            ts: now_iso(),
            event: "NOTIFICATION_SENT",
            kind: match notification.kind {
                NotificationKind::EarlyBreakThreat => "early_break_threat".to_string(),
                NotificationKind::GameCompleted => "game_completed".to_string(),
            },
            match_id: notification.game.match_id.to_string(),
            set_number: notification.game.set_number,
            game_number: notification.game.game_number,
            server: notification.server_name.clone(),
            winner: notification
                .winner
                .map(|w| side_name(notification, w).to_string()),
            delivered: result.is_ok(),
        });

        result.map_err(|e| DispatchError::new(e.to_string()))
    }
}
