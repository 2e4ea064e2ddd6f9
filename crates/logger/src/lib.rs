/// TennisWatcher — Logger
/// JSONL event stream (denní soubory v logs/)

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ApiStatusEvent {
    pub ts:           String,
    pub event:        &'static str,   // "API_STATUS"
    pub source:       String,         // "sofascore"
    pub scope:        String,         // "live_list" | "point_by_point"
    pub ok:           bool,
    pub status_code:  Option<u16>,
    pub message:      String,
    pub items_logged: usize,
}

#[derive(Serialize, Debug)]
pub struct SystemHeartbeatEvent {
    pub ts:                 String,
    pub event:              &'static str,   // "SYSTEM_HEARTBEAT"
    pub poll_interval_secs: u64,
    pub live_matches:       usize,          // vše co feed hlásí jako live
    pub relevant_matches:   usize,          // po ATP/Challenger + singles filtru
    pub tracked_states:     usize,
    pub fetch_failures:     usize,
    pub notifications_sent: usize,
    pub delivery_failures:  usize,
}

#[derive(Serialize, Debug)]
pub struct NotificationSentEvent {
    pub ts:          String,
    pub event:       &'static str,   // "NOTIFICATION_SENT"
    pub kind:        String,         // "early_break_threat" | "game_completed"
    pub match_id:    String,
    pub set_number:  u32,
    pub game_number: u32,
    pub server:      String,         // jméno hráče co servíroval při locku
    pub winner:      Option<String>, // jen u completion
    pub delivered:   bool,           // false = DispatchError, stav i tak "sent"
}
