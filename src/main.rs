/// TennisWatcher — Live Tennis Observer
///
/// Co dělá:
///   1. Každých 5s polluje live tenisové zápasy ze Sofascore
///   2. Filtr: ATP + Challenger, jen dvouhry
///   3. Point-by-point detail → "server prohrál první dva body" + dohrání gamu
///   4. Telegram alert, každý max. jednou na (match, set, game)
///
/// Co NEDĚLÁ: žádná perzistence — stav žije jen po dobu běhu procesu.
///
/// Spuštění:
///   BOT_TOKEN a CHAT_ID v env (nebo .env), pak:
///   cargo run --bin tennis-observer

use anyhow::Result;
use dotenv::dotenv;
use logger::{now_iso, ApiStatusEvent, EventLogger, SystemHeartbeatEvent};
use match_watcher::Scheduler;
use std::env;
use std::fs::File;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod sofascore;
mod telegram;

use sofascore::{is_relevant, SofascoreClient};
use telegram::TelegramSink;

/// Po tolika po sobě jdoucích live-list failech resetujeme HTTP session.
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!("=== TennisWatcher Observer — LIVE TENNIS ===");
    info!("Filter: ATP + Challenger, singles only");
    info!("Logs: ./logs/");

    // Single instance lock
    let lock_file_path = env::temp_dir().join("tennis_watcher_observer.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of tennis-observer is already running! Exiting.");
            return Ok(());
        }
    };

    let poll_interval_secs = env::var("TENNIS_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(5);

    info!("Live poll interval: {}s", poll_interval_secs);

    let event_log = EventLogger::new("logs");
    let sink = Arc::new(TelegramSink::from_env(EventLogger::new("logs"))?);
    sink.announce_startup().await;

    let source = Arc::new(SofascoreClient::new());
    let mut scheduler = Scheduler::new(Arc::clone(&source), Arc::clone(&sink));

    let mut consecutive_failures: u32 = 0;

    loop {
        debug!("--- Live poll cycle ---");

        match source.fetch_live_matches().await {
            Ok(live) => {
                consecutive_failures = 0;
                let _ = event_log.log(&ApiStatusEvent {
                    ts: now_iso(),
                    event: "API_STATUS",
                    source: "sofascore".to_string(),
                    scope: "live_list".to_string(),
                    ok: true,
                    status_code: Some(200),
                    message: "ok".to_string(),
                    items_logged: live.len(),
                });

                let total_live = live.len();
                let relevant: Vec<_> = live.into_iter().filter(is_relevant).collect();
                let stats = scheduler.run_cycle(&relevant).await;

                info!(
                    "Cycle done: {} live ({} relevant), {} tracked, {} alerts, {} fetch fails",
                    total_live,
                    stats.live_matches,
                    stats.tracked_states,
                    stats.notifications,
                    stats.fetch_failures
                );

                let _ = event_log.log(&SystemHeartbeatEvent {
                    ts: now_iso(),
                    event: "SYSTEM_HEARTBEAT",
                    poll_interval_secs,
                    live_matches: total_live,
                    relevant_matches: stats.live_matches,
                    tracked_states: stats.tracked_states,
                    fetch_failures: stats.fetch_failures,
                    notifications_sent: stats.notifications,
                    delivery_failures: stats.delivery_failures,
                });
            }
            Err(e) => {
                // Celý cyklus = "no update" pro všechny zápasy, stavy přežívají.
                consecutive_failures += 1;
                warn!("Live list fetch failed ({}x in a row): {}", consecutive_failures, e);
                let _ = event_log.log(&ApiStatusEvent {
                    ts: now_iso(),
                    event: "API_STATUS",
                    source: "sofascore".to_string(),
                    scope: "live_list".to_string(),
                    ok: false,
                    status_code: None,
                    message: e.to_string(),
                    items_logged: 0,
                });

                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    warn!("♻️ {} consecutive failures — resetting feed session", consecutive_failures);
                    source.reset_session();
                    consecutive_failures = 0;
                }
            }
        }

        // Clean shutdown: ctrl-c mezi cykly, rozběhnutý cyklus vždy doběhne
        // celý (žádný partial update stavů).
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting.");
                break;
            }
            _ = sleep(Duration::from_secs(poll_interval_secs)) => {}
        }
    }

    Ok(())
}
