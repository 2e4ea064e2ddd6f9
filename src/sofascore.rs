//! Sofascore feed adapter
//!
//! Live tenis přes api.sofascore.com: seznam live eventů + point-by-point
//! detail. Browser user-agent kvůli anti-bot ochraně. Jména a kategorie
//! chodí jen v live listu, point-by-point je bez metadat — proto si adapter
//! drží cache summary údajů z posledního live fetche.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use match_watcher::{
    FetchError, GameSnapshot, MatchDetailSource, MatchId, MatchSnapshot, MatchType,
    PointObservation, SetSnapshot, Side,
};
use serde::Deserialize;
use tracing::debug;

const LIVE_URL: &str = "https://api.sofascore.com/api/v1/sport/tennis/events/live";
/// Turnajové kategorie, které pouštíme do core (slug z feedu, lowercase).
const RELEVANT_CATEGORIES: [&str; 2] = ["atp", "challenger"];

/// Summary metadata zápasu z live listu (point-by-point je nenese).
#[derive(Debug, Clone)]
struct MatchMeta {
    home_name: String,
    away_name: String,
    tournament_category: String,
    match_type: MatchType,
}

pub struct SofascoreClient {
    client: RwLock<reqwest::Client>,
    meta: Mutex<HashMap<MatchId, MatchMeta>>,
}

impl SofascoreClient {
    pub fn new() -> Self {
        Self {
            client: RwLock::new(build_client()),
            meta: Mutex::new(HashMap::new()),
        }
    }

    fn http(&self) -> reqwest::Client {
        self.client.read().unwrap().clone()
    }

    /// Zahodí HTTP session (connection pool, cookies) a začne s čerstvou.
    /// Volá se po sérii neúspěšných live fetchů místo restartu procesu.
    pub fn reset_session(&self) {
        *self.client.write().unwrap() = build_client();
        debug!("♻️ sofascore HTTP session reset");
    }

    /// Live list: summary snapshoty bez setů (ty dodá až detail fetch).
    pub async fn fetch_live_matches(&self) -> Result<Vec<MatchSnapshot>> {
        let resp = self
            .http()
            .get(LIVE_URL)
            .send()
            .await
            .context("live events request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("live events HTTP {status}");
        }

        let raw = resp.text().await?;
        let parsed: serde_json::Value =
            serde_json::from_str(&raw).context("live events: invalid JSON")?;
        let events = parsed.pointer("/events").and_then(|v| v.as_array());

        let mut out = Vec::new();
        if let Some(list) = events {
            for ev in list {
                let Some(id) = ev.pointer("/id").and_then(|v| v.as_i64()) else {
                    continue;
                };
                let home = ev
                    .pointer("/homeTeam/shortName")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                let away = ev
                    .pointer("/awayTeam/shortName")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                let category = ev
                    .pointer("/tournament/category/slug")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_lowercase();
                // Team type 1 = jednotlivec (dvouhra), 2 = pár (čtyřhra).
                let team_type = ev
                    .pointer("/homeTeam/type")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);
                let match_type = if team_type == 1 {
                    MatchType::Singles
                } else {
                    MatchType::Doubles
                };

                let match_id = MatchId::new(id.to_string());
                self.meta.lock().unwrap().insert(
                    match_id.clone(),
                    MatchMeta {
                        home_name: home.to_string(),
                        away_name: away.to_string(),
                        tournament_category: category.clone(),
                        match_type,
                    },
                );

                out.push(MatchSnapshot {
                    match_id,
                    home_name: home.to_string(),
                    away_name: away.to_string(),
                    tournament_category: category,
                    match_type,
                    sets: vec![],
                });
            }
        }

        Ok(out)
    }
}

impl Default for SofascoreClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        // Imitujeme prohlížeč kvůli anti-bot ochraně
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Filtr před vstupem do core: ATP + Challenger, jen dvouhry.
pub fn is_relevant(m: &MatchSnapshot) -> bool {
    m.match_type == MatchType::Singles
        && RELEVANT_CATEGORIES.contains(&m.tournament_category.as_str())
}

// ── Point-by-point payload ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PointByPointResponse {
    #[serde(rename = "pointByPoint", default)]
    point_by_point: Vec<SofaSet>,
}

#[derive(Debug, Deserialize)]
struct SofaSet {
    #[serde(rename = "set")]
    number: u32,
    #[serde(rename = "tieBreak", default)]
    tie_break: bool,
    #[serde(default)]
    games: Vec<SofaGame>,
}

#[derive(Debug, Deserialize)]
struct SofaGame {
    #[serde(rename = "game")]
    number: u32,
    #[serde(default)]
    points: Vec<SofaPoint>,
    score: SofaGameScore,
}

#[derive(Debug, Deserialize)]
struct SofaGameScore {
    /// 1 = home servíruje, 2 = away.
    #[serde(default)]
    serving: i64,
    /// -1 = rozehráno, 1/2 = vítěz gamu.
    #[serde(default = "scoring_in_progress")]
    scoring: i64,
}

fn scoring_in_progress() -> i64 {
    -1
}

#[derive(Debug, Deserialize)]
struct SofaPoint {
    #[serde(rename = "homePoint", default)]
    home_point: String,
    #[serde(rename = "awayPoint", default)]
    away_point: String,
}

fn convert_sets(payload: PointByPointResponse) -> Vec<SetSnapshot> {
    payload
        .point_by_point
        .into_iter()
        .map(|set| SetSnapshot {
            set_number: set.number,
            is_tie_break: set.tie_break,
            games: set
                .games
                .into_iter()
                .map(|g| GameSnapshot {
                    game_number: g.number,
                    server: if g.score.serving == 2 {
                        Side::Away
                    } else {
                        Side::Home
                    },
                    points: g
                        .points
                        .into_iter()
                        .map(|p| PointObservation::new(p.home_point, p.away_point))
                        .collect(),
                    winner: match g.score.scoring {
                        1 => Some(Side::Home),
                        2 => Some(Side::Away),
                        _ => None,
                    },
                })
                .collect(),
        })
        .collect()
}

#[async_trait]
impl MatchDetailSource for SofascoreClient {
    async fn fetch_match_detail(&self, id: &MatchId) -> Result<MatchSnapshot, FetchError> {
        let url = format!(
            "https://api.sofascore.com/api/v1/event/{}/point-by-point",
            id.as_str()
        );
        let resp = self
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::new(id.clone(), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::new(id.clone(), format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::new(id.clone(), e.to_string()))?;
        let payload: PointByPointResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::new(id.clone(), format!("invalid JSON: {e}")))?;

        let meta = self.meta.lock().unwrap().get(id).cloned().ok_or_else(|| {
            // Detail bez předchozího live sightingu — nemáme jména, přeskočit.
            FetchError::new(id.clone(), "no summary metadata cached")
        })?;

        Ok(MatchSnapshot {
            match_id: id.clone(),
            home_name: meta.home_name,
            away_name: meta.away_name,
            tournament_category: meta.tournament_category,
            match_type: meta.match_type,
            sets: convert_sets(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_by_point_payload_maps_to_snapshot_sets() {
        let body = r#"{
            "pointByPoint": [
                {
                    "set": 1,
                    "games": [
                        {
                            "game": 1,
                            "points": [
                                {"homePoint": "15", "awayPoint": "0"},
                                {"homePoint": "30", "awayPoint": "0"}
                            ],
                            "score": {"serving": 1, "scoring": 1}
                        },
                        {
                            "game": 2,
                            "points": [
                                {"homePoint": "0", "awayPoint": "15"},
                                {"homePoint": "0", "awayPoint": "30"}
                            ],
                            "score": {"serving": 2, "scoring": -1}
                        }
                    ]
                }
            ]
        }"#;

        let payload: PointByPointResponse = serde_json::from_str(body).unwrap();
        let sets = convert_sets(payload);

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].set_number, 1);
        assert!(!sets[0].is_tie_break);
        assert_eq!(sets[0].games.len(), 2);

        let done = &sets[0].games[0];
        assert_eq!(done.server, Side::Home);
        assert_eq!(done.winner, Some(Side::Home));

        let running = &sets[0].games[1];
        assert_eq!(running.server, Side::Away);
        assert_eq!(running.winner, None);
        assert_eq!(running.points[1], PointObservation::new("0", "30"));
    }

    #[test]
    fn tie_break_flag_survives_conversion() {
        let body = r#"{
            "pointByPoint": [
                {
                    "set": 3,
                    "tieBreak": true,
                    "games": [
                        {"game": 13, "points": [], "score": {"serving": 1}}
                    ]
                }
            ]
        }"#;
        let payload: PointByPointResponse = serde_json::from_str(body).unwrap();
        let sets = convert_sets(payload);
        assert!(sets[0].is_tie_break);
        assert_eq!(sets[0].games[0].winner, None);
    }

    #[test]
    fn relevance_filter_matches_category_and_type() {
        let mk = |category: &str, match_type: MatchType| MatchSnapshot {
            match_id: MatchId::new("1"),
            home_name: "H".into(),
            away_name: "A".into(),
            tournament_category: category.into(),
            match_type,
            sets: vec![],
        };

        assert!(is_relevant(&mk("atp", MatchType::Singles)));
        assert!(is_relevant(&mk("challenger", MatchType::Singles)));
        assert!(!is_relevant(&mk("itf-men", MatchType::Singles)));
        assert!(!is_relevant(&mk("atp", MatchType::Doubles)));
    }
}
