//! Per-match state machine: Idle ⇄ Watching + dedup bookkeeping.
//!
//! Jeden zápas hlídá max. jeden game najednou (single watched-game lock).
//! Pollování je překryvné a partially-ordered — game se může objevit,
//! zmizet a zase vrátit na jiném indexu — takže veškerý dedup jede přes
//! `GameIdentity` sety, ne přes pozice v poli.

use std::collections::HashSet;

use crate::conditions::{game_completed, lost_first_two_on_serve};
use crate::selector::CurrentGamePolicy;
use crate::snapshot::{GameIdentity, MatchSnapshot, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Server prohrál první dva body rozehraného gamu.
    EarlyBreakThreat,
    /// Hlídaný game dohrán (druhá půlka páru early/completion).
    GameCompleted,
}

/// Typovaná notifikace — rendering na text dělá až sink adapter.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub game: GameIdentity,
    pub home_name: String,
    pub away_name: String,
    /// Kdo servíroval, když se lock bral (completion zpráva se renderuje
    /// z tohohle, ne z aktuálního snapshotu).
    pub server_side: Side,
    pub server_name: String,
    /// Jen u `GameCompleted`.
    pub winner: Option<Side>,
}

impl Notification {
    /// Some(true) = server game udržel, Some(false) = byl prolomen.
    pub fn server_held(&self) -> Option<bool> {
        self.winner.map(|w| w == self.server_side)
    }
}

#[derive(Debug, Clone)]
struct WatchedGame {
    id: GameIdentity,
    server_side: Side,
    server_name: String,
}

/// Stav jednoho live zápasu. Vlastní ho výhradně Scheduler, mutuje jen
/// `advance` — žádné sdílení mezi zápasy.
#[derive(Debug, Default)]
pub struct MatchWatchState {
    watched: Option<WatchedGame>,
    /// Gamy s odeslanou early notifikací — roste, nikdy se nečistí
    /// (bounded počtem gamů v zápase).
    sent_early: HashSet<GameIdentity>,
    sent_completion: HashSet<GameIdentity>,
}

impl MatchWatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Game, na který aktuálně drží lock (pokud nějaký).
    pub fn watched_game(&self) -> Option<&GameIdentity> {
        self.watched.as_ref().map(|w| &w.id)
    }

    pub fn early_sent_for(&self, id: &GameIdentity) -> bool {
        self.sent_early.contains(id)
    }

    pub fn completion_sent_for(&self, id: &GameIdentity) -> bool {
        self.sent_completion.contains(id)
    }

    /// Jeden krok stavového automatu nad novým snapshotem.
    ///
    /// Vrací max. jednu notifikaci; prázdný/malformed snapshot je no-op.
    /// Celý krok je synchronní a all-or-nothing — žádný partial update.
    pub fn advance(
        &mut self,
        snapshot: &MatchSnapshot,
        policy: CurrentGamePolicy,
    ) -> Option<Notification> {
        let set = policy.current_set(snapshot)?;
        let game = policy.current_game(set)?;
        let id = GameIdentity::new(snapshot.match_id.clone(), set.set_number, game.game_number);

        match self.watched.clone() {
            Some(watched) => {
                if watched.id != id {
                    // Current je jiný game než hlídaný — nic nevyhodnocujeme,
                    // dokud se hlídaný game zase neukáže. Druhý qualifying
                    // game se vědomě přeskakuje (jeden příběh na zápas).
                    return None;
                }
                let winner = game_completed(game)?;
                self.watched = None;
                if self.sent_completion.insert(id.clone()) {
                    Some(Notification {
                        kind: NotificationKind::GameCompleted,
                        game: id,
                        home_name: snapshot.home_name.clone(),
                        away_name: snapshot.away_name.clone(),
                        server_side: watched.server_side,
                        server_name: watched.server_name,
                        winner: Some(winner),
                    })
                } else {
                    None
                }
            }
            None => {
                if game_completed(game).is_some() {
                    // Dohraný game bez předchozí early notifikace → ticho.
                    // Completion má smysl jen jako druhá půlka páru.
                    return None;
                }
                if !lost_first_two_on_serve(game, set) || self.sent_early.contains(&id) {
                    return None;
                }
                let server_side = game.server;
                let server_name = snapshot.name_of(server_side).to_string();
                self.sent_early.insert(id.clone());
                self.watched = Some(WatchedGame {
                    id: id.clone(),
                    server_side,
                    server_name: server_name.clone(),
                });
                Some(Notification {
                    kind: NotificationKind::EarlyBreakThreat,
                    game: id,
                    home_name: snapshot.home_name.clone(),
                    away_name: snapshot.away_name.clone(),
                    server_side,
                    server_name,
                    winner: None,
                })
            }
        }
    }
}
