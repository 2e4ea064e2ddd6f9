//! Fan-out přes live zápasy: jeden `MatchWatchState` na MatchId.
//!
//! V rámci cyklu běží zápasy paralelně (tokio::spawn), stav se MOVNE do
//! tasku a po dokončení vrátí — exkluzivní ownership místo process-wide
//! locku, žádný cross-match shared mutable state. Cyklus N+1 pro zápas
//! nezačne, dokud neskončil cyklus N (run_cycle čeká na všechny tasky).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{DispatchError, FetchError};
use crate::selector::CurrentGamePolicy;
use crate::snapshot::{MatchId, MatchSnapshot};
use crate::state::{MatchWatchState, Notification};

/// Point-by-point detail zdroj. Fail = cyklus se pro daný zápas přeskočí.
#[async_trait]
pub trait MatchDetailSource: Send + Sync {
    async fn fetch_match_detail(&self, id: &MatchId) -> Result<MatchSnapshot, FetchError>;
}

/// Notifikační sink. Max. jeden pokus o doručení na detekovaný přechod —
/// fail se loguje a stav se stejně označí jako odeslaný (žádný re-send).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, notification: &Notification) -> Result<(), DispatchError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CycleStats {
    pub live_matches: usize,
    pub tracked_states: usize,
    pub fetch_failures: usize,
    pub notifications: usize,
    pub delivery_failures: usize,
}

pub struct Scheduler<S, D> {
    source: Arc<S>,
    sink: Arc<D>,
    policy: CurrentGamePolicy,
    states: HashMap<MatchId, MatchWatchState>,
}

impl<S, D> Scheduler<S, D>
where
    S: MatchDetailSource + 'static,
    D: NotificationSink + 'static,
{
    pub fn new(source: Arc<S>, sink: Arc<D>) -> Self {
        Self::with_policy(source, sink, CurrentGamePolicy::default())
    }

    pub fn with_policy(source: Arc<S>, sink: Arc<D>, policy: CurrentGamePolicy) -> Self {
        Self {
            source,
            sink,
            policy,
            states: HashMap::new(),
        }
    }

    /// Počet zápasů, pro které aktuálně držíme stav.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    /// Jeden poll cyklus nad (už přefiltrovaným) live seznamem.
    ///
    /// Zápas, jehož id v seznamu není, ztrácí stav na konci cyklu — když
    /// se později vrátí, začíná s čerstvým dedupem (brand-new match).
    pub async fn run_cycle(&mut self, live: &[MatchSnapshot]) -> CycleStats {
        let mut stats = CycleStats {
            live_matches: live.len(),
            ..CycleStats::default()
        };

        let mut seen: HashSet<MatchId> = HashSet::new();
        let mut handles = Vec::with_capacity(live.len());

        for snap in live {
            if !seen.insert(snap.match_id.clone()) {
                debug!("duplicate live entry for {}, skipping", snap.match_id);
                continue;
            }
            let state = self.states.remove(&snap.match_id).unwrap_or_default();
            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            let policy = self.policy;
            let id = snap.match_id.clone();
            handles.push(tokio::spawn(run_match_cycle(id, state, source, sink, policy)));
        }

        for handle in handles {
            match handle.await {
                Ok(outcome) => {
                    if !outcome.fetched {
                        stats.fetch_failures += 1;
                    }
                    stats.notifications += outcome.emitted;
                    stats.delivery_failures += outcome.delivery_failed;
                    self.states.insert(outcome.id, outcome.state);
                }
                Err(e) => {
                    // Stav tasku je pryč; zápas začne příští cyklus čistý.
                    warn!("match task panicked: {e}");
                }
            }
        }

        // GC: zápasy mimo tento live seznam opustily feed.
        let departed: Vec<MatchId> = self
            .states
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in departed {
            self.states.remove(&id);
            debug!("🧹 {} left the live feed, state dropped", id);
        }

        stats.tracked_states = self.states.len();
        stats
    }
}

struct MatchOutcome {
    id: MatchId,
    state: MatchWatchState,
    fetched: bool,
    emitted: usize,
    delivery_failed: usize,
}

async fn run_match_cycle<S, D>(
    id: MatchId,
    mut state: MatchWatchState,
    source: Arc<S>,
    sink: Arc<D>,
    policy: CurrentGamePolicy,
) -> MatchOutcome
where
    S: MatchDetailSource,
    D: NotificationSink,
{
    let detail = match source.fetch_match_detail(&id).await {
        Ok(detail) => detail,
        Err(e) => {
            debug!("{e} — state untouched, retry next cycle");
            return MatchOutcome {
                id,
                state,
                fetched: false,
                emitted: 0,
                delivery_failed: 0,
            };
        }
    };

    let mut emitted = 0;
    let mut delivery_failed = 0;
    if let Some(notification) = state.advance(&detail, policy) {
        emitted = 1;
        if let Err(e) = sink.emit(&notification).await {
            // Best-effort: neretryujeme, dedup zůstává označený.
            delivery_failed = 1;
            warn!("delivery failed for {}: {e}", notification.game);
        }
    }

    MatchOutcome {
        id,
        state,
        fetched: true,
        emitted,
        delivery_failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{GameSnapshot, MatchType, PointObservation, SetSnapshot, Side};
    use crate::state::NotificationKind;
    use std::sync::Mutex;

    /// In-memory detail source: id → snapshot; chybějící id = FetchError.
    #[derive(Default)]
    struct FakeSource {
        details: Mutex<HashMap<MatchId, MatchSnapshot>>,
    }

    impl FakeSource {
        fn put(&self, snap: MatchSnapshot) {
            self.details
                .lock()
                .unwrap()
                .insert(snap.match_id.clone(), snap);
        }

        fn clear(&self, id: &MatchId) {
            self.details.lock().unwrap().remove(id);
        }
    }

    #[async_trait]
    impl MatchDetailSource for FakeSource {
        async fn fetch_match_detail(&self, id: &MatchId) -> Result<MatchSnapshot, FetchError> {
            self.details
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| FetchError::new(id.clone(), "no detail available"))
        }
    }

    /// Sink co si zapisuje notifikace; `failing` simuluje DispatchError
    /// (notifikace se zaznamená i tak, aby šel testovat dedup).
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Notification>>,
        failing: std::sync::atomic::AtomicBool,
    }

    impl RecordingSink {
        fn kinds(&self) -> Vec<NotificationKind> {
            self.sent.lock().unwrap().iter().map(|n| n.kind).collect()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn emit(&self, notification: &Notification) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(DispatchError::new("telegram down"));
            }
            Ok(())
        }
    }

    fn detail(id: &str, game_number: u32, points: &[(&str, &str)], winner: Option<Side>) -> MatchSnapshot {
        MatchSnapshot {
            match_id: MatchId::from(id),
            home_name: "Alcaraz".into(),
            away_name: "Sinner".into(),
            tournament_category: "atp".into(),
            match_type: MatchType::Singles,
            sets: vec![SetSnapshot {
                set_number: 1,
                is_tie_break: false,
                games: vec![GameSnapshot {
                    game_number,
                    server: Side::Home,
                    points: points
                        .iter()
                        .map(|(h, a)| PointObservation::new(*h, *a))
                        .collect(),
                    winner,
                }],
            }],
        }
    }

    /// Live-list položka: jen id + jména, bez setů (jak chodí z live endpointu).
    fn live_entry(id: &str) -> MatchSnapshot {
        MatchSnapshot {
            match_id: MatchId::from(id),
            home_name: "Alcaraz".into(),
            away_name: "Sinner".into(),
            tournament_category: "atp".into(),
            match_type: MatchType::Singles,
            sets: vec![],
        }
    }

    fn scheduler(
        source: &Arc<FakeSource>,
        sink: &Arc<RecordingSink>,
    ) -> Scheduler<FakeSource, RecordingSink> {
        Scheduler::new(Arc::clone(source), Arc::clone(sink))
    }

    #[tokio::test]
    async fn early_then_completion_pair() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        let stats = sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(stats.notifications, 1);
        assert_eq!(stats.tracked_states, 1);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], Some(Side::Away)));
        let stats = sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(stats.notifications, 1);

        assert_eq!(
            sink.kinds(),
            vec![
                NotificationKind::EarlyBreakThreat,
                NotificationKind::GameCompleted
            ]
        );
    }

    #[tokio::test]
    async fn repeated_cycles_emit_once() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        for _ in 0..4 {
            sched.run_cycle(&[live_entry("M")]).await;
        }
        assert_eq!(sink.kinds(), vec![NotificationKind::EarlyBreakThreat]);
    }

    #[tokio::test]
    async fn fetch_failure_skips_cycle_and_keeps_state() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(sink.kinds().len(), 1);

        // Detail vypadne → fetch failure, stav (lock + dedup) přežívá.
        source.clear(&MatchId::from("M"));
        let stats = sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.tracked_states, 1);

        // Detail zpátky, stejný snapshot → žádný duplikát early.
        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(sink.kinds().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_failure_still_marks_sent() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        sink.failing
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        let stats = sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(stats.notifications, 1);
        assert_eq!(stats.delivery_failures, 1);

        // Sink se zotaví — ale early už je označená, žádný re-send.
        sink.failing
            .store(false, std::sync::atomic::Ordering::SeqCst);
        sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn departed_match_is_garbage_collected_and_returns_fresh() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(sched.tracked(), 1);

        // Zápas zmizel z live listu → stav pryč ještě v tomhle cyklu.
        let stats = sched.run_cycle(&[]).await;
        assert_eq!(stats.tracked_states, 0);
        assert_eq!(sched.tracked(), 0);

        // Návrat = brand-new match: čerstvý dedup, early smí znovu.
        sched.run_cycle(&[live_entry("M")]).await;
        assert_eq!(
            sink.kinds(),
            vec![
                NotificationKind::EarlyBreakThreat,
                NotificationKind::EarlyBreakThreat
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_live_entries_processed_once() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("M", 3, &[("0", "15"), ("0", "30")], None));
        let stats = sched
            .run_cycle(&[live_entry("M"), live_entry("M"), live_entry("M")])
            .await;
        assert_eq!(stats.notifications, 1);
        assert_eq!(sched.tracked(), 1);
        assert_eq!(sink.kinds().len(), 1);
    }

    #[tokio::test]
    async fn independent_matches_run_in_one_cycle() {
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let mut sched = scheduler(&source, &sink);

        source.put(detail("A", 3, &[("0", "15"), ("0", "30")], None));
        source.put(detail("B", 5, &[("0", "15"), ("0", "30")], None));
        // C nemá detail → fetch failure nesmí ovlivnit A/B.
        let stats = sched
            .run_cycle(&[live_entry("A"), live_entry("B"), live_entry("C")])
            .await;

        assert_eq!(stats.live_matches, 3);
        assert_eq!(stats.notifications, 2);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.tracked_states, 3);
    }
}
