/// TennisWatcher — Match Watcher Core
///
/// Event-detection + deduplication engine pro live tenis. Dostává pollované
/// snapshoty zápasů, vybírá "current game", vyhodnocuje podmínky
/// (server prohrál první dva body; game dohrán) a hlídá, aby každá
/// notifikace odešla max. jednou na (match, set, game).
///
/// Transport (Sofascore fetch, Telegram send) žije v adapterech mimo tento
/// crate — sem vede jen `MatchDetailSource` a `NotificationSink`.

pub mod conditions;
pub mod error;
pub mod scheduler;
pub mod selector;
pub mod snapshot;
pub mod state;

pub use conditions::{game_completed, lost_first_two_on_serve, ZERO_TOKEN};
pub use error::{DispatchError, FetchError};
pub use scheduler::{CycleStats, MatchDetailSource, NotificationSink, Scheduler};
pub use selector::CurrentGamePolicy;
pub use snapshot::{
    GameIdentity, GameSnapshot, MatchId, MatchSnapshot, MatchType, PointObservation, SetSnapshot,
    Side,
};
pub use state::{MatchWatchState, Notification, NotificationKind};
