//! Current-game selection policy.
//!
//! Feed revize historicky střídaly, jestli je rozehraný game na indexu 0
//! nebo -1. Místo tiché domněnky je to explicitní, přepnutelná policy;
//! default je "poslední prvek" a upstream adapter musí ordering garantovat
//! (nebo si policy přepnout).

use crate::snapshot::{GameSnapshot, MatchSnapshot, SetSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CurrentGamePolicy {
    /// Poslední set v `sets` a poslední game v `games` je ten rozehraný.
    #[default]
    LastIsCurrent,
    /// Opačná konvence (starší feed revize).
    FirstIsCurrent,
}

impl CurrentGamePolicy {
    pub fn current_set<'a>(&self, snapshot: &'a MatchSnapshot) -> Option<&'a SetSnapshot> {
        match self {
            CurrentGamePolicy::LastIsCurrent => snapshot.sets.last(),
            CurrentGamePolicy::FirstIsCurrent => snapshot.sets.first(),
        }
    }

    pub fn current_game<'a>(&self, set: &'a SetSnapshot) -> Option<&'a GameSnapshot> {
        match self {
            CurrentGamePolicy::LastIsCurrent => set.games.last(),
            CurrentGamePolicy::FirstIsCurrent => set.games.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{GameSnapshot, MatchId, MatchSnapshot, MatchType, SetSnapshot, Side};

    fn game(n: u32) -> GameSnapshot {
        GameSnapshot {
            game_number: n,
            server: Side::Home,
            points: vec![],
            winner: None,
        }
    }

    fn match_with_sets(sets: Vec<SetSnapshot>) -> MatchSnapshot {
        MatchSnapshot {
            match_id: MatchId::from("m"),
            home_name: "H".into(),
            away_name: "A".into(),
            tournament_category: "atp".into(),
            match_type: MatchType::Singles,
            sets,
        }
    }

    #[test]
    fn empty_set_yields_none() {
        let set = SetSnapshot {
            set_number: 1,
            is_tie_break: false,
            games: vec![],
        };
        assert!(CurrentGamePolicy::default().current_game(&set).is_none());
    }

    #[test]
    fn empty_match_yields_none() {
        let m = match_with_sets(vec![]);
        assert!(CurrentGamePolicy::default().current_set(&m).is_none());
    }

    #[test]
    fn last_is_current_picks_tail() {
        let set = SetSnapshot {
            set_number: 1,
            is_tie_break: false,
            games: vec![game(1), game(2), game(3)],
        };
        let picked = CurrentGamePolicy::LastIsCurrent.current_game(&set).unwrap();
        assert_eq!(picked.game_number, 3);
    }

    #[test]
    fn first_is_current_picks_head() {
        let set = SetSnapshot {
            set_number: 1,
            is_tie_break: false,
            games: vec![game(1), game(2), game(3)],
        };
        let picked = CurrentGamePolicy::FirstIsCurrent.current_game(&set).unwrap();
        assert_eq!(picked.game_number, 1);
    }
}
