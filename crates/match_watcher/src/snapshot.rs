//! Typed model of one poll's view of one match.
//!
//! Všechno tady je jen data — žádné IO, žádná logika kromě drobných helperů.
//! Score tokeny ("0", "15", "40", "A") zůstávají opaque stringy; tie-break
//! a advantage tokeny nejsou čísla, takže je neredukujeme na inty.

use std::fmt;

/// Opaque stable identifier zápasu (z feedu), platný po dobu live života.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// Výsledek jedné výměny: raw score tokeny obou stran PO odehrání bodu.
/// Pořadí v `GameSnapshot::points` = chronologie (index 0 = první bod).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointObservation {
    pub home: String,
    pub away: String,
}

impl PointObservation {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }

    pub fn token(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Jeden game uvnitř setu. `game_number` je 1-based číslo z feedu —
/// unikátní JEN v kombinaci s číslem setu, ne globálně.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub game_number: u32,
    pub server: Side,
    pub points: Vec<PointObservation>,
    /// Some(side) ⇔ game dohrán. Přechod None → Some je monotónní.
    pub winner: Option<Side>,
}

#[derive(Debug, Clone)]
pub struct SetSnapshot {
    pub set_number: u32,
    pub is_tie_break: bool,
    /// Pořadí definuje feed — current game NENÍ garantovaně na fixním
    /// indexu, viz `CurrentGamePolicy`.
    pub games: Vec<GameSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Singles,
    Doubles,
}

#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub home_name: String,
    pub away_name: String,
    pub tournament_category: String,
    pub match_type: MatchType,
    pub sets: Vec<SetSnapshot>,
}

impl MatchSnapshot {
    pub fn name_of(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_name,
            Side::Away => &self.away_name,
        }
    }
}

/// Kompozitní klíč `(match, set, game)` — jediný klíč pro veškerý dedup.
/// Nikdy se nesmí recyklovat pro dva fyzicky různé gamy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameIdentity {
    pub match_id: MatchId,
    pub set_number: u32,
    pub game_number: u32,
}

impl GameIdentity {
    pub fn new(match_id: MatchId, set_number: u32, game_number: u32) -> Self {
        Self {
            match_id,
            set_number,
            game_number,
        }
    }
}

impl fmt::Display for GameIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/S{}G{}", self.match_id, self.set_number, self.game_number)
    }
}
