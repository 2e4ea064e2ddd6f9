//! Pure condition evaluators — žádný stav, žádné IO.

use crate::snapshot::{GameSnapshot, SetSnapshot, Side};

/// Raw token feedu pro "žádný bod" na dané straně.
pub const ZERO_TOKEN: &str = "0";

/// Server prohrál oba první body gamu (0-15, 0-30 z pohledu serveru).
///
/// Tie-break je kategoricky vyloučený — bodování tam nemá server/receiver
/// framing, tokeny jsou čísla a podmínka by neměla smysl.
pub fn lost_first_two_on_serve(game: &GameSnapshot, set: &SetSnapshot) -> bool {
    if set.is_tie_break {
        return false;
    }
    if game.points.len() < 2 {
        return false;
    }
    let server = game.server;
    let receiver = server.other();
    game.points[..2]
        .iter()
        .all(|p| p.token(server) == ZERO_TOKEN && p.token(receiver) != ZERO_TOKEN)
}

/// Vítěz gamu, pokud už je dohraný. Feed přechází monotónně
/// None → Some(side), nikdy zpět.
pub fn game_completed(game: &GameSnapshot) -> Option<Side> {
    game.winner
}
