//! Game-wide constants: card alphabets, player limits, and house rules.

/// The standard French-deck rank alphabet in ace-low order.
pub const FRENCH_RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

/// The standard French-deck suit alphabet.
pub const FRENCH_SUITS: [char; 4] = ['c', 'd', 'h', 's'];

/// Rank character used for jokers.
pub const JOKER_RANK: char = 'j';

/// Suit character used for jokers.
pub const JOKER_SUIT: char = '*';

/// Go Fish needs at least one player to ask and one to be asked.
pub const MIN_PLAYERS: usize = 2;

pub const MAX_PLAYERS: usize = 9;

/// Initial hand size for games with fewer than
/// [`LARGE_GAME_THRESHOLD`] players.
pub const SMALL_GAME_HAND_SIZE: usize = 6;

/// Initial hand size for games with [`LARGE_GAME_THRESHOLD`] or more
/// players.
pub const LARGE_GAME_HAND_SIZE: usize = 5;

pub const LARGE_GAME_THRESHOLD: usize = 5;

/// Default host for servers and clients.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for servers and clients.
pub const DEFAULT_PORT: u16 = 5071;
