//! The authoritative Go Fish session state machine.
//!
//! The session owns the draw pile, every player slot, and the turn
//! cursor. Peers only submit intents; the session alone resolves them
//! and reports the resulting state as slot-addressed [`Delivery`]
//! values, so the whole machine is testable without a socket in
//! sight.

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    FRENCH_RANKS, FRENCH_SUITS, LARGE_GAME_HAND_SIZE, LARGE_GAME_THRESHOLD, MAX_PLAYERS,
    MIN_PLAYERS, SMALL_GAME_HAND_SIZE,
};
use super::entities::{End, OrderTable, PlayerSummary, SearchTerm, Stack, new_deck};

/// A stable per-game player identifier, assigned at connection time
/// and independent of the underlying connection's lifetime.
pub type SlotIndex = usize;

/// Errors from invalid game configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {0}")]
    PlayerCount(usize),
    #[error("rank and suit alphabets must be non-empty")]
    EmptyAlphabet,
}

/// Errors from invalid player actions. The host logs these and moves
/// on; none of them mutate state or tear down a connection.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("game is full")]
    CapacityReached,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("game is not in progress")]
    GameNotInProgress,
    #[error("not your turn")]
    OutOfTurnAsk,
    #[error("can't ask yourself")]
    CannotAskSelf,
    #[error("no player in slot {0}")]
    InvalidSlot(SlotIndex),
    #[error("rank {0} is not in this game")]
    UnknownRank(char),
    #[error("rank {0} is not in your hand")]
    RankNotHeld(char),
}

/// Per-game configuration.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub ranks: Vec<char>,
    pub suits: Vec<char>,
    /// How many players the session waits for before starting.
    pub player_count: usize,
    /// Initial and redeal hand size. `None` applies the house rule:
    /// 6 cards, or 5 for games of 5+ players.
    pub hand_size: Option<usize>,
    /// Unset only by deterministic tests.
    pub shuffle: bool,
}

impl GameConfig {
    pub fn new(player_count: usize) -> Self {
        Self {
            ranks: FRENCH_RANKS.to_vec(),
            suits: FRENCH_SUITS.to_vec(),
            player_count,
            hand_size: None,
            shuffle: true,
        }
    }

    pub fn hand_size(&self) -> usize {
        self.hand_size.unwrap_or(if self.player_count >= LARGE_GAME_THRESHOLD {
            LARGE_GAME_HAND_SIZE
        } else {
            SMALL_GAME_HAND_SIZE
        })
    }

    pub fn total_cards(&self) -> usize {
        self.ranks.len() * self.suits.len()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(ConfigError::PlayerCount(self.player_count));
        }
        if self.ranks.is_empty() || self.suits.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(())
    }
}

/// Linear phase progression; there are no reverse transitions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GamePhase {
    WaitingForPlayers,
    Playing,
    GameOver,
}

/// One player slot: a hand, the tricks credited to it, and whether
/// its connection is still attached.
#[derive(Clone, Debug)]
pub struct PlayerSlot {
    pub hand: Stack,
    pub tricks: Vec<char>,
    pub live: bool,
}

impl PlayerSlot {
    fn new() -> Self {
        Self {
            hand: Stack::new(),
            tricks: Vec::new(),
            live: true,
        }
    }

    fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            hand_size: self.hand.len(),
            tricks: self.tricks.clone(),
            live: self.live,
        }
    }
}

/// A game-driven message for one slot. The host maps these onto the
/// wire protocol one-to-one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SessionUpdate {
    /// Full initial snapshot; the game has begun.
    StartGame {
        slot: SlotIndex,
        hand: Stack,
        stats: Vec<PlayerSummary>,
        draw_pile_size: usize,
    },
    /// The recipient may submit one ask.
    Turn,
    /// Full-state refresh after a resolved ask. Always a verbatim
    /// replacement, never a delta, so mirrors can't drift.
    HandAndStats {
        hand: Stack,
        stats: Vec<PlayerSummary>,
        draw_pile_size: usize,
    },
    /// Terminal; no further asks are accepted.
    GameOver,
}

/// A [`SessionUpdate`] addressed to one slot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delivery {
    pub slot: SlotIndex,
    pub update: SessionUpdate,
}

/// The authoritative game session.
pub struct GameSession {
    config: GameConfig,
    order: OrderTable,
    phase: GamePhase,
    slots: Vec<PlayerSlot>,
    draw_pile: Stack,
    turn_index: SlotIndex,
}

impl GameSession {
    /// Creates a session waiting for `config.player_count` players.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let order = OrderTable::new(&config.ranks, &config.suits);
        let draw_pile = new_deck(&config.ranks, &config.suits, 0, config.shuffle);
        Ok(Self {
            config,
            order,
            phase: GamePhase::WaitingForPlayers,
            slots: Vec::new(),
            draw_pile,
            turn_index: 0,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn_index(&self) -> SlotIndex {
        self.turn_index
    }

    pub fn draw_pile_size(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn slots(&self) -> &[PlayerSlot] {
        &self.slots
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn order(&self) -> &OrderTable {
        &self.order
    }

    /// Whether a new connection can still be promoted to a slot.
    pub fn can_accept(&self) -> bool {
        self.phase == GamePhase::WaitingForPlayers && self.slots.len() < self.config.player_count
    }

    /// Per-slot summary stats, in slot order.
    pub fn stats(&self) -> Vec<PlayerSummary> {
        self.slots.iter().map(PlayerSlot::summary).collect()
    }

    /// Assigns the next free slot to a newly confirmed connection.
    /// The final connection triggers the transition to `Playing` and
    /// the returned deliveries carry the initial snapshots plus the
    /// first turn notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is full or already running.
    pub fn add_player(&mut self) -> Result<(SlotIndex, Vec<Delivery>), UserError> {
        match self.phase {
            GamePhase::Playing | GamePhase::GameOver => Err(UserError::GameAlreadyInProgress),
            GamePhase::WaitingForPlayers if self.slots.len() >= self.config.player_count => {
                Err(UserError::CapacityReached)
            }
            GamePhase::WaitingForPlayers => {
                let slot = self.slots.len();
                self.slots.push(PlayerSlot::new());
                info!("slot {slot} joined ({}/{})", self.slots.len(), self.config.player_count);
                let deliveries = if self.slots.len() == self.config.player_count {
                    self.start_game()
                } else {
                    Vec::new()
                };
                Ok((slot, deliveries))
            }
        }
    }

    /// Deals the initial hands, scans them for pre-existing tricks,
    /// and announces the first turn.
    fn start_game(&mut self) -> Vec<Delivery> {
        self.phase = GamePhase::Playing;
        let hand_size = self.config.hand_size();
        for slot in &mut self.slots {
            slot.hand = self.draw_pile.deal(hand_size, End::Top);
        }
        for slot in 0..self.slots.len() {
            self.trick_check(slot);
        }
        info!(
            "game started with {} players, {} cards left in the draw pile",
            self.slots.len(),
            self.draw_pile.len()
        );
        let stats = self.stats();
        let mut deliveries: Vec<Delivery> = self
            .slots
            .iter()
            .enumerate()
            .map(|(slot, state)| Delivery {
                slot,
                update: SessionUpdate::StartGame {
                    slot,
                    hand: state.hand.clone(),
                    stats: stats.clone(),
                    draw_pile_size: self.draw_pile.len(),
                },
            })
            .collect();
        if self.phase == GamePhase::GameOver {
            // The initial trick scan can end a degenerate game on the
            // spot.
            deliveries.extend(self.broadcast(SessionUpdate::GameOver));
        } else {
            deliveries.push(Delivery {
                slot: self.turn_index,
                update: SessionUpdate::Turn,
            });
        }
        deliveries
    }

    /// Resolves one ask from the slot currently holding the turn.
    ///
    /// # Errors
    ///
    /// Returns a [`UserError`] for any protocol violation: out of
    /// turn, self-targeted, unknown slot or rank, or a rank the asker
    /// does not hold. Nothing is mutated on error.
    pub fn resolve_ask(
        &mut self,
        asker: SlotIndex,
        target: SlotIndex,
        rank: char,
    ) -> Result<Vec<Delivery>, UserError> {
        if self.phase != GamePhase::Playing {
            return Err(UserError::GameNotInProgress);
        }
        if asker != self.turn_index {
            return Err(UserError::OutOfTurnAsk);
        }
        if target == asker {
            return Err(UserError::CannotAskSelf);
        }
        if target >= self.slots.len() {
            return Err(UserError::InvalidSlot(target));
        }
        if !self.order.contains_rank(rank) {
            return Err(UserError::UnknownRank(rank));
        }
        if self.slots[asker].hand.find(SearchTerm::Rank(rank)).is_empty() {
            return Err(UserError::RankNotHeld(rank));
        }

        let taken = self.slots[target].hand.remove(SearchTerm::Rank(rank));
        let mut keeps_turn;
        if taken.is_empty() {
            // Go fish: one card from the pile, if there is one.
            keeps_turn = false;
            if !self.draw_pile.is_empty() {
                let drawn = self.draw_pile.deal(1, End::Top);
                let drew_match = drawn.cards()[0].rank == rank;
                self.slots[asker].hand.add_list(drawn, End::Top);
                if drew_match {
                    info!("slot {asker} fished up the {rank} they asked for");
                    keeps_turn = true;
                }
            }
            self.trick_check(asker);
            self.exhaustion_check(asker);
        } else {
            info!(
                "slot {target} handed {} {rank}(s) over to slot {asker}",
                taken.len()
            );
            self.slots[asker].hand.add_list(taken, End::Top);
            self.trick_check(target);
            self.trick_check(asker);
            self.exhaustion_check(target);
            self.exhaustion_check(asker);
            keeps_turn = true;
        }

        // A player can keep the turn with no cards left only once the
        // pile has run dry; pass the turn on rather than stranding it.
        if keeps_turn && self.slots[asker].hand.is_empty() {
            keeps_turn = false;
        }

        let mut deliveries = self.snapshot_deliveries();
        if self.phase == GamePhase::GameOver {
            deliveries.extend(self.broadcast(SessionUpdate::GameOver));
        } else if keeps_turn {
            deliveries.push(Delivery {
                slot: self.turn_index,
                update: SessionUpdate::Turn,
            });
        } else {
            match self.advance_turn() {
                Some(next) => deliveries.push(Delivery {
                    slot: next,
                    update: SessionUpdate::Turn,
                }),
                None => {
                    info!("no eligible player left to act, ending the game");
                    self.phase = GamePhase::GameOver;
                    deliveries.extend(self.broadcast(SessionUpdate::GameOver));
                }
            }
        }
        Ok(deliveries)
    }

    /// Flips a slot's liveness flag. The slot and its hand stay in
    /// the game and are skipped during turn rotation. If the slot was
    /// holding the turn, the turn moves on immediately so play does
    /// not stall on a dead peer.
    pub fn mark_disconnected(&mut self, slot: SlotIndex) -> Vec<Delivery> {
        let Some(state) = self.slots.get_mut(slot) else {
            return Vec::new();
        };
        state.live = false;
        info!("slot {slot} disconnected");
        if self.phase != GamePhase::Playing || self.turn_index != slot {
            return Vec::new();
        }
        match self.advance_turn() {
            Some(next) => vec![Delivery {
                slot: next,
                update: SessionUpdate::Turn,
            }],
            None => {
                info!("no eligible player left to act, ending the game");
                self.phase = GamePhase::GameOver;
                self.broadcast(SessionUpdate::GameOver)
            }
        }
    }

    /// Extracts every completed trick from a hand: any rank held in
    /// every suit moves to the slot's trick list in full. One pass is
    /// exhaustive. Also evaluates the game-over condition.
    fn trick_check(&mut self, slot: SlotIndex) -> Vec<char> {
        let suit_count = self.config.suits.len();
        let ranks = self.config.ranks.clone();
        let mut completed = Vec::new();
        for rank in ranks {
            let matches = self.slots[slot].hand.find(SearchTerm::Rank(rank));
            if matches.len() == suit_count {
                self.slots[slot].hand.remove(SearchTerm::Rank(rank));
                self.slots[slot].tricks.push(rank);
                completed.push(rank);
                info!("slot {slot} takes a trick of {rank}s");
            }
        }
        let collected: usize = self.slots.iter().map(|s| s.tricks.len()).sum();
        if collected == self.config.ranks.len() {
            info!("every rank has been collected, the game is over");
            self.phase = GamePhase::GameOver;
        }
        completed
    }

    /// Redeals a fresh hand to a player who ran out of cards, as far
    /// as the draw pile allows, then re-scans the new hand for
    /// tricks.
    fn exhaustion_check(&mut self, slot: SlotIndex) {
        if self.phase != GamePhase::Playing
            || !self.slots[slot].hand.is_empty()
            || self.draw_pile.is_empty()
        {
            return;
        }
        let hand_size = self.config.hand_size();
        self.slots[slot].hand = self.draw_pile.deal(hand_size, End::Top);
        info!(
            "slot {slot} ran out of cards and was redealt {}",
            self.slots[slot].hand.len()
        );
        self.trick_check(slot);
    }

    /// Moves the turn cursor to the next slot that is both live and
    /// holding cards. Searches at most one full round; `None` means
    /// nobody is eligible and the game should end.
    fn advance_turn(&mut self) -> Option<SlotIndex> {
        let count = self.slots.len();
        for step in 1..=count {
            let candidate = (self.turn_index + step) % count;
            let slot = &self.slots[candidate];
            if slot.live && !slot.hand.is_empty() {
                self.turn_index = candidate;
                return Some(candidate);
            }
        }
        None
    }

    /// A full-state refresh for every slot.
    fn snapshot_deliveries(&self) -> Vec<Delivery> {
        let stats = self.stats();
        self.slots
            .iter()
            .enumerate()
            .map(|(slot, state)| Delivery {
                slot,
                update: SessionUpdate::HandAndStats {
                    hand: state.hand.clone(),
                    stats: stats.clone(),
                    draw_pile_size: self.draw_pile.len(),
                },
            })
            .collect()
    }

    fn broadcast(&self, update: SessionUpdate) -> Vec<Delivery> {
        (0..self.slots.len())
            .map(|slot| Delivery {
                slot,
                update: update.clone(),
            })
            .collect()
    }
}
