use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{cmp::Ordering, collections::HashMap, fmt};

use super::constants::{FRENCH_RANKS, FRENCH_SUITS, JOKER_RANK, JOKER_SUIT};

/// Error from parsing a two-character card code.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("card code must be exactly two characters, got {0:?}")]
pub struct ParseCardError(pub String);

/// An immutable (rank, suit) pair.
///
/// Both halves are single characters from the rank/suit alphabets the
/// game was configured with. A card's wire form is its two-character
/// code, rank first (e.g. `"Ah"`, `"Ts"`), which is also how it
/// serializes.
///
/// Note that the derived equality compares the raw characters; use
/// [`OrderTable::cards_eq`] for equality relative to a configured
/// order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Card {
    pub rank: char,
    pub suit: char,
}

impl Card {
    pub fn new(rank: char, suit: char) -> Self {
        Self { rank, suit }
    }

    pub fn joker() -> Self {
        Self::new(JOKER_RANK, JOKER_SUIT)
    }

    /// The two-character textual form of this card.
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(2);
        code.push(self.rank);
        code.push(self.suit);
        code
    }

    /// Parses a two-character card code.
    ///
    /// # Errors
    ///
    /// Returns an error if `code` is not exactly two characters.
    pub fn parse(code: &str) -> Result<Self, ParseCardError> {
        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => Ok(Self::new(rank, suit)),
            _ => Err(ParseCardError(code.to_string())),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Self::parse(&code).map_err(serde::de::Error::custom)
    }
}

/// Injected rank/suit ordering used for card comparison and stack
/// sorting.
///
/// Every comparison takes the table explicitly so independently
/// configured games never alias each other's sort semantics.
#[derive(Clone, Debug)]
pub struct OrderTable {
    ranks: HashMap<char, u8>,
    suits: HashMap<char, u8>,
}

impl OrderTable {
    /// Builds a table from alphabets given in ascending order. Jokers
    /// always sort below the lowest rank and suit.
    pub fn new(ranks: &[char], suits: &[char]) -> Self {
        let mut rank_keys = HashMap::with_capacity(ranks.len() + 1);
        rank_keys.insert(JOKER_RANK, 0);
        for (i, &rank) in ranks.iter().enumerate() {
            rank_keys.insert(rank, i as u8 + 1);
        }
        let mut suit_keys = HashMap::with_capacity(suits.len() + 1);
        suit_keys.insert(JOKER_SUIT, 0);
        for (i, &suit) in suits.iter().enumerate() {
            suit_keys.insert(suit, i as u8 + 1);
        }
        Self {
            ranks: rank_keys,
            suits: suit_keys,
        }
    }

    /// The standard French-deck table with aces low.
    pub fn ace_low() -> Self {
        Self::new(&FRENCH_RANKS, &FRENCH_SUITS)
    }

    /// The standard French-deck table with aces high.
    pub fn ace_high() -> Self {
        let mut ranks: Vec<char> = FRENCH_RANKS[1..].to_vec();
        ranks.push('A');
        Self::new(&ranks, &FRENCH_SUITS)
    }

    pub fn contains_rank(&self, rank: char) -> bool {
        rank != JOKER_RANK && self.ranks.contains_key(&rank)
    }

    fn rank_key(&self, rank: char) -> u8 {
        self.ranks.get(&rank).copied().unwrap_or(0)
    }

    fn suit_key(&self, suit: char) -> u8 {
        self.suits.get(&suit).copied().unwrap_or(0)
    }

    /// Equality under this table: both rank and suit must compare
    /// equal.
    pub fn cards_eq(&self, a: &Card, b: &Card) -> bool {
        self.rank_key(a.rank) == self.rank_key(b.rank)
            && self.suit_key(a.suit) == self.suit_key(b.suit)
    }

    /// Total order over cards, keyed by rank then suit when
    /// `ranks_first`, suit then rank otherwise.
    pub fn cmp(&self, a: &Card, b: &Card, ranks_first: bool) -> Ordering {
        let rank_order = self.rank_key(a.rank).cmp(&self.rank_key(b.rank));
        let suit_order = self.suit_key(a.suit).cmp(&self.suit_key(b.suit));
        if ranks_first {
            rank_order.then(suit_order)
        } else {
            suit_order.then(rank_order)
        }
    }
}

impl Default for OrderTable {
    fn default() -> Self {
        Self::ace_low()
    }
}

/// Which end of a [`Stack`] an operation works on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum End {
    /// The front of the stack, where cards are dealt from by default.
    Top,
    Bottom,
}

/// A search key for [`Stack`] lookups: either every card of a rank,
/// or one exact card.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchTerm {
    Rank(char),
    Exact(Card),
}

impl SearchTerm {
    /// Parses a one-character rank term or a two-character card code.
    pub fn parse(term: &str) -> Option<Self> {
        let mut chars = term.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), None, _) => Some(Self::Rank(rank)),
            (Some(rank), Some(suit), None) => Some(Self::Exact(Card::new(rank, suit))),
            _ => None,
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        match self {
            Self::Rank(rank) => card.rank == *rank,
            Self::Exact(exact) => card == exact,
        }
    }
}

impl From<char> for SearchTerm {
    fn from(rank: char) -> Self {
        Self::Rank(rank)
    }
}

impl From<Card> for SearchTerm {
    fn from(card: Card) -> Self {
        Self::Exact(card)
    }
}

/// An ordered, mutable collection of cards: a deck, a draw pile, or a
/// hand.
///
/// The derived equality is order-dependent; [`Stack::compare_stacks`]
/// compares as sets. Stacks never duplicate cards on their own: every
/// mutating operation either inserts cards handed to it by value or
/// removes and returns cards, so owners can only move cards between
/// stacks.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Stack {
    cards: Vec<Card>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// The two-character codes of all cards, in stack order.
    pub fn codes(&self) -> Vec<String> {
        self.cards.iter().map(Card::code).collect()
    }

    /// Randomly permutes the stack in place.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    pub fn add(&mut self, card: Card, end: End) {
        match end {
            End::Top => self.cards.insert(0, card),
            End::Bottom => self.cards.push(card),
        }
    }

    /// Moves every card of `other` onto the given end, preserving
    /// `other`'s order.
    pub fn add_list(&mut self, other: Stack, end: End) {
        match end {
            End::Top => {
                let mut cards = other.cards;
                cards.append(&mut self.cards);
                self.cards = cards;
            }
            End::Bottom => self.cards.extend(other.cards),
        }
    }

    /// Removes and returns up to `n` cards from the given end.
    ///
    /// Dealing past the end truncates instead of failing: the
    /// returned stack's length signals how many cards were actually
    /// available.
    pub fn deal(&mut self, n: usize, end: End) -> Stack {
        let n = n.min(self.cards.len());
        match end {
            End::Top => {
                let rest = self.cards.split_off(n);
                let dealt = std::mem::replace(&mut self.cards, rest);
                Stack::from_cards(dealt)
            }
            End::Bottom => {
                let mut dealt = self.cards.split_off(self.cards.len() - n);
                // Dealing one-by-one off the bottom reverses the tail.
                dealt.reverse();
                Stack::from_cards(dealt)
            }
        }
    }

    /// Indices of every card matching `term`, in stack order.
    pub fn find(&self, term: SearchTerm) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| term.matches(card))
            .map(|(i, _)| i)
            .collect()
    }

    /// Copies of every card matching `term`, in stack order.
    pub fn get(&self, term: SearchTerm) -> Vec<Card> {
        self.cards
            .iter()
            .copied()
            .filter(|card| term.matches(card))
            .collect()
    }

    pub fn get_list(&self, terms: &[SearchTerm]) -> Vec<Card> {
        terms.iter().flat_map(|&term| self.get(term)).collect()
    }

    /// Removes and returns every card matching `term`. A term with no
    /// matches is a no-op, not an error.
    pub fn remove(&mut self, term: SearchTerm) -> Stack {
        let mut removed = Vec::new();
        self.cards.retain(|card| {
            if term.matches(card) {
                removed.push(*card);
                false
            } else {
                true
            }
        });
        Stack::from_cards(removed)
    }

    pub fn remove_list(&mut self, terms: &[SearchTerm]) -> Stack {
        let mut removed = Stack::new();
        for &term in terms {
            removed.add_list(self.remove(term), End::Bottom);
        }
        removed
    }

    /// Splits into two stacks at `at`, or down the middle when `at`
    /// is `None`.
    pub fn split(&self, at: Option<usize>) -> (Stack, Stack) {
        let at = at.unwrap_or(self.cards.len() / 2).min(self.cards.len());
        (
            Stack::from_cards(self.cards[..at].to_vec()),
            Stack::from_cards(self.cards[at..].to_vec()),
        )
    }

    /// Sorts the stack under the given order: cards group by the
    /// primary key (rank when `ranks_first`), ordered by the
    /// secondary key within each group. Stable for equal keys.
    pub fn sort(&mut self, order: &OrderTable, ranks_first: bool) {
        self.cards.sort_by(|a, b| order.cmp(a, b, ranks_first));
    }

    pub fn is_sorted(&self, order: &OrderTable, ranks_first: bool) -> bool {
        self.cards
            .windows(2)
            .all(|pair| order.cmp(&pair[0], &pair[1], ranks_first) != Ordering::Greater)
    }

    /// Order-independent equality: sorts copies of both stacks before
    /// comparing.
    pub fn compare_stacks(&self, other: &Stack, order: &OrderTable) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.sort(order, true);
        b.sort(order, true);
        a == b
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.codes().join(" "))
    }
}

impl IntoIterator for Stack {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl FromIterator<Card> for Stack {
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        Self::from_cards(iter.into_iter().collect())
    }
}

/// Builds a fresh deck: one card per (rank, suit) pair plus `jokers`
/// wildcard cards, optionally shuffled.
///
/// The unshuffled order is deterministic: jokers first, then
/// rank-major, suit-minor in the order the alphabets are given.
pub fn new_deck(ranks: &[char], suits: &[char], jokers: usize, shuffle: bool) -> Stack {
    let mut deck = Stack::new();
    for _ in 0..jokers {
        deck.add(Card::joker(), End::Bottom);
    }
    for &rank in ranks {
        for &suit in suits {
            deck.add(Card::new(rank, suit), End::Bottom);
        }
    }
    if shuffle {
        deck.shuffle();
    }
    deck
}

/// What one player slot looks like from the outside: hand size and
/// collected tricks, but never the hand itself.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub hand_size: usize,
    /// Ranks for which this player collected all suits.
    pub tricks: Vec<char>,
    /// Whether the owning connection is still attached.
    pub live: bool,
}

impl fmt::Display for PlayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tricks: String = self.tricks.iter().collect();
        let liveness = if self.live { "" } else { ", gone" };
        write!(
            f,
            "{} card(s), tricks [{tricks}]{liveness}",
            self.hand_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(code: &str) -> Card {
        Card::parse(code).unwrap()
    }

    fn stack(codes: &[&str]) -> Stack {
        codes.iter().map(|code| card(code)).collect()
    }

    #[test]
    fn card_code_round_trip() {
        let ah = card("Ah");
        assert_eq!(ah.rank, 'A');
        assert_eq!(ah.suit, 'h');
        assert_eq!(ah.code(), "Ah");
        assert_eq!(ah.to_string(), "Ah");
    }

    #[test]
    fn card_parse_rejects_wrong_length() {
        assert!(Card::parse("A").is_err());
        assert!(Card::parse("Ahh").is_err());
        assert!(Card::parse("").is_err());
    }

    #[test]
    fn card_serializes_as_code() {
        let serialized = bincode::serialize(&card("Ts")).unwrap();
        let deserialized: Card = bincode::deserialize(&serialized).unwrap();
        assert_eq!(deserialized, card("Ts"));
        // The wire form is the two-character code, not a struct.
        let as_string: String = bincode::deserialize(&serialized).unwrap();
        assert_eq!(as_string, "Ts");
    }

    #[test]
    fn order_table_ace_low_vs_high() {
        let low = OrderTable::ace_low();
        let high = OrderTable::ace_high();
        let ace = card("Ac");
        let king = card("Kc");
        assert_eq!(low.cmp(&ace, &king, true), Ordering::Less);
        assert_eq!(high.cmp(&ace, &king, true), Ordering::Greater);
    }

    #[test]
    fn order_table_suits_break_rank_ties() {
        let order = OrderTable::ace_low();
        assert_eq!(order.cmp(&card("Ac"), &card("Ad"), true), Ordering::Less);
        assert_eq!(order.cmp(&card("Ad"), &card("Ad"), true), Ordering::Equal);
        // Suits-first compares suit before rank.
        assert_eq!(order.cmp(&card("Kc"), &card("2d"), false), Ordering::Less);
    }

    #[test]
    fn order_table_equality() {
        let order = OrderTable::ace_low();
        assert!(order.cards_eq(&card("Ah"), &card("Ah")));
        assert!(!order.cards_eq(&card("Ah"), &card("As")));
        assert!(!order.cards_eq(&card("Ah"), &card("2h")));
    }

    #[test]
    fn jokers_sort_below_everything() {
        let order = OrderTable::ace_low();
        assert_eq!(
            order.cmp(&Card::joker(), &card("Ac"), true),
            Ordering::Less
        );
    }

    #[test]
    fn new_deck_unshuffled_is_rank_major() {
        let deck = new_deck(&FRENCH_RANKS, &FRENCH_SUITS, 0, false);
        assert_eq!(deck.len(), 52);
        assert_eq!(deck.cards()[0], card("Ac"));
        assert_eq!(deck.cards()[1], card("Ad"));
        assert_eq!(deck.cards()[4], card("2c"));
        assert_eq!(deck.cards()[51], card("Ks"));
    }

    #[test]
    fn new_deck_with_jokers() {
        let deck = new_deck(&FRENCH_RANKS, &FRENCH_SUITS, 2, false);
        assert_eq!(deck.len(), 54);
        assert_eq!(deck.cards()[0], Card::joker());
        assert_eq!(deck.cards()[1], Card::joker());
        assert_eq!(deck.cards()[2], card("Ac"));
    }

    #[test]
    fn shuffled_deck_keeps_the_same_cards() {
        let reference = new_deck(&FRENCH_RANKS, &FRENCH_SUITS, 0, false);
        let shuffled = new_deck(&FRENCH_RANKS, &FRENCH_SUITS, 0, true);
        assert!(shuffled.compare_stacks(&reference, &OrderTable::ace_low()));
    }

    #[test]
    fn deal_from_top_preserves_order() {
        let mut deck = stack(&["Ac", "2c", "3c", "4c"]);
        let dealt = deck.deal(2, End::Top);
        assert_eq!(dealt, stack(&["Ac", "2c"]));
        assert_eq!(deck, stack(&["3c", "4c"]));
    }

    #[test]
    fn deal_from_bottom_reverses_tail() {
        let mut deck = stack(&["Ac", "2c", "3c", "4c"]);
        let dealt = deck.deal(2, End::Bottom);
        assert_eq!(dealt, stack(&["4c", "3c"]));
        assert_eq!(deck, stack(&["Ac", "2c"]));
    }

    #[test]
    fn deal_truncates_instead_of_failing() {
        let mut deck = stack(&["Ac", "2c"]);
        let dealt = deck.deal(5, End::Top);
        assert_eq!(dealt.len(), 2);
        assert!(deck.is_empty());
        // Dealing from an already-empty stack yields an empty result.
        assert!(deck.deal(1, End::Top).is_empty());
    }

    #[test]
    fn find_by_rank_is_a_wildcard() {
        let hand = stack(&["Ah", "2c", "As", "Tc"]);
        assert_eq!(hand.find(SearchTerm::Rank('A')), vec![0, 2]);
        assert_eq!(hand.get(SearchTerm::Rank('A')), vec![card("Ah"), card("As")]);
        assert_eq!(hand.find(SearchTerm::Exact(card("Tc"))), vec![3]);
        assert!(hand.find(SearchTerm::Rank('Q')).is_empty());
    }

    #[test]
    fn search_term_parse() {
        assert_eq!(SearchTerm::parse("A"), Some(SearchTerm::Rank('A')));
        assert_eq!(
            SearchTerm::parse("Ah"),
            Some(SearchTerm::Exact(card("Ah")))
        );
        assert_eq!(SearchTerm::parse("Ahh"), None);
        assert_eq!(SearchTerm::parse(""), None);
    }

    #[test]
    fn remove_is_a_no_op_without_matches() {
        let mut hand = stack(&["Ah", "2c"]);
        let removed = hand.remove(SearchTerm::Rank('K'));
        assert!(removed.is_empty());
        assert_eq!(hand.len(), 2);
    }

    #[test]
    fn remove_takes_every_match() {
        let mut hand = stack(&["Ah", "2c", "As", "2d"]);
        let removed = hand.remove(SearchTerm::Rank('2'));
        assert_eq!(removed, stack(&["2c", "2d"]));
        assert_eq!(hand, stack(&["Ah", "As"]));
    }

    #[test]
    fn remove_list_takes_all_terms() {
        let mut hand = stack(&["Ah", "2c", "As", "Td"]);
        let removed = hand.remove_list(&[SearchTerm::Rank('A'), card("Td").into()]);
        assert_eq!(removed.len(), 3);
        assert_eq!(hand, stack(&["2c"]));
    }

    #[test]
    fn add_list_to_top_preserves_incoming_order() {
        let mut hand = stack(&["Tc"]);
        hand.add_list(stack(&["Ah", "As"]), End::Top);
        assert_eq!(hand, stack(&["Ah", "As", "Tc"]));
    }

    #[test]
    fn sort_groups_by_rank_then_suit() {
        let order = OrderTable::ace_low();
        let mut hand = stack(&["Ks", "Ah", "Kc", "Ac", "2d"]);
        hand.sort(&order, true);
        assert_eq!(hand, stack(&["Ac", "Ah", "2d", "Kc", "Ks"]));
        assert!(hand.is_sorted(&order, true));
    }

    #[test]
    fn sort_suits_first_groups_by_suit() {
        let order = OrderTable::ace_low();
        let mut hand = stack(&["Ks", "Ah", "Kc", "Ac"]);
        hand.sort(&order, false);
        assert_eq!(hand, stack(&["Ac", "Kc", "Ah", "Ks"]));
    }

    #[test]
    fn stack_equality_is_order_dependent() {
        let a = stack(&["Ah", "2c"]);
        let b = stack(&["2c", "Ah"]);
        assert_ne!(a, b);
        assert!(a.compare_stacks(&b, &OrderTable::ace_low()));
    }

    #[test]
    fn deal_then_add_back_round_trips() {
        let order = OrderTable::ace_low();
        let original = new_deck(&FRENCH_RANKS, &FRENCH_SUITS, 0, false);
        let mut deck = original.clone();
        let dealt = deck.deal(10, End::Top);
        deck.add_list(dealt, End::Bottom);
        assert!(deck.compare_stacks(&original, &order));
    }

    #[test]
    fn split_halves_by_default() {
        let deck = stack(&["Ac", "2c", "3c", "4c"]);
        let (top, bottom) = deck.split(None);
        assert_eq!(top, stack(&["Ac", "2c"]));
        assert_eq!(bottom, stack(&["3c", "4c"]));
        let (top, bottom) = deck.split(Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(bottom.len(), 3);
    }

    #[test]
    fn stack_serialization_round_trip() {
        let hand = stack(&["Ah", "Ts", "2c"]);
        let serialized = bincode::serialize(&hand).unwrap();
        let deserialized: Stack = bincode::deserialize(&serialized).unwrap();
        assert_eq!(deserialized, hand);
    }

    #[test]
    fn player_summary_display() {
        let summary = PlayerSummary {
            hand_size: 3,
            tricks: vec!['A', 'K'],
            live: false,
        };
        assert_eq!(summary.to_string(), "3 card(s), tricks [AK], gone");
    }
}
