use serde::{Deserialize, Serialize};

use super::Card;
use crate::mechanics::Priority;

/// Default deck size: one card per day of the week.
pub const DEFAULT_DECK_CAPACITY: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DeckEntry {
    card: Card,
    seq: u64,
}

/// Bounded card deck that always draws the highest tier first.
///
/// Within a tier cards come out in insertion order. When the deck grows
/// past capacity the oldest `Common` card is dropped; cards above common
/// are never dropped, so the deck only exceeds its capacity when it holds
/// more structural cards than fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedDeque {
    capacity: usize,
    entries: Vec<DeckEntry>,
    next_seq: u64,
    consumed: usize,
}

impl WeightedDeque {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
            next_seq: 0,
            consumed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a card and returns whatever was evicted to make room.
    pub fn insert(&mut self, card: Card) -> Vec<Card> {
        self.push(card);
        self.evict_overflow()
    }

    /// Inserts every card before evicting, so a batch competes as a whole.
    pub fn bulk_insert(&mut self, cards: impl IntoIterator<Item = Card>) -> Vec<Card> {
        for card in cards {
            self.push(card);
        }
        self.evict_overflow()
    }

    fn push(&mut self, card: Card) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(DeckEntry { card, seq });
    }

    fn evict_overflow(&mut self) -> Vec<Card> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let victim = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.card.priority().is_evictable())
                .min_by_key(|(_, e)| (e.card.priority(), e.seq))
                .map(|(i, _)| i);

            let Some(index) = victim else {
                break;
            };
            let entry = self.entries.remove(index);
            tracing::debug!(card_id = entry.card.id(), "evicted card from full deck");
            evicted.push(entry.card);
        }
        evicted
    }

    fn top_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| (e.card.priority(), std::cmp::Reverse(e.seq)))
            .map(|(i, _)| i)
    }

    pub fn draw(&mut self) -> Option<Card> {
        let index = self.top_index()?;
        self.consumed += 1;
        Some(self.entries.remove(index).card)
    }

    pub fn draw_n(&mut self, n: usize) -> Vec<Card> {
        std::iter::from_fn(|| self.draw()).take(n).collect()
    }

    pub fn peek(&self) -> Option<&Card> {
        self.top_index().map(|i| &self.entries[i].card)
    }

    /// Cards in draw order, without removing them.
    pub fn cards(&self) -> Vec<Card> {
        let mut sorted: Vec<&DeckEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| (std::cmp::Reverse(e.card.priority()), e.seq));
        sorted.into_iter().map(|e| e.card.clone()).collect()
    }

    pub fn count_at(&self, priority: Priority) -> usize {
        self.entries
            .iter()
            .filter(|e| e.card.priority() == priority)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.consumed = 0;
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// True once half the deck (at least one card) has been drawn since
    /// the last reset.
    pub fn needs_generation(&self) -> bool {
        self.consumed >= (self.capacity / 2).max(1)
    }

    pub fn reset_consumption(&mut self) {
        self.consumed = 0;
    }

    pub fn status(&self) -> String {
        format!("{}/{}", self.entries.len(), self.capacity)
    }
}

impl Default for WeightedDeque {
    fn default() -> Self {
        Self::new(DEFAULT_DECK_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardInfo, InfoCard};

    fn card(id: &str, priority: Priority) -> Card {
        let mut card = Card::Info(InfoCard {
            info: CardInfo::new(id, id),
            next_cards: Vec::new(),
        });
        card.set_priority(priority);
        card
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_draws_highest_tier_first_then_oldest() {
        let mut deck = WeightedDeque::new(10);
        deck.insert(card("c1", Priority::Common));
        deck.insert(card("p1", Priority::Plot));
        deck.insert(card("c2", Priority::Common));
        deck.insert(card("s1", Priority::Story));
        deck.insert(card("p2", Priority::Plot));

        assert_eq!(deck.peek().map(|c| c.id()), Some("s1"));
        let drawn = deck.draw_n(5);
        assert_eq!(ids(&drawn), vec!["s1", "p1", "p2", "c1", "c2"]);
        assert!(deck.draw().is_none());
        assert_eq!(deck.consumed(), 5);
    }

    #[test]
    fn test_capacity_plus_one_commons_keeps_capacity() {
        let mut deck = WeightedDeque::new(7);
        let evicted = deck.bulk_insert((0..8).map(|i| card(&format!("c{}", i), Priority::Common)));

        assert_eq!(deck.len(), 7);
        assert_eq!(ids(&evicted), vec!["c0"]);
    }

    #[test]
    fn test_structural_cards_are_never_evicted() {
        let mut deck = WeightedDeque::new(2);
        deck.insert(card("c1", Priority::Common));
        deck.insert(card("e1", Priority::Event));
        let evicted = deck.insert(card("t1", Priority::Tree));
        assert_eq!(ids(&evicted), vec!["c1"]);

        let evicted = deck.insert(card("s1", Priority::Story));
        assert!(evicted.is_empty());
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.count_at(Priority::Common), 0);
    }

    #[test]
    fn test_cards_lists_in_draw_order() {
        let mut deck = WeightedDeque::new(5);
        deck.insert(card("c1", Priority::Common));
        deck.insert(card("e1", Priority::Event));
        deck.insert(card("c2", Priority::Common));
        assert_eq!(ids(&deck.cards()), vec!["e1", "c1", "c2"]);
        assert_eq!(deck.len(), 3);
    }

    #[test]
    fn test_needs_generation() {
        let mut deck = WeightedDeque::new(7);
        deck.bulk_insert((0..7).map(|i| card(&format!("c{}", i), Priority::Common)));
        deck.draw_n(2);
        assert!(!deck.needs_generation());
        deck.draw();
        assert!(deck.needs_generation());
        deck.reset_consumption();
        assert!(!deck.needs_generation());

        deck.clear();
        assert!(deck.is_empty());
        assert_eq!(deck.status(), "0/7");
    }
}
