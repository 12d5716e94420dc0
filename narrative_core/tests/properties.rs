//! Property tests for the death loop, the plot graph and the deck.
//!
//! These use `proptest` to generate random game states and check that
//! the rules' invariants hold for every one of them.

use std::collections::{BTreeMap, BTreeSet};

use game_rules::{
    Card, CardInfo, DeathBoundary, DeathLoop, Event, EventInfo, GlobalBlackboard, InfoCard, Npc,
    Priority, ProgressEvent, WeightedDeque, STAT_MAX, STAT_MIN,
};
use narrative_core::{MacroDAG, PlotNode};
use proptest::prelude::*;

const TAG_POOL: [&str; 14] = [
    "brave", "cruel", "drunk", "exiled", "famous", "greedy", "hunted", "kind", "lame", "lucky",
    "noble", "pious", "scarred", "wise",
];

fn stats_strategy() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map("[a-z]{1,4}", -30i64..130, 1..6)
}

fn tag_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(TAG_POOL.to_vec(), 0..=TAG_POOL.len())
        .prop_map(|tags| tags.into_iter().map(str::to_string).collect())
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        4 => Just(Priority::Common),
        1 => Just(Priority::Event),
        1 => Just(Priority::Plot),
        1 => Just(Priority::Tree),
        1 => Just(Priority::Story),
    ]
}

fn card(id: usize, priority: Priority) -> Card {
    let mut card = Card::Info(InfoCard {
        info: CardInfo::new(format!("card_{}", id), "Card"),
        next_cards: Vec::new(),
    });
    card.set_priority(priority);
    card
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn death_iff_a_stat_is_on_a_bound(stats in stats_strategy()) {
        let mut board = GlobalBlackboard::default();
        for (id, value) in &stats {
            board.set_stat(id, *value);
        }
        let violators: BTreeSet<String> = board
            .stats()
            .iter()
            .filter(|(_, v)| **v <= STAT_MIN || **v >= STAT_MAX)
            .map(|(id, _)| id.clone())
            .collect();

        let death = DeathLoop::default().check_death(&mut board);

        prop_assert_eq!(death.is_some(), !violators.is_empty());
        prop_assert_eq!(board.is_alive(), violators.is_empty());
        if let Some(death) = death {
            prop_assert!(violators.contains(&death.cause_stat));
            prop_assert_eq!(Some(&death.cause_stat), violators.iter().next());
            let expected = if death.cause_value <= STAT_MIN {
                DeathBoundary::Min
            } else {
                DeathBoundary::Max
            };
            prop_assert_eq!(death.boundary, expected);
            prop_assert!(DeathLoop::default().check_death(&mut board).is_none());
        }
    }

    #[test]
    fn resurrect_keeps_capped_karma_and_resets_life(
        stats in stats_strategy(),
        tags in tag_set(),
        temp in tag_set(),
        cap in 0usize..12,
    ) {
        let mut board = GlobalBlackboard::default();
        for (id, value) in &stats {
            board.set_stat(id, *value);
        }
        for tag in &tags {
            board.add_tag(tag.clone());
        }
        board.insert_npc(Npc::new("mira", "Mira"));
        board.insert_event(Event::Progress(ProgressEvent {
            info: EventInfo::new("harvest", "Harvest"),
            target: 3,
            current: 0,
            progress_label: String::new(),
        }));
        let life = board.life();
        let season = board.calendar().season;

        let karma = DeathLoop::new(cap, 50).resurrect(&mut board, &temp);

        let eligible: BTreeSet<String> = tags.difference(&temp).cloned().collect();
        prop_assert_eq!(karma.len(), eligible.len().min(cap));
        prop_assert!(karma.is_subset(&eligible));
        prop_assert_eq!(board.tags(), &karma);
        prop_assert_eq!(board.karma(), &karma);
        prop_assert_eq!(board.previous_life_tags(), &tags);
        prop_assert!(board.stats().values().all(|v| *v == 50));
        prop_assert!(board.npcs().values().all(|n| !n.enabled));
        prop_assert!(board.events().is_empty());
        prop_assert_eq!(board.life(), life + 1);
        prop_assert_eq!(board.calendar().day, 1);
        prop_assert_eq!(board.calendar().season, (season + 1) % 4);
        prop_assert!(board.is_alive());
        prop_assert!(board.death().is_none());
    }

    #[test]
    fn partial_reset_never_unfires_endings(
        endings in prop::collection::vec(any::<bool>(), 1..12),
        fired in prop::collection::vec(any::<bool>(), 12),
    ) {
        let mut dag = MacroDAG::new();
        for (i, is_ending) in endings.iter().enumerate() {
            let node = PlotNode::new(format!("n{:02}", i), "", "").unwrap();
            let node = if *is_ending { node.ending("The end.") } else { node };
            dag.add_node(node).unwrap();
        }
        let mut fired_endings = BTreeSet::new();
        for (i, is_ending) in endings.iter().enumerate() {
            if fired[i] {
                let id = format!("n{:02}", i);
                dag.fire_node(&id).unwrap();
                if *is_ending {
                    fired_endings.insert(id);
                }
            }
        }

        dag.partial_reset();

        prop_assert_eq!(dag.fired_ids(), fired_endings.clone());
        prop_assert_eq!(dag.check_ending().is_some(), !fired_endings.is_empty());
    }

    #[test]
    fn eviction_only_drops_oldest_commons(
        priorities in prop::collection::vec(priority_strategy(), 0..30),
        capacity in 1usize..10,
    ) {
        let mut deck = WeightedDeque::new(capacity);
        let mut evicted = Vec::new();
        for (i, priority) in priorities.iter().enumerate() {
            evicted.extend(deck.insert(card(i, *priority)));
        }

        prop_assert!(evicted.iter().all(|c| c.priority() == Priority::Common));
        for tier in [Priority::Event, Priority::Plot, Priority::Tree, Priority::Story] {
            let inserted = priorities.iter().filter(|p| **p == tier).count();
            prop_assert_eq!(deck.count_at(tier), inserted);
        }
        prop_assert_eq!(deck.len() + evicted.len(), priorities.len());

        let structural = priorities.iter().filter(|p| !p.is_evictable()).count();
        prop_assert_eq!(deck.len(), capacity.max(structural).min(priorities.len()));

        // Commons leave in insertion order.
        let ids: Vec<usize> = evicted
            .iter()
            .filter_map(|c| c.id().strip_prefix("card_")?.parse().ok())
            .collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn draw_order_is_priority_then_age(
        priorities in prop::collection::vec(priority_strategy(), 1..20),
    ) {
        let mut deck = WeightedDeque::new(64);
        for (i, priority) in priorities.iter().enumerate() {
            deck.insert(card(i, *priority));
        }

        let drawn = deck.draw_n(priorities.len());
        prop_assert_eq!(drawn.len(), priorities.len());
        for pair in drawn.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.priority() >= b.priority());
            if a.priority() == b.priority() {
                let age = |c: &Card| c.id()["card_".len()..].parse::<usize>().unwrap_or(0);
                prop_assert!(age(a) < age(b));
            }
        }
        prop_assert_eq!(deck.consumed(), priorities.len());
    }
}
