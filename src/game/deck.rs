use rand::seq::SliceRandom;

use crate::types::DevelopmentCard;

pub const DECK_DISTRIBUTION: [(DevelopmentCard, usize); 5] = [
    (DevelopmentCard::Knight, 14),
    (DevelopmentCard::VictoryPoint, 5),
    (DevelopmentCard::RoadBuilding, 2),
    (DevelopmentCard::Monopoly, 2),
    (DevelopmentCard::YearOfPlenty, 2),
];

pub const DECK_SIZE: usize = 25;

/// The full catalog in a fixed order. Cards are drawn from the end.
pub fn build_development_deck() -> Vec<DevelopmentCard> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for (card, count) in DECK_DISTRIBUTION {
        deck.extend(std::iter::repeat(card).take(count));
    }
    deck
}

pub fn shuffled_development_deck(rng: &mut impl rand::Rng) -> Vec<DevelopmentCard> {
    let mut deck = build_development_deck();
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn deck_matches_catalog() {
        let deck = build_development_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let count = |card| deck.iter().filter(|c| **c == card).count();
        assert_eq!(count(DevelopmentCard::Knight), 14);
        assert_eq!(count(DevelopmentCard::VictoryPoint), 5);
        assert_eq!(count(DevelopmentCard::RoadBuilding), 2);
        assert_eq!(count(DevelopmentCard::Monopoly), 2);
        assert_eq!(count(DevelopmentCard::YearOfPlenty), 2);
    }

    #[test]
    fn shuffle_keeps_the_multiset() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut shuffled = shuffled_development_deck(&mut rng);
        let mut reference = build_development_deck();
        let key = |card: &DevelopmentCard| card.to_string();
        shuffled.sort_by_key(key);
        reference.sort_by_key(key);
        assert_eq!(shuffled, reference);
    }
}
