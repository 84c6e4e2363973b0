//! Enumerates the actions a seat may take against a snapshot.
//!
//! Every listed action passes [`Session::apply`] validation. Discards are
//! the exception to completeness: one representative selection is offered.

use itertools::Itertools;

use crate::board::TOPOLOGY;
use crate::game::action::{ActionPayload, GameAction};
use crate::game::placement::{can_build_city, can_build_road, can_build_settlement};
use crate::game::resources::{COST_DEVELOPMENT, ResourceBundle};
use crate::game::session::Session;
use crate::types::{ActionPrompt, ActionType, DevelopmentCard, Resource};

pub fn legal_actions(session: &Session, seat: usize) -> Vec<GameAction> {
    if !session.actors().contains(&seat) {
        return Vec::new();
    }
    let Some(player) = session.player(seat) else {
        return Vec::new();
    };

    match session.prompt() {
        ActionPrompt::WaitForPlayers | ActionPrompt::GameOver => Vec::new(),
        ActionPrompt::RollForOrder => vec![GameAction::new(seat, ActionType::RollForOrder)],
        ActionPrompt::BuildInitialSettlement => TOPOLOGY
            .vertices
            .iter()
            .filter(|vertex| {
                can_build_settlement(&session.buildings, &session.roads, player, **vertex, true)
                    .is_ok()
            })
            .map(|vertex| {
                GameAction::new(seat, ActionType::BuildSettlement)
                    .with_payload(ActionPayload::Vertex(*vertex))
            })
            .collect(),
        ActionPrompt::BuildInitialRoad => road_actions(session, seat, true),
        ActionPrompt::Discard => {
            let owed = session.pending_discards.get(&seat).copied().unwrap_or(0);
            let mut bundle = ResourceBundle::zero();
            for resource in player.resources.cards().into_iter().take(owed as usize) {
                bundle.add(resource, 1);
            }
            vec![GameAction::new(seat, ActionType::Discard).with_payload(ActionPayload::Resources(bundle))]
        }
        ActionPrompt::MoveRobber => session
            .board
            .hexes
            .iter()
            .filter(|hex| hex.id != session.robber_hex)
            .map(|hex| {
                GameAction::new(seat, ActionType::MoveRobber).with_payload(ActionPayload::Hex(hex.id))
            })
            .collect(),
        ActionPrompt::ChooseVictim => session
            .steal_candidates
            .iter()
            .map(|victim| {
                GameAction::new(seat, ActionType::StealFrom).with_payload(ActionPayload::Seat(*victim))
            })
            .collect(),
        ActionPrompt::Roll => {
            let mut actions = vec![GameAction::new(seat, ActionType::Roll)];
            actions.extend(dev_card_actions(session, seat));
            actions
        }
        ActionPrompt::PlayTurn => play_turn_actions(session, seat),
    }
}

fn play_turn_actions(session: &Session, seat: usize) -> Vec<GameAction> {
    let Some(player) = session.player(seat) else {
        return Vec::new();
    };
    let mut actions = vec![GameAction::new(seat, ActionType::EndTurn)];
    actions.extend(road_actions(session, seat, false));

    actions.extend(
        TOPOLOGY
            .vertices
            .iter()
            .filter(|vertex| {
                can_build_settlement(&session.buildings, &session.roads, player, **vertex, false)
                    .is_ok()
            })
            .map(|vertex| {
                GameAction::new(seat, ActionType::BuildSettlement)
                    .with_payload(ActionPayload::Vertex(*vertex))
            }),
    );
    actions.extend(
        session
            .buildings
            .keys()
            .filter(|vertex| can_build_city(&session.buildings, player, **vertex).is_ok())
            .map(|vertex| {
                GameAction::new(seat, ActionType::BuildCity).with_payload(ActionPayload::Vertex(*vertex))
            }),
    );
    if !session.dev_deck.is_empty() && player.resources.can_afford(&COST_DEVELOPMENT) {
        actions.push(GameAction::new(seat, ActionType::BuyDevelopmentCard));
    }
    actions.extend(maritime_trades(session, seat));
    actions.extend(dev_card_actions(session, seat));
    actions
}

fn road_actions(session: &Session, seat: usize, setup: bool) -> Vec<GameAction> {
    let Some(player) = session.player(seat) else {
        return Vec::new();
    };
    let free = session.free_roads > 0;
    TOPOLOGY
        .edges
        .iter()
        .filter(|edge| {
            can_build_road(&session.buildings, &session.roads, player, **edge, setup, free).is_ok()
        })
        .map(|edge| GameAction::new(seat, ActionType::BuildRoad).with_payload(ActionPayload::Edge(*edge)))
        .collect()
}

fn maritime_trades(session: &Session, seat: usize) -> Vec<GameAction> {
    let Some(player) = session.player(seat) else {
        return Vec::new();
    };
    Resource::ALL
        .into_iter()
        .filter(|give| player.resources.get(*give) >= session.trade_rate(seat, *give))
        .cartesian_product(Resource::ALL)
        .filter(|(give, receive)| give != receive)
        .map(|(give, receive)| {
            GameAction::new(seat, ActionType::MaritimeTrade)
                .with_payload(ActionPayload::MaritimeTrade { give, receive })
        })
        .collect()
}

fn dev_card_actions(session: &Session, seat: usize) -> Vec<GameAction> {
    let Some(player) = session.player(seat) else {
        return Vec::new();
    };
    if session.has_played_dev_card {
        return Vec::new();
    }
    let mut actions = Vec::new();
    if player.holds_playable(DevelopmentCard::Knight) {
        actions.push(GameAction::new(seat, ActionType::PlayKnightCard));
    }
    if player.holds_playable(DevelopmentCard::RoadBuilding) {
        actions.push(GameAction::new(seat, ActionType::PlayRoadBuilding));
    }
    if player.holds_playable(DevelopmentCard::Monopoly) {
        actions.extend(Resource::ALL.into_iter().map(|resource| {
            GameAction::new(seat, ActionType::PlayMonopoly).with_payload(ActionPayload::Resource(resource))
        }));
    }
    if player.holds_playable(DevelopmentCard::YearOfPlenty) {
        actions.extend(
            Resource::ALL
                .into_iter()
                .combinations_with_replacement(2)
                .map(|pair| {
                    GameAction::new(seat, ActionType::PlayYearOfPlenty)
                        .with_payload(ActionPayload::ResourcePair(pair[0], pair[1]))
                }),
        );
    }
    actions
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::game::config::GameConfig;
    use crate::types::GameStatus;

    fn started() -> Session {
        let mut rng = StdRng::seed_from_u64(21);
        let mut session = Session::create(
            "LGAL".parse().unwrap(),
            "a",
            "Ana",
            GameConfig::default(),
            &mut rng,
        );
        session.join("b", "Bo").unwrap();
        session.start("a").unwrap();
        session
    }

    #[test]
    fn only_actors_get_actions() {
        let mut session = started();
        assert_eq!(legal_actions(&session, 0).len(), 1);
        session.status = GameStatus::Playing;
        session.setup_phase = true;
        assert_eq!(legal_actions(&session, 1), Vec::new());
        assert_eq!(legal_actions(&session, 0).len(), TOPOLOGY.vertices.len());
    }

    #[test]
    fn discard_offers_an_exact_selection() {
        let mut session = started();
        session.status = GameStatus::Playing;
        session.has_rolled = true;
        session.players[1].resources = ResourceBundle::from_counts([3, 3, 2, 0, 0]);
        session.pending_discards.insert(1, 4);
        let actions = legal_actions(&session, 1);
        assert_eq!(actions.len(), 1);
        match &actions[0].payload {
            ActionPayload::Resources(bundle) => {
                assert_eq!(bundle.total(), 4);
                assert!(session.players[1].resources.can_afford(bundle));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn every_listed_action_applies_during_a_random_game() {
        use rand::seq::SliceRandom;

        let mut rng = StdRng::seed_from_u64(8);
        let mut session = started();
        for _ in 0..400 {
            if session.is_over() {
                break;
            }
            let seat = session.actors()[0];
            let actions = legal_actions(&session, seat);
            assert!(!actions.is_empty(), "seat {seat} stuck at {}", session.prompt());
            for action in &actions {
                assert!(
                    session.apply(action, &mut rng).is_ok(),
                    "{action:?} rejected at {}",
                    session.prompt()
                );
            }
            let choice = actions.choose(&mut rng).unwrap().clone();
            session = session.apply(&choice, &mut rng).unwrap().session;
        }
    }
}
