//! Turn and phase state machine.
//!
//! [`Session::apply`] is a pure transition: it validates one action against a
//! snapshot and returns the next snapshot plus the events it produced. The
//! input is never touched, so a rejected action needs no write.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::HexId;
use crate::coords::{EdgeId, VertexId};
use crate::game::action::{ActionPayload, GameAction};
use crate::game::awards::{AWARD_POINTS, Award};
use crate::game::longest_path::longest_path;
use crate::game::placement::{
    Building, PlacementError, can_build_city, can_build_road, can_build_settlement,
};
use crate::game::resources::{
    COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, ResourceBundle, ResourceError,
};
use crate::game::session::Session;
use crate::game::setup::SetupPlacement;
use crate::types::{ActionPrompt, ActionType, BuildingKind, DevelopmentCard, GameStatus, Resource};

/// Cards above this count owe a discard on a 7.
const DISCARD_LIMIT: u32 = 7;
const ROBBER_ROLL: u8 = 7;
const ROAD_BUILDING_CREDITS: u8 = 2;

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub session: Session,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    OrderRolled {
        seat: usize,
        value: u8,
    },
    RollOff {
        seats: Vec<usize>,
    },
    OrderDecided {
        first_seat: usize,
    },
    BuiltSettlement {
        seat: usize,
        vertex: VertexId,
    },
    BuiltRoad {
        seat: usize,
        edge: EdgeId,
    },
    BuiltCity {
        seat: usize,
        vertex: VertexId,
    },
    SetupComplete {
        first_player: usize,
    },
    DiceRolled {
        seat: usize,
        dice: (u8, u8),
        sum: u8,
    },
    ResourcesGained {
        seat: usize,
        bundle: ResourceBundle,
    },
    DiscardRequired {
        seat: usize,
        count: u32,
    },
    Discarded {
        seat: usize,
        bundle: ResourceBundle,
    },
    RobberMoved {
        seat: usize,
        hex: HexId,
    },
    ResourceStolen {
        thief: usize,
        victim: usize,
        resource: Resource,
    },
    DevelopmentCardBought {
        seat: usize,
    },
    DevelopmentCardPlayed {
        seat: usize,
        card: DevelopmentCard,
    },
    MonopolyCollected {
        seat: usize,
        resource: Resource,
        amount: u8,
    },
    MaritimeTrade {
        seat: usize,
        give: Resource,
        rate: u8,
        receive: Resource,
    },
    AwardChanged {
        award: Award,
        from: Option<usize>,
        to: Option<usize>,
    },
    TurnAdvanced {
        next_player: usize,
    },
    GameWon {
        winner: usize,
    },
}

impl GameEvent {
    /// Line for the shared event log.
    pub fn describe(&self, session: &Session) -> String {
        let name = |seat: usize| session.display_name(seat);
        match self {
            GameEvent::OrderRolled { seat, value } => {
                format!("{} rolled {value} for turn order", name(*seat))
            }
            GameEvent::RollOff { seats } => {
                let names: Vec<String> = seats.iter().map(|seat| name(*seat)).collect();
                format!("Tie! {} roll again", names.join(" and "))
            }
            GameEvent::OrderDecided { first_seat } => format!("{} goes first", name(*first_seat)),
            GameEvent::BuiltSettlement { seat, .. } => format!("{} built a settlement", name(*seat)),
            GameEvent::BuiltRoad { seat, .. } => format!("{} built a road", name(*seat)),
            GameEvent::BuiltCity { seat, .. } => format!("{} built a city", name(*seat)),
            GameEvent::SetupComplete { first_player } => {
                format!("Setup complete. {} rolls first", name(*first_player))
            }
            GameEvent::DiceRolled { seat, sum, .. } => format!("{} rolled {sum}", name(*seat)),
            GameEvent::ResourcesGained { seat, bundle } => {
                format!("{} received {bundle}", name(*seat))
            }
            GameEvent::DiscardRequired { seat, count } => {
                format!("{} must discard {count} cards", name(*seat))
            }
            GameEvent::Discarded { seat, bundle } => {
                format!("{} discarded {} cards", name(*seat), bundle.total())
            }
            GameEvent::RobberMoved { seat, .. } => format!("{} moved the robber", name(*seat)),
            GameEvent::ResourceStolen { thief, victim, .. } => {
                format!("{} stole a card from {}", name(*thief), name(*victim))
            }
            GameEvent::DevelopmentCardBought { seat } => {
                format!("{} bought a development card", name(*seat))
            }
            GameEvent::DevelopmentCardPlayed { seat, card } => {
                format!("{} played {}", name(*seat), card.to_string().replace('_', " "))
            }
            GameEvent::MonopolyCollected {
                seat,
                resource,
                amount,
            } => format!(
                "{} collected {amount} {}",
                name(*seat),
                resource.to_string().to_lowercase()
            ),
            GameEvent::MaritimeTrade {
                seat,
                give,
                rate,
                receive,
            } => format!(
                "{} traded {rate} {} for 1 {}",
                name(*seat),
                give.to_string().to_lowercase(),
                receive.to_string().to_lowercase()
            ),
            GameEvent::AwardChanged { award, to, .. } => match to {
                Some(seat) => format!("{} took {award}", name(*seat)),
                None => format!("{award} is no longer held"),
            },
            GameEvent::TurnAdvanced { next_player } => format!("{}'s turn", name(*next_player)),
            GameEvent::GameWon { winner } => format!("{} wins!", name(*winner)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("the game is over")]
    GameFinished,
    #[error("no player in seat {0}")]
    InvalidPlayer(usize),
    #[error("it is {expected}'s turn, not {actual}'s")]
    ActionOutOfTurn { expected: usize, actual: usize },
    #[error("{action} is not allowed now (waiting for {prompt})")]
    InvalidPrompt {
        prompt: ActionPrompt,
        action: ActionType,
    },
    #[error("missing or invalid payload: {0}")]
    InvalidPayload(&'static str),
    #[error("seat {0} has no roll for turn order pending")]
    NoOrderRollPending(usize),
    #[error("roll the dice first")]
    MustRollFirst,
    #[error("the dice were already rolled this turn")]
    AlreadyRolled,
    #[error("seat {0} does not owe a discard")]
    NoDiscardOwed(usize),
    #[error("must discard exactly {expected} cards, not {actual}")]
    WrongDiscardCount { expected: u32, actual: u32 },
    #[error("no hex with id {0}")]
    UnknownHex(HexId),
    #[error("the robber must move to a different hex")]
    RobberMustMove,
    #[error("seat {0} cannot be robbed")]
    InvalidVictim(usize),
    #[error("the development deck is empty")]
    DeckEmpty,
    #[error("no playable {0} card in hand")]
    CardNotPlayable(DevelopmentCard),
    #[error("only one development card may be played per turn")]
    DevCardAlreadyPlayed,
    #[error("must trade for a different resource")]
    SameResourceTrade,
    #[error("the game has already started")]
    AlreadyStarted,
    #[error("the table is full")]
    TableFull,
    #[error("only the host can start the game")]
    NotHost,
    #[error("need at least {0} players to start")]
    NotEnoughPlayers(usize),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Resources(#[from] ResourceError),
}

impl Session {
    /// Validates `action` and computes the next snapshot.
    pub fn apply(&self, action: &GameAction, rng: &mut impl Rng) -> Result<StepOutcome, GameError> {
        let mut next = self.clone();
        let mut events = Vec::new();
        next.step(action, rng, &mut events)?;
        for event in &events {
            let line = event.describe(&next);
            next.push_log(line);
        }
        debug!(
            code = %self.code,
            seat = action.seat,
            action = %action.action_type,
            events = events.len(),
            "applied action"
        );
        Ok(StepOutcome {
            session: next,
            events,
        })
    }

    fn step(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if action.seat >= self.players.len() {
            return Err(GameError::InvalidPlayer(action.seat));
        }
        match self.status {
            GameStatus::Won => Err(GameError::GameFinished),
            GameStatus::Lobby => Err(GameError::InvalidPrompt {
                prompt: ActionPrompt::WaitForPlayers,
                action: action.action_type,
            }),
            GameStatus::Starting => self.handle_order_roll(action, rng, events),
            GameStatus::Playing if self.setup_phase => self.handle_setup_action(action, events),
            GameStatus::Playing => self.handle_turn_action(action, rng, events),
        }
    }

    fn handle_order_roll(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if action.action_type != ActionType::RollForOrder {
            return Err(GameError::InvalidPrompt {
                prompt: ActionPrompt::RollForOrder,
                action: action.action_type,
            });
        }
        let seat = action.seat;
        let contenders = self.order_contenders();
        if !contenders.contains(&seat) || self.initial_rolls.contains_key(&seat) {
            return Err(GameError::NoOrderRollPending(seat));
        }
        let value = match action.payload {
            ActionPayload::None => rng.gen_range(1..=6),
            ActionPayload::Die(value) if (1..=6).contains(&value) => value,
            _ => return Err(GameError::InvalidPayload("expected a die between 1 and 6")),
        };
        self.initial_rolls.insert(seat, value);
        events.push(GameEvent::OrderRolled { seat, value });

        if contenders
            .iter()
            .any(|seat| !self.initial_rolls.contains_key(seat))
        {
            return Ok(());
        }
        let Some(best) = contenders
            .iter()
            .filter_map(|seat| self.initial_rolls.get(seat).copied())
            .max()
        else {
            return Ok(());
        };
        let leaders: Vec<usize> = contenders
            .into_iter()
            .filter(|seat| self.initial_rolls.get(seat) == Some(&best))
            .collect();

        if leaders.len() == 1 {
            let first_seat = leaders[0];
            self.roll_off.clear();
            self.first_seat = first_seat;
            self.current_player = first_seat;
            self.status = GameStatus::Playing;
            self.setup_phase = true;
            self.setup_step = 0;
            info!(code = %self.code, first_seat, "turn order decided");
            events.push(GameEvent::OrderDecided { first_seat });
        } else {
            for seat in &leaders {
                self.initial_rolls.remove(seat);
            }
            self.roll_off = leaders.clone();
            events.push(GameEvent::RollOff { seats: leaders });
        }
        Ok(())
    }

    fn handle_setup_action(
        &mut self,
        action: &GameAction,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let order = self.setup_order();
        let Some(step) = order.step(self.setup_step) else {
            return Err(GameError::InvalidPrompt {
                prompt: self.prompt(),
                action: action.action_type,
            });
        };
        let seat = action.seat;
        if seat != step.seat {
            return Err(GameError::ActionOutOfTurn {
                expected: step.seat,
                actual: seat,
            });
        }

        match (step.placement, action.action_type) {
            (SetupPlacement::Settlement, ActionType::BuildSettlement) => {
                let vertex = expect_vertex(&action.payload)?;
                can_build_settlement(&self.buildings, &self.roads, &self.players[seat], vertex, true)?;
                self.place_settlement(seat, vertex);
                events.push(GameEvent::BuiltSettlement { seat, vertex });
                if step.second_round {
                    let bundle = self.starting_resources(vertex);
                    if !bundle.is_empty() {
                        self.players[seat].receive(&bundle);
                        events.push(GameEvent::ResourcesGained { seat, bundle });
                    }
                }
            }
            (SetupPlacement::Road, ActionType::BuildRoad) => {
                let edge = expect_edge(&action.payload)?;
                can_build_road(&self.buildings, &self.roads, &self.players[seat], edge, true, false)?;
                self.place_road(seat, edge);
                events.push(GameEvent::BuiltRoad { seat, edge });
            }
            (_, other) => {
                return Err(GameError::InvalidPrompt {
                    prompt: self.prompt(),
                    action: other,
                });
            }
        }

        self.setup_step += 1;
        self.update_longest_route(events);
        self.check_victory(seat, events);
        if self.status == GameStatus::Won {
            return Ok(());
        }

        if order.is_complete(self.setup_step) {
            let first_player = order.last_seat().unwrap_or(self.first_seat);
            self.setup_phase = false;
            self.current_player = first_player;
            self.has_rolled = false;
            info!(code = %self.code, first_player, "setup complete");
            events.push(GameEvent::SetupComplete { first_player });
        } else if let Some(next) = order.seat_for_step(self.setup_step) {
            self.current_player = next;
        }
        Ok(())
    }

    fn handle_turn_action(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let seat = action.seat;
        // Any seat that owes cards may discard, whoever's turn it is.
        if action.action_type == ActionType::Discard {
            return self.handle_discard_action(action, events);
        }
        if seat != self.current_player {
            return Err(GameError::ActionOutOfTurn {
                expected: self.current_player,
                actual: seat,
            });
        }

        match action.action_type {
            ActionType::Roll => self.roll(action, rng, events),
            ActionType::MoveRobber => self.handle_move_robber_action(action, rng, events),
            ActionType::StealFrom => self.handle_steal_action(action, rng, events),
            ActionType::BuildRoad => {
                self.ensure_can_act_after_roll(action.action_type)?;
                let edge = expect_edge(&action.payload)?;
                self.build_road(seat, edge, events)
            }
            ActionType::BuildSettlement => {
                self.ensure_can_act_after_roll(action.action_type)?;
                let vertex = expect_vertex(&action.payload)?;
                self.build_settlement(seat, vertex, events)
            }
            ActionType::BuildCity => {
                self.ensure_can_act_after_roll(action.action_type)?;
                let vertex = expect_vertex(&action.payload)?;
                self.build_city(seat, vertex, events)
            }
            ActionType::BuyDevelopmentCard => {
                self.ensure_can_act_after_roll(action.action_type)?;
                self.buy_development_card(seat, events)
            }
            ActionType::MaritimeTrade => {
                self.ensure_can_act_after_roll(action.action_type)?;
                let (give, receive) = match action.payload {
                    ActionPayload::MaritimeTrade { give, receive } => (give, receive),
                    _ => return Err(GameError::InvalidPayload("expected a maritime trade")),
                };
                self.maritime_trade(seat, give, receive, events)
            }
            ActionType::EndTurn => {
                self.ensure_can_act_after_roll(action.action_type)?;
                self.advance_turn(events);
                Ok(())
            }
            ActionType::PlayKnightCard => {
                self.ensure_dev_card_available(seat, DevelopmentCard::Knight, action.action_type, events)?;
                self.play_knight_card(seat, events);
                Ok(())
            }
            ActionType::PlayYearOfPlenty => {
                let (first, second) = match action.payload {
                    ActionPayload::ResourcePair(first, second) => (first, second),
                    _ => {
                        return Err(GameError::InvalidPayload(
                            "expected two resources for year of plenty",
                        ));
                    }
                };
                self.ensure_dev_card_available(seat, DevelopmentCard::YearOfPlenty, action.action_type, events)?;
                let mut bundle = ResourceBundle::single(first, 1);
                bundle.add(second, 1);
                self.players[seat].receive(&bundle);
                events.push(GameEvent::ResourcesGained { seat, bundle });
                Ok(())
            }
            ActionType::PlayMonopoly => {
                let resource = match action.payload {
                    ActionPayload::Resource(resource) => resource,
                    _ => {
                        return Err(GameError::InvalidPayload(
                            "expected resource payload for monopoly",
                        ));
                    }
                };
                self.ensure_dev_card_available(seat, DevelopmentCard::Monopoly, action.action_type, events)?;
                self.play_monopoly(seat, resource, events);
                Ok(())
            }
            ActionType::PlayRoadBuilding => {
                self.ensure_dev_card_available(seat, DevelopmentCard::RoadBuilding, action.action_type, events)?;
                self.free_roads = ROAD_BUILDING_CREDITS;
                Ok(())
            }
            ActionType::RollForOrder | ActionType::Discard => Err(GameError::InvalidPrompt {
                prompt: self.prompt(),
                action: action.action_type,
            }),
        }
    }

    fn ensure_can_act_after_roll(&self, action: ActionType) -> Result<(), GameError> {
        match self.prompt() {
            ActionPrompt::PlayTurn => Ok(()),
            ActionPrompt::Roll => Err(GameError::MustRollFirst),
            prompt => Err(GameError::InvalidPrompt { prompt, action }),
        }
    }

    fn roll(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        match self.prompt() {
            ActionPrompt::Roll => {}
            ActionPrompt::PlayTurn => return Err(GameError::AlreadyRolled),
            prompt => {
                return Err(GameError::InvalidPrompt {
                    prompt,
                    action: action.action_type,
                });
            }
        }
        let dice = match action.payload {
            ActionPayload::None => (rng.gen_range(1..=6), rng.gen_range(1..=6)),
            ActionPayload::Dice(a, b) if (1..=6).contains(&a) && (1..=6).contains(&b) => (a, b),
            _ => return Err(GameError::InvalidPayload("expected two dice between 1 and 6")),
        };
        let sum = dice.0 + dice.1;
        self.dice = Some(dice);
        self.has_rolled = true;
        events.push(GameEvent::DiceRolled {
            seat: action.seat,
            dice,
            sum,
        });

        if sum == ROBBER_ROLL {
            self.begin_discard_phase(events);
        } else {
            self.distribute_resources(sum, events);
        }
        Ok(())
    }

    fn begin_discard_phase(&mut self, events: &mut Vec<GameEvent>) {
        for player in &self.players {
            let total = player.resource_count();
            if total > DISCARD_LIMIT {
                let count = total / 2;
                self.pending_discards.insert(player.seat, count);
                events.push(GameEvent::DiscardRequired {
                    seat: player.seat,
                    count,
                });
            }
        }
        self.robber_move_pending = self.pending_discards.is_empty();
    }

    /// Pays every building next to a producing hex: one card per settlement,
    /// two per city. The robber's hex produces nothing.
    fn distribute_resources(&mut self, sum: u8, events: &mut Vec<GameEvent>) {
        let mut gains = vec![ResourceBundle::zero(); self.players.len()];
        for hex in self.board.hexes_with_number(sum) {
            if hex.id == self.robber_hex {
                continue;
            }
            let Some(resource) = hex.resource() else {
                continue;
            };
            for vertex in hex.corners() {
                if let Some(building) = self.buildings.get(&vertex) {
                    if let Some(gain) = gains.get_mut(building.owner) {
                        gain.add(resource, building.yield_multiplier());
                    }
                }
            }
        }
        for (seat, bundle) in gains.into_iter().enumerate() {
            if bundle.is_empty() {
                continue;
            }
            self.players[seat].receive(&bundle);
            events.push(GameEvent::ResourcesGained { seat, bundle });
        }
    }

    /// One card per non-desert hex touching a second setup settlement.
    fn starting_resources(&self, vertex: VertexId) -> ResourceBundle {
        let mut bundle = ResourceBundle::zero();
        for resource in self.board.hexes_at(vertex).filter_map(|hex| hex.resource()) {
            bundle.add(resource, 1);
        }
        bundle
    }

    fn handle_discard_action(
        &mut self,
        action: &GameAction,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let seat = action.seat;
        let Some(&owed) = self.pending_discards.get(&seat) else {
            return Err(GameError::NoDiscardOwed(seat));
        };
        let bundle = match action.payload {
            ActionPayload::Resources(bundle) => bundle,
            _ => return Err(GameError::InvalidPayload("expected the cards to discard")),
        };
        if bundle.total() != owed {
            return Err(GameError::WrongDiscardCount {
                expected: owed,
                actual: bundle.total(),
            });
        }
        self.players[seat].pay(&bundle)?;
        self.pending_discards.remove(&seat);
        events.push(GameEvent::Discarded { seat, bundle });
        if self.pending_discards.is_empty() {
            self.robber_move_pending = true;
        }
        Ok(())
    }

    fn handle_move_robber_action(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let prompt = self.prompt();
        if prompt != ActionPrompt::MoveRobber {
            return Err(GameError::InvalidPrompt {
                prompt,
                action: action.action_type,
            });
        }
        let hex = match action.payload {
            ActionPayload::Hex(hex) => hex,
            _ => return Err(GameError::InvalidPayload("expected a hex for the robber")),
        };
        if self.board.hex(hex).is_none() {
            return Err(GameError::UnknownHex(hex));
        }
        if hex == self.robber_hex {
            return Err(GameError::RobberMustMove);
        }

        let seat = action.seat;
        self.robber_hex = hex;
        self.robber_move_pending = false;
        events.push(GameEvent::RobberMoved { seat, hex });

        let candidates = self.robbable_seats(hex, seat);
        match candidates.len() {
            0 => {}
            1 => self.steal_random_resource(seat, candidates[0], rng, events),
            _ => self.steal_candidates = candidates,
        }
        Ok(())
    }

    fn handle_steal_action(
        &mut self,
        action: &GameAction,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let prompt = self.prompt();
        if prompt != ActionPrompt::ChooseVictim {
            return Err(GameError::InvalidPrompt {
                prompt,
                action: action.action_type,
            });
        }
        let victim = match action.payload {
            ActionPayload::Seat(victim) => victim,
            _ => return Err(GameError::InvalidPayload("expected a seat to steal from")),
        };
        if !self.steal_candidates.contains(&victim) {
            return Err(GameError::InvalidVictim(victim));
        }
        self.steal_candidates.clear();
        self.steal_random_resource(action.seat, victim, rng, events);
        Ok(())
    }

    /// Other seats with a building on `hex` and at least one card.
    pub fn robbable_seats(&self, hex: HexId, thief: usize) -> Vec<usize> {
        let Some(hex) = self.board.hex(hex) else {
            return Vec::new();
        };
        let mut seats: Vec<usize> = hex
            .corners()
            .iter()
            .filter_map(|vertex| self.buildings.get(vertex))
            .map(|building| building.owner)
            .filter(|owner| {
                *owner != thief
                    && self
                        .players
                        .get(*owner)
                        .is_some_and(|player| player.resource_count() > 0)
            })
            .collect();
        seats.sort_unstable();
        seats.dedup();
        seats
    }

    /// Uniform over cards, so larger piles are likelier.
    fn steal_random_resource(
        &mut self,
        thief: usize,
        victim: usize,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        let cards = self.players[victim].resources.cards();
        if cards.is_empty() {
            return;
        }
        let resource = cards[rng.gen_range(0..cards.len())];
        if self.players[victim].resources.subtract(resource, 1).is_ok() {
            self.players[thief].resources.add(resource, 1);
            events.push(GameEvent::ResourceStolen {
                thief,
                victim,
                resource,
            });
        }
    }

    fn build_road(
        &mut self,
        seat: usize,
        edge: EdgeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let free = self.free_roads > 0;
        can_build_road(&self.buildings, &self.roads, &self.players[seat], edge, false, free)?;
        if free {
            self.free_roads -= 1;
        } else {
            self.players[seat].pay(&COST_ROAD)?;
        }
        self.place_road(seat, edge);
        events.push(GameEvent::BuiltRoad { seat, edge });
        self.update_longest_route(events);
        self.check_victory(seat, events);
        Ok(())
    }

    fn build_settlement(
        &mut self,
        seat: usize,
        vertex: VertexId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        can_build_settlement(&self.buildings, &self.roads, &self.players[seat], vertex, false)?;
        self.players[seat].pay(&COST_SETTLEMENT)?;
        self.place_settlement(seat, vertex);
        events.push(GameEvent::BuiltSettlement { seat, vertex });
        self.update_longest_route(events);
        self.check_victory(seat, events);
        Ok(())
    }

    fn build_city(
        &mut self,
        seat: usize,
        vertex: VertexId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        can_build_city(&self.buildings, &self.players[seat], vertex)?;
        let player = &mut self.players[seat];
        player.pay(&COST_CITY)?;
        player.inventory.cities -= 1;
        player.inventory.settlements += 1;
        player.victory_points += 1;
        self.buildings.insert(
            vertex,
            Building {
                owner: seat,
                kind: BuildingKind::City,
            },
        );
        events.push(GameEvent::BuiltCity { seat, vertex });
        self.check_victory(seat, events);
        Ok(())
    }

    fn place_settlement(&mut self, seat: usize, vertex: VertexId) {
        self.buildings.insert(vertex, Building::settlement(seat));
        let player = &mut self.players[seat];
        player.inventory.settlements -= 1;
        player.victory_points += 1;
    }

    fn place_road(&mut self, seat: usize, edge: EdgeId) {
        self.roads.insert(edge, seat);
        self.players[seat].inventory.roads -= 1;
    }

    fn buy_development_card(
        &mut self,
        seat: usize,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if self.dev_deck.is_empty() {
            return Err(GameError::DeckEmpty);
        }
        self.players[seat].pay(&COST_DEVELOPMENT)?;
        let Some(card) = self.dev_deck.pop() else {
            return Err(GameError::DeckEmpty);
        };
        self.players[seat].add_dev_card(card);
        events.push(GameEvent::DevelopmentCardBought { seat });
        self.check_victory(seat, events);
        Ok(())
    }

    /// Checks the per-turn limit and the hand, then spends the card.
    fn ensure_dev_card_available(
        &mut self,
        seat: usize,
        card: DevelopmentCard,
        action: ActionType,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        match self.prompt() {
            ActionPrompt::Roll | ActionPrompt::PlayTurn => {}
            prompt => return Err(GameError::InvalidPrompt { prompt, action }),
        }
        if self.has_played_dev_card {
            return Err(GameError::DevCardAlreadyPlayed);
        }
        let player = &mut self.players[seat];
        if !player.holds_playable(card) || !player.consume_dev_card(card) {
            return Err(GameError::CardNotPlayable(card));
        }
        self.has_played_dev_card = true;
        events.push(GameEvent::DevelopmentCardPlayed { seat, card });
        Ok(())
    }

    fn play_knight_card(&mut self, seat: usize, events: &mut Vec<GameEvent>) {
        self.players[seat].knights_played += 1;
        self.robber_move_pending = true;
        self.update_largest_army(events);
        self.check_victory(seat, events);
    }

    /// Cards that would overflow the collector's pile stay with their owners.
    fn play_monopoly(&mut self, seat: usize, resource: Resource, events: &mut Vec<GameEvent>) {
        let mut room = u8::MAX - self.players[seat].resources.get(resource);
        let mut amount = 0u8;
        for (idx, player) in self.players.iter_mut().enumerate() {
            if idx == seat {
                continue;
            }
            let taken = player.resources.get(resource).min(room);
            if player.resources.subtract(resource, taken).is_ok() {
                room -= taken;
                amount += taken;
            }
        }
        self.players[seat].resources.add(resource, amount);
        events.push(GameEvent::MonopolyCollected {
            seat,
            resource,
            amount,
        });
    }

    fn maritime_trade(
        &mut self,
        seat: usize,
        give: Resource,
        receive: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if give == receive {
            return Err(GameError::SameResourceTrade);
        }
        let rate = self.trade_rate(seat, give);
        let player = &mut self.players[seat];
        player.resources.subtract(give, rate)?;
        player.resources.add(receive, 1);
        events.push(GameEvent::MaritimeTrade {
            seat,
            give,
            rate,
            receive,
        });
        Ok(())
    }

    fn advance_turn(&mut self, events: &mut Vec<GameEvent>) {
        self.players[self.current_player].mature_dev_cards();
        let next_player = (self.current_player + 1) % self.players.len();
        self.current_player = next_player;
        self.has_rolled = false;
        self.has_played_dev_card = false;
        self.free_roads = 0;
        events.push(GameEvent::TurnAdvanced { next_player });
    }

    fn update_longest_route(&mut self, events: &mut Vec<GameEvent>) {
        let scores: Vec<u8> = (0..self.players.len())
            .map(|seat| {
                longest_path(
                    self.roads
                        .iter()
                        .filter(|(_, owner)| **owner == seat)
                        .map(|(edge, _)| edge),
                )
            })
            .collect();
        for (player, score) in self.players.iter_mut().zip(&scores) {
            player.longest_road = *score;
        }
        let holder = Award::LongestRoute
            .rule()
            .contest(self.longest_road_holder, &scores);
        self.transfer_award(Award::LongestRoute, holder, events);
    }

    fn update_largest_army(&mut self, events: &mut Vec<GameEvent>) {
        let scores: Vec<u8> = self.players.iter().map(|p| p.knights_played).collect();
        let holder = Award::LargestArmy
            .rule()
            .contest(self.largest_army_holder, &scores);
        self.transfer_award(Award::LargestArmy, holder, events);
    }

    fn transfer_award(&mut self, award: Award, holder: Option<usize>, events: &mut Vec<GameEvent>) {
        let slot = match award {
            Award::LongestRoute => &mut self.longest_road_holder,
            Award::LargestArmy => &mut self.largest_army_holder,
        };
        if *slot == holder {
            return;
        }
        let from = std::mem::replace(slot, holder);
        if let Some(player) = from.and_then(|seat| self.players.get_mut(seat)) {
            player.victory_points = player.victory_points.saturating_sub(AWARD_POINTS);
        }
        if let Some(player) = holder.and_then(|seat| self.players.get_mut(seat)) {
            player.victory_points += AWARD_POINTS;
        }
        events.push(GameEvent::AwardChanged {
            award,
            from,
            to: holder,
        });
    }

    /// The actor wins if it qualifies, otherwise the lowest qualifying seat.
    fn check_victory(&mut self, actor: usize, events: &mut Vec<GameEvent>) {
        if self.status == GameStatus::Won {
            return;
        }
        let target = self.config.vps_to_win;
        let winner = if self.players[actor].victory_points >= target {
            Some(actor)
        } else {
            self.players.iter().position(|p| p.victory_points >= target)
        };
        let Some(winner) = winner else {
            return;
        };
        self.status = GameStatus::Won;
        self.winner = Some(winner);
        info!(code = %self.code, winner, "game won");
        events.push(GameEvent::GameWon { winner });
    }
}

fn expect_vertex(payload: &ActionPayload) -> Result<VertexId, GameError> {
    match payload {
        ActionPayload::Vertex(vertex) => Ok(*vertex),
        _ => Err(GameError::InvalidPayload("expected a vertex")),
    }
}

fn expect_edge(payload: &ActionPayload) -> Result<EdgeId, GameError> {
    match payload {
        ActionPayload::Edge(edge) => Ok(*edge),
        _ => Err(GameError::InvalidPayload("expected an edge")),
    }
}
