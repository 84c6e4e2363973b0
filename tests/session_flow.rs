use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use settlers_session::game::{ActionPayload, ResourceBundle, legal_actions};
use settlers_session::{
    ActionPrompt, ActionType, ClientError, GameAction, GameClient, GameCode, GameConfig,
    GameError, GameEvent, GameStatus, MemoryStore, Session, SessionPatch, SessionStore,
};

struct Table {
    store: Arc<dyn SessionStore>,
    clients: Vec<GameClient>,
    code: GameCode,
}

impl Table {
    fn client(&self, seat: usize) -> &GameClient {
        &self.clients[seat]
    }

    fn snapshot(&self) -> Session {
        self.clients[0].snapshot(&self.code).unwrap()
    }
}

/// Two seats joined through a shared link, started by the host.
fn two_seat_table(rng: &mut StdRng) -> Table {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let host = GameClient::with_client_id(Arc::clone(&store), "host", "Ana");
    let guest = GameClient::with_client_id(Arc::clone(&store), "guest", "Bo");

    let created = host.create_game(GameConfig::default(), rng).unwrap();
    let link = created.code.join_link("https://play.example/join");
    let code = GameCode::from_join_link(&link).unwrap();
    assert_eq!(code, created.code);

    let (_, seat) = guest.join_game(&code).unwrap();
    assert_eq!(seat, 1);
    host.start_game(&code).unwrap();
    Table {
        store,
        clients: vec![host, guest],
        code,
    }
}

fn order_roll(seat: usize, value: u8) -> GameAction {
    GameAction::new(seat, ActionType::RollForOrder).with_payload(ActionPayload::Die(value))
}

fn run_setup(table: &Table, rng: &mut StdRng) -> Vec<usize> {
    let mut order = Vec::new();
    while table.snapshot().setup_phase {
        let session = table.snapshot();
        let seat = session.actors()[0];
        order.push(seat);
        let action = legal_actions(&session, seat).remove(0);
        table.client(seat).act(&table.code, &action, rng).unwrap();
    }
    order
}

#[test]
fn two_players_reach_the_first_roll() {
    let mut rng = StdRng::seed_from_u64(17);
    let table = two_seat_table(&mut rng);
    assert_eq!(table.snapshot().prompt(), ActionPrompt::RollForOrder);

    table.client(0).act(&table.code, &order_roll(0, 6), &mut rng).unwrap();
    let decided = table
        .client(1)
        .act(&table.code, &order_roll(1, 1), &mut rng)
        .unwrap();
    assert!(decided.events.contains(&GameEvent::OrderDecided { first_seat: 0 }));
    assert_eq!(decided.session.status, GameStatus::Playing);

    let order = run_setup(&table, &mut rng);
    assert_eq!(order, vec![0, 0, 1, 1, 1, 1, 0, 0]);

    let session = table.snapshot();
    assert_eq!(session.prompt(), ActionPrompt::Roll);
    assert_eq!(session.current_player, 0);
    assert_eq!(session.buildings.len(), 4);
    assert_eq!(session.roads.len(), 4);
    for player in &session.players {
        assert_eq!(player.victory_points, 2);
        assert!(player.resource_count() <= 3);
    }
    assert!(session.logs.len() <= session.config.log_capacity);
    assert_eq!(session.logs[0], "Setup complete. Ana rolls first");
}

#[test]
fn a_seven_collects_discards_before_the_robber_moves() {
    let mut rng = StdRng::seed_from_u64(23);
    let table = two_seat_table(&mut rng);
    table.client(0).act(&table.code, &order_roll(0, 5), &mut rng).unwrap();
    table.client(1).act(&table.code, &order_roll(1, 3), &mut rng).unwrap();
    run_setup(&table, &mut rng);

    // Any participant may write any field; hand seat 1 nine cards.
    let mut players = table.snapshot().players;
    players[1].resources = ResourceBundle::from_counts([3, 2, 2, 1, 1]);
    table
        .store
        .apply_patch(
            &table.code,
            SessionPatch {
                players: Some(players),
                ..SessionPatch::default()
            },
        )
        .unwrap();

    let roll = GameAction::new(0, ActionType::Roll).with_payload(ActionPayload::Dice(3, 4));
    let rolled = table.client(0).act(&table.code, &roll, &mut rng).unwrap();
    assert!(rolled
        .events
        .contains(&GameEvent::DiscardRequired { seat: 1, count: 4 }));
    let session = rolled.session;
    assert_eq!(session.dice, Some((3, 4)));
    assert_eq!(session.pending_discards, BTreeMap::from([(1, 4)]));
    assert!(!session.robber_move_pending);
    assert_eq!(session.prompt(), ActionPrompt::Discard);
    assert_eq!(session.actors(), vec![1]);

    let early = GameAction::new(0, ActionType::MoveRobber)
        .with_payload(ActionPayload::Hex((session.robber_hex + 1) % 19));
    let err = table.client(0).act(&table.code, &early, &mut rng).unwrap_err();
    assert!(matches!(err, ClientError::Game(_)));

    let short = GameAction::new(1, ActionType::Discard)
        .with_payload(ActionPayload::Resources(ResourceBundle::from_counts([3, 0, 0, 0, 0])));
    let err = table.client(1).act(&table.code, &short, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Game(GameError::WrongDiscardCount {
            expected: 4,
            actual: 3
        })
    ));

    let discard = legal_actions(&session, 1).remove(0);
    let after = table.client(1).act(&table.code, &discard, &mut rng).unwrap().session;
    assert!(after.pending_discards.is_empty());
    assert!(after.robber_move_pending);
    assert_eq!(after.prompt(), ActionPrompt::MoveRobber);
    assert_eq!(after.actors(), vec![0]);
    assert_eq!(after.players[1].resource_count(), 5);
}

#[test]
fn subscribers_follow_every_write() {
    let mut rng = StdRng::seed_from_u64(31);
    let table = two_seat_table(&mut rng);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = table
        .client(1)
        .subscribe(
            &table.code,
            Arc::new(move |session: &Session| {
                sink.lock().unwrap().push((session.version, session.prompt()));
            }),
        )
        .unwrap();

    let start_version = table.snapshot().version;
    table.client(0).act(&table.code, &order_roll(0, 2), &mut rng).unwrap();
    table.client(1).act(&table.code, &order_roll(1, 4), &mut rng).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (start_version + 1, ActionPrompt::RollForOrder),
            (start_version + 2, ActionPrompt::BuildInitialSettlement),
        ]
    );

    subscription.unsubscribe();
    run_setup(&table, &mut rng);
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(table.snapshot().first_seat, 1);
}

#[test]
fn late_joiners_are_turned_away() {
    let mut rng = StdRng::seed_from_u64(5);
    let table = two_seat_table(&mut rng);
    let late = GameClient::new(Arc::clone(&table.store), "Cy");
    let err = late.join_game(&table.code).unwrap_err();
    assert!(matches!(err, ClientError::Game(GameError::AlreadyStarted)));

    let unknown: GameCode = "QQQQ".parse().unwrap();
    assert!(late.join_game(&unknown).is_err());
}
