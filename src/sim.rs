//! Bot games over an in-process store, used by the `settlers-sim` binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::client::{ClientError, GameClient};
use crate::game::{GameConfig, GameEvent, Session, legal_actions};
use crate::players::BasePlayer;
use crate::store::{MemoryStore, SessionStore};

pub const TURNS_LIMIT: u32 = 1000;

/// Final snapshot of one simulated game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub session: Session,
    pub turns: u32,
    pub ticks: u64,
}

impl GameRecord {
    pub fn winner(&self) -> Option<usize> {
        self.session.winner
    }
}

/// Plays one game with one client per bot, all writing through a shared
/// store. Stops on a win, after `turn_limit` turns or when a bot passes.
pub fn play_bot_game(
    bots: &mut [Box<dyn BasePlayer>],
    config: GameConfig,
    seed: u64,
    turn_limit: u32,
) -> Result<GameRecord, ClientError> {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let mut rng = StdRng::seed_from_u64(seed);
    let clients: Vec<GameClient> = (0..bots.len())
        .map(|seat| {
            GameClient::with_client_id(
                Arc::clone(&store),
                format!("bot-{seat}"),
                format!("Bot {}", seat + 1),
            )
        })
        .collect();
    let Some(host) = clients.first() else {
        return Err(ClientError::NotSeated);
    };

    let code = host.create_game(config, &mut rng)?.code;
    for client in &clients[1..] {
        client.join_game(&code)?;
    }
    host.start_game(&code)?;

    let mut turns = 0;
    let mut ticks = 0;
    loop {
        let session = host.snapshot(&code)?;
        if session.is_over() || turns >= turn_limit {
            break;
        }
        let Some(&seat) = session.actors().first() else {
            break;
        };
        let actions = legal_actions(&session, seat);
        let Some(action) = bots[seat].decide(&session, &actions) else {
            debug!(seat, prompt = %session.prompt(), "bot passed");
            break;
        };
        let outcome = clients[seat].act(&code, &action, &mut rng)?;
        ticks += 1;
        turns += outcome
            .events
            .iter()
            .filter(|event| matches!(event, GameEvent::TurnAdvanced { .. }))
            .count() as u32;
    }

    Ok(GameRecord {
        session: host.snapshot(&code)?,
        turns,
        ticks,
    })
}

#[derive(Debug, Default, Clone)]
pub struct GameStats {
    pub wins: HashMap<usize, u32>,
    pub results_by_player: HashMap<usize, Vec<u8>>,
    pub games: u32,
    pub total_ticks: u64,
    pub total_turns: u64,
    pub total_duration: Duration,
}

impl GameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_game(&mut self, record: &GameRecord, duration: Duration) {
        self.games += 1;
        self.total_duration += duration;
        self.total_turns += u64::from(record.turns);
        self.total_ticks += record.ticks;

        if let Some(winner) = record.winner() {
            *self.wins.entry(winner).or_insert(0) += 1;
        }
        for player in &record.session.players {
            self.results_by_player
                .entry(player.seat)
                .or_default()
                .push(player.victory_points);
        }
    }

    pub fn win_rate(&self, seat: usize) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        let wins = self.wins.get(&seat).copied().unwrap_or(0);
        wins as f64 / self.games as f64 * 100.0
    }

    pub fn avg_victory_points(&self, seat: usize) -> f64 {
        match self.results_by_player.get(&seat) {
            Some(vps) if !vps.is_empty() => {
                vps.iter().map(|vp| u32::from(*vp)).sum::<u32>() as f64 / vps.len() as f64
            }
            _ => 0.0,
        }
    }

    pub fn get_avg_ticks(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_ticks as f64 / self.games as f64
    }

    pub fn get_avg_turns(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games as f64
    }

    pub fn get_avg_duration(&self) -> Duration {
        if self.games == 0 {
            return Duration::ZERO;
        }
        self.total_duration / self.games
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::RandomPlayer;
    use crate::types::GameStatus;

    fn bots(count: usize) -> Vec<Box<dyn BasePlayer>> {
        (0..count)
            .map(|seat| Box::new(RandomPlayer::new(seat as u64)) as Box<dyn BasePlayer>)
            .collect()
    }

    #[test]
    fn bot_game_gets_past_setup() {
        let mut players = bots(3);
        let record = play_bot_game(&mut players, GameConfig::default(), 7, 20).unwrap();
        assert_eq!(record.session.players.len(), 3);
        assert_eq!(record.session.status, GameStatus::Playing);
        assert!(!record.session.setup_phase);
        assert!(record.turns >= 20 || record.session.is_over());
        for player in &record.session.players {
            assert!(player.victory_points >= 2);
        }
    }

    #[test]
    fn stats_accumulate_per_seat() {
        let mut players = bots(2);
        let config = GameConfig {
            vps_to_win: 3,
            ..GameConfig::default()
        };
        let mut stats = GameStats::new();
        for seed in 0..3 {
            let record = play_bot_game(&mut players, config.clone(), seed, TURNS_LIMIT).unwrap();
            stats.record_game(&record, Duration::from_millis(10));
        }
        assert_eq!(stats.games, 3);
        assert!(stats.total_turns > 0);
        assert_eq!(stats.results_by_player[&0].len(), 3);
        assert_eq!(stats.results_by_player[&1].len(), 3);
        let finished = stats.wins.values().sum::<u32>();
        assert!(finished <= 3);
        let rates = stats.win_rate(0) + stats.win_rate(1);
        assert!((rates - f64::from(finished) / 3.0 * 100.0).abs() < 1e-9);
        assert_eq!(stats.get_avg_duration(), Duration::from_millis(10));
    }
}
