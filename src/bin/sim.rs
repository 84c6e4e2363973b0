use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use settlers_session::game::GameConfig;
use settlers_session::players::{BasePlayer, RandomPlayer};
use settlers_session::sim::{GameStats, TURNS_LIMIT, play_bot_game};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser, Clone)]
#[command(name = "settlers-sim")]
#[command(about = "Play random bot games through a shared in-memory session store")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 5)]
    num: u32,

    /// Seats at the table (2-4)
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON file with GameConfig overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Victory points needed to win (overrides the config file)
    #[arg(long)]
    vps_to_win: Option<u8>,

    /// Stop a game after this many turns
    #[arg(long, default_value_t = TURNS_LIMIT)]
    turn_limit: u32,

    /// Silence console output
    #[arg(long)]
    quiet: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path).unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }),
        None => GameConfig::default(),
    };
    if let Some(vps) = args.vps_to_win {
        config.vps_to_win = vps;
    }
    config.min_players = config.min_players.min(args.players);
    config.max_players = config.max_players.max(args.players);
    if let Err(err) = config.validate() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let mut stats = GameStats::new();
    for game_idx in 0..args.num {
        let seed = args.seed + u64::from(game_idx);
        let mut bots: Vec<Box<dyn BasePlayer>> = (0..args.players)
            .map(|seat| Box::new(RandomPlayer::new(seed * 10 + seat as u64)) as Box<dyn BasePlayer>)
            .collect();

        let start = Instant::now();
        let record = match play_bot_game(&mut bots, config.clone(), seed, args.turn_limit) {
            Ok(record) => record,
            Err(err) => {
                error!(game = game_idx + 1, %err, "game aborted");
                continue;
            }
        };
        let duration = start.elapsed();
        stats.record_game(&record, duration);

        if !args.quiet {
            let winner = record
                .winner()
                .map(|seat| record.session.display_name(seat))
                .unwrap_or_else(|| "None".to_string());
            println!(
                "Game {:>4}: Code={}, Winner={:>6}, Turns={:>4}, Duration={:?}",
                game_idx + 1,
                record.session.code,
                winner,
                record.turns,
                duration
            );
        }
    }

    if !args.quiet {
        print_summary(&stats, args.players);
    }
}

fn print_summary(stats: &GameStats, players: usize) {
    println!("\n{}", "=".repeat(80));
    println!("SIMULATION SUMMARY");
    println!("{}", "=".repeat(80));

    println!("\nPlayer Summary:");
    println!(
        "{:<15} {:<10} {:<12} {:<12}",
        "Player", "Wins", "Win Rate", "Avg VP"
    );
    println!("{}", "-".repeat(50));
    for seat in 0..players {
        println!(
            "{:<15} {:<10} {:<11.1}% {:<12.2}",
            format!("Random (seat {seat})"),
            stats.wins.get(&seat).copied().unwrap_or(0),
            stats.win_rate(seat),
            stats.avg_victory_points(seat)
        );
    }

    println!("\nGame Summary:");
    println!("  Total Games: {}", stats.games);
    println!("  Avg Turns: {:.2}", stats.get_avg_turns());
    println!("  Avg Ticks: {:.2}", stats.get_avg_ticks());
    println!("  Avg Duration: {:.2?}", stats.get_avg_duration());
}
