//! Headless wizard skirmish runner.
//!
//! Plays battles with the ally side on autopilot and logs what happens.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wizard_skirmish::config::SPEED_STEPS;
use wizard_skirmish::{
    default_stat_table, AutoPilot, BattleAction, BattleConfig, BattleController, BattleOutcome,
    BattleResult, Behavior, Leaderboard, LeaderboardEntry, SavedBattle, Side, TurnRng,
};

/// Simulated wall-clock time per frame.
const FRAME_DELTA: Duration = Duration::from_millis(16);

/// Rows shown when printing the leaderboard.
const LEADERBOARD_ROWS: usize = 10;

/// Wizard Skirmish: a party of wizards against waves of monsters
#[derive(Parser, Debug)]
#[command(name = "wizard-skirmish")]
#[command(author, version, about = "Simulate wizard skirmish battles headlessly", long_about = None)]
struct Args {
    /// Number of waves to play before stopping
    #[arg(short = 'w', long = "waves", default_value_t = 1)]
    waves: u32,

    /// Animation speed multiplier
    #[arg(short = 's', long = "speed", default_value_t = 1, value_parser = parse_speed)]
    speed: u32,

    /// Seed for reproducible runs
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Name recorded on the leaderboard
    #[arg(short = 'u', long = "user", default_value = "wizard")]
    user: String,

    /// Battle configuration file (RON)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Resume from a saved battle
    #[arg(short = 'l', long = "load")]
    load: Option<PathBuf>,

    /// Save the battle here when the run stops mid-battle
    #[arg(long = "save")]
    save: Option<PathBuf>,

    /// Leaderboard file (JSON lines) to append the final score to
    #[arg(long = "leaderboard")]
    leaderboard: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long = "max-steps", default_value_t = 200_000)]
    max_steps: u64,
}

fn parse_speed(value: &str) -> Result<u32, String> {
    let speed: u32 = value.parse().map_err(|e| format!("{}", e))?;
    if SPEED_STEPS.contains(&speed) {
        Ok(speed)
    } else {
        Err(format!("speed must be one of {:?}", SPEED_STEPS))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> BattleResult<()> {
    let mut config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    config.speed_multiplier = args.speed;

    let table = default_stat_table()?.clone();
    let (battle_rng, pilot_rng) = match args.seed {
        Some(seed) => (TurnRng::seeded(seed), TurnRng::seeded(seed.wrapping_add(1))),
        None => (TurnRng::new_random(), TurnRng::new_random()),
    };

    let mut controller = match &args.load {
        Some(path) => {
            let saved = SavedBattle::load(path)?;
            BattleController::from_saved(&saved, config, table, battle_rng)?
        }
        None => BattleController::new_battle(config, table, battle_rng)?,
    };

    let outcome = play(&mut controller, pilot_rng, args)?;

    match outcome {
        Some(outcome) => info!("Run finished: {:?}, score {}", outcome, controller.session().score),
        None => {
            info!("Stopped mid-battle after {} frames", args.max_steps);
            if let Some(path) = &args.save {
                match controller.save_record() {
                    Ok(record) => {
                        record.save(path)?;
                        info!("Saved battle to {}", path.display());
                    }
                    Err(e) => warn!("Could not save: {}", e),
                }
            }
        }
    }

    if let Some(path) = &args.leaderboard {
        let score = controller.final_score().unwrap_or(controller.session().score);
        Leaderboard::append(path, &LeaderboardEntry::new(args.user.clone(), score))?;
        let board = Leaderboard::load(path)?;
        println!("{:<4} {:<20} {:>8}", "#", "Name", "Score");
        for (rank, entry) in board.top(LEADERBOARD_ROWS).iter().enumerate() {
            println!("{:<4} {:<20} {:>8}", rank + 1, entry.user_name, entry.score);
        }
    }
    Ok(())
}

/// Drive the controller until the run ends. Returns None if `max_steps`
/// ran out first.
fn play(
    controller: &mut BattleController,
    mut pilot_rng: TurnRng,
    args: &Args,
) -> BattleResult<Option<BattleOutcome>> {
    let pilot = AutoPilot::default();
    let mut waves_won = 0;

    for _ in 0..args.max_steps {
        controller.update(FRAME_DELTA);

        let session = controller.session();
        if session.turn_owner == Side::Ally && session.everyone_idle() {
            if let Some(actor) = session.turn_queue.head() {
                let action = pilot.decide_action(actor, session, &mut pilot_rng, controller.config());
                match action {
                    BattleAction::Attack => controller.player_attack(),
                    BattleAction::Heal => controller.player_heal(),
                    BattleAction::Special => controller.player_special(),
                };
            }
        }

        controller.events().log_formatted(controller.session());
        controller.drain_events();

        match controller.outcome() {
            Some(BattleOutcome::Victory) => {
                waves_won += 1;
                if waves_won >= args.waves {
                    return Ok(Some(BattleOutcome::Victory));
                }
                controller.next_wave()?;
            }
            Some(BattleOutcome::Defeat) => return Ok(Some(BattleOutcome::Defeat)),
            None => {}
        }
    }
    Ok(None)
}
