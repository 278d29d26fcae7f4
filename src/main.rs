//! Stakebook CLI
//!
//! `demo` runs a scripted end-to-end settlement: a game is created, wagers
//! are pooled, validators vote the result in after the bookie's grace
//! window, and winners plus fee recipients collect. `init-config` writes a
//! sample configuration file.

use clap::{Parser, Subcommand};
use stakebook::{
    clock::{Clock, ManualClock},
    config::{generate_sample_config, ConfigLoader, StakebookConfig},
    engine::StakebookApp,
    types::{
        id_from_label, Address, BetDef, BetMode, ConditionKind, Game, Market, ResultSheet,
        SlipDraft, Window, ETHER, NATIVE_CURRENCY,
    },
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stakebook", about = "Pari-mutuel settlement engine with a PoS result oracle")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted settlement scenario against an in-memory engine
    Demo,
    /// Write a sample configuration file
    InitConfig {
        #[arg(default_value = "stakebook.toml")]
        path: String,
    },
}

fn address(label: &str) -> Address {
    id_from_label(label)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stakebook=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::InitConfig { path } => {
            generate_sample_config(&path)?;
            println!("Sample configuration written to {}", path);
            Ok(())
        }
        Command::Demo => {
            let config = match cli.config {
                Some(path) => ConfigLoader::new().with_path(path).load()?,
                None => StakebookConfig::default(),
            };
            run_demo(config)
        }
    }
}

fn run_demo(mut config: StakebookConfig) -> Result<(), Box<dyn std::error::Error>> {
    // A scripted clock keeps the scenario deterministic.
    let clock = ManualClock::starting_at(1_000);
    config.oracle.min_votes = 3;
    let admin = address("admin");
    let app = StakebookApp::in_memory(config, Arc::new(clock.clone()), admin);

    println!("=== Stakebook demo: one game, one market, seven wagers ===");

    // Catalog: a match-winner market with home and away bets.
    let home_bet = BetDef {
        id: id_from_label("full-time-home"),
        mode: BetMode::Condition {
            window: Window::FullTime,
            kind: ConditionKind::HomeWins,
        },
        flag: true,
        team: None,
    };
    let away_bet = BetDef {
        id: id_from_label("full-time-away"),
        mode: BetMode::Condition {
            window: Window::FullTime,
            kind: ConditionKind::AwayWins,
        },
        flag: true,
        team: None,
    };
    let market = Market {
        id: id_from_label("match-winner"),
        bets: vec![home_bet.id, away_bet.id],
    };
    app.catalog().store_bets(vec![home_bet.clone(), away_bet.clone()]);
    app.catalog().store_markets(vec![market.clone()]);

    let bookie = address("bookie");
    let game = Game {
        id: 1,
        home_team: 10,
        away_team: 20,
        start_time: clock.now() + 3_600,
        end_time: clock.now() + 3_600 + 6_000,
        players: vec![],
        bookie,
    };
    app.registry().create_game(admin, game.clone())?;

    // Fee-earning collectibles.
    app.owners().set_team_owner(10, address("team-owner"));
    app.owners().set_collectible_owner(market.id, address("market-owner"));
    app.owners().set_collectible_owner(home_bet.id, address("bet-owner"));

    // Wagers: two on home, five on away, 0.3 each.
    let stake = 3 * ETHER / 10;
    let draft = |bet_id| SlipDraft {
        amount: stake,
        bet_id,
        market_id: market.id,
        game_id: game.id,
        currency: NATIVE_CURRENCY,
        referrer: NATIVE_CURRENCY,
    };
    let mut winners = Vec::new();
    for i in 0..2 {
        let bettor = address(&format!("home-bettor-{}", i));
        winners.push((bettor, app.slips().place_bet(bettor, draft(home_bet.id), stake)?));
    }
    for i in 0..5 {
        let bettor = address(&format!("away-bettor-{}", i));
        app.slips().place_bet(bettor, draft(away_bet.id), stake)?;
    }
    println!("placed 7 wagers of 0.3 each");

    // Oracle: bookie submits first, validators confirm after the grace
    // window, one dissenter gets slashed.
    let sheet = ResultSheet {
        game_id: game.id,
        home_score: 2,
        away_score: 1,
        home_halftime_score: 1,
        away_halftime_score: 0,
        ..Default::default()
    };
    app.oracle().acquire_validator_role(bookie)?;
    let validators: Vec<Address> = (0..3).map(|i| address(&format!("validator-{}", i))).collect();
    for validator in &validators {
        app.oracle().acquire_validator_role(*validator)?;
    }

    clock.set(game.end_time + 10);
    app.oracle().submit_game_results(bookie, sheet.clone())?;

    clock.set(game.end_time + 601);
    app.oracle().submit_game_results(validators[0], sheet.clone())?;
    app.oracle().submit_game_results(validators[1], sheet.clone())?;
    let mut dissent = sheet.clone();
    dissent.home_score = 0;
    app.oracle().submit_game_results(validators[2], dissent)?;

    let reward = app.claim_reward(bookie, game.id, bookie)?;
    println!("bookie reward (rank 0): {} base units", reward);
    match app.claim_reward(validators[2], game.id, validators[2]) {
        Err(e) => println!("dissenting validator: {}", e),
        Ok(_) => unreachable!("dissenter cannot claim"),
    }

    // Settlement: winners split 70% of the losing aggregate, the rest flows
    // through the fee waterfall.
    for (bettor, slip_id) in &winners {
        let payout = app.claim_bet(*bettor, *slip_id, *bettor)?;
        println!("winner payout: {} base units", payout);
    }

    let key = app.slips().get_slip(winners[0].1).unwrap().pool_key();
    for collector in ["admin", "bookie", "team-owner", "market-owner", "bet-owner"] {
        let who = address(collector);
        let fees = app.collect_fees(who, &[key], who)?;
        println!("{} collected {} base units in fees", collector, fees);
    }

    println!("=== demo complete ===");
    Ok(())
}
