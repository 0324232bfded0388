use creature_battle::{
    battle::validation::valid_actions, BattleController, BattleError, BattleEvent, BattleOutcome,
    BattleRules, CreatureSpec, PartySpec, SideId,
};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAX_TURNS: u32 = 200;

fn demo_parties() -> (PartySpec, PartySpec) {
    let red = PartySpec::new(
        "Red",
        vec![
            CreatureSpec::new("emberfox", 50, &["ember", "quick_attack", "swords_dance"])
                .with_item("life_orb"),
            CreatureSpec::new("stonehorn", 50, &["earthquake", "tackle"]).with_item("leftovers"),
        ],
    )
    .with_bag_item("potion", 2);
    let blue = PartySpec::new(
        "Blue",
        vec![
            CreatureSpec::new("tidalotter", 50, &["water_gun", "tackle"]).with_ability("swift_swim"),
            CreatureSpec::new("voltmouse", 50, &["thunder_shock", "thunder_wave"]),
        ],
    );
    (red, blue)
}

fn load_rules(path: Option<&str>) -> Result<BattleRules, String> {
    let Some(path) = path else {
        return Ok(BattleRules::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {}", path, e))?;
    BattleRules::from_ron_str(&text).map_err(|e| e.to_string())
}

fn run(seed: u64, rules: BattleRules) -> Result<BattleOutcome, BattleError> {
    let (red, blue) = demo_parties();
    let mut battle = BattleController::new(seed, rules, red, blue)?;
    for event in battle.opening_events() {
        println!("  {:?}", event);
    }

    while battle.outcome() == BattleOutcome::Undecided && battle.turn() <= MAX_TURNS {
        let turn = battle.turn();
        for side in SideId::both() {
            let Some(action) = valid_actions(battle.state(), side, battle.tables())
                .into_iter()
                .next()
            else {
                warn!(turn, %side, "no legal action left");
                return Ok(BattleOutcome::Undecided);
            };
            battle.submit(side, turn, action)?;
        }

        let report = battle.resolve_turn()?;
        println!("Turn {}", report.turn);
        for event in &report.events {
            if !matches!(event, BattleEvent::TurnStarted { .. } | BattleEvent::TurnEnded { .. }) {
                println!("  {:?}", event);
            }
        }
        for fault in &report.faults {
            warn!(turn = report.turn, side = ?fault.side, fault = %fault.fault, "turn fault");
        }
    }

    Ok(battle.outcome())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = match args.first().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            eprintln!("seed must be an unsigned integer: {}", e);
            return ExitCode::FAILURE;
        }
        None => 42,
    };
    let rules = match load_rules(args.get(1).map(String::as_str)) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error loading rules: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(seed, rules) {
        Ok(outcome) => {
            info!(seed, ?outcome, "demo battle finished");
            println!("Outcome: {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Battle error: {}", e);
            ExitCode::FAILURE
        }
    }
}
