use anyhow::{bail, Context};
use clap::Parser;
use maze_chase_engine::config::GameConfig;
use maze_chase_engine::engine::{GameEngine, GameEngineOptions};
use maze_chase_engine::layouts::{CLASSIC, OPEN_ROOM};
use maze_chase_engine::observer::{EngineObserver, JsonLinesObserver};
use maze_chase_engine::rng::Rng;
use maze_chase_engine::types::{Direction, GameOverReason, Mode, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;

const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 5;
/// Chance per tick that the autopilot asks for a new heading.
const AUTOPILOT_TURN_CHANCE: f32 = 0.04;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Maze layout file; overrides --preset.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Built-in layout: classic or open-room.
    #[arg(long)]
    preset: Option<String>,
    /// JSON file with GameConfig overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Stream every engine event to stderr as JSON lines.
    #[arg(long)]
    trace: bool,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    #[serde(skip)]
    layout: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    reason: Option<GameOverReason>,
    ticks: u64,
    score: u32,
    lives: u32,
    #[serde(rename = "pelletsTotal")]
    pellets_total: usize,
    #[serde(rename = "pelletsConsumed")]
    pellets_consumed: usize,
    energizers: u32,
    captures: u32,
    deaths: u32,
    #[serde(rename = "extraLives")]
    extra_lives: u32,
    #[serde(rename = "modeChanges")]
    mode_changes: u32,
    #[serde(rename = "directionCommits")]
    direction_commits: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: i64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: i64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_ref() {
        Some(path) => GameConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let scenarios = resolve_scenarios(&cli)?;
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "maxTicks": scenario.max_ticks,
                "tickRate": config.tick_rate,
            }),
        );
        let scenario_run = run_scenario(&scenario, &config, cli.trace)
            .with_context(|| format!("running scenario {}", scenario.name))?;

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *reason_counts
            .entry(game_over_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "pelletsConsumed": scenario_run.result.pellets_consumed,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!("{}", serde_json::to_string(&scenario_run.result)?);
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        reason_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
    Ok(())
}

fn run_scenario(
    scenario: &Scenario,
    config: &GameConfig,
    trace: bool,
) -> anyhow::Result<ScenarioRunResult> {
    let options = GameEngineOptions {
        seed: scenario.seed,
        observer: trace
            .then(|| Box::new(JsonLinesObserver::new(io::stderr())) as Box<dyn EngineObserver>),
        ..GameEngineOptions::default()
    };
    let mut engine = GameEngine::from_layout(&scenario.layout, config.clone(), options)?;
    let mut autopilot = Rng::new(scenario.seed ^ 0x9e37_79b9);

    let mut result = ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        ..ScenarioResultLine::default()
    };
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;

    while !engine.is_ended() && engine.tick() < scenario.max_ticks {
        if autopilot.bool(AUTOPILOT_TURN_CHANCE) {
            let dir = Direction::ALL[autopilot.int(0, 3) as usize];
            engine.request_turn(dir);
        }
        engine.advance();
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::EnergizerEaten { .. } => result.energizers += 1,
                RuntimeEvent::PursuerCaptured { .. } => result.captures += 1,
                RuntimeEvent::PlayerCaught { .. } => result.deaths += 1,
                RuntimeEvent::ExtraLife { .. } => result.extra_lives += 1,
                RuntimeEvent::ModeChanged { .. } => result.mode_changes += 1,
                RuntimeEvent::DirectionCommitted { .. } => result.direction_commits += 1,
                RuntimeEvent::PursuerStalled { id, cell, ticks } => push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    format!(
                        "pursuer {id} stalled at ({}, {}) for {ticks} ticks",
                        cell.row, cell.col
                    ),
                ),
                _ => {}
            }
        }
    }

    result.reason = engine.end_reason();
    result.ticks = engine.tick();
    result.score = engine.score();
    result.lives = engine.lives();
    result.pellets_total = engine.pellets_total();
    result.pellets_consumed = engine.pellets_consumed();
    result.anomalies = anomalies;

    Ok(ScenarioRunResult {
        result,
        anomaly_records,
        finished_tick: last_tick,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    let player = &snapshot.player;
    if player.row_exact.floor() as i32 != player.row || player.col_exact.floor() as i32 != player.col
    {
        anomalies.push(format!(
            "player cell ({}, {}) disagrees with position ({}, {})",
            player.row, player.col, player.row_exact, player.col_exact
        ));
    }

    if snapshot.pellets_consumed > snapshot.pellets_total {
        anomalies.push(format!(
            "consumed {} of {} pellets",
            snapshot.pellets_consumed, snapshot.pellets_total
        ));
    }
    if snapshot.lives == 0 && !snapshot.ended {
        anomalies.push("no lives left but game still running".to_string());
    }

    for pursuer in &snapshot.pursuers {
        if pursuer.row_exact.floor() as i32 != pursuer.row
            || pursuer.col_exact.floor() as i32 != pursuer.col
        {
            anomalies.push(format!(
                "pursuer {} cell ({}, {}) disagrees with position ({}, {})",
                pursuer.id, pursuer.row, pursuer.col, pursuer.row_exact, pursuer.col_exact
            ));
        }
        if !pursuer.speed.is_finite() || pursuer.speed <= 0.0 || pursuer.speed > 1.0 {
            anomalies.push(format!("pursuer {} speed out of range: {}", pursuer.id, pursuer.speed));
        }
        if pursuer.mode == Mode::Flee && snapshot.flee_ticks_left == 0 {
            anomalies.push(format!("pursuer {} fleeing without a flee timer", pursuer.id));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> anyhow::Result<Vec<Scenario>> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(rand::random::<u64>));
    let max_ticks = cli.ticks.unwrap_or(DEFAULT_MAX_TICKS);

    if let Some(path) = cli.layout.as_ref() {
        let layout = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout {}", path.display()))?;
        return Ok(vec![Scenario {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| "custom".to_string()),
            layout,
            seed,
            max_ticks,
        }]);
    }

    if let Some(preset) = cli.preset.as_deref() {
        let Some(layout) = preset_layout(preset) else {
            bail!("unknown preset {preset:?}; expected classic or open-room");
        };
        return Ok(vec![Scenario {
            name: preset.to_string(),
            layout: layout.to_string(),
            seed,
            max_ticks,
        }]);
    }

    Ok(vec![
        Scenario {
            name: "classic".to_string(),
            layout: CLASSIC.to_string(),
            seed,
            max_ticks,
        },
        Scenario {
            name: "open-room".to_string(),
            layout: OPEN_ROOM.to_string(),
            seed: normalize_seed(seed as u64 + 1),
            max_ticks,
        },
    ])
}

fn preset_layout(name: &str) -> Option<&'static str> {
    match name {
        "classic" => Some(CLASSIC),
        "open-room" | "open_room" => Some(OPEN_ROOM),
        _ => None,
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: i64,
    finished_at_ms: i64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("failed to serialize log line {event}: {error}"),
    }
}

fn game_over_reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::LevelCleared) => "level_cleared",
        Some(GameOverReason::OutOfLives) => "out_of_lives",
        None => "tick_limit",
    }
    .to_string()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
