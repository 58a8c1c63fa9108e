use arena_duel_engine::constants::{TICK_RATE, WORLD_HALF_WIDTH};
use arena_duel_engine::engine::MatchEngine;
use arena_duel_engine::types::{Archetype, AudioCue, FighterSetup, Snapshot};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    left: Option<String>,
    #[arg(long)]
    right: Option<String>,
    #[arg(long)]
    rounds: Option<u32>,
    #[arg(long)]
    difficulty: Option<f32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    left: Archetype,
    right: Archetype,
    rounds: u32,
    difficulty: f32,
    seed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ScenarioReason {
    Decided,
    Draw,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    left: Archetype,
    right: Archetype,
    rounds: u32,
    difficulty: f32,
    reason: ScenarioReason,
    #[serde(rename = "leftWins")]
    left_wins: u32,
    #[serde(rename = "rightWins")]
    right_wins: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "lightHits")]
    light_hits: i32,
    #[serde(rename = "heavyHits")]
    heavy_hits: i32,
    knockouts: i32,
    #[serde(rename = "maxCombo")]
    max_combo: u8,
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
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
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

const ROUND_TICK_SAFETY: u64 = 60 * 60 * 3;

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
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
                "left": scenario.left,
                "right": scenario.right,
                "rounds": scenario.rounds,
                "difficulty": scenario.difficulty,
            }),
        );
        let scenario_run = run_scenario(&scenario);

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
        total_duration_ms += scenario_run.result.duration_ms;
        *reason_counts
            .entry(scenario_reason_key(scenario_run.result.reason))
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
                "durationMs": scenario_run.result.duration_ms,
                "leftWins": scenario_run.result.left_wins,
                "rightWins": scenario_run.result.right_wins,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results.clone(),
        reason_counts,
        total_anomalies,
        total_duration_ms,
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
            "averageDurationMs": summary.average_duration_ms,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = MatchEngine::new(
        FighterSetup {
            archetype: scenario.left,
            ai: Some(scenario.difficulty),
        },
        FighterSetup {
            archetype: scenario.right,
            ai: Some(scenario.difficulty),
        },
        scenario.seed,
    );

    let mut light_hits = 0;
    let mut heavy_hits = 0;
    let mut knockouts = 0;
    let mut max_combo = 0u8;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut reason = ScenarioReason::Decided;

    'rounds: for round in 0..scenario.rounds {
        if round > 0 {
            engine.rematch();
        }
        let round_started_at = engine.tick();
        loop {
            engine.step();
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

            for fighter in &snapshot.fighters {
                max_combo = max_combo.max(fighter.combo_count);
            }
            for cue in &snapshot.audio {
                match cue {
                    AudioCue::LightHit => light_hits += 1,
                    AudioCue::HeavyHit => heavy_hits += 1,
                    AudioCue::Knockout => knockouts += 1,
                    _ => {}
                }
            }

            if snapshot.outcome.is_some() {
                break;
            }
            if snapshot.tick - round_started_at > ROUND_TICK_SAFETY {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    "round tick safety limit exceeded".to_string(),
                );
                reason = ScenarioReason::Draw;
                break 'rounds;
            }
        }
    }

    let final_snapshot = engine.build_snapshot(false);
    let left_wins = final_snapshot.fighters[0].score;
    let right_wins = final_snapshot.fighters[1].score;

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            left: scenario.left,
            right: scenario.right,
            rounds: scenario.rounds,
            difficulty: scenario.difficulty,
            reason,
            left_wins,
            right_wins,
            duration_ms: last_tick * 1000 / TICK_RATE as u64,
            light_hits,
            heavy_hits,
            knockouts,
            max_combo,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !snapshot.slow_mo.is_finite() || snapshot.slow_mo <= 0.0 || snapshot.slow_mo > 1.0 {
        anomalies.push(format!("invalid slow-mo factor: {}", snapshot.slow_mo));
    }
    if !snapshot.shake.is_finite() || snapshot.shake < 0.0 {
        anomalies.push(format!("invalid shake magnitude: {}", snapshot.shake));
    }
    if snapshot.fighters.len() != 2 {
        anomalies.push(format!("invalid fighter count: {}", snapshot.fighters.len()));
    }

    for (idx, fighter) in snapshot.fighters.iter().enumerate() {
        if !fighter.x.is_finite() || !fighter.y.is_finite() {
            anomalies.push(format!("fighter {idx} position is not finite"));
        } else if fighter.x.abs() > WORLD_HALF_WIDTH {
            anomalies.push(format!("fighter {idx} escaped the arena: x={}", fighter.x));
        }
        if !fighter.health.is_finite()
            || fighter.health < 0.0
            || fighter.health > fighter.max_health
        {
            anomalies.push(format!(
                "fighter {idx} health out of range: {}/{}",
                fighter.health, fighter.max_health
            ));
        }
        if fighter.dead && fighter.health > 0.0 {
            anomalies.push(format!(
                "fighter {idx} is dead with positive health: {}",
                fighter.health
            ));
        }
        if fighter.combo_count > 2 {
            anomalies.push(format!(
                "fighter {idx} combo count out of range: {}",
                fighter.combo_count
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| u64::from(rand::random::<u32>())));
    let difficulty = cli.difficulty.unwrap_or(0.7).clamp(0.0, 1.0);
    let rounds = cli.rounds.unwrap_or(3).clamp(1, 99);

    if cli.single || cli.left.is_some() || cli.right.is_some() {
        let left = cli
            .left
            .as_deref()
            .and_then(Archetype::parse)
            .unwrap_or(Archetype::Phantom);
        let right = cli
            .right
            .as_deref()
            .and_then(Archetype::parse)
            .unwrap_or(Archetype::Warlock);
        return vec![Scenario {
            name: format!("custom-{left:?}-vs-{right:?}").to_lowercase(),
            left,
            right,
            rounds,
            difficulty,
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-check-phantom-warlock".to_string(),
            left: Archetype::Phantom,
            right: Archetype::Warlock,
            rounds,
            difficulty,
            seed,
        },
        Scenario {
            name: "balance-check-meteor-grappler".to_string(),
            left: Archetype::Meteor,
            right: Archetype::Grappler,
            rounds,
            difficulty,
            seed: normalize_seed(u64::from(seed) + 1),
        },
    ]
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

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("duel-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
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
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn scenario_reason_key(reason: ScenarioReason) -> String {
    match reason {
        ScenarioReason::Decided => "decided",
        ScenarioReason::Draw => "draw",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
