use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ultrasafe::classify::{classify_goal, classify_result};
use ultrasafe::evaluator::{MatchEvaluator, MatchInput};
use ultrasafe::fixtures::parse_matches_json;
use ultrasafe::stats::{SeasonStatsStore, TeamSeasonStats};
use ultrasafe::thresholds::ThresholdConfig;

const TEAMS: u32 = 400;

fn synthetic_team(team_id: u32, season: u16) -> TeamSeasonStats {
    let t = f64::from(team_id % 37) / 37.0;
    let gf = 0.8 + 1.6 * t;
    let ga = 2.0 - 1.2 * t;
    TeamSeasonStats {
        team_id,
        season,
        team_name: Some(format!("Club {team_id}")),
        league_id: Some(61 + team_id % 5),
        games_played: if season == 2025 { 4 + team_id % 30 } else { 38 },
        gf_avg: gf,
        ga_avg: ga,
        win_rate: 0.15 + 0.6 * t,
        goal_diff: gf - ga,
        defense_rate: 0.1 + 0.4 * t,
        attack_rate: 0.55 + 0.4 * t,
        fail_rate: 0.45 - 0.4 * t,
        clean_sheet_rate: 0.1 + 0.4 * t,
        over15_rate: if team_id % 3 == 0 { Some(0.5 + 0.45 * t) } else { None },
    }
}

fn synthetic_store() -> SeasonStatsStore {
    let mut store = SeasonStatsStore::new();
    for id in 1..=TEAMS {
        store.insert(synthetic_team(id, 2025));
        if id % 4 != 0 {
            store.insert(synthetic_team(id, 2024));
        }
    }
    store
}

fn synthetic_matches() -> Vec<MatchInput> {
    (1..=TEAMS)
        .step_by(2)
        .map(|id| MatchInput::new(id, id + 1))
        .collect()
}

fn bench_evaluate_batch(c: &mut Criterion) {
    let store = synthetic_store();
    let matches = synthetic_matches();
    let evaluator =
        MatchEvaluator::new(&store, ThresholdConfig::default(), 2025).with_divisions(&store);
    c.bench_function("evaluate_batch_200", |b| {
        b.iter(|| {
            let out = evaluator.evaluate_batch(black_box(&matches));
            black_box(out.len());
        })
    });
}

fn bench_evaluate_single(c: &mut Criterion) {
    let store = synthetic_store();
    let evaluator =
        MatchEvaluator::new(&store, ThresholdConfig::default(), 2025).with_divisions(&store);
    let input = MatchInput::new(17, 42);
    c.bench_function("evaluate_single", |b| {
        b.iter(|| {
            let v = evaluator.evaluate(black_box(&input)).unwrap();
            black_box(v.o15i);
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let cfg = ThresholdConfig::default();
    c.bench_function("classify_sweep", |b| {
        b.iter(|| {
            let mut picks = 0usize;
            for step in -100..=100 {
                let x = f64::from(step) / 100.0;
                if classify_goal(black_box(x.abs()), &cfg, false).is_pick() {
                    picks += 1;
                }
                if classify_result(black_box(x), &cfg, false).is_pick() {
                    picks += 1;
                }
            }
            black_box(picks);
        })
    });
}

fn bench_fixture_parse(c: &mut Criterion) {
    let fixtures: Vec<serde_json::Value> = (1..=TEAMS)
        .step_by(2)
        .map(|id| {
            serde_json::json!({
                "fixture_id": id,
                "league_id": 61,
                "home_team": {"id": id, "name": format!("Club {id}")},
                "away_team": {"id": id + 1, "name": format!("Club {}", id + 1)},
            })
        })
        .collect();
    let raw = serde_json::json!({ "fixtures": fixtures }).to_string();
    c.bench_function("fixture_parse_200", |b| {
        b.iter(|| {
            let parsed = parse_matches_json(black_box(&raw)).unwrap();
            black_box(parsed.len());
        })
    });
}

criterion_group!(
    benches,
    bench_evaluate_batch,
    bench_evaluate_single,
    bench_classify,
    bench_fixture_parse
);
criterion_main!(benches);
