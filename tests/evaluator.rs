use ultrasafe::classify::{Side, Tier};
use ultrasafe::evaluator::{MatchEvaluator, MatchInput};
use ultrasafe::exclusion::ExclusionFlag;
use ultrasafe::season_blend::{BlendMode, SeasonPhase};
use ultrasafe::stats::{SeasonStatsStore, TeamSeasonStats};
use ultrasafe::thresholds::ThresholdConfig;
use ultrasafe::EngineError;

fn team(team_id: u32, season: u16, games: u32, gf: f64, ga: f64) -> TeamSeasonStats {
    TeamSeasonStats {
        team_id,
        season,
        team_name: Some(format!("Team {team_id}")),
        league_id: Some(61),
        games_played: games,
        gf_avg: gf,
        ga_avg: ga,
        win_rate: 0.45,
        goal_diff: gf - ga,
        defense_rate: 0.35,
        attack_rate: 0.75,
        fail_rate: 0.25,
        clean_sheet_rate: 0.35,
        over15_rate: None,
    }
}

#[test]
fn two_open_teams_are_ultrasafe_over() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 18, 2.3, 0.9));
    store.insert(team(1, 2024, 34, 2.3, 0.9));
    store.insert(team(2, 2025, 16, 2.1, 1.1));

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).expect("both teams known");

    assert_eq!(v.phase_a, SeasonPhase::Advanced);
    assert_eq!(v.phase_b, SeasonPhase::CurrentOnly);
    assert!(v.flags.is_empty());
    assert!((v.o15i - 0.9975).abs() < 1e-9);
    assert_eq!(v.goal.tier, Tier::UltraSafe);
    assert_eq!(v.goal.label(), "UltraSafe +1.5");
    assert!((v.goal.reliability - 0.9975).abs() < 1e-9);
}

#[test]
fn identical_teams_have_no_result_pick() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 20, 1.4, 1.2));
    store.insert(team(2, 2025, 20, 1.4, 1.2));

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();

    assert_eq!(v.rsi_a, 0.0);
    assert_eq!(v.result.tier, Tier::Avoid);
    assert!(v.result.side.is_none());
    assert_eq!(v.result.label(), "Éviter");
}

#[test]
fn low_sample_vetoes_even_an_extreme_over() {
    let mut store = SeasonStatsStore::new();
    let mut a = team(1, 2025, 5, 2.5, 1.5);
    a.over15_rate = Some(0.95);
    let mut b = team(2, 2025, 5, 2.4, 1.4);
    b.over15_rate = Some(0.95);
    store.insert(a);
    store.insert(b);

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();

    assert!(v.flags.contains(&ExclusionFlag::EchantillonFaible));
    assert!(v.o15i > 0.99);
    assert_eq!(v.goal.label(), "Éviter +1.5");
    assert!(v.goal.filtered);
    assert!(!v.result.is_pick());
    assert!(!v.has_pick());
}

#[test]
fn previous_season_rescues_a_short_current_sample() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 3, 1.8, 0.8));
    store.insert(team(1, 2024, 38, 1.8, 0.8));
    store.insert(team(2, 2025, 3, 1.6, 1.0));
    store.insert(team(2, 2024, 38, 1.6, 1.0));

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert_eq!(v.phase_a, SeasonPhase::Early);
    assert!(!v.flags.contains(&ExclusionFlag::EchantillonFaible));
}

#[test]
fn strong_home_side_gets_a_or_draw() {
    let mut store = SeasonStatsStore::new();
    let mut a = team(1, 2025, 20, 2.0, 0.8);
    a.win_rate = 0.85;
    a.defense_rate = 0.6;
    a.attack_rate = 0.95;
    a.fail_rate = 0.05;
    a.clean_sheet_rate = 0.6;
    let mut b = team(2, 2025, 20, 1.0, 1.6);
    b.win_rate = 0.10;
    b.defense_rate = 0.05;
    b.attack_rate = 0.55;
    b.fail_rate = 0.45;
    b.clean_sheet_rate = 0.05;
    store.insert(a);
    store.insert(b);

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert!(v.flags.is_empty(), "flags: {}", v.flags_label());
    assert_eq!(v.result.tier, Tier::UltraSafe);
    assert_eq!(v.result.side, Some(Side::A));
    assert_eq!(v.result.label(), "UltraSafe A ou Nul");

    let swapped = eval.evaluate(&MatchInput::new(1, 2).swapped()).unwrap();
    assert_eq!(swapped.result.side, Some(Side::B));
    assert_eq!(swapped.rsi_a, -v.rsi_a);
    assert_eq!(swapped.o15i, v.o15i);
}

#[test]
fn large_level_gap_is_flagged_not_picked() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 20, 3.2, 0.4));
    store.insert(team(2, 2025, 20, 0.6, 1.9));

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert!(v.flags.contains(&ExclusionFlag::GapNiveauSuspect));
    assert!(!v.has_pick());
    assert!(v.rsi_a > 0.0);
}

#[test]
fn division_change_comes_from_the_store() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 20, 1.5, 1.1));
    let mut promoted = team(1, 2024, 38, 1.9, 0.8);
    promoted.league_id = Some(62);
    store.insert(promoted);
    store.insert(team(2, 2025, 20, 1.4, 1.2));

    let with =
        MatchEvaluator::new(&store, ThresholdConfig::default(), 2025).with_divisions(&store);
    let v = with.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert!(v.flags.contains(&ExclusionFlag::MelangeDivisions));

    let without = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    let v = without.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert!(!v.flags.contains(&ExclusionFlag::MelangeDivisions));
}

#[test]
fn rerun_is_byte_identical() {
    let mut store = SeasonStatsStore::new();
    for id in 1..=6u32 {
        store.insert(team(id, 2025, 10 + id, 1.0 + id as f64 * 0.15, 1.6 - id as f64 * 0.1));
        store.insert(team(id, 2024, 38, 1.2, 1.2));
    }
    let inputs: Vec<MatchInput> = vec![
        MatchInput::new(1, 2),
        MatchInput::new(3, 4),
        MatchInput::new(5, 6),
        MatchInput::new(6, 1),
    ];
    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);

    let first = serde_json::to_string(
        &eval
            .evaluate_batch(&inputs)
            .into_iter()
            .collect::<Result<Vec<_>, EngineError>>()
            .unwrap(),
    )
    .unwrap();
    let second = serde_json::to_string(
        &eval
            .evaluate_batch(&inputs)
            .into_iter()
            .collect::<Result<Vec<_>, EngineError>>()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(first, second);
}

#[test]
fn preseason_mode_uses_last_season() {
    let mut store = SeasonStatsStore::new();
    store.insert(team(1, 2025, 0, 0.0, 0.0));
    store.insert(team(1, 2024, 38, 1.7, 1.1));
    store.insert(team(2, 2025, 0, 0.0, 0.0));
    store.insert(team(2, 2024, 38, 1.5, 1.3));

    let eval = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025)
        .with_mode(BlendMode::PreSeason);
    let v = eval.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert_eq!(v.phase_a, SeasonPhase::PreSeason);
    let open_a = 1.7 + 1.1;
    let open_b = 1.5 + 1.3;
    let want = 1.0 - (1.0 - open_a / 3.0) * (1.0 - open_b / 3.0);
    assert!((v.o15i - want).abs() < 1e-9);
    assert!(v.flags.is_empty());
}

#[test]
fn preseason_evaluates_teams_known_only_from_last_season() {
    let lines = "\
{\"team_id\":1,\"league_id\":61,\"stats\":{\"played_total\":34,\"wins_total\":18,\"gf_avg\":1.9,\"ga_avg\":0.9}}
{\"team_id\":2,\"league_id\":61,\"stats\":{\"played_total\":34,\"wins_total\":11,\"gf_avg\":1.4,\"ga_avg\":1.3}}
";
    let mut store = SeasonStatsStore::new();
    let summary = store.extend_from_reader(lines.as_bytes(), 2024).unwrap();
    assert_eq!(summary.loaded, 2);

    let standard = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025);
    assert_eq!(
        standard.evaluate(&MatchInput::new(1, 2)).unwrap_err(),
        EngineError::MissingData {
            team_id: 1,
            season: 2025
        }
    );

    let preseason = MatchEvaluator::new(&store, ThresholdConfig::default(), 2025)
        .with_divisions(&store)
        .with_mode(BlendMode::PreSeason);
    let v = preseason.evaluate(&MatchInput::new(1, 2)).unwrap();
    assert_eq!(v.phase_a, SeasonPhase::PreSeason);
    assert_eq!(v.phase_b, SeasonPhase::PreSeason);
    assert!(v.flags.is_empty(), "flags: {}", v.flags_label());
    let want = 1.0 - (1.0 - 2.8 / 3.0) * (1.0 - 2.7 / 3.0);
    assert!((v.o15i - want).abs() < 1e-9);
    assert_eq!(v.goal.label(), "UltraSafe +1.5");
    assert!(v.rsi_a > 0.0);
}
