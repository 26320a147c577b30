use chrono::NaiveDate;
use playerpulse_core::{
    DurationModel, HourModel, NormalizedRecord, SessionRng, SessionSynthesizer, SimulationConfig,
    rank_popularity, synthesize_sessions,
};
use std::collections::BTreeMap;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 10_000;
// Chi-squared critical value for df = 2 at p = 0.001.
const CHI_SQUARED_DF2: f64 = 13.82;

fn as_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).expect("count fits u32"))
}

fn scenario_table() -> playerpulse_core::PopularityTable {
    rank_popularity(
        [("Game A", 950), ("Game B", 500), ("Game C", 50)]
            .into_iter()
            .map(|(name, peak_players)| NormalizedRecord {
                name: name.to_string(),
                peak_players,
            }),
    )
}

fn plan(seed: u64) -> playerpulse_core::SynthesisPlan {
    SimulationConfig {
        num_users: 100,
        target_session_count: SAMPLE_SIZE,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        simulation_days: 28,
        seed,
        ..SimulationConfig::default()
    }
    .plan()
}

#[test]
fn game_frequencies_follow_rank_weights() {
    let table = scenario_table();
    let synthesizer = SessionSynthesizer::new(&table, &plan(7)).expect("synthesizer");
    let mut rng = SessionRng::for_stream(7, "acceptance");

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for _ in 0..SAMPLE_SIZE {
        *counts
            .entry(synthesizer.draw_game(&mut rng).to_string())
            .or_default() += 1;
    }

    let total_rank: u32 = table.entries().iter().map(|entry| entry.rank).sum();
    let chi_squared: f64 = table
        .entries()
        .iter()
        .map(|entry| {
            let expected = as_f64(SAMPLE_SIZE) * f64::from(entry.rank) / f64::from(total_rank);
            let observed = as_f64(counts.get(&entry.name).copied().unwrap_or_default());
            (observed - expected).powi(2) / expected
        })
        .sum();
    assert!(
        chi_squared < CHI_SQUARED_DF2,
        "rank weighting drifted: chi^2 = {chi_squared:.3}, counts {counts:?}"
    );
    assert!(counts["Game A"] > counts["Game B"]);
    assert!(counts["Game B"] > counts["Game C"]);
}

#[test]
fn start_hours_follow_weekday_and_weekend_models() {
    let sessions = synthesize_sessions(&scenario_table(), &plan(11)).expect("sessions");
    let mut weekday = Vec::new();
    let mut weekend = Vec::new();
    for session in &sessions {
        let hour = session.hour_of_day.expect("hour present");
        assert!(hour <= 23);
        match session.day_of_week.as_str() {
            "Saturday" | "Sunday" => weekend.push(hour),
            _ => weekday.push(hour),
        }
    }

    let mean =
        |hours: &[u32]| hours.iter().map(|&h| f64::from(h)).sum::<f64>() / as_f64(hours.len());
    let weekday_mean = mean(&weekday);
    let weekend_mean = mean(&weekend);
    assert!(
        (17.8..=19.2).contains(&weekday_mean),
        "weekday mean hour {weekday_mean:.2}"
    );
    assert!(
        (17.3..=18.4).contains(&weekend_mean),
        "weekend mean hour {weekend_mean:.2}"
    );
    assert!(weekend.iter().all(|h| (12..=23).contains(h)));

    // 8 of the 28 days starting on a Monday fall on a weekend.
    let weekend_share = as_f64(weekend.len()) / as_f64(sessions.len());
    assert!(
        (weekend_share - 8.0 / 28.0).abs() < 0.03,
        "weekend share {weekend_share:.3}"
    );
}

#[test]
fn durations_are_log_normal_and_clamped() {
    let sampler = DurationModel::default().sampler().expect("duration sampler");
    let mut rng = SessionRng::for_stream(3, "durations");
    let mut minutes: Vec<i64> = (0..SAMPLE_SIZE).map(|_| sampler.sample(&mut rng)).collect();
    assert!(minutes.iter().all(|m| (15..=600).contains(m)));

    let at_floor = minutes.iter().filter(|&&m| m == 15).count();
    let floor_share = as_f64(at_floor) / as_f64(SAMPLE_SIZE);
    assert!(
        (0.12..=0.19).contains(&floor_share),
        "share clamped to the floor {floor_share:.3}"
    );

    minutes.sort_unstable();
    let median = minutes[SAMPLE_SIZE / 2];
    assert!((38..=52).contains(&median), "median duration {median}");
}

#[test]
fn weekday_hours_saturate_instead_of_wrapping() {
    let sampler = HourModel {
        weekday_mean: 23.0,
        weekday_std_dev: 6.0,
        ..HourModel::default()
    }
    .sampler()
    .expect("hour sampler");
    let mut rng = SessionRng::for_stream(5, "hours");
    let hours: Vec<u32> = (0..SAMPLE_SIZE).map(|_| sampler.sample(false, &mut rng)).collect();
    assert!(hours.iter().all(|&h| h <= 23));
    let top = hours.iter().filter(|&&h| h == 23).count();
    assert!(as_f64(top) / as_f64(SAMPLE_SIZE) > 0.4);
}
