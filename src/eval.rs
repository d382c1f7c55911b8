//! Evaluation harness: per-scenario statistics comparing the planner
//! against `N` random baselines, a 108-scenario test matrix, and
//! multi-run aggregate statistics.
//!
//! Grounded on `original_source/evaluation/evaluate.py`,
//! `comprehensive_test.py`, `multi_run_test.py`, and `test_data.py`.
//! The baseline fan-out and scenario-matrix fan-out both use rayon, per
//! spec section 5's embarrassingly-parallel concurrency model.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::errors::PlannerError;
use crate::geo::TransportMode;
use crate::metrics::{self, Scores};
use crate::place::{self, Place};
use crate::{self as planner};

const METRIC_NAMES: [&str; 5] = ["distance", "time_window", "distribution", "clustering", "total"];

fn metric_value(scores: &Scores, name: &str) -> f64 {
    match name {
        "distance" => scores.distance,
        "time_window" => scores.time_window,
        "distribution" => scores.distribution,
        "clustering" => scores.clustering,
        "total" => scores.total,
        _ => unreachable!("unknown metric name {name}"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileStats {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Significance {
    pub z_score: f64,
    pub is_significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvaluation {
    pub scenario: String,
    pub num_places: usize,
    pub duration_days: u32,
    pub transport_mode: TransportMode,
    pub algorithm_scores: Scores,
    pub random_stats: BTreeMap<String, MetricStats>,
    pub percentiles: BTreeMap<String, PercentileStats>,
    pub ranking_percentile: BTreeMap<String, f64>,
    pub statistical_significance: BTreeMap<String, Significance>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator), matching Python's
/// `statistics.stdev`; 0 for fewer than two samples.
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (n denominator) — used for the
/// multi-run aggregate, distinct from the per-scenario sample stdev
/// above, matching numpy's default `ddof=0`.
fn population_stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear-interpolation percentile, matching `numpy.percentile`'s default.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn splitmix_derive(seed: u64, index: u64) -> u64 {
    seed ^ index.wrapping_mul(0x9E3779B97F4A7C15)
}

/// Runs the planner once and `num_random_solutions` independent baselines
/// over the same places, then computes the full statistics contract from
/// spec section 4.E.
pub fn evaluate_scenario(
    scenario_name: &str,
    places: &[Place],
    days: u32,
    mode: TransportMode,
    num_random_solutions: usize,
    config: &PlannerConfig,
    seed: u64,
) -> Result<ScenarioEvaluation, PlannerError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let planner::PlanResult { schedule, .. } = planner::plan_schedule(places, days, mode, config, &mut rng)?;
    let algorithm_scores = metrics::score_schedule(&schedule, config);

    let mut normalize_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let (normalized, lodging) = place::normalize(places, &mut normalize_rng)?;

    let random_scores: Vec<Scores> = (0..num_random_solutions)
        .into_par_iter()
        .map(|i| {
            let mut worker_rng = StdRng::seed_from_u64(splitmix_derive(seed, i as u64));
            let baseline_schedule = crate::baseline::generate(&normalized, &lodging, days, mode, config, &mut worker_rng);
            metrics::score_schedule(&baseline_schedule, config)
        })
        .collect();

    let mut random_stats = BTreeMap::new();
    let mut percentiles = BTreeMap::new();
    let mut ranking_percentile = BTreeMap::new();
    let mut statistical_significance = BTreeMap::new();

    for name in METRIC_NAMES {
        let mut values: Vec<f64> = random_scores.iter().map(|s| metric_value(s, name)).collect();
        if values.is_empty() {
            continue;
        }
        let algo_value = metric_value(&algorithm_scores, name);

        let std_dev = sample_stdev(&values);
        random_stats.insert(
            name.to_string(),
            MetricStats {
                mean: mean(&values),
                std_dev,
                min: values.iter().cloned().fold(f64::INFINITY, f64::min),
                max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            },
        );

        let below = values.iter().filter(|v| **v < algo_value).count();
        ranking_percentile.insert(name.to_string(), 100.0 * below as f64 / values.len() as f64);

        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        percentiles.insert(
            name.to_string(),
            PercentileStats {
                p25: percentile(&values, 25.0),
                p50: percentile(&values, 50.0),
                p75: percentile(&values, 75.0),
            },
        );

        if std_dev > 0.0 {
            let z = (algo_value - mean(&values)) / std_dev;
            statistical_significance.insert(
                name.to_string(),
                Significance {
                    z_score: z,
                    is_significant: z.abs() > config.significance_z_threshold,
                },
            );
        }
    }

    Ok(ScenarioEvaluation {
        scenario: scenario_name.to_string(),
        num_places: places.len(),
        duration_days: days,
        transport_mode: mode,
        algorithm_scores,
        random_stats,
        percentiles,
        ranking_percentile,
        statistical_significance,
    })
}

/// Test-fixture generator for the 108-scenario matrix, grounded on
/// `original_source/evaluation/test_data.py::TestDataGenerator`.
pub struct ScenarioSpec {
    pub name: String,
    pub places: Vec<Place>,
    pub duration_days: u32,
    pub transport_mode: TransportMode,
}

const CITY_CENTERS: [(&str, f64, f64); 4] = [
    ("Paris", 48.8566, 2.3522),
    ("London", 51.5074, -0.1278),
    ("Tokyo", 35.6762, 139.6503),
    ("New York", 40.7128, -74.0060),
];

const SIZE_CONFIGS: [(&str, usize, usize); 3] = [("small", 3, 2), ("medium", 8, 4), ("large", 15, 6)];
const DURATION_CONFIGS: [(&str, u32, u32); 3] = [("short", 1, 2), ("medium", 3, 5), ("long", 6, 8)];
const TRANSPORT_MODES: [TransportMode; 3] = [TransportMode::Walking, TransportMode::Transit, TransportMode::Driving];

fn jittered_location(center: (f64, f64), radius: f64, rng: &mut impl Rng) -> (f64, f64) {
    let dlat = rng.gen_range(-radius..=radius);
    let dlng = rng.gen_range(-radius..=radius);
    (center.0 + dlat, center.1 + dlng)
}

fn generate_hotel(center: (f64, f64), rng: &mut impl Rng) -> Place {
    let (lat, lng) = jittered_location(center, 0.01, rng);
    Place {
        place_id: Some(format!("hotel_{lat}_{lng}")),
        name: Some(format!("Hotel in {lat}, {lng}")),
        types: vec!["lodging".to_string(), "hotel".to_string()],
        rating: Some(rng.gen_range(3.5..=5.0)),
        user_ratings_total: Some(rng.gen_range(100..=5000)),
        price_level: Some(rng.gen_range(2..=4)),
        geometry: Some(place::Geometry {
            location: place::LatLng { lat, lng },
        }),
        location: None,
    }
}

fn generate_attraction(center: (f64, f64), rng: &mut impl Rng) -> Place {
    let (lat, lng) = jittered_location(center, 0.02, rng);
    let types = [
        vec!["tourist_attraction".to_string(), "point_of_interest".to_string()],
        vec!["museum".to_string(), "tourist_attraction".to_string()],
        vec!["park".to_string(), "point_of_interest".to_string()],
    ];
    let chosen = types[rng.gen_range(0..types.len())].clone();
    Place {
        place_id: Some(format!("attr_{lat}_{lng}")),
        name: Some(format!("Attraction at {lat}, {lng}")),
        types: chosen,
        rating: Some(rng.gen_range(3.5..=5.0)),
        user_ratings_total: Some(rng.gen_range(1000..=50000)),
        price_level: Some(rng.gen_range(1..=3)),
        geometry: Some(place::Geometry {
            location: place::LatLng { lat, lng },
        }),
        location: None,
    }
}

fn generate_restaurant(center: (f64, f64), rng: &mut impl Rng) -> Place {
    let (lat, lng) = jittered_location(center, 0.015, rng);
    Place {
        place_id: Some(format!("rest_{lat}_{lng}")),
        name: Some(format!("Restaurant at {lat}, {lng}")),
        types: vec!["restaurant".to_string(), "food".to_string(), "point_of_interest".to_string()],
        rating: Some(rng.gen_range(3.5..=5.0)),
        user_ratings_total: Some(rng.gen_range(100..=3000)),
        price_level: Some(rng.gen_range(1..=4)),
        geometry: Some(place::Geometry {
            location: place::LatLng { lat, lng },
        }),
        location: None,
    }
}

fn generate_scenario_places(center: (f64, f64), num_attractions: usize, num_restaurants: usize, rng: &mut impl Rng) -> Vec<Place> {
    let mut places = vec![generate_hotel(center, rng)];
    for _ in 0..num_attractions {
        places.push(generate_attraction(center, rng));
    }
    for _ in 0..num_restaurants {
        places.push(generate_restaurant(center, rng));
    }
    places
}

/// The full 4 cities x 3 sizes x 3 durations x 3 modes = 108 scenario
/// matrix, with a per-scenario randomly sampled day count.
pub fn generate_test_suite(rng: &mut impl Rng) -> Vec<ScenarioSpec> {
    let mut scenarios = Vec::with_capacity(108);
    for (city, lat, lng) in CITY_CENTERS {
        for (size_name, num_attr, num_rest) in SIZE_CONFIGS {
            for (duration_name, min_days, max_days) in DURATION_CONFIGS {
                for mode in TRANSPORT_MODES {
                    let days = rng.gen_range(min_days..=max_days);
                    let places = generate_scenario_places((lat, lng), num_attr, num_rest, rng);
                    let mode_name = match mode {
                        TransportMode::Walking => "walking",
                        TransportMode::Transit => "transit",
                        TransportMode::Driving => "driving",
                    };
                    scenarios.push(ScenarioSpec {
                        name: format!("{city}_{size_name}_{duration_name}_{mode_name}"),
                        places,
                        duration_days: days,
                        transport_mode: mode,
                    });
                }
            }
        }
    }
    scenarios
}

pub const EXPECTED_SCENARIO_COUNT: usize = 108;

/// Per-category slice of the matrix-wide success rates, per spec section
/// 4.E's "broken down overall, per transport mode, and per observed
/// place-count size bucket".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSummary {
    pub count: usize,
    pub better_than_random_rate: f64,
    pub significantly_better_rate: f64,
}

fn rate_summary(evals: &[&ScenarioEvaluation]) -> RateSummary {
    let count = evals.len().max(1);
    let better = evals
        .iter()
        .filter(|e| e.ranking_percentile.get("total").is_some_and(|p| *p > 50.0))
        .count();
    let significant = evals
        .iter()
        .filter(|e| e.ranking_percentile.get("total").is_some_and(|p| *p > 90.0))
        .count();
    RateSummary {
        count: evals.len(),
        better_than_random_rate: better as f64 / count as f64,
        significantly_better_rate: significant as f64 / count as f64,
    }
}

/// Observed place-count size bucket, independent of the nominal bucket
/// (`small`/`medium`/`large`) that generated the scenario, per spec section
/// 4.E.
fn observed_size_bucket(num_places: usize) -> &'static str {
    if num_places <= 8 {
        "small"
    } else if num_places <= 15 {
        "medium"
    } else {
        "large"
    }
}

fn mode_name(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Walking => "walking",
        TransportMode::Transit => "transit",
        TransportMode::Driving => "driving",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixReport {
    pub evaluated: Vec<ScenarioEvaluation>,
    pub failed: Vec<(String, String)>,
    pub expected_count: usize,
    pub missing: Vec<String>,
    pub missing_by_size: BTreeMap<String, usize>,
    pub better_than_random_rate: f64,
    pub significantly_better_rate: f64,
    pub by_transport_mode: BTreeMap<String, RateSummary>,
    pub by_place_count_size: BTreeMap<String, RateSummary>,
}

/// Runs the full scenario matrix once, fanned out across scenarios with
/// rayon per spec section 5.
pub fn run_scenario_matrix(seed: u64, num_random_solutions: usize, config: &PlannerConfig) -> MatrixReport {
    let mut suite_rng = StdRng::seed_from_u64(seed);
    let scenarios = generate_test_suite(&mut suite_rng);

    let results: Vec<(String, Result<ScenarioEvaluation, PlannerError>)> = scenarios
        .into_par_iter()
        .enumerate()
        .map(|(i, scenario)| {
            let scenario_seed = splitmix_derive(seed, i as u64 + 1);
            let result = evaluate_scenario(
                &scenario.name,
                &scenario.places,
                scenario.duration_days,
                scenario.transport_mode,
                num_random_solutions,
                config,
                scenario_seed,
            );
            (scenario.name, result)
        })
        .collect();

    let mut evaluated = Vec::new();
    let mut failed = Vec::new();
    for (name, result) in results {
        match result {
            Ok(eval) => evaluated.push(eval),
            Err(err) => {
                log::error!("scenario {name} failed: {err}");
                failed.push((name, err.to_string()));
            }
        }
    }

    let expected_names: std::collections::HashSet<String> = {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_test_suite(&mut rng).into_iter().map(|s| s.name).collect()
    };
    let seen: std::collections::HashSet<String> = evaluated
        .iter()
        .map(|e| e.scenario.clone())
        .chain(failed.iter().map(|(n, _)| n.clone()))
        .collect();
    let missing: Vec<String> = expected_names.difference(&seen).cloned().collect();

    let mut missing_by_size: BTreeMap<String, usize> = BTreeMap::new();
    for name in &missing {
        let nominal_size = name.split('_').nth(1).unwrap_or("unknown").to_string();
        *missing_by_size.entry(nominal_size).or_insert(0) += 1;
    }

    let overall = rate_summary(&evaluated.iter().collect::<Vec<_>>());

    let mut by_transport_mode: BTreeMap<String, RateSummary> = BTreeMap::new();
    for mode in TRANSPORT_MODES {
        let subset: Vec<&ScenarioEvaluation> = evaluated.iter().filter(|e| e.transport_mode == mode).collect();
        if !subset.is_empty() {
            by_transport_mode.insert(mode_name(mode).to_string(), rate_summary(&subset));
        }
    }

    let mut by_place_count_size: BTreeMap<String, RateSummary> = BTreeMap::new();
    for bucket in ["small", "medium", "large"] {
        let subset: Vec<&ScenarioEvaluation> = evaluated
            .iter()
            .filter(|e| observed_size_bucket(e.num_places) == bucket)
            .collect();
        if !subset.is_empty() {
            by_place_count_size.insert(bucket.to_string(), rate_summary(&subset));
        }
    }

    MatrixReport {
        better_than_random_rate: overall.better_than_random_rate,
        significantly_better_rate: overall.significantly_better_rate,
        evaluated,
        failed,
        expected_count: EXPECTED_SCENARIO_COUNT,
        missing,
        missing_by_size,
        by_transport_mode,
        by_place_count_size,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiRunStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

fn summarize_rates(mut values: Vec<f64>) -> MultiRunStats {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    MultiRunStats {
        min: *values.first().unwrap_or(&0.0),
        max: *values.last().unwrap_or(&0.0),
        mean: mean(&values),
        median: percentile(&values, 50.0),
        std: population_stdev(&values),
    }
}

/// Repeats the full scenario matrix `runs` times and reports
/// min/max/mean/median/std of the per-run success rates, per spec
/// section 4.E's multi-run mode.
pub fn run_multi(runs: u32, base_seed: u64, num_random_solutions: usize, config: &PlannerConfig) -> (MultiRunStats, MultiRunStats) {
    let mut better_rates = Vec::with_capacity(runs as usize);
    let mut significant_rates = Vec::with_capacity(runs as usize);

    for run in 0..runs {
        let report = run_scenario_matrix(splitmix_derive(base_seed, run as u64), num_random_solutions, config);
        better_rates.push(report.better_than_random_rate);
        significant_rates.push(report.significantly_better_rate);
    }

    (summarize_rates(better_rates), summarize_rates(significant_rates))
}
