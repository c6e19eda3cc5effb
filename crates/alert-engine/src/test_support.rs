//! Price series builders shared by the rule tests.

use analysis_core::{PriceObservation, PriceSeries};
use chrono::NaiveDate;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

pub fn series_from(symbol: &str, closes: &[f64]) -> PriceSeries {
    let obs = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceObservation::new(start_date() + chrono::Duration::days(i as i64), close))
        .collect();
    PriceSeries::new(symbol, obs).unwrap()
}

/// Steady climb from 15.00 to a 25.46 high, then a 20-day slide to 22.81.
pub fn drawdown_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..130).map(|i| 15.0 + (25.46 - 15.0) * i as f64 / 129.0).collect();
    closes.extend((1..=20).map(|i| 25.46 - (25.46 - 22.81) * i as f64 / 20.0));
    closes
}

/// Two identical 100-day cycles: a flat base followed by a 21-day bump that
/// peaks at 200.75 and eases back to `last`. The base is chosen so the
/// 100-day average sits at exactly 180 and never moves.
pub fn pullback_closes(last: f64) -> Vec<f64> {
    let up = (0..14).map(|i| 178.0 + (200.75 - 178.0) * i as f64 / 13.0);
    let down = (1..=7).map(|i| 200.75 + (last - 200.75) * i as f64 / 7.0);
    let bump: Vec<f64> = up.chain(down).collect();
    let base = (180.0 * 100.0 - bump.iter().sum::<f64>()) / 79.0;

    let mut cycle = vec![base; 79];
    cycle.extend(bump);
    cycle.repeat(2)
}

/// 120-day rise from 100 to 130 followed by a 60-day decline to 110.
/// The 50-day average drops below the 100-day average at observation 166.
pub fn crossover_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..120).map(|i| 100.0 + 30.0 * i as f64 / 119.0).collect();
    closes.extend((1..=60).map(|i| 130.0 - 20.0 * i as f64 / 60.0));
    closes
}
