use analysis_core::{AnalysisError, PriceObservation, PriceSeries};

/// Highest close among the trailing `window` observations, current day included.
pub fn period_high(series: &PriceSeries, window: usize) -> Option<f64> {
    trailing(series, window)
        .iter()
        .map(|o| o.close)
        .fold(None, |high: Option<f64>, close| {
            Some(high.map_or(close, |h| h.max(close)))
        })
}

/// Percentage decline of the latest close from the trailing high.
///
/// Fails with `InsufficientData` when the window holds fewer than
/// `min_observations` closes. The result is in `[0, 100)`.
pub fn compute_drawdown(
    series: &PriceSeries,
    window: usize,
    min_observations: usize,
) -> Result<f64, AnalysisError> {
    let required = min_observations.max(1);
    let recent = trailing(series, window);
    if recent.len() < required {
        return Err(AnalysisError::InsufficientData(format!(
            "drawdown over {} days needs {} observations, have {}",
            window,
            required,
            recent.len()
        )));
    }

    let current = recent[recent.len() - 1].close;
    let high = recent.iter().map(|o| o.close).fold(current, f64::max);

    if high <= current {
        return Ok(0.0);
    }
    Ok((high - current) / high * 100.0)
}

/// Largest absolute close-to-close move, in percent, over the trailing `days` moves.
pub fn max_daily_move_pct(series: &PriceSeries, days: usize) -> Result<f64, AnalysisError> {
    if days == 0 || series.len() < days + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "{} daily moves need {} observations, have {}",
            days,
            days + 1,
            series.len()
        )));
    }

    let recent = trailing(series, days + 1);
    let max_move = recent
        .windows(2)
        .map(|pair| ((pair[1].close - pair[0].close) / pair[0].close).abs() * 100.0)
        .fold(0.0, f64::max);

    Ok(max_move)
}

/// True when none of the trailing `days` moves exceeds `ceiling_pct`.
pub fn is_stable(series: &PriceSeries, days: usize, ceiling_pct: f64) -> Result<bool, AnalysisError> {
    max_daily_move_pct(series, days).map(|max_move| max_move <= ceiling_pct)
}

fn trailing(series: &PriceSeries, window: usize) -> &[PriceObservation] {
    let obs = series.observations();
    &obs[obs.len().saturating_sub(window)..]
}
