use analysis_core::{AnalysisError, MovingAverageSeries, PriceSeries, SlopeClassification};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let window = &data[i + 1 - period..=i];
        // Summing deviations from the first close keeps a flat window exact.
        let anchor = window[0];
        let deviation: f64 = window.iter().map(|x| x - anchor).sum();
        result.push(anchor + deviation / period as f64);
    }
    result
}

/// SMA of the closes of a series. Too little history yields an empty series.
pub fn compute_sma(series: &PriceSeries, period: usize) -> MovingAverageSeries {
    MovingAverageSeries {
        period,
        values: sma(&series.closes(), period),
    }
}

/// Classify the direction of a moving average.
///
/// Compares the latest value with the value `lookback` observations earlier.
/// A relative change above `tolerance_pct` percent is rising, below its
/// negative is falling, anything in between is flat.
pub fn classify_slope(
    ma: &MovingAverageSeries,
    lookback: usize,
    tolerance_pct: f64,
) -> Result<SlopeClassification, AnalysisError> {
    let (latest, base) = match (ma.latest(), ma.back(lookback)) {
        (Some(latest), Some(base)) => (latest, base),
        _ => {
            return Err(AnalysisError::InsufficientData(format!(
                "slope of {}-period average needs {} values, have {}",
                ma.period,
                lookback + 1,
                ma.len()
            )))
        }
    };

    if base == 0.0 {
        return Err(AnalysisError::InvalidData(
            "moving average base value is zero".to_string(),
        ));
    }

    let change_pct = (latest - base) / base * 100.0;
    let slope = if change_pct > tolerance_pct {
        SlopeClassification::Rising
    } else if change_pct < -tolerance_pct {
        SlopeClassification::Falling
    } else {
        SlopeClassification::Flat
    };

    Ok(slope)
}
