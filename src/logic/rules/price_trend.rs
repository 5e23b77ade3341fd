use crate::logic::calculations::{linear_fit, mean, percent_change};
use crate::models::{round_to, PriceForecast, PriceObservation, PriceProjection};

/// Half-width of the projected range, as a fraction of the projection.
pub const RANGE_FRACTION: f64 = 0.08;

/// Latest production above this multiple of the trailing average flags overproduction.
pub const OVERPRODUCTION_RATIO: f64 = 1.2;

/// Periods averaged when judging the latest production figure.
pub const TRAILING_PERIODS: usize = 3;

/// Projects the price one period past the last observation with a least-squares line.
pub fn price_prediction(history: &[PriceObservation]) -> PriceForecast {
    let mut series = history.to_vec();
    series.sort_by_key(|o| o.period);

    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|o| (o.period as f64, o.price))
        .collect();

    let (fit, last) = match (linear_fit(&points), series.last()) {
        (Some(fit), Some(last)) => (fit, last),
        _ => {
            return PriceForecast::InsufficientHistory {
                observed: series.len(),
            }
        }
    };

    let projected_period = last.period + 1;
    let projected = fit.at(projected_period as f64).max(0.0);

    PriceForecast::Projected(PriceProjection {
        projected_period,
        projected_price: round_to(projected, 2),
        low: round_to((projected * (1.0 - RANGE_FRACTION)).max(0.0), 2),
        high: round_to(projected * (1.0 + RANGE_FRACTION), 2),
        pct_change: round_to(percent_change(last.price, projected).unwrap_or(0.0), 2),
        overproduction_risk: overproduction_risk(&series),
    })
}

/// Latest production against the average of up to three periods before it.
fn overproduction_risk(series: &[PriceObservation]) -> bool {
    let Some((latest, earlier)) = series.split_last() else {
        return false;
    };
    let Some(latest_production) = latest.production else {
        return false;
    };

    let trailing: Vec<f64> = earlier
        .iter()
        .rev()
        .take(TRAILING_PERIODS)
        .filter_map(|o| o.production)
        .collect();

    match mean(&trailing) {
        Some(avg) if avg > 0.0 => latest_production > avg * OVERPRODUCTION_RATIO,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(period: i32, price: f64) -> PriceObservation {
        PriceObservation::new(period, price)
    }

    fn projection(forecast: PriceForecast) -> PriceProjection {
        match forecast {
            PriceForecast::Projected(p) => p,
            other => panic!("expected projection, got {:?}", other),
        }
    }

    #[test]
    fn non_monotonic_potato_series() {
        let history = vec![obs(2022, 1200.0), obs(2023, 1350.0), obs(2024, 1100.0)];
        let p = projection(price_prediction(&history));

        assert_eq!(p.projected_period, 2025);
        assert!((p.projected_price - 1116.67).abs() < 0.01);
        assert!((p.low - 1027.33).abs() < 0.01);
        assert!((p.high - 1206.0).abs() < 0.01);
        assert!((p.pct_change - 1.52).abs() < 0.01);
        assert!(!p.overproduction_risk);
    }

    #[test]
    fn unsorted_input_is_ordered_by_period() {
        let history = vec![obs(2024, 300.0), obs(2022, 100.0), obs(2023, 200.0)];
        let p = projection(price_prediction(&history));
        assert_eq!(p.projected_period, 2025);
        assert!((p.projected_price - 400.0).abs() < 1e-6);
        assert!((p.pct_change - 33.33).abs() < 0.01);
    }

    #[test]
    fn too_little_history() {
        assert_eq!(
            price_prediction(&[]),
            PriceForecast::InsufficientHistory { observed: 0 }
        );
        assert_eq!(
            price_prediction(&[obs(2024, 2625.0)]),
            PriceForecast::InsufficientHistory { observed: 1 }
        );
        assert_eq!(
            price_prediction(&[obs(2024, 10.0), obs(2024, 12.0)]),
            PriceForecast::InsufficientHistory { observed: 2 }
        );
    }

    #[test]
    fn low_end_is_floored_at_zero() {
        let history = vec![obs(2022, 300.0), obs(2023, 150.0), obs(2024, 10.0)];
        let p = projection(price_prediction(&history));
        assert_eq!(p.projected_price, 0.0);
        assert_eq!(p.low, 0.0);
        assert!(p.high >= p.low);
    }

    #[test]
    fn overproduction_flagged_above_trailing_average() {
        let history = vec![
            obs(2021, 1400.0).with_production(211.0),
            obs(2022, 1800.0).with_production(206.0),
            obs(2023, 1150.0).with_production(204.0),
            obs(2024, 900.0).with_production(262.0),
        ];
        assert!(projection(price_prediction(&history)).overproduction_risk);
    }

    #[test]
    fn overproduction_needs_production_figures() {
        let steady = vec![
            obs(2022, 100.0).with_production(100.0),
            obs(2023, 110.0).with_production(105.0),
            obs(2024, 120.0).with_production(110.0),
        ];
        assert!(!projection(price_prediction(&steady)).overproduction_risk);

        let unknown = vec![obs(2023, 100.0), obs(2024, 110.0).with_production(500.0)];
        assert!(!projection(price_prediction(&unknown)).overproduction_risk);
    }
}
