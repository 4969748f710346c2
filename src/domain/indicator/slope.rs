//! Slope angle of a series over a rolling window.
//!
//! For the window ending at i, both y and x = 0..n-1 are min-max scaled to
//! [0, 1] and an ordinary least squares line y = a + b*x is fitted. The
//! output is atan(b) in degrees.
//!
//! The first (n-1) positions are 0. A window holding an undefined value is
//! undefined. A flat window (max == min) has no direction and yields 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_WINDOW: usize = 5;

pub fn calculate_slope(input: &[Option<f64>], window: usize) -> IndicatorSeries {
    if window < 2 {
        return IndicatorSeries::empty(IndicatorType::Slope(window));
    }

    let x_scaled: Vec<f64> = (0..window)
        .map(|k| k as f64 / (window - 1) as f64)
        .collect();
    let x_mean = x_scaled.iter().sum::<f64>() / window as f64;
    let sxx: f64 = x_scaled.iter().map(|x| (x - x_mean).powi(2)).sum();

    let mut values = Vec::with_capacity(input.len());
    for i in 0..input.len() {
        if i + 1 < window {
            values.push(Some(0.0));
            continue;
        }

        let ys: Option<Vec<f64>> = input[i + 1 - window..=i]
            .iter()
            .map(|v| v.filter(|y| y.is_finite()))
            .collect();

        values.push(ys.map(|ys| window_angle(&ys, &x_scaled, x_mean, sxx)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Slope(window),
        values,
    }
}

fn window_angle(ys: &[f64], x_scaled: &[f64], x_mean: f64, sxx: f64) -> f64 {
    let y_min = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = y_max - y_min;
    if range == 0.0 {
        return 0.0;
    }

    let y_scaled: Vec<f64> = ys.iter().map(|y| (y - y_min) / range).collect();
    let y_mean = y_scaled.iter().sum::<f64>() / ys.len() as f64;
    let sxy: f64 = x_scaled
        .iter()
        .zip(&y_scaled)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    (sxy / sxx).atan().to_degrees()
}
