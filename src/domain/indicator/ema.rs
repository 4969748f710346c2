//! Exponential Moving Average.
//!
//! alpha = 2/(span+1). The average is the bias-adjusted form: every
//! observation x[j] seen so far is weighted by (1-alpha)^(i-j) and the sum
//! is normalized by the total weight. Undefined inputs add no observation
//! but older weights still decay across them.
//! Warmup: undefined until `span` observations have been seen.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_ema(input: &[Option<f64>], span: usize) -> IndicatorSeries {
    if span == 0 || input.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(span));
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut values = Vec::with_capacity(input.len());
    let mut average: Option<f64> = None;
    let mut old_weight = 1.0;
    let mut observations = 0usize;

    for x in input {
        let x = x.filter(|v| v.is_finite());
        if x.is_some() {
            observations += 1;
        }

        average = match (average, x) {
            (Some(avg), Some(cur)) => {
                old_weight *= decay;
                let next = if avg != cur {
                    (old_weight * avg + cur) / (old_weight + 1.0)
                } else {
                    avg
                };
                old_weight += 1.0;
                Some(next)
            }
            (Some(avg), None) => {
                old_weight *= decay;
                Some(avg)
            }
            (None, cur) => cur,
        };

        values.push(if observations >= span { average } else { None });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}
