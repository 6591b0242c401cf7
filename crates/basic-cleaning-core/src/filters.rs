use polars::prelude::*;
use serde::Serialize;

use crate::dataset::PRICE_COLUMN;
use crate::error::{CleaningError, Result};

/// Inclusive `[min, max]` bounds on the price column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() {
            return Err(CleaningError::Config(
                "price bounds must be numbers, got NaN".to_string(),
            ));
        }
        if min > max {
            return Err(CleaningError::Config(format!(
                "min_price ({min}) is greater than max_price ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceFilterStats {
    pub kept: usize,
    pub out_of_range: usize,
    pub missing_or_invalid: usize,
}

/// `None` for empty, non-numeric, or NaN values.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
}

/// Keep rows whose price parses and falls inside `range`; everything else is dropped.
pub fn filter_price_range(
    df: &DataFrame,
    range: &PriceRange,
) -> Result<(DataFrame, PriceFilterStats)> {
    let prices = df.column(PRICE_COLUMN)?.str()?;

    let mut stats = PriceFilterStats::default();
    let mask: Vec<bool> = prices
        .into_iter()
        .map(|value| match value.and_then(parse_price) {
            Some(price) if range.contains(price) => {
                stats.kept += 1;
                true
            }
            Some(_) => {
                stats.out_of_range += 1;
                false
            }
            None => {
                stats.missing_or_invalid += 1;
                false
            }
        })
        .collect();

    let mask = BooleanChunked::from_slice("price_in_range".into(), &mask);
    let filtered = df.filter(&mask)?;
    Ok((filtered, stats))
}
