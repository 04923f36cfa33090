//! Value formatting for display: prices in BRL, ratings, distances, names.

use crate::api::models::{InstructorSummary, LicenseCategory, PricingTier};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Anything `format_price` accepts. Unparseable input becomes [`PriceValue::Missing`].
#[derive(Debug, Clone, PartialEq)]
pub enum PriceValue {
    Number(f64),
    Text(String),
    Missing,
}

impl PriceValue {
    fn amount(&self) -> Option<f64> {
        match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => s.trim().parse::<f64>().ok(),
            PriceValue::Missing => None,
        }
        .filter(|n| n.is_finite())
    }
}

impl From<f64> for PriceValue {
    fn from(value: f64) -> Self {
        PriceValue::Number(value)
    }
}

impl From<f32> for PriceValue {
    fn from(value: f32) -> Self {
        PriceValue::Number(f64::from(value))
    }
}

impl From<i32> for PriceValue {
    fn from(value: i32) -> Self {
        PriceValue::Number(f64::from(value))
    }
}

impl From<u32> for PriceValue {
    fn from(value: u32) -> Self {
        PriceValue::Number(f64::from(value))
    }
}

impl From<i64> for PriceValue {
    fn from(value: i64) -> Self {
        PriceValue::Number(value as f64)
    }
}

impl From<&str> for PriceValue {
    fn from(value: &str) -> Self {
        PriceValue::Text(value.to_string())
    }
}

impl From<String> for PriceValue {
    fn from(value: String) -> Self {
        PriceValue::Text(value)
    }
}

impl From<&Value> for PriceValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(PriceValue::Missing, PriceValue::Number),
            Value::String(s) => PriceValue::Text(s.clone()),
            _ => PriceValue::Missing,
        }
    }
}

impl<T: Into<PriceValue>> From<Option<T>> for PriceValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PriceValue::Missing, Into::into)
    }
}

/// Format an amount as Brazilian reais: `R$ 1.234,56`.
///
/// Missing or unparseable values render as `R$ 0,00`.
///
/// # Examples
/// ```
/// use godrive_core::display::format::format_price;
/// assert_eq!(format_price(10), "R$ 10,00");
/// assert_eq!(format_price("7.5"), "R$ 7,50");
/// assert_eq!(format_price(None::<f64>), "R$ 0,00");
/// assert_eq!(format_price("abc"), "R$ 0,00");
/// ```
pub fn format_price(value: impl Into<PriceValue>) -> String {
    let amount = value.into().amount().unwrap_or(0.0);
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    format!(
        "{}R$ {},{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Up to two uppercase initials: first and last word of `name`.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let picked = match words.as_slice() {
        [] => Vec::new(),
        [only] => vec![*only],
        [first, .., last] => vec![*first, *last],
    };
    picked
        .iter()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn format_rating(rating: Option<f64>, review_count: u32) -> String {
    match rating {
        Some(rating) if review_count > 0 => {
            let noun = if review_count == 1 { "review" } else { "reviews" };
            format!("★ {:.1} ({} {})", rating, review_count, noun)
        }
        _ => "No reviews yet".to_string(),
    }
}

/// `850 m` below one kilometre, `3.2 km` above.
pub fn format_distance(distance_km: Option<f64>) -> String {
    match distance_km.filter(|d| d.is_finite() && *d >= 0.0) {
        Some(km) if km < 1.0 => format!("{:.0} m", km * 1000.0),
        Some(km) => format!("{:.1} km", km),
        None => "N/A".to_string(),
    }
}

/// Brazilian day-first date.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_categories(categories: &[LicenseCategory]) -> String {
    if categories.is_empty() {
        return "N/A".to_string();
    }
    categories
        .iter()
        .map(LicenseCategory::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Instructors teaching `category`; everything when no category is given.
pub fn filter_by_category(
    instructors: &[InstructorSummary],
    category: Option<LicenseCategory>,
) -> Vec<&InstructorSummary> {
    instructors
        .iter()
        .filter(|instructor| category.is_none_or(|c| instructor.categories.contains(&c)))
        .collect()
}

/// Tier with the lowest price per lesson.
pub fn cheapest_tier(tiers: &[PricingTier]) -> Option<&PricingTier> {
    tiers.iter().min_by(|a, b| {
        let per_lesson = |tier: &PricingTier| tier.price / f64::from(tier.lessons.max(1));
        per_lesson(*a).total_cmp(&per_lesson(*b))
    })
}
