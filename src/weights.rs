// ⚖️ Weight Calculator - Visual weight of nodes and edges
//
// Edge width follows the most recent contribution:
//   width = clamp(amount / 1000 / divisor, min, max)
// Tier is exact equality on the amount, never range bucketing.
// Contributor size grows with its connection count, with no global cap.

use crate::config::{LabelConfig, Palette, WeightConfig};
use crate::error::{Error, Result};
use crate::records::ContributorRecord;
use crate::resolver::{Category, EntityKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

// ============================================================================
// AMOUNT TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountTier {
    #[serde(rename = "1000")]
    Thousand,

    #[serde(rename = "2000")]
    TwoThousand,

    #[serde(rename = "other")]
    Other,
}

impl AmountTier {
    pub fn classify(amount: f64) -> Self {
        if amount == 1000.0 {
            AmountTier::Thousand
        } else if amount == 2000.0 {
            AmountTier::TwoThousand
        } else {
            AmountTier::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AmountTier::Thousand => "1000",
            AmountTier::TwoThousand => "2000",
            AmountTier::Other => "other",
        }
    }

    pub fn color<'a>(&self, palette: &'a Palette) -> &'a str {
        match self {
            AmountTier::Thousand => &palette.edge_1000,
            AmountTier::TwoThousand => &palette.edge_2000,
            AmountTier::Other => &palette.edge_other,
        }
    }
}

// ============================================================================
// EDGE WEIGHT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    pub width: f64,
    pub tier: AmountTier,
}

pub struct WeightCalculator {
    config: WeightConfig,
}

impl WeightCalculator {
    pub fn new() -> Self {
        Self::from_config(&WeightConfig::default())
    }

    pub fn from_config(config: &WeightConfig) -> Self {
        WeightCalculator {
            config: config.clone(),
        }
    }

    /// Width and color tier for an edge carrying `amount`
    pub fn edge_weight(&self, amount: f64) -> EdgeWeight {
        let scaled = amount / 1000.0 / self.config.width_divisor;
        // NaN scales to the minimum instead of escaping the clamp
        let width = if scaled.is_nan() {
            self.config.min_edge_width
        } else {
            scaled.clamp(self.config.min_edge_width, self.config.max_edge_width)
        };

        EdgeWeight {
            width,
            tier: AmountTier::classify(amount),
        }
    }

    /// Contributor size: base plus a bonus per connected beneficiary
    pub fn contributor_size(&self, connection_count: usize) -> f64 {
        if connection_count == 0 {
            return self.config.unconnected_node_size;
        }
        self.config.base_node_size + connection_count as f64 * self.config.connection_bonus
    }

    pub fn beneficiary_size(&self, connected: bool) -> f64 {
        if connected {
            self.config.connected_beneficiary_size
        } else {
            self.config.unconnected_node_size
        }
    }

    pub fn node_size(&self, kind: EntityKind, category: Category, connection_count: usize) -> f64 {
        match (kind, category) {
            (EntityKind::Contributor, Category::Connected) => self.contributor_size(connection_count),
            (EntityKind::Contributor, Category::Unconnected) => self.contributor_size(0),
            (EntityKind::Beneficiary, category) => {
                self.beneficiary_size(category == Category::Connected)
            }
        }
    }
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Most recent record by date; absent dates rank oldest, later input wins ties
pub fn latest_contribution<'a, I>(records: I) -> Option<&'a ContributorRecord>
where
    I: IntoIterator<Item = &'a ContributorRecord>,
{
    records.into_iter().fold(None, |latest, record| match latest {
        // Option orders None below every Some
        Some(current) if record.date < current.date => Some(current),
        _ => Some(record),
    })
}

/// Edge tooltip: "1.0k ₪ (15/03/2024)" or "1.0k ₪ (תאריך לא מוגדר)"
///
/// Fails instead of panicking when `date_format` is not a valid strftime pattern.
pub fn edge_label(amount: f64, date: Option<NaiveDate>, labels: &LabelConfig) -> Result<String> {
    let mut date_text = String::new();
    match date {
        Some(d) => write!(date_text, "{}", d.format(&labels.date_format))
            .map_err(|_| Error::Config(format!("invalid date_format {:?}", labels.date_format)))?,
        None => date_text.push_str(&labels.missing_date),
    }
    Ok(format!(
        "{:.1}k {} ({})",
        amount / 1000.0,
        labels.currency_symbol,
        date_text
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(name: &str, amount: f64, date: Option<(i32, u32, u32)>) -> ContributorRecord {
        ContributorRecord::new(
            name,
            amount,
            date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        )
    }

    #[test]
    fn test_tier_exact_equality() {
        assert_eq!(AmountTier::classify(1000.0), AmountTier::Thousand);
        assert_eq!(AmountTier::classify(2000.0), AmountTier::TwoThousand);
        assert_eq!(AmountTier::classify(1500.0), AmountTier::Other);
        assert_eq!(AmountTier::classify(999.99), AmountTier::Other);
        assert_eq!(AmountTier::classify(-1000.0), AmountTier::Other);
        assert_eq!(AmountTier::Thousand.as_str(), "1000");
    }

    #[test]
    fn test_edge_width_examples() {
        let calc = WeightCalculator::new();
        assert_eq!(calc.edge_weight(1000.0).width, 1.0);
        assert_eq!(calc.edge_weight(20_000.0).width, 2.0);
        assert_eq!(calc.edge_weight(45_000.0).width, 4.5);
        assert_eq!(calc.edge_weight(1_000_000.0).width, 8.0);
    }

    #[test]
    fn test_edge_width_clamped() {
        let calc = WeightCalculator::new();
        let amounts = [
            f64::MIN,
            -5000.0,
            0.0,
            1.0,
            1000.0,
            79_999.0,
            80_000.0,
            1e12,
            f64::MAX,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
        ];
        for amount in amounts {
            let width = calc.edge_weight(amount).width;
            assert!((1.0..=8.0).contains(&width), "amount {} gave width {}", amount, width);
        }
    }

    #[test]
    fn test_edge_width_monotonic() {
        let calc = WeightCalculator::new();
        let mut previous = 0.0;
        for step in 0..200 {
            let width = calc.edge_weight(step as f64 * 500.0).width;
            assert!(width >= previous);
            previous = width;
        }
    }

    #[test]
    fn test_contributor_size_grows_with_connections() {
        let calc = WeightCalculator::new();
        assert_eq!(calc.contributor_size(0), 20.0);
        assert_eq!(calc.contributor_size(1), 24.0);
        assert_eq!(calc.contributor_size(5), 40.0);
        assert!(calc.contributor_size(50) > calc.contributor_size(49));
    }

    #[test]
    fn test_beneficiary_size() {
        let calc = WeightCalculator::new();
        assert_eq!(calc.beneficiary_size(true), 25.0);
        assert_eq!(calc.beneficiary_size(false), 20.0);
    }

    #[test]
    fn test_node_size_by_kind_and_category() {
        let calc = WeightCalculator::new();
        assert_eq!(calc.node_size(EntityKind::Contributor, Category::Connected, 3), 32.0);
        assert_eq!(calc.node_size(EntityKind::Contributor, Category::Unconnected, 0), 20.0);
        assert_eq!(calc.node_size(EntityKind::Beneficiary, Category::Connected, 2), 25.0);
        assert_eq!(calc.node_size(EntityKind::Beneficiary, Category::Unconnected, 0), 20.0);
    }

    #[test]
    fn test_latest_contribution_by_date() {
        let records = vec![
            create_test_record("ACME", 1000.0, Some((2024, 1, 10))),
            create_test_record("ACME", 2000.0, Some((2024, 3, 1))),
            create_test_record("ACME", 500.0, Some((2023, 12, 1))),
        ];

        let latest = latest_contribution(&records).unwrap();
        assert_eq!(latest.amount, 2000.0);
    }

    #[test]
    fn test_latest_contribution_absent_dates_oldest() {
        let records = vec![
            create_test_record("ACME", 1000.0, Some((2020, 1, 1))),
            create_test_record("ACME", 7000.0, None),
        ];

        let latest = latest_contribution(&records).unwrap();
        assert_eq!(latest.amount, 1000.0);
    }

    #[test]
    fn test_latest_contribution_ties_use_input_order() {
        let records = vec![
            create_test_record("ACME", 1000.0, Some((2024, 5, 5))),
            create_test_record("ACME", 2000.0, Some((2024, 5, 5))),
        ];
        assert_eq!(latest_contribution(&records).unwrap().amount, 2000.0);

        let undated = vec![
            create_test_record("ACME", 300.0, None),
            create_test_record("ACME", 400.0, None),
        ];
        assert_eq!(latest_contribution(&undated).unwrap().amount, 400.0);
    }

    #[test]
    fn test_latest_contribution_empty() {
        let records: Vec<ContributorRecord> = Vec::new();
        assert!(latest_contribution(&records).is_none());
    }

    #[test]
    fn test_edge_label_format() {
        let labels = LabelConfig::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5);

        assert_eq!(edge_label(1000.0, date, &labels).unwrap(), "1.0k ₪ (05/03/2024)");
        assert_eq!(edge_label(2500.0, None, &labels).unwrap(), "2.5k ₪ (תאריך לא מוגדר)");
        assert_eq!(edge_label(-800.0, None, &labels).unwrap(), "-0.8k ₪ (תאריך לא מוגדר)");
    }

    #[test]
    fn test_edge_label_bad_date_format_is_an_error() {
        let labels = LabelConfig {
            date_format: "%Q".to_string(),
            ..LabelConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 1);

        assert!(matches!(edge_label(1000.0, date, &labels), Err(Error::Config(_))));
        // Undated edges never touch the format
        assert!(edge_label(1000.0, None, &labels).is_ok());
    }

    #[test]
    fn test_tier_colors() {
        let palette = Palette::default();
        assert_eq!(AmountTier::Thousand.color(&palette), "#fbbf24");
        assert_eq!(AmountTier::TwoThousand.color(&palette), "#2563eb");
        assert_eq!(AmountTier::Other.color(&palette), "#a3a3a3");
    }
}
