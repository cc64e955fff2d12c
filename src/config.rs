// ⚙️ Engine Configuration - Matching, weights, layout, labels, palette
//
// Every field has a default, so an empty TOML file (or none at all) yields
// the stock engine. Values are validated once before a build.

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matching: MatchingConfig,
    pub weights: WeightConfig,
    pub layout: LayoutConfig,
    pub labels: LabelConfig,
    pub palette: Palette,
}

impl EngineConfig {
    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.layout.validate()?;
        self.labels.validate()?;
        Ok(())
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// Which candidate wins when several satisfy the same match tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First candidate in ledger order
    #[default]
    FirstSeen,

    /// Longest candidate key; ledger order among equal lengths
    LongestCandidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Organizational markers removed as whole tokens in the suffix-stripped tier
    pub org_suffixes: Vec<String>,

    pub tie_break: TieBreak,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            org_suffixes: crate::normalizer::DEFAULT_ORG_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tie_break: TieBreak::FirstSeen,
        }
    }
}

// ============================================================================
// WEIGHTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Thinnest edge (default: 1)
    pub min_edge_width: f64,

    /// Thickest edge (default: 8)
    pub max_edge_width: f64,

    /// Width = amount in thousands / divisor (default: 10)
    pub width_divisor: f64,

    /// Size of a contributor before connection bonus (default: 20)
    pub base_node_size: f64,

    /// Added per connected beneficiary (default: 4)
    pub connection_bonus: f64,

    /// Size of a connected beneficiary (default: 25)
    pub connected_beneficiary_size: f64,

    /// Size of any unconnected node (default: 20)
    pub unconnected_node_size: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        WeightConfig {
            min_edge_width: 1.0,
            max_edge_width: 8.0,
            width_divisor: 10.0,
            base_node_size: 20.0,
            connection_bonus: 4.0,
            connected_beneficiary_size: 25.0,
            unconnected_node_size: 20.0,
        }
    }
}

impl WeightConfig {
    fn validate(&self) -> Result<()> {
        if !(self.min_edge_width > 0.0 && self.min_edge_width <= self.max_edge_width) {
            return Err(Error::Config(format!(
                "edge width range [{}, {}] is empty or non-positive",
                self.min_edge_width, self.max_edge_width
            )));
        }
        if !(self.width_divisor > 0.0) {
            return Err(Error::Config("width_divisor must be positive".to_string()));
        }
        if self.connection_bonus < 0.0 {
            return Err(Error::Config("connection_bonus must not be negative".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub center_x: f64,
    pub center_y: f64,

    /// Circle radius for connected contributors (default: 200)
    pub radius: f64,

    /// Lane of unconnected contributors, left of the circle (default: -600)
    pub unconnected_contributor_x: f64,

    /// Lane of connected beneficiaries, right of the circle (default: 600)
    pub connected_beneficiary_x: f64,

    /// Lane of unconnected beneficiaries, past the connected lane (default: 800)
    pub unconnected_beneficiary_x: f64,

    /// Vertical distance between neighbours in a lane (default: 40)
    pub lane_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            center_x: 0.0,
            center_y: 0.0,
            radius: 200.0,
            unconnected_contributor_x: -600.0,
            connected_beneficiary_x: 600.0,
            unconnected_beneficiary_x: 800.0,
            lane_spacing: 40.0,
        }
    }
}

impl LayoutConfig {
    /// Lanes must sit strictly outside the circle, in left-to-right order
    fn validate(&self) -> Result<()> {
        let values = [
            self.center_x,
            self.center_y,
            self.radius,
            self.unconnected_contributor_x,
            self.connected_beneficiary_x,
            self.unconnected_beneficiary_x,
            self.lane_spacing,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Config("layout values must be finite".to_string()));
        }
        if self.radius < 0.0 || self.lane_spacing <= 0.0 {
            return Err(Error::Config(
                "radius must be >= 0 and lane_spacing > 0".to_string(),
            ));
        }

        let ordered = self.unconnected_contributor_x < self.center_x - self.radius
            && self.center_x + self.radius < self.connected_beneficiary_x
            && self.connected_beneficiary_x < self.unconnected_beneficiary_x;
        if !ordered {
            return Err(Error::Config(format!(
                "layout regions overlap: lanes at x={}, {}, {} around circle [{}, {}]",
                self.unconnected_contributor_x,
                self.connected_beneficiary_x,
                self.unconnected_beneficiary_x,
                self.center_x - self.radius,
                self.center_x + self.radius
            )));
        }
        Ok(())
    }
}

// ============================================================================
// LABELS & PALETTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub currency_symbol: String,

    /// chrono format for the edge date (default: day/month/year)
    pub date_format: String,

    /// Shown instead of a date when the latest contribution has none
    pub missing_date: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            currency_symbol: "₪".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            missing_date: "תאריך לא מוגדר".to_string(),
        }
    }
}

impl LabelConfig {
    /// The date format must be a strftime pattern chrono understands
    fn validate(&self) -> Result<()> {
        let broken = StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error));
        if broken {
            return Err(Error::Config(format!(
                "invalid date_format {:?}",
                self.date_format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub connected_contributor: String,
    pub unconnected_contributor: String,
    pub connected_beneficiary: String,
    pub unconnected_beneficiary: String,
    pub edge_1000: String,
    pub edge_2000: String,
    pub edge_other: String,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            connected_contributor: "#1f77b4".to_string(),
            unconnected_contributor: "#87ceeb".to_string(),
            connected_beneficiary: "#ff7f0e".to_string(),
            unconnected_beneficiary: "#ffb347".to_string(),
            edge_1000: "#fbbf24".to_string(),
            edge_2000: "#2563eb".to_string(),
            edge_other: "#a3a3a3".to_string(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
