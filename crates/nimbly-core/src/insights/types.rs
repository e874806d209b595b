//! Core types for the insights engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Types of insights that can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    /// How often the user shopped
    PurchaseFrequency,
    /// How a product's price moved between the first and last observation
    PriceTrend,
    /// Products bought repeatedly
    CommonPurchase,
    /// Where the user shopped
    StorePattern,
}

impl InsightType {
    /// Every detector, in report order
    pub const ALL: [InsightType; 4] = [
        InsightType::PurchaseFrequency,
        InsightType::PriceTrend,
        InsightType::CommonPurchase,
        InsightType::StorePattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::PurchaseFrequency => "purchase_frequency",
            InsightType::PriceTrend => "price_trend",
            InsightType::CommonPurchase => "common_purchase",
            InsightType::StorePattern => "store_pattern",
        }
    }

    /// Position in the report
    pub fn order(&self) -> usize {
        match self {
            InsightType::PurchaseFrequency => 0,
            InsightType::PriceTrend => 1,
            InsightType::CommonPurchase => 2,
            InsightType::StorePattern => 3,
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase_frequency" => Ok(InsightType::PurchaseFrequency),
            "price_trend" => Ok(InsightType::PriceTrend),
            "common_purchase" => Ok(InsightType::CommonPurchase),
            "store_pattern" => Ok(InsightType::StorePattern),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// A descriptive statement about past purchases
///
/// Recomputed on every request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    /// Short title (e.g., "Most visited store: Safeway")
    pub title: String,
    /// One or two past-tense sentences
    pub description: String,
    /// Number of observations behind the statement
    pub data_points: usize,
    /// 0.0-1.0, grows with the amount of supporting data
    pub confidence: f64,
    /// Detector-specific structured data
    pub underlying_data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    /// Create a new insight with the current timestamp
    pub fn new(
        insight_type: InsightType,
        title: impl Into<String>,
        description: impl Into<String>,
        data_points: usize,
        confidence: f64,
    ) -> Self {
        Self {
            insight_type,
            title: title.into(),
            description: description.into(),
            data_points,
            confidence: confidence.clamp(0.0, 1.0),
            underlying_data: serde_json::Value::Null,
            generated_at: Utc::now(),
        }
    }

    /// Add structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.underlying_data = data;
        self
    }
}

/// Result of an insights request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    /// Guidance shown when there is nothing to report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
