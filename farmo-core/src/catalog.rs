use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Unit an instant price is quoted in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceUnit {
    Hour,
    Day,
    Km,
    Acre,
    Fixed,
}

impl PriceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceUnit::Hour => "HOUR",
            PriceUnit::Day => "DAY",
            PriceUnit::Km => "KM",
            PriceUnit::Acre => "ACRE",
            PriceUnit::Fixed => "FIXED",
        }
    }
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOUR" => Ok(PriceUnit::Hour),
            "DAY" => Ok(PriceUnit::Day),
            "KM" => Ok(PriceUnit::Km),
            "ACRE" => Ok(PriceUnit::Acre),
            "FIXED" => Ok(PriceUnit::Fixed),
            other => Err(CoreError::ValidationError(format!("unknown price unit: {}", other))),
        }
    }
}

/// Service category with its admin-managed instant booking settings.
/// Prices are in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub instant_enabled: bool,
    pub instant_price: Option<i64>,
    pub instant_price_unit: PriceUnit,
    pub instant_timeout_minutes: u32,
    pub instant_search_radius_km: f64,
}

impl Category {
    pub const DEFAULT_TIMEOUT_MINUTES: u32 = 10;
    pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 15.0;

    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            is_active: true,
            instant_enabled: true,
            instant_price: None,
            instant_price_unit: PriceUnit::Hour,
            instant_timeout_minutes: Self::DEFAULT_TIMEOUT_MINUTES,
            instant_search_radius_km: Self::DEFAULT_SEARCH_RADIUS_KM,
        }
    }

    /// Price usable for an instant booking, if the admin has set one.
    pub fn effective_instant_price(&self) -> Option<i64> {
        self.instant_price.filter(|p| *p > 0)
    }
}
