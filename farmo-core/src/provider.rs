use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Locatable;

/// Read-only view of a partner as the dispatcher needs it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCandidate {
    pub provider_id: Uuid,
    pub business_name: String,
    pub is_verified: bool,
    pub is_available: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProviderCandidate {
    /// Verified and online; location is checked by the geo filter.
    pub fn is_dispatchable(&self) -> bool {
        self.is_verified && self.is_available
    }
}

impl Locatable for ProviderCandidate {
    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}
