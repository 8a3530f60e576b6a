use serde::{Deserialize, Serialize};

/// What a provider sees about an instant booking it has been offered.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InstantBookingSummary {
    pub booking_id: String,
    pub order_number: String,
    pub category_slug: String,
    pub address: String,
    pub distance_km: f64,
    pub quantity: u32,
    pub total_amount: i64,
    pub expires_at: i64,
}

/// Messages pushed to a provider's notification channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderNotification {
    NewInstantRequest {
        summary: InstantBookingSummary,
        timestamp: i64,
    },
    BookingAssigned {
        booking_id: String,
        timestamp: i64,
    },
    RequestWithdrawn {
        booking_id: String,
        timestamp: i64,
    },
}

impl ProviderNotification {
    pub fn booking_id(&self) -> &str {
        match self {
            ProviderNotification::NewInstantRequest { summary, .. } => &summary.booking_id,
            ProviderNotification::BookingAssigned { booking_id, .. } => booking_id,
            ProviderNotification::RequestWithdrawn { booking_id, .. } => booking_id,
        }
    }
}
