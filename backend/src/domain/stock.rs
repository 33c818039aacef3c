//! Blood stock levels per blood type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BloodType;
use super::rules::{DEFAULT_STOCK_QUANTITY, stock_status};

/// Stock level classification. Always derived from the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "Aman")]
    Safe,
    #[serde(rename = "Menipis")]
    Low,
    #[serde(rename = "Kritis")]
    Critical,
}

impl StockStatus {
    /// Wire label for the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "Aman",
            Self::Low => "Menipis",
            Self::Critical => "Kritis",
        }
    }

    /// Whether the status should raise a low-stock alert.
    pub fn needs_alert(self) -> bool {
        matches!(self, Self::Low | Self::Critical)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Aman" => Ok(Self::Safe),
            "Menipis" => Ok(Self::Low),
            "Kritis" => Ok(Self::Critical),
            other => Err(format!("unknown stock status: {other}")),
        }
    }
}

/// Bags available for one blood type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodStock {
    blood_type: BloodType,
    quantity: u32,
    updated_at: DateTime<Utc>,
}

impl BloodStock {
    pub fn new(blood_type: BloodType, quantity: u32, updated_at: DateTime<Utc>) -> Self {
        Self {
            blood_type,
            quantity,
            updated_at,
        }
    }

    /// Row created for a blood type that has never been stocked.
    pub fn initial(blood_type: BloodType, now: DateTime<Utc>) -> Self {
        Self::new(blood_type, DEFAULT_STOCK_QUANTITY, now)
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Status derived from the current quantity.
    pub fn status(&self) -> StockStatus {
        stock_status(self.quantity)
    }

    /// Copy with a new quantity, stamping the update time.
    pub fn with_quantity(&self, quantity: u32, now: DateTime<Utc>) -> Self {
        Self::new(self.blood_type, quantity, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn initial_rows_start_critical() {
        let stock = BloodStock::initial(BloodType::OPositive, Utc::now());
        assert_eq!(stock.quantity(), DEFAULT_STOCK_QUANTITY);
        assert_eq!(stock.status(), StockStatus::Critical);
    }

    #[rstest]
    fn with_quantity_rederives_status_and_timestamp() {
        let before = Utc::now();
        let stock = BloodStock::initial(BloodType::BNegative, before);
        let later = before + chrono::Duration::minutes(5);
        let updated = stock.with_quantity(22, later);
        assert_eq!(updated.status(), StockStatus::Safe);
        assert_eq!(updated.updated_at(), later);
        assert_eq!(updated.blood_type(), BloodType::BNegative);
    }

    #[rstest]
    #[case(StockStatus::Safe, "\"Aman\"", false)]
    #[case(StockStatus::Low, "\"Menipis\"", true)]
    #[case(StockStatus::Critical, "\"Kritis\"", true)]
    fn status_wire_labels(
        #[case] status: StockStatus,
        #[case] json: &str,
        #[case] alert: bool,
    ) {
        assert_eq!(serde_json::to_string(&status).expect("serialise"), json);
        assert_eq!(status.needs_alert(), alert);
        assert_eq!(status.as_str().parse::<StockStatus>(), Ok(status));
    }
}
