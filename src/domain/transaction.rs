use super::account::{AccountHolder, Amount, FeeRate};
use super::fee::compute_fee;
use crate::error::PainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation type recorded on a ledger row.
///
/// The numeric codes are published; never reassign one.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(try_from = "u32", into = "u32")]
pub enum PainType {
    CreditTransfer = 1,
    Deposit = 1000,
}

impl PainType {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for PainType {
    type Error = PainError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::CreditTransfer),
            1000 => Ok(Self::Deposit),
            other => Err(PainError::ValidationError(format!(
                "Unknown transaction type {other}"
            ))),
        }
    }
}

impl From<PainType> for u32 {
    fn from(pain_type: PainType) -> Self {
        pain_type.code()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Where a transaction was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, PainError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(PainError::ValidationError(format!(
                "Coordinates ({lat}, {lon}) are out of range"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parses the optional latitude/longitude pair of a request.
    ///
    /// Both empty means no location was supplied.
    pub fn from_parts(lat: &str, lon: &str) -> Result<Option<Self>, PainError> {
        let (lat, lon) = (lat.trim(), lon.trim());
        if lat.is_empty() && lon.is_empty() {
            return Ok(None);
        }
        let parse = |raw: &str, name: &str| {
            raw.parse::<f64>()
                .map_err(|_| PainError::ValidationError(format!("Invalid {name} '{raw}'")))
        };
        Self::new(parse(lat, "latitude")?, parse(lon, "longitude")?).map(Some)
    }

    /// Well-known text, x = longitude, y = latitude.
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.lon, self.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

impl FromStr for GeoPoint {
    type Err = PainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PainError::ValidationError(format!("Invalid WKT point '{s}'"));
        let inner = s
            .trim()
            .strip_prefix("POINT(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let mut coords = inner.split_whitespace();
        let (Some(lon), Some(lat), None) = (coords.next(), coords.next(), coords.next()) else {
            return Err(invalid());
        };
        let lon = lon.parse().map_err(|_| invalid())?;
        let lat = lat.parse().map_err(|_| invalid())?;
        Self::new(lat, lon)
    }
}

impl TryFrom<String> for GeoPoint {
    type Error = PainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GeoPoint> for String {
    fn from(point: GeoPoint) -> Self {
        point.to_wkt()
    }
}

/// A payment-initiation ledger row.
///
/// `fee_amount` is derived from `amount` and `fee_rate` once, at construction,
/// and is never recomputed afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PainTransaction {
    /// Assigned by the ledger store on append.
    #[serde(default)]
    pub id: Option<i64>,
    pub pain_type: PainType,
    pub sender: AccountHolder,
    pub receiver: AccountHolder,
    pub amount: Amount,
    pub fee_rate: FeeRate,
    pub fee_amount: Amount,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    pub description: String,
    pub status: TransactionStatus,
    pub timestamp: i64,
}

impl PainTransaction {
    pub fn new(
        pain_type: PainType,
        sender: AccountHolder,
        receiver: AccountHolder,
        amount: Amount,
        fee_rate: FeeRate,
    ) -> Self {
        Self {
            id: None,
            pain_type,
            sender,
            receiver,
            amount,
            fee_rate,
            fee_amount: compute_fee(amount, fee_rate),
            geo: None,
            description: String::new(),
            status: TransactionStatus::Pending,
            timestamp: 0,
        }
    }

    pub fn with_geo(mut self, geo: Option<GeoPoint>) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the account appears on either side of the transaction.
    pub fn touches(&self, account_number: &str) -> bool {
        self.sender.account_number == account_number
            || self.receiver.account_number == account_number
    }
}
