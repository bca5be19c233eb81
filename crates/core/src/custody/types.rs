//! Domain types for custody operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::period::Period;

/// Unique key of a custody record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustodyKey {
    /// Accounting period.
    pub period: Period,
    /// Instrument identifier.
    pub stock: String,
    /// Holder identifier.
    pub client_id: String,
}

impl std::fmt::Display for CustodyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.period, self.stock, self.client_id)
    }
}

/// A held quantity of an instrument for a client in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    /// Accounting period (`YYYY-MM`).
    pub period: String,
    /// Instrument identifier.
    pub stock: String,
    /// Holder identifier.
    pub client_id: String,
    /// Venue the instrument is held on.
    pub market: Option<String>,
    /// Last known valuation.
    pub price: Option<Decimal>,
    /// Accumulated quantity, never negative.
    pub quantity: i64,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the quantity was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Caller input for `AddCustodyStock`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddCustodyInput {
    /// Accounting period (`YYYY-MM`).
    #[serde(default)]
    pub period: String,
    /// Instrument identifier.
    #[serde(default)]
    pub stock: String,
    /// Holder identifier.
    #[serde(default)]
    pub client_id: String,
    /// Quantity to add, must be positive.
    #[serde(default)]
    pub quantity: i64,
    /// Venue, stored when provided.
    #[serde(default)]
    pub market: Option<String>,
    /// Valuation, stored when provided.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl AddCustodyInput {
    /// Creates an input with the required fields only.
    #[must_use]
    pub fn new(
        period: impl Into<String>,
        stock: impl Into<String>,
        client_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            period: period.into(),
            stock: stock.into(),
            client_id: client_id.into(),
            quantity,
            market: None,
            price: None,
        }
    }

    /// Sets the market.
    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Sets the price.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

/// Informational columns written alongside an accumulation.
///
/// `None` keeps whatever is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodyAttributes {
    /// Venue.
    pub market: Option<String>,
    /// Valuation.
    pub price: Option<Decimal>,
}

/// Result of an atomic accumulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The record was created or incremented.
    Applied(CustodyRecord),
    /// The period is closed; nothing was written.
    PeriodClosed,
}

/// Filter for custody queries.
///
/// `None` matches any value; `Some` must match exactly. Fields are ANDed.
/// Blank strings are wildcards too, whether they arrive over the wire or
/// through the builders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyFilter {
    /// Period to match.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub period: Option<String>,
    /// Stock to match.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub stock: Option<String>,
    /// Client to match.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub client_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(non_blank)
}

impl CustodyFilter {
    /// Creates a new empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one period.
    #[must_use]
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = non_blank(Some(period.into()));
        self
    }

    /// Restricts to one stock.
    #[must_use]
    pub fn with_stock(mut self, stock: impl Into<String>) -> Self {
        self.stock = non_blank(Some(stock.into()));
        self
    }

    /// Restricts to one client.
    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = non_blank(Some(client_id.into()));
        self
    }

    /// Returns the filter with blank fields turned into wildcards.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            period: non_blank(self.period.clone()),
            stock: non_blank(self.stock.clone()),
            client_id: non_blank(self.client_id.clone()),
        }
    }

    /// Returns the exact key when all three fields are set and the period is valid.
    #[must_use]
    pub fn as_key(&self) -> Option<CustodyKey> {
        match (&self.period, &self.stock, &self.client_id) {
            (Some(period), Some(stock), Some(client_id)) => Some(CustodyKey {
                period: Period::parse(period).ok()?,
                stock: stock.clone(),
                client_id: client_id.clone(),
            }),
            _ => None,
        }
    }

    /// Returns true if `record` satisfies every provided field.
    #[must_use]
    pub fn matches(&self, record: &CustodyRecord) -> bool {
        self.period.as_ref().is_none_or(|p| *p == record.period)
            && self.stock.as_ref().is_none_or(|s| *s == record.stock)
            && self
                .client_id
                .as_ref()
                .is_none_or(|c| *c == record.client_id)
    }
}

/// Filter for `ClosePeriod`: the periods to close.
///
/// Closing is per whole period, so any other field (a stock or client
/// scope) is refused instead of silently widening the close.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClosePeriodFilter {
    /// Periods (`YYYY-MM`) to close.
    #[serde(default)]
    pub periods: Vec<String>,
}

impl ClosePeriodFilter {
    /// Creates a filter for a single period.
    #[must_use]
    pub fn single(period: impl Into<String>) -> Self {
        Self {
            periods: vec![period.into()],
        }
    }
}

/// Status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period accepts accumulation.
    Open,
    /// Period is closed, no accumulation allowed.
    Closed,
}

/// State of one accounting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodState {
    /// Period (`YYYY-MM`).
    pub period: String,
    /// Current status.
    pub status: PeriodStatus,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl PeriodState {
    /// State of a period that was never closed.
    #[must_use]
    pub fn open(period: &Period) -> Self {
        Self {
            period: period.to_string(),
            status: PeriodStatus::Open,
            closed_at: None,
        }
    }

    /// State of a period closed at `closed_at`.
    #[must_use]
    pub fn closed(period: &Period, closed_at: DateTime<Utc>) -> Self {
        Self {
            period: period.to_string(),
            status: PeriodStatus::Closed,
            closed_at: Some(closed_at),
        }
    }

    /// Returns true if accumulation is no longer allowed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == PeriodStatus::Closed
    }
}

/// Result of closing one or more periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePeriodOutcome {
    /// Periods transitioned from open to closed by this call.
    pub closed: Vec<PeriodState>,
    /// Periods that were already closed, with their original close time.
    pub already_closed: Vec<PeriodState>,
}
