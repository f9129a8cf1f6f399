use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RunOutcome;

/// Stable identifier of a draft order. Never reused within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    #[default]
    Limit,
    Stop,
}

impl OrderType {
    /// Whether orders of this type must carry a price
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    #[default]
    Day,
    Gtc,
    Ioc,
    Fok,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Day => "day",
            TimeInForce::Gtc => "gtc",
            TimeInForce::Ioc => "ioc",
            TimeInForce::Fok => "fok",
        }
    }
}

/// User-editable fields of a draft order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Must be a whole number; kept as a decimal so fractional input can be flagged
    pub quantity: Decimal,
    /// Present iff `order_type` is not market
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    /// Free text, ignored by validation
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderFields {
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: u64, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity: Decimal::from(quantity),
            price: Some(price),
            time_in_force: TimeInForce::Day,
            note: None,
        }
    }

    pub fn market(symbol: impl Into<String>, side: Side, quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity: Decimal::from(quantity),
            price: None,
            time_in_force: TimeInForce::Day,
            note: None,
        }
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Validation status derived from an order's fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reasons", rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Valid,
    Invalid(Vec<String>),
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            ValidationStatus::Invalid(reasons) => reasons,
            _ => &[],
        }
    }
}

/// An order the user has composed but not yet submitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub id: OrderId,
    pub fields: OrderFields,
    pub status: ValidationStatus,
    /// Bumped on every field edit
    #[serde(default)]
    pub revision: u64,
    /// Terminal outcome from the most recent run that captured this order
    #[serde(default)]
    pub last_outcome: Option<RunOutcome>,
}

impl DraftOrder {
    pub fn new(id: OrderId, fields: OrderFields) -> Self {
        Self {
            id,
            fields,
            status: ValidationStatus::Pending,
            revision: 0,
            last_outcome: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.fields.symbol
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Record a field edit: the previous run outcome no longer describes
    /// these fields
    pub fn touch(&mut self) {
        self.revision += 1;
        self.last_outcome = None;
    }
}
