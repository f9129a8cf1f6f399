use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::{OrderFields, OrderType, Side, TimeInForce};

/// A single field assignment, used for one-off edits and bulk apply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Symbol(String),
    Side(Side),
    OrderType(OrderType),
    Quantity(Decimal),
    Price(Option<Decimal>),
    TimeInForce(TimeInForce),
    Note(Option<String>),
}

impl FieldUpdate {
    /// Build an update from a tabular column name and a raw cell value.
    ///
    /// Column names follow the batch import layout: `symbol`, `side`,
    /// `order type`, `quantity`, `price`, `time-in-force` and `note`.
    /// Spaces, dashes and underscores are interchangeable and matching is
    /// case-insensitive. An empty price or note clears the field.
    pub fn parse(field: &str, value: &str) -> Result<Self, FieldParseError> {
        let key: String = field
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        let value = value.trim();

        match key.as_str() {
            "symbol" => Ok(FieldUpdate::Symbol(value.to_ascii_uppercase())),
            "side" => value.parse().map(FieldUpdate::Side),
            "ordertype" | "type" => value.parse().map(FieldUpdate::OrderType),
            "quantity" | "qty" => Decimal::from_str(value)
                .map(FieldUpdate::Quantity)
                .map_err(|_| FieldParseError::InvalidNumber {
                    field: "quantity".to_string(),
                    value: value.to_string(),
                }),
            "price" => {
                if value.is_empty() {
                    return Ok(FieldUpdate::Price(None));
                }
                Decimal::from_str(value)
                    .map(|p| FieldUpdate::Price(Some(p)))
                    .map_err(|_| FieldParseError::InvalidNumber {
                        field: "price".to_string(),
                        value: value.to_string(),
                    })
            }
            "timeinforce" | "tif" => value.parse().map(FieldUpdate::TimeInForce),
            "note" => Ok(FieldUpdate::Note(
                (!value.is_empty()).then(|| value.to_string()),
            )),
            _ => Err(FieldParseError::UnknownField(field.to_string())),
        }
    }

    /// Apply the update to a set of fields.
    ///
    /// Switching to a market order drops any price, since market orders
    /// never carry one.
    pub fn apply_to(&self, fields: &mut OrderFields) {
        match self {
            FieldUpdate::Symbol(symbol) => fields.symbol = symbol.clone(),
            FieldUpdate::Side(side) => fields.side = *side,
            FieldUpdate::OrderType(order_type) => {
                fields.order_type = *order_type;
                if !order_type.requires_price() {
                    fields.price = None;
                }
            }
            FieldUpdate::Quantity(quantity) => fields.quantity = *quantity,
            FieldUpdate::Price(price) => fields.price = *price,
            FieldUpdate::TimeInForce(tif) => fields.time_in_force = *tif,
            FieldUpdate::Note(note) => fields.note = note.clone(),
        }
    }

    /// Name of the field this update targets
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldUpdate::Symbol(_) => "symbol",
            FieldUpdate::Side(_) => "side",
            FieldUpdate::OrderType(_) => "order_type",
            FieldUpdate::Quantity(_) => "quantity",
            FieldUpdate::Price(_) => "price",
            FieldUpdate::TimeInForce(_) => "time_in_force",
            FieldUpdate::Note(_) => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid {field} value: {value}")]
    InvalidValue { field: String, value: String },

    #[error("invalid number for {field}: {value}")]
    InvalidNumber { field: String, value: String },
}

impl FromStr for Side {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Side::Buy),
            "sell" | "s" => Ok(Side::Sell),
            _ => Err(FieldParseError::InvalidValue {
                field: "side".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for OrderType {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" | "mkt" => Ok(OrderType::Market),
            "limit" | "lmt" => Ok(OrderType::Limit),
            "stop" | "stp" => Ok(OrderType::Stop),
            _ => Err(FieldParseError::InvalidValue {
                field: "order_type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TimeInForce {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(TimeInForce::Day),
            "gtc" => Ok(TimeInForce::Gtc),
            "ioc" => Ok(TimeInForce::Ioc),
            "fok" => Ok(TimeInForce::Fok),
            _ => Err(FieldParseError::InvalidValue {
                field: "time_in_force".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_names() {
        assert_eq!(
            FieldUpdate::parse("Order Type", "MARKET").unwrap(),
            FieldUpdate::OrderType(OrderType::Market)
        );
        assert_eq!(
            FieldUpdate::parse("time-in-force", "gtc").unwrap(),
            FieldUpdate::TimeInForce(TimeInForce::Gtc)
        );
        assert_eq!(
            FieldUpdate::parse("symbol", " msft ").unwrap(),
            FieldUpdate::Symbol("MSFT".to_string())
        );
    }

    #[test]
    fn test_parse_empty_price_clears() {
        assert_eq!(
            FieldUpdate::parse("price", "").unwrap(),
            FieldUpdate::Price(None)
        );
        assert_eq!(
            FieldUpdate::parse("price", "12.50").unwrap(),
            FieldUpdate::Price(Some(Decimal::new(1250, 2)))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            FieldUpdate::parse("colour", "red"),
            Err(FieldParseError::UnknownField(_))
        ));
        assert!(matches!(
            FieldUpdate::parse("quantity", "ten"),
            Err(FieldParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            FieldUpdate::parse("side", "hold"),
            Err(FieldParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_switch_to_market_drops_price() {
        let mut fields = OrderFields::limit("AAPL", Side::Buy, 10, Decimal::new(150, 0));
        FieldUpdate::OrderType(OrderType::Market).apply_to(&mut fields);

        assert_eq!(fields.order_type, OrderType::Market);
        assert_eq!(fields.price, None);
    }

    #[test]
    fn test_switch_between_priced_types_keeps_price() {
        let mut fields = OrderFields::limit("AAPL", Side::Buy, 10, Decimal::new(150, 0));
        FieldUpdate::OrderType(OrderType::Stop).apply_to(&mut fields);

        assert_eq!(fields.price, Some(Decimal::new(150, 0)));
    }
}
