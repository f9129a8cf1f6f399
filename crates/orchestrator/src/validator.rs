use order_batch_config::ValidationSettings;
use order_batch_types::{OrderFields, OrderType, ValidationStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Structural validator for draft orders
///
/// Every rule is evaluated; nothing short-circuits, so the user sees all
/// problems with an order at once.
#[derive(Debug, Clone)]
pub struct OrderValidator {
    /// Largest quantity a single order may carry
    max_quantity: Decimal,
}

impl OrderValidator {
    pub fn new(max_quantity: u64) -> Self {
        Self {
            max_quantity: Decimal::from(max_quantity),
        }
    }

    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self::new(settings.max_quantity)
    }

    pub fn max_quantity(&self) -> Decimal {
        self.max_quantity
    }

    /// Validate a set of order fields
    pub fn validate(&self, fields: &OrderFields) -> ValidationStatus {
        let violations = self.check(fields);
        if violations.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid(violations.iter().map(ToString::to_string).collect())
        }
    }

    /// All rule violations for `fields`, in rule order
    pub fn check(&self, fields: &OrderFields) -> Vec<ValidationError> {
        let mut violations = Vec::new();

        if let Err(e) = self.validate_symbol(fields) {
            violations.push(e);
        }
        if let Err(e) = self.validate_quantity(fields) {
            violations.push(e);
        }
        if let Err(e) = self.validate_price(fields) {
            violations.push(e);
        }

        violations
    }

    pub fn validate_symbol(&self, fields: &OrderFields) -> Result<(), ValidationError> {
        if fields.symbol.trim().is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        Ok(())
    }

    pub fn validate_quantity(&self, fields: &OrderFields) -> Result<(), ValidationError> {
        let quantity = fields.quantity;

        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity { quantity });
        }

        if !quantity.fract().is_zero() {
            return Err(ValidationError::FractionalQuantity { quantity });
        }

        if quantity > self.max_quantity {
            return Err(ValidationError::QuantityTooLarge {
                quantity,
                maximum: self.max_quantity,
            });
        }

        Ok(())
    }

    pub fn validate_price(&self, fields: &OrderFields) -> Result<(), ValidationError> {
        match (fields.order_type, fields.price) {
            (OrderType::Market, Some(_)) => Err(ValidationError::PriceOnMarketOrder),
            (OrderType::Market, None) => Ok(()),
            (order_type, None) => Err(ValidationError::MissingPrice {
                order_type: order_type.as_str(),
            }),
            (_, Some(price)) if price <= Decimal::ZERO => {
                Err(ValidationError::NonPositivePrice { price })
            }
            (_, Some(_)) => Ok(()),
        }
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::from_settings(&ValidationSettings::default())
    }
}

/// Reasons a draft order is invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("symbol is required")]
    EmptySymbol,

    #[error("quantity {quantity} must be greater than zero")]
    NonPositiveQuantity { quantity: Decimal },

    #[error("quantity {quantity} must be a whole number")]
    FractionalQuantity { quantity: Decimal },

    #[error("quantity {quantity} exceeds maximum {maximum}")]
    QuantityTooLarge { quantity: Decimal, maximum: Decimal },

    #[error("{order_type} order requires a price")]
    MissingPrice { order_type: &'static str },

    #[error("price {price} must be greater than zero")]
    NonPositivePrice { price: Decimal },

    #[error("market order must not carry a price")]
    PriceOnMarketOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_batch_types::{FieldUpdate, Side};
    use rust_decimal_macros::dec;

    fn limit_order() -> OrderFields {
        OrderFields::limit("AAPL", Side::Buy, 100, dec!(187.25))
    }

    #[test]
    fn test_valid_limit_order() {
        let validator = OrderValidator::new(1_000);
        assert_eq!(validator.validate(&limit_order()), ValidationStatus::Valid);
    }

    #[test]
    fn test_valid_market_order() {
        let validator = OrderValidator::new(1_000);
        let fields = OrderFields::market("MSFT", Side::Sell, 10);
        assert!(validator.validate(&fields).is_valid());
    }

    #[test]
    fn test_whitespace_symbol_is_empty() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.symbol = "   ".to_string();

        assert_eq!(
            validator.validate_symbol(&fields),
            Err(ValidationError::EmptySymbol)
        );
    }

    #[test]
    fn test_quantity_rules() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();

        fields.quantity = Decimal::ZERO;
        assert!(matches!(
            validator.validate_quantity(&fields),
            Err(ValidationError::NonPositiveQuantity { .. })
        ));

        fields.quantity = dec!(2.5);
        assert!(matches!(
            validator.validate_quantity(&fields),
            Err(ValidationError::FractionalQuantity { .. })
        ));

        fields.quantity = dec!(1001);
        assert!(matches!(
            validator.validate_quantity(&fields),
            Err(ValidationError::QuantityTooLarge { .. })
        ));

        fields.quantity = dec!(1000);
        assert!(validator.validate_quantity(&fields).is_ok());
    }

    #[test]
    fn test_stop_order_requires_price() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.order_type = OrderType::Stop;
        fields.price = None;

        assert_eq!(
            validator.validate_price(&fields),
            Err(ValidationError::MissingPrice { order_type: "stop" })
        );
    }

    #[test]
    fn test_non_positive_price() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.price = Some(dec!(-1));

        assert!(matches!(
            validator.validate_price(&fields),
            Err(ValidationError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn test_market_order_with_price() {
        let validator = OrderValidator::new(1_000);
        let mut fields = OrderFields::market("MSFT", Side::Sell, 10);
        fields.price = Some(dec!(10));

        assert_eq!(
            validator.validate_price(&fields),
            Err(ValidationError::PriceOnMarketOrder)
        );
    }

    #[test]
    fn test_all_violations_reported() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.symbol = String::new();
        fields.quantity = dec!(-3);
        fields.price = None;

        let status = validator.validate(&fields);
        assert_eq!(status.reasons().len(), 3);
        assert_eq!(status.reasons()[0], "symbol is required");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.quantity = dec!(0.5);

        assert_eq!(validator.validate(&fields), validator.validate(&fields));
    }

    #[test]
    fn test_note_never_affects_validation() {
        let validator = OrderValidator::new(1_000);
        let mut fields = limit_order();
        fields.price = None;
        let before = validator.validate(&fields);

        FieldUpdate::Note(Some("rebalance leg 2".to_string())).apply_to(&mut fields);
        assert_eq!(validator.validate(&fields), before);
    }

    #[test]
    fn test_default_uses_configured_maximum() {
        let validator = OrderValidator::default();
        assert_eq!(validator.max_quantity(), dec!(1000000));
    }
}
