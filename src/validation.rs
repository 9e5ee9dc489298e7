// Validation utilities module
// Provides custom validation functions for domain-specific rules

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a price is non-negative
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates that a rating average is between 0.0 and 5.0
pub fn validate_rating_range(rating: f64) -> Result<(), ValidationError> {
    if !(0.0..=5.0).contains(&rating) {
        Err(ValidationError::new("rating_out_of_range"))
    } else {
        Ok(())
    }
}

/// Validates that a discount code is non-empty alphanumeric (dashes and
/// underscores allowed)
pub fn validate_discount_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ValidationError::new("invalid_code_length"));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new("invalid_code_characters"));
    }
    Ok(())
}
