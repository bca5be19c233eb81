//! Input validation for custody operations.
//!
//! All checks are pure and run before any storage access.

use rust_decimal::Decimal;

use super::error::CustodyError;
use super::period::Period;
use super::types::{AddCustodyInput, ClosePeriodFilter, CustodyAttributes, CustodyKey};

/// An `AddCustodyStock` request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAdd {
    /// Record key.
    pub key: CustodyKey,
    /// Strictly positive quantity to add.
    pub quantity: i64,
    /// Informational columns to store.
    pub attributes: CustodyAttributes,
}

/// Decimal places kept for a price.
const PRICE_SCALE: u32 = 4;

/// Exclusive upper bound on the integer digits of a price (`NUMERIC(19, 4)`).
const PRICE_INTEGER_DIGITS: u32 = 15;

fn check_price(price: Decimal) -> Result<(), CustodyError> {
    if price < Decimal::ZERO {
        return Err(CustodyError::NegativePrice);
    }
    let limit = Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS));
    if price.normalize().scale() > PRICE_SCALE || price >= limit {
        return Err(CustodyError::PriceOutOfRange(price.to_string()));
    }
    Ok(())
}

fn required(value: &str, field: &'static str) -> Result<(), CustodyError> {
    if value.trim().is_empty() {
        return Err(CustodyError::MissingField(field));
    }
    Ok(())
}

/// Validates an add request.
///
/// Fields are checked in order: period, stock, client_id, quantity, price.
/// A price must be non-negative, below 10^15 and carry at most four decimal
/// places; trailing zeros are dropped. A blank market is treated as not provided.
///
/// # Errors
///
/// Returns an `InvalidArgument`-class `CustodyError` for the first failing field.
pub fn validate_add(input: &AddCustodyInput) -> Result<ValidatedAdd, CustodyError> {
    let period = Period::parse(&input.period)?;
    required(&input.stock, "stock")?;
    required(&input.client_id, "client_id")?;

    if input.quantity <= 0 {
        return Err(CustodyError::NonPositiveQuantity(input.quantity));
    }

    if let Some(price) = input.price {
        check_price(price)?;
    }

    let market = input
        .market
        .as_ref()
        .filter(|m| !m.trim().is_empty())
        .cloned();

    Ok(ValidatedAdd {
        key: CustodyKey {
            period,
            stock: input.stock.clone(),
            client_id: input.client_id.clone(),
        },
        quantity: input.quantity,
        attributes: CustodyAttributes {
            market,
            price: input.price.map(|p| p.normalize()),
        },
    })
}

/// Validates a close filter, returning its periods sorted and de-duplicated.
///
/// # Errors
///
/// Returns `CustodyError::EmptyPeriodFilter` if no period is given, or the
/// period error for the first malformed entry.
pub fn validate_close_filter(filter: &ClosePeriodFilter) -> Result<Vec<Period>, CustodyError> {
    if filter.periods.is_empty() {
        return Err(CustodyError::EmptyPeriodFilter);
    }

    let mut periods = filter
        .periods
        .iter()
        .map(|p| Period::parse(p))
        .collect::<Result<Vec<_>, _>>()?;
    periods.sort();
    periods.dedup();
    Ok(periods)
}
