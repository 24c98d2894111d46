/// Money helpers for gateway payloads.
///
/// Amounts are stored as NUMERIC(10,2). Gateways want integers: Stripe takes
/// minor units (cents), Daraja takes whole shillings. Both truncate.
use num_traits::ToPrimitive;
use sqlx::types::BigDecimal;

/// 12.345 -> 1234
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100)).with_scale(0).to_i64()
}

/// 12.99 -> 12
pub fn to_whole_units(amount: &BigDecimal) -> Option<i64> {
    amount.with_scale(0).to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn minor_units_truncate() {
        assert_eq!(to_minor_units(&dec("100.00")), Some(10000));
        assert_eq!(to_minor_units(&dec("0.50")), Some(50));
        assert_eq!(to_minor_units(&dec("12.345")), Some(1234));
    }

    #[test]
    fn whole_units_truncate() {
        assert_eq!(to_whole_units(&dec("100.00")), Some(100));
        assert_eq!(to_whole_units(&dec("99.99")), Some(99));
        assert_eq!(to_whole_units(&dec("1")), Some(1));
    }
}
