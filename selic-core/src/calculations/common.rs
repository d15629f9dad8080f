//! Rounding, comparison and money-formatting helpers shared by the
//! calculations and by the presentation layers that consume them.

use rust_decimal::Decimal;

/// Rounds a monetary value to cents, with midpoints rounded away from zero.
///
/// Projections keep full precision internally; this is applied only when a
/// figure is shown or exported.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use selic_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1127.4999999999995)), dec!(1127.50));
/// assert_eq!(round_half_up(dec!(39.225)), dec!(39.23));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use selic_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-12.50), Decimal::ZERO), Decimal::ZERO);
/// assert_eq!(max(dec!(196.11), Decimal::ZERO), dec!(196.11));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Currency symbol prefixed to every formatted amount.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Formats `amount` as Brazilian reais with two decimal places and comma
/// thousands separators, e.g. `R$1,234.56`.
///
/// Cents are rounded half-up. Negative amounts carry a leading `-`; an
/// amount that rounds to zero never does.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use selic_core::calculations::common::format_money;
///
/// assert_eq!(format_money(dec!(2396.1059567262687)), "R$2,396.11");
/// assert_eq!(format_money(dec!(-1500)), "-R$1,500.00");
/// ```
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!("{sign}{CURRENCY_SYMBOL}{}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
