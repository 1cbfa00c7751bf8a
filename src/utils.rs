use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use serde::Serializer;
use std::fmt::Display;
use std::str::FromStr;

const NATIVE_DECIMALS: u32 = 18;

/// Converts a wei amount (`U256`) to AVAX as a `BigDecimal`.
/// Useful for exact arithmetic on balances; use [`format_balance`] for display.
pub fn wei_to_eth(wei: U256) -> anyhow::Result<BigDecimal> {
    let wei = BigDecimal::from_str(&wei.to_string())
        .map_err(|e| anyhow::anyhow!("Invalid wei amount {wei}: {e}"))?;
    Ok(wei / BigDecimal::from(1_000_000_000_000_000_000u128))
}

/// Formats a wei amount as a native-token amount with `decimals` fractional digits,
/// rounding half up.
pub fn format_balance(wei: U256, decimals: u32) -> String {
    let decimals = decimals.min(NATIVE_DECIMALS);
    let ten = U256::from(10u64);
    let unit = ten.pow(U256::from(NATIVE_DECIMALS - decimals));
    let rounded = wei.saturating_add(unit / U256::from(2u64)) / unit;
    if decimals == 0 {
        return rounded.to_string();
    }
    let scale = ten.pow(U256::from(decimals));
    format!(
        "{}.{:0>width$}",
        rounded / scale,
        (rounded % scale).to_string(),
        width = decimals as usize
    )
}

/// Shortens an address for display: `0x1234...abcd`.
pub fn shorten_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Serializes any `Display` value as a JSON string.
/// Block numbers and 256-bit values go over the wire as decimal strings.
pub fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
