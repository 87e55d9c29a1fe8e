use alloy::primitives::{utils::format_units, Address, U256};
use eyre::Result;

/// Formats a raw token amount with the token's decimals.
///
/// Trailing zeros of the fraction are dropped, keeping one digit, so one whole
/// token reads `1.0`. A zero amount reads `0`.
///
/// # Errors
/// * If `decimals` is larger than alloy supports
pub fn format_balance(raw: U256, decimals: u8) -> Result<String> {
    if raw.is_zero() {
        return Ok("0".to_string());
    }

    let mut formatted = format_units(raw, decimals)?;
    if formatted.contains('.') {
        let trimmed_len = formatted.trim_end_matches('0').len();
        formatted.truncate(trimmed_len);
        if formatted.ends_with('.') {
            formatted.push('0');
        }
    }
    Ok(formatted)
}

/// Shortens an address to `0x1234...abcd`
pub fn elide_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
