use thousands::Separable;

use crate::errors::CoreError;

/// Validation of raw cashier input and formatting of amounts for display.
///
/// Pure functions, no state. Anything rejected here never reaches the ledger.
pub struct InputService;

impl InputService {
    pub fn new() -> Self {
        Self
    }

    /// Parse a seller number. Must be a positive integer.
    pub fn parse_seller(&self, input: &str) -> Result<u32, CoreError> {
        let trimmed = input.trim();
        match parse_digits(trimmed) {
            Some(0) => Err(CoreError::ValidationError(
                "Seller number must be positive".into(),
            )),
            Some(n) => Ok(n),
            None => Err(CoreError::ValidationError(format!(
                "Invalid seller number '{trimmed}'"
            ))),
        }
    }

    /// Parse a whitespace-separated list of prices, e.g. `"10 20 30"`.
    /// Irregular whitespace is accepted; any non-integer token rejects the
    /// whole list.
    pub fn parse_prices(&self, input: &str) -> Result<Vec<u32>, CoreError> {
        let prices = input
            .split_whitespace()
            .map(|token| {
                parse_digits(token).ok_or_else(|| {
                    CoreError::ValidationError(format!("Invalid price '{token}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if prices.is_empty() {
            return Err(CoreError::ValidationError("No prices entered".into()));
        }
        Ok(prices)
    }

    /// Format an amount with US digit grouping and a currency label,
    /// e.g. `12345` → `"12,345 SEK"`.
    pub fn format_money(&self, amount: u64, currency: &str) -> String {
        format!("{} {currency}", amount.separate_with_commas())
    }
}

/// Plain ASCII digits only; `str::parse` alone would also take a sign.
fn parse_digits(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl Default for InputService {
    fn default() -> Self {
        Self::new()
    }
}
