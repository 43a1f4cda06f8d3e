//! The directory of supported display currencies.
//!
//! Currency only affects presentation. Amounts are stored as plain numbers
//! and are never converted when the profile currency changes.

use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

use numfmt::{Formatter, Precision};
use serde::Serialize;

use crate::Error;

/// A supported display currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Currency {
    /// The ISO 4217 code, e.g. "PHP".
    pub code: &'static str,
    /// The symbol used when formatting amounts, e.g. "₱".
    pub symbol: &'static str,
    /// The human readable name, e.g. "Philippine Peso".
    pub name: &'static str,
}

/// The currencies a profile may select, in display order.
pub const CURRENCIES: [Currency; 10] = [
    Currency {
        code: "PHP",
        symbol: "₱",
        name: "Philippine Peso",
    },
    Currency {
        code: "AED",
        symbol: "AED",
        name: "UAE Dirham",
    },
    Currency {
        code: "USD",
        symbol: "$",
        name: "US Dollar",
    },
    Currency {
        code: "EUR",
        symbol: "€",
        name: "Euro",
    },
    Currency {
        code: "GBP",
        symbol: "£",
        name: "British Pound",
    },
    Currency {
        code: "JPY",
        symbol: "¥",
        name: "Japanese Yen",
    },
    Currency {
        code: "INR",
        symbol: "₹",
        name: "Indian Rupee",
    },
    Currency {
        code: "SAR",
        symbol: "﷼",
        name: "Saudi Riyal",
    },
    Currency {
        code: "CAD",
        symbol: "$",
        name: "Canadian Dollar",
    },
    Currency {
        code: "AUD",
        symbol: "$",
        name: "Australian Dollar",
    },
];

/// Look up a currency by its ISO code.
///
/// Unknown but well-formed codes are not an error for display purposes; the
/// code itself is used as the symbol so amounts stay readable.
pub fn currency_for_code(code: &str) -> Option<Currency> {
    CURRENCIES.iter().find(|c| c.code == code).copied()
}

/// The symbol for a currency code, falling back to the code itself.
pub fn currency_symbol(code: &str) -> &str {
    match currency_for_code(code) {
        Some(currency) => currency.symbol,
        None => code,
    }
}

/// Validate a currency code: exactly three ASCII letters, stored uppercase.
pub fn validate_currency_code(code: &str) -> Result<String, Error> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(Error::InvalidCurrencyCode(code.to_owned()))
    }
}

/// Format `number` as an amount in the given currency, e.g. "₱1,234.50".
///
/// Negative amounts place the sign before the symbol. Formatters are built
/// once per currency and reused across calls.
pub fn format_currency(number: f64, code: &str) -> String {
    static FORMATTERS: OnceLock<Mutex<HashMap<String, Formatter>>> = OnceLock::new();

    let symbol = currency_symbol(code);

    if number == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return format!("{symbol}0.00");
    }

    let mut formatters = match FORMATTERS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
    {
        Ok(guard) => guard,
        // A poisoned cache only loses memoization, so rebuild the formatter.
        Err(poisoned) => poisoned.into_inner(),
    };

    let prefix = if number < 0.0 {
        format!("-{symbol}")
    } else {
        symbol.to_owned()
    };

    let formatter = formatters.entry(prefix.clone()).or_insert_with(|| {
        Formatter::currency(&prefix)
            .unwrap_or_else(|_| Formatter::default())
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = formatter.fmt_string(number.abs());

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}
