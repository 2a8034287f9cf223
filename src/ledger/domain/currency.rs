use std::collections::HashMap;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Currency {
    code: String,
    symbol: String,
    minor_units: u8,
}

#[derive(Debug, Eq, PartialEq)]
pub enum CurrencyParseError {
    /// The provided amount could not be parsed as a number.
    InvalidNumber(String),
    /// The provided amount included more precision than the currency's minor
    /// units allow for. The parameter is the number of decimal places that
    /// were provided.
    TooManyDecimals(Currency, usize),
}

impl Currency {
    /// Construct a new currency.
    ///
    /// # Arguments
    /// * `code` - The currency's unique string code.
    /// * `symbol` - The symbol displayed in front of formatted amounts.
    /// * `minor_units` - The number of decimal places allowed by the currency.
    ///
    /// # Examples
    ///
    /// ```
    /// # use balanced_books::ledger::domain::currency::Currency;
    /// let _usd = Currency::new("USD", "$", 2);
    /// let _jpy = Currency::new("JPY", "¥", 0);
    /// ```
    pub fn new<C: Into<String>, S: Into<String>>(code: C, symbol: S, minor_units: u8) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            minor_units,
        }
    }

    /// Parse an amount from a string representation.
    ///
    /// # Arguments
    /// * `raw_amount` - A string containing a numeric amount. This can include
    ///   whitespace and separators. A blank string is a zero amount.
    ///
    /// # Returns
    ///
    /// The parsed amount as an integer in the currency's minor units. This can
    /// be represented as `amount * 10^n` where `n` is the currency's minor
    /// units.
    ///
    /// The amount is always represented as an integer so that balances are
    /// compared exactly rather than within a floating point tolerance.
    pub fn parse_amount(&self, raw_amount: &str) -> Result<i64, CurrencyParseError> {
        let decimal = ".";
        let separator = ",";

        let cleaned_amount = raw_amount.replace(separator, "").replace(' ', "");

        if cleaned_amount.is_empty() {
            return Ok(0);
        }

        let number_to_parse = match cleaned_amount.rsplit_once(decimal) {
            // The number has no decimals, so pad it with the appropriate number
            // of zeroes for the currency.
            None => format!("{}{}", cleaned_amount, "0".repeat(self.minor_units.into())),

            // The number includes a decimal component, so validate that it does
            // not contain too many decimal places.
            Some((whole_part, decimal_part)) => {
                if decimal_part.len() <= Into::<usize>::into(self.minor_units) {
                    format!(
                        "{}{:0<width$}",
                        whole_part,
                        decimal_part,
                        width = self.minor_units.into(),
                    )
                } else {
                    return Err(CurrencyParseError::TooManyDecimals(
                        self.clone(),
                        decimal_part.len(),
                    ));
                }
            }
        };

        number_to_parse
            .parse()
            .map_err(|_| CurrencyParseError::InvalidNumber(raw_amount.to_owned()))
    }

    /// Format a value in minor units as a decimal string, eg `-0.07`.
    pub fn format_value<V: Into<i128>>(&self, value: V) -> String {
        let value = value.into();

        // Preserve the sign, but then do string manipulation on the absolute
        // value so we don't have to worry about a negative sign.
        let sign = if value.is_negative() { "-" } else { "" };
        let amount_str = value.unsigned_abs().to_string();

        if self.minor_units == 0 {
            return format!("{}{}", sign, amount_str);
        }

        // We have to pad the value in order to ensure the string is long enough
        // to insert the decimal point at the appropriate location.
        let padded = format!(
            "{:0>width$}",
            amount_str,
            width = usize::from(self.minor_units) + 1
        );
        let decimal_location = padded.len() - usize::from(self.minor_units);

        let whole_part = &padded[..decimal_location];
        let decimal_part = &padded[decimal_location..];

        format!("{}{}.{}", sign, whole_part, decimal_part)
    }

    /// Format a value in minor units with the currency's symbol, eg `-$0.07`.
    pub fn format_with_symbol<V: Into<i128>>(&self, value: V) -> String {
        let formatted = self.format_value(value);

        match formatted.strip_prefix('-') {
            Some(unsigned) => format!("-{}{}", self.symbol, unsigned),
            None => format!("{}{}", self.symbol, formatted),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn minor_units(&self) -> u8 {
        self.minor_units
    }
}

/// The currencies available to tenants unless configured otherwise.
pub fn default_currencies() -> HashMap<String, Currency> {
    [
        Currency::new("USD", "$", 2),
        Currency::new("EUR", "€", 2),
        Currency::new("GBP", "£", 2),
        Currency::new("JPY", "¥", 0),
    ]
    .into_iter()
    .map(|currency| (currency.code().to_owned(), currency))
    .collect()
}

/// An amount associated with a specific currency.
///
/// The amount is always stored as a whole number, so the value depends on the
/// associated currency's minor units.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyAmount {
    currency: Currency,
    value: i128,
}

impl CurrencyAmount {
    pub fn from_minor<V: Into<i128>>(currency: Currency, value: V) -> Self {
        Self {
            currency,
            value: value.into(),
        }
    }

    pub fn from_str(currency: Currency, raw_amount: &str) -> Result<Self, CurrencyParseError> {
        let value = currency.parse_amount(raw_amount)?;

        Ok(Self::from_minor(currency, value))
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn format_value(&self) -> String {
        self.currency.format_value(self.value)
    }
}
