use semval::prelude::*;

/// An ISO 4217 style currency code such as `USD`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn unvalidated(code: &str) -> Self {
        Self(code.trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurrencyCodeInvalidity {
    /// The code is not exactly three uppercase ASCII letters.
    Format,
}

impl Validate for CurrencyCode {
    type Invalidity = CurrencyCodeInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let well_formed = self.0.len() == 3 && self.0.chars().all(|c| c.is_ascii_uppercase());

        ValidationContext::new()
            .invalidate_if(!well_formed, CurrencyCodeInvalidity::Format)
            .into()
    }
}

impl ValidatedFrom<&str> for CurrencyCode {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self::unvalidated(from);

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}
