use semval::prelude::*;

pub const MAX_TENANT_NAME_LENGTH: usize = 100;

/// The display name of a tenant. Names are unique across tenants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TenantName(String);

impl TenantName {
    /// Create an unvalidated name. Surrounding whitespace is removed.
    ///
    /// # Arguments
    ///
    /// * `name` - The name as it was entered.
    pub fn unvalidated(name: &str) -> Self {
        Self(name.trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names are compared without regard to case when checking for
    /// duplicates.
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TenantNameInvalidity {
    /// The name is empty or only whitespace.
    Empty,

    /// The name has more characters than the contained maximum.
    MaxLength(usize),
}

impl Validate for TenantName {
    type Invalidity = TenantNameInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(self.0.is_empty(), TenantNameInvalidity::Empty)
            .invalidate_if(
                self.0.chars().count() > MAX_TENANT_NAME_LENGTH,
                TenantNameInvalidity::MaxLength(MAX_TENANT_NAME_LENGTH),
            )
            .into()
    }
}

impl ValidatedFrom<&str> for TenantName {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self::unvalidated(from);

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validated_from_blank() {
        let (_, context) = TenantName::validated_from("   ").expect_err("blank name");
        let errors = context.into_iter().collect::<Vec<_>>();

        assert_eq!(vec![TenantNameInvalidity::Empty], errors);
    }

    #[test]
    fn validated_from_too_long() {
        let name = "a".repeat(MAX_TENANT_NAME_LENGTH + 1);

        let (_, context) = TenantName::validated_from(name.as_str()).expect_err("long name");
        let errors = context.into_iter().collect::<Vec<_>>();

        assert_eq!(
            vec![TenantNameInvalidity::MaxLength(MAX_TENANT_NAME_LENGTH)],
            errors
        );
    }

    #[test]
    fn validated_from_multibyte_at_limit() {
        let name = "é".repeat(MAX_TENANT_NAME_LENGTH);

        let parsed = TenantName::validated_from(name.as_str()).expect("name is at the limit");

        assert_eq!(name, parsed.as_str());
    }

    #[test]
    fn matches_ignores_case() {
        let name = TenantName::unvalidated(" Bella Vista Restaurant ");

        assert!(name.matches("bella vista restaurant"));
        assert!(!name.matches("Bella Vista"));
    }
}
