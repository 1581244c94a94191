//! Form validation rules
//!
//! Every rule runs; a form reports all of its violations at once rather
//! than stopping at the first.

use console_core::FieldViolation;
use rust_decimal::Decimal;

/// Violation collector
///
/// ```rust
/// use console_settings::validation::Rules;
///
/// let violations = Rules::new()
///     .require_text("ruleName", "", "Rule name")
///     .min_i64("overdueDays", 0, 1)
///     .finish();
/// assert_eq!(violations.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    violations: Vec<FieldViolation>,
}

impl Rules {
    /// Empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text must contain a non-whitespace character
    #[must_use]
    pub fn require_text(self, field: &str, value: &str, label: &str) -> Self {
        self.check(field, !value.trim().is_empty(), format!("{label} is required"))
    }

    /// Integer must be at least `min`
    #[must_use]
    pub fn min_i64(self, field: &str, value: i64, min: i64) -> Self {
        self.check(field, value >= min, format!("Must be at least {min}"))
    }

    /// Amount must be strictly positive
    #[must_use]
    pub fn positive_decimal(self, field: &str, value: Decimal) -> Self {
        self.check(field, value > Decimal::ZERO, "Must be greater than 0")
    }

    /// Values must be strictly ascending
    #[must_use]
    pub fn ascending<T: PartialOrd>(self, field: &str, values: &[T]) -> Self {
        let ok = values.windows(2).all(|w| w[0] < w[1]);
        self.check(field, ok, "Must be in strictly ascending order")
    }

    /// Add a violation unless `ok`
    #[must_use]
    pub fn check(mut self, field: &str, ok: bool, message: impl Into<String>) -> Self {
        if !ok {
            self.violations.push(FieldViolation::new(field, message));
        }
        self
    }

    /// Merge violations of a nested record, prefixing their field names
    ///
    /// `tiers[1]` + `afterDays` becomes `tiers[1].afterDays`.
    #[must_use]
    pub fn nested(mut self, prefix: &str, violations: Vec<FieldViolation>) -> Self {
        self.violations.extend(violations.into_iter().map(|v| FieldViolation {
            field: format!("{prefix}.{}", v.field),
            message: v.message,
        }));
        self
    }

    /// Collected violations
    #[inline]
    #[must_use]
    pub fn finish(self) -> Vec<FieldViolation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn passing_rules_yield_nothing() {
        let violations = Rules::new()
            .require_text("name", "Survey", "Name")
            .min_i64("days", 1, 1)
            .positive_decimal("total", Decimal::new(5, 1))
            .ascending("tiers", &[1, 3, 7])
            .finish();
        assert!(violations.is_empty());
    }

    #[test]
    fn every_failure_is_reported() {
        let violations = Rules::new()
            .require_text("name", "  ", "Name")
            .min_i64("days", 0, 1)
            .positive_decimal("total", Decimal::ZERO)
            .ascending("tiers", &[3, 3])
            .finish();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "days", "total", "tiers"]);
        assert_eq!(violations[0].message, "Name is required");
        assert_eq!(violations[1].message, "Must be at least 1");
    }

    #[test]
    fn nested_fields_are_prefixed() {
        let violations = Rules::new()
            .nested("tiers[2]", vec![FieldViolation::new("notifyRole", "Role is required")])
            .finish();
        assert_eq!(violations[0].field, "tiers[2].notifyRole");
    }
}
