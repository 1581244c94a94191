//! Loan eligibility form fields
//!
//! Administrators define the fields an applicant fills in; the same
//! definitions check an applicant's answers.

use crate::validation::Rules;
use async_trait::async_trait;
use chrono::NaiveDate;
use console_cascade::{RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, Validate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Input kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Decimal number, optionally bounded
    Number,
    /// One of a fixed list
    Select,
    /// `YYYY-MM-DD`
    Date,
}

/// Field definition (stored record and form alike)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanField {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Machine name
    pub field_name: String,
    /// Label shown to applicants
    pub label: String,
    /// Input kind
    #[serde(default)]
    pub field_type: FieldType,
    /// Answer required
    #[serde(default)]
    pub required: bool,
    /// Lower bound for numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    /// Upper bound for numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    /// Choices for select fields
    #[serde(default)]
    pub options: Vec<String>,
}

impl LoanField {
    /// Optional field of a kind
    pub fn new(field_name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: String::new(),
            field_name: field_name.into(),
            label: label.into(),
            field_type,
            required: false,
            min: None,
            max: None,
            options: Vec::new(),
        }
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Bound a number field
    #[inline]
    #[must_use]
    pub fn bounded(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Choices of a select field
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Check an applicant's answer
    ///
    /// # Errors
    /// The violation, keyed by `field_name`
    pub fn check_value(&self, value: &str) -> Result<(), FieldViolation> {
        let value = value.trim();
        let fail = |message: String| Err(FieldViolation::new(self.field_name.clone(), message));

        if value.is_empty() {
            return if self.required {
                fail(format!("{} is required", self.label))
            } else {
                Ok(())
            };
        }

        match self.field_type {
            FieldType::Text => Ok(()),
            FieldType::Number => {
                let Ok(number) = Decimal::from_str(value) else {
                    return fail(format!("{} must be a number", self.label));
                };
                if let Some(min) = self.min.filter(|min| number < *min) {
                    return fail(format!("{} must be at least {min}", self.label));
                }
                if let Some(max) = self.max.filter(|max| number > *max) {
                    return fail(format!("{} must be at most {max}", self.label));
                }
                Ok(())
            }
            FieldType::Select => {
                if self.options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    fail(format!("{} must be one of: {}", self.label, self.options.join(", ")))
                }
            }
            FieldType::Date => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(_) => Ok(()),
                Err(_) => fail(format!("{} must be a date (YYYY-MM-DD)", self.label)),
            },
        }
    }
}

impl Validate for LoanField {
    fn violations(&self) -> Vec<FieldViolation> {
        let bounds_ok = match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        };
        let has_options = self.options.iter().any(|o| !o.trim().is_empty());

        Rules::new()
            .require_text("fieldName", &self.field_name, "Field name")
            .require_text("label", &self.label, "Label")
            .check("min", bounds_ok, "Minimum cannot exceed maximum")
            .check(
                "options",
                self.field_type != FieldType::Select || has_options,
                "Select fields need at least one option",
            )
            .finish()
    }
}

/// Loan field collection
#[derive(Debug, Clone)]
pub struct LoanFields {
    client: RestClient,
}

impl LoanFields {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScopedSource for LoanFields {
    type Scope = ();
    type View = Vec<LoanField>;

    async fn fetch(&self, _: &()) -> Result<Vec<LoanField>, ConsoleError> {
        self.client.list(Resource::Loan, Vec::new()).await
    }
}

#[async_trait]
impl RecordStore for LoanFields {
    type Scope = ();
    type Draft = LoanField;

    async fn create(&self, _: &(), draft: &LoanField) -> Result<(), ConsoleError> {
        self.client.create(Resource::Loan, draft).await.map(drop)
    }

    async fn update(&self, _: &(), id: &str, draft: &LoanField) -> Result<(), ConsoleError> {
        self.client.update(Resource::Loan, id, draft).await.map(drop)
    }

    async fn delete(&self, _: &(), id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::Loan, id).await
    }
}
