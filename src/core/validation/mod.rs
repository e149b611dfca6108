//! Validation and filtering of request payloads
//!
//! Payloads arrive as raw JSON so that a wrong type (e.g. `"deposit": "abc"`)
//! is reported as a field error instead of an opaque deserialisation failure.
//! [`FieldRules`] filters each declared field, runs its validators, and
//! collects every failure before the payload is deserialised into a typed
//! request.

pub mod extractor;
pub mod filters;
pub mod validators;

pub use extractor::Validated;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{FieldValidationError, NexusResult, ValidationError};
use crate::core::lifecycle::{TransitionPreview, TransitionRequest};
use crate::core::transaction::{Rating, TransactionDraft, TransactionStatus};

type FilterFn = Box<dyn Fn(&str, Value) -> Value + Send + Sync>;
type ValidatorFn = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

const DATE_FORMAT: &str = "%Y-%m-%d";

struct FieldRule {
    field: &'static str,
    filters: Vec<FilterFn>,
    validators: Vec<ValidatorFn>,
}

/// Per-field filters and validators for one payload type
#[derive(Default)]
pub struct FieldRules {
    fields: Vec<FieldRule>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule_mut(&mut self, field: &'static str) -> &mut FieldRule {
        let index = match self.fields.iter().position(|r| r.field == field) {
            Some(index) => index,
            None => {
                self.fields.push(FieldRule {
                    field,
                    filters: Vec::new(),
                    validators: Vec::new(),
                });
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }

    pub fn add_filter<F>(&mut self, field: &'static str, filter: F) -> &mut Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.rule_mut(field).filters.push(Box::new(filter));
        self
    }

    pub fn add_validator<V>(&mut self, field: &'static str, validator: V) -> &mut Self
    where
        V: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rule_mut(field).validators.push(Box::new(validator));
        self
    }

    /// Filter then validate every declared field.
    ///
    /// Only the first failing validator of each field is reported. Fields that
    /// are not declared pass through untouched.
    pub fn validate_and_filter(&self, payload: Value) -> Result<Value, ValidationError> {
        let Value::Object(mut obj) = payload else {
            return Err(ValidationError::FieldError {
                field: "body".to_string(),
                message: "must be a JSON object".to_string(),
            });
        };

        let mut errors = Vec::new();

        for rule in &self.fields {
            let mut value = obj.remove(rule.field).unwrap_or(Value::Null);
            for filter in &rule.filters {
                value = filter(rule.field, value);
            }

            if let Some(message) = rule
                .validators
                .iter()
                .find_map(|validate| validate(rule.field, &value).err())
            {
                errors.push(FieldValidationError {
                    field: rule.field.to_string(),
                    message,
                });
            }

            if !value.is_null() {
                obj.insert(rule.field.to_string(), value);
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(obj))
        } else {
            Err(ValidationError::FieldErrors(errors))
        }
    }
}

/// A request payload with declared validation rules
pub trait ValidatedPayload: DeserializeOwned {
    fn rules() -> FieldRules;

    fn from_json(payload: Value) -> NexusResult<Self> {
        let filtered = Self::rules().validate_and_filter(payload)?;
        Ok(serde_json::from_value(filtered)?)
    }
}

/// Body of `POST /transactions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub host_client_id: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    pub car_name: String,
    pub deposit: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Initial status; `locked` when omitted
    #[serde(default)]
    pub status: Option<TransactionStatus>,
}

impl ValidatedPayload for CreateTransactionRequest {
    fn rules() -> FieldRules {
        let mut rules = FieldRules::new();

        for field in ["hostClientId", "hostName"] {
            rules
                .add_filter(field, filters::trim())
                .add_filter(field, filters::blank_as_null())
                .add_validator(field, validators::string());
        }

        rules
            .add_filter("carName", filters::trim())
            .add_validator("carName", validators::required())
            .add_validator("carName", validators::string())
            .add_validator("carName", validators::non_empty());

        rules
            .add_validator("deposit", validators::required())
            .add_validator("deposit", validators::number())
            .add_validator("deposit", validators::non_negative());

        for field in ["startDate", "endDate"] {
            rules
                .add_filter(field, filters::trim())
                .add_filter(field, filters::blank_as_null())
                .add_validator(field, validators::string())
                .add_validator(field, validators::date_format(DATE_FORMAT));
        }

        rules
            .add_filter("status", filters::trim())
            .add_filter("status", filters::lowercase())
            .add_filter("status", filters::blank_as_null())
            .add_validator(
                "status",
                validators::in_list(&["pending", "pending_deposit", "open", "locked", "agreed"]),
            );

        rules
    }
}

impl From<CreateTransactionRequest> for TransactionDraft {
    fn from(req: CreateTransactionRequest) -> Self {
        TransactionDraft::new(req.car_name, req.deposit)
            .with_host(req.host_client_id, req.host_name)
            .with_dates(req.start_date, req.end_date)
            .with_status(req.status.unwrap_or(TransactionStatus::Locked))
    }
}

/// Body of `PATCH /transactions/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PatchTransactionRequest {
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub rating: Option<Rating>,
    /// Recorded when `status` is `locked`
    #[serde(default)]
    pub renter_id: Option<String>,
}

impl PatchTransactionRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.rating.is_none()
    }
}

impl ValidatedPayload for PatchTransactionRequest {
    fn rules() -> FieldRules {
        let mut rules = FieldRules::new();

        rules
            .add_filter("status", filters::trim())
            .add_filter("status", filters::lowercase())
            .add_filter("status", filters::blank_as_null())
            .add_validator("status", validators::in_list(ALL_STATUSES));

        rules
            .add_filter("rating", filters::trim())
            .add_filter("rating", filters::lowercase())
            .add_filter("rating", filters::blank_as_null())
            .add_validator("rating", validators::in_list(&["good", "normal", "bad"]));

        add_renter_rules(&mut rules);
        rules
    }
}

const ALL_STATUSES: &[&str] = &[
    "pending",
    "pending_deposit",
    "open",
    "locked",
    "agreed",
    "completed",
    "released",
    "cancelled",
    "canceled",
];

/// Body of `POST /transactions/{id}/transitions`
impl ValidatedPayload for TransitionRequest {
    fn rules() -> FieldRules {
        let mut rules = FieldRules::new();

        rules
            .add_filter("status", filters::trim())
            .add_filter("status", filters::lowercase())
            .add_validator("status", validators::required())
            .add_validator("status", validators::in_list(ALL_STATUSES));

        rules
            .add_filter("rating", filters::trim())
            .add_filter("rating", filters::lowercase())
            .add_filter("rating", filters::blank_as_null())
            .add_validator("rating", validators::in_list(&["good", "normal", "bad"]));

        add_renter_rules(&mut rules);
        rules
    }
}

/// Body of `POST /transactions/{id}/transitions/confirm`: a preview echoed back
impl ValidatedPayload for TransitionPreview {
    fn rules() -> FieldRules {
        let mut rules = FieldRules::new();

        rules
            .add_validator("transaction_id", validators::required())
            .add_validator("transaction_id", validators::string());

        for field in ["from", "to"] {
            rules
                .add_validator(field, validators::required())
                .add_validator(field, validators::in_list(ALL_STATUSES));
        }

        rules
            .add_validator("actor", validators::required())
            .add_validator("actor", validators::in_list(&["host", "renter"]));

        add_renter_rules(&mut rules);
        rules
    }
}

fn add_renter_rules(rules: &mut FieldRules) {
    rules
        .add_filter("renter_id", filters::trim())
        .add_filter("renter_id", filters::blank_as_null())
        .add_validator("renter_id", validators::string());
}
