//! Share links: a transaction's terms carried as URL query parameters.
//!
//! Format: `<origin>/tx?host=...&car=...&deposit=...&start=...&end=...&mode=...`
//! with an optional `tx=<id>` naming an existing record. Optional parameters
//! fall back to defaults; a missing car or an unusable deposit makes the whole
//! link invalid, and an invalid link has no recovery path other than asking
//! the host for a new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::error::ShareLinkError;
use crate::core::extractors::DetectedRuntime;
use crate::core::lifecycle::format_deposit;
use crate::core::runtime::RuntimeEnvironment;
use crate::core::transaction::Transaction;

/// Path of the renter view
pub const SHARE_PATH: &str = "/tx";

/// Label shown when the link does not name the host
pub const HOST_PLACEHOLDER: &str = "Host";

/// Shown for a missing start or end date
pub const UNSPECIFIED: &str = "unspecified";

pub const DEFAULT_MODE: &str = "record";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decoded share link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    /// Existing record this link refers to, if any
    #[serde(default)]
    pub transaction_id: Option<Uuid>,
    pub host: String,
    pub car: String,
    pub deposit: f64,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    pub mode: String,
}

#[derive(Serialize)]
struct EncodedParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    car: &'a str,
    deposit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    mode: &'a str,
}

impl ShareLink {
    /// Link for an existing record
    pub fn for_transaction(tx: &Transaction) -> Self {
        Self {
            transaction_id: Some(tx.id),
            host: tx
                .host_name
                .clone()
                .unwrap_or_else(|| HOST_PLACEHOLDER.to_string()),
            car: tx.car_name.clone(),
            deposit: tx.deposit,
            start: tx.start_date,
            end: tx.end_date,
            mode: DEFAULT_MODE.to_string(),
        }
    }

    /// Query string without the leading `?`
    pub fn to_query(&self) -> String {
        let params = EncodedParams {
            tx: self.transaction_id.map(|id| id.to_string()),
            host: (self.host != HOST_PLACEHOLDER).then_some(self.host.as_str()),
            car: &self.car,
            deposit: self.deposit.to_string(),
            start: self.start.map(|d| d.format(DATE_FORMAT).to_string()),
            end: self.end.map(|d| d.format(DATE_FORMAT).to_string()),
            mode: &self.mode,
        };
        // Serialising a flat struct of strings cannot fail
        serde_urlencoded::to_string(&params).unwrap_or_default()
    }

    /// Full URL under `origin`
    pub fn to_url(&self, origin: &str) -> String {
        format!(
            "{}{}?{}",
            origin.trim_end_matches('/'),
            SHARE_PATH,
            self.to_query()
        )
    }

    /// Decode a raw query string (with or without the leading `?`)
    pub fn decode(query: &str) -> Result<Self, ShareLinkError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| ShareLinkError::Malformed {
                message: e.to_string(),
            })?;

        let mut params = HashMap::new();
        for (key, value) in pairs {
            params.entry(key).or_insert(value);
        }
        Self::from_params(&params)
    }

    /// Decode the query part of a full share URL
    pub fn decode_url(url: &str) -> Result<Self, ShareLinkError> {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let query = query.split_once('#').map(|(q, _)| q).unwrap_or(query);
        Self::decode(query)
    }

    /// Decode already-split query parameters
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ShareLinkError> {
        let get = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let car = get("car").ok_or(ShareLinkError::MissingParam { param: "car" })?;

        let raw_deposit = get("deposit").ok_or(ShareLinkError::MissingParam { param: "deposit" })?;
        let deposit = raw_deposit
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| ShareLinkError::InvalidParam {
                param: "deposit",
                value: raw_deposit.to_string(),
            })?;

        let start = parse_date(get("start"), "start")?;
        let end = parse_date(get("end"), "end")?;

        let transaction_id = get("tx")
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| ShareLinkError::InvalidParam {
                    param: "tx",
                    value: raw.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            transaction_id,
            host: get("host").unwrap_or(HOST_PLACEHOLDER).to_string(),
            car: car.to_string(),
            deposit,
            start,
            end,
            mode: get("mode").unwrap_or(DEFAULT_MODE).to_string(),
        })
    }

    /// Rental period as shown to the renter
    pub fn period(&self) -> String {
        if self.start.is_none() && self.end.is_none() {
            return UNSPECIFIED.to_string();
        }
        let show = |d: Option<NaiveDate>| {
            d.map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| UNSPECIFIED.to_string())
        };
        format!("{} ~ {}", show(self.start), show(self.end))
    }
}

fn parse_date(raw: Option<&str>, param: &'static str) -> Result<Option<NaiveDate>, ShareLinkError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ShareLinkError::InvalidParam {
            param,
            value: value.to_string(),
        })
    })
    .transpose()
}

/// What the renter screen shows for a valid link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenterView {
    pub link: ShareLink,
    pub deposit_label: String,
    pub period: String,
    pub environment: RuntimeEnvironment,
    pub badge: String,
}

impl RenterView {
    pub fn new(link: ShareLink, runtime: DetectedRuntime) -> Self {
        Self {
            deposit_label: format_deposit(link.deposit),
            period: link.period(),
            environment: runtime.environment,
            badge: runtime.badge,
            link,
        }
    }
}
