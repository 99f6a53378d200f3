//! Typed response envelopes for the procurement service
//!
//! Every endpoint answers with `{success, message?, data?}`. Bodies are decoded
//! here, once, so checks work with typed fields instead of key lookups.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("response body is not JSON: {0}")]
    NotJson(String),

    #[error("response body has no boolean 'success' flag")]
    MissingSuccessFlag,

    #[error("'data' is missing or not an object")]
    MissingData,

    #[error("'data' is missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("'data' has an unexpected shape: {0}")]
    Shape(String),

    #[error("success flag is true on an error response")]
    UnexpectedSuccess,
}

/// A decoded response body
#[derive(Debug)]
pub enum Envelope<T> {
    Success { data: T, message: Option<String> },
    Failure { message: Option<String> },
}

/// Payload types declare which `data` keys must be present
pub trait Contract: DeserializeOwned {
    const REQUIRED_FIELDS: &'static [&'static str];
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: Option<bool>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

/// Decode a body into a typed envelope, checking required `data` fields first
pub fn decode<T: Contract>(body: &str) -> Result<Envelope<T>, DecodeError> {
    let raw = parse_raw(body)?;
    let message = raw.message.as_ref().and_then(message_text);

    match raw.success {
        None => Err(DecodeError::MissingSuccessFlag),
        Some(false) => Ok(Envelope::Failure { message }),
        Some(true) => {
            let Some(Value::Object(fields)) = raw.data else {
                return Err(DecodeError::MissingData);
            };

            let missing: Vec<&'static str> = T::REQUIRED_FIELDS
                .iter()
                .copied()
                .filter(|name| !fields.contains_key(*name))
                .collect();
            if !missing.is_empty() {
                return Err(DecodeError::MissingFields(missing));
            }

            let data = serde_json::from_value(Value::Object(fields))
                .map_err(|e| DecodeError::Shape(e.to_string()))?;
            Ok(Envelope::Success { data, message })
        }
    }
}

/// Decode a body that must be an error envelope, returning its message
///
/// An empty or whitespace-only message is reported as `None`.
pub fn decode_failure(body: &str) -> Result<Option<String>, DecodeError> {
    let raw = parse_raw(body)?;
    match raw.success {
        None => Err(DecodeError::MissingSuccessFlag),
        Some(true) => Err(DecodeError::UnexpectedSuccess),
        Some(false) => Ok(raw.message.as_ref().and_then(message_text)),
    }
}

/// Best-effort message extraction for diagnostics; never fails
pub fn failure_message(body: &str) -> Option<String> {
    parse_raw(body)
        .ok()
        .and_then(|raw| raw.message.as_ref().and_then(message_text))
}

fn parse_raw(body: &str) -> Result<RawEnvelope, DecodeError> {
    serde_json::from_str(body).map_err(|e| DecodeError::NotJson(e.to_string()))
}

fn message_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// `data` of a successful login
#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
}

impl Contract for LoginData {
    const REQUIRED_FIELDS: &'static [&'static str] = &["token"];
}

/// Full `data` of a successful listing call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(deserialize_with = "count")]
    pub page: u64,
    #[serde(deserialize_with = "count")]
    pub page_size: u64,
    #[serde(deserialize_with = "count")]
    pub total: u64,
    #[serde(deserialize_with = "amount")]
    pub total_amount: f64,
    #[serde(deserialize_with = "amount")]
    pub jodal_total_amount: f64,
    #[serde(deserialize_with = "amount")]
    pub mas_total_amount: f64,
    pub items: Vec<DeliveryRequest>,
}

impl Contract for ListingPage {
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "page",
        "pageSize",
        "total",
        "totalAmount",
        "jodalTotalAmount",
        "masTotalAmount",
        "items",
    ];
}

/// The part of a listing page that filter and sort probes rely on
#[derive(Debug, Deserialize)]
pub struct ListingSlice {
    #[serde(deserialize_with = "count")]
    pub total: u64,
    pub items: Vec<DeliveryRequest>,
}

impl Contract for ListingSlice {
    const REQUIRED_FIELDS: &'static [&'static str] = &["items", "total"];
}

/// One delivery-request record
///
/// Only the fields the checks inspect get accessors; the rest are kept as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DeliveryRequest(Map<String, Value>);

/// Comparable value of a record field, used for sort-order assertions
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

impl DeliveryRequest {
    pub fn field_names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// `exclcProdctYn`
    pub fn category(&self) -> Option<&str> {
        self.text("exclcProdctYn")
    }

    /// `dminsttNm`
    pub fn institution_name(&self) -> Option<&str> {
        self.text("dminsttNm")
    }

    /// `prdctClsfcNoNm`
    pub fn product_class_name(&self) -> Option<&str> {
        self.text("prdctClsfcNoNm")
    }

    /// `dlvrReqRcptDate`, accepting `YYYY-MM-DD`, a datetime, or `YYYYMMDD`
    pub fn receipt_date(&self) -> Option<NaiveDate> {
        self.text("dlvrReqRcptDate").and_then(parse_record_date)
    }

    pub fn sort_key(&self, field: &str) -> Option<SortKey> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_f64().map(SortKey::Number),
            Value::String(s) if !s.is_empty() => Some(SortKey::Text(s.clone())),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw.get(..8).unwrap_or(raw), "%Y%m%d"))
        .ok()
}

/// Numbers may arrive as JSON numbers or numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    use serde::de::Error;
    match Numeric::deserialize(deserializer)? {
        Numeric::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Numeric::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got '{s}'"))),
    }
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    use serde::de::Error;
    match Numeric::deserialize(deserializer)? {
        Numeric::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("expected an amount, got {n}"))),
        Numeric::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected an amount, got '{s}'"))),
    }
}
