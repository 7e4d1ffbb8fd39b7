//! The store's response envelope: every enveloped reply is a JSON object with
//! exactly `status`, `data` and `error`. Deployed stores also emit the short
//! keys `S`, `D` and `E`, which are accepted as aliases.

use crate::services::store_client::{StoreClientError, StoreClientResult};
use serde_json::{Map, Value};

const FIELDS: [(&str, &str); 3] = [("status", "S"), ("data", "D"), ("error", "E")];

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: i64,
    pub data: Value,
    /// Empty when the store reported no error.
    pub error: String,
}

impl Envelope {
    /// Parse and validate a raw response body.
    pub fn from_slice(body: &[u8]) -> StoreClientResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| StoreClientError::Protocol(format!("response is not JSON: {}", err)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> StoreClientResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(StoreClientError::Protocol(
                "response is not a JSON object".into(),
            ));
        };
        let [status, data, error] = FIELDS.map(|(long, short)| take_field(&mut fields, long, short));

        let status = status?;
        let status = status.as_i64().ok_or_else(|| {
            StoreClientError::Protocol(format!("envelope status is not an integer: {}", status))
        })?;
        let data = data?;
        let error = match error? {
            Value::Null => String::new(),
            Value::String(message) => message,
            other => {
                return Err(StoreClientError::Protocol(format!(
                    "envelope error is not a string: {}",
                    other
                )));
            }
        };

        Ok(Self {
            status,
            data,
            error,
        })
    }

    /// Surface a store-reported failure, otherwise hand back the payload.
    pub fn into_data(self) -> StoreClientResult<Value> {
        if self.error.is_empty() {
            Ok(self.data)
        } else {
            Err(StoreClientError::Store {
                status: self.status,
                message: self.error,
            })
        }
    }
}

fn take_field(fields: &mut Map<String, Value>, long: &str, short: &str) -> StoreClientResult<Value> {
    fields
        .remove(long)
        .or_else(|| fields.remove(short))
        .ok_or_else(|| StoreClientError::Protocol(format!("envelope is missing `{}`", long)))
}
