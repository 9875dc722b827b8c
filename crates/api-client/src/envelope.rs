//! The `{success, data, message}` wrapper around every response

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Uniform response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the server accepted the request
    pub success: bool,
    /// Payload, absent for unit responses
    pub data: Option<T>,
    /// Human-readable message
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope around `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Unwrap the payload
    ///
    /// `what` names the request in the `MissingData` error.
    pub fn into_data(self, what: &str) -> ApiResult<T> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "request was not successful".to_string()),
            });
        }
        self.data.ok_or_else(|| ApiError::MissingData(what.to_string()))
    }

    /// Check success and drop any payload
    pub fn into_unit(self) -> ApiResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "request was not successful".to_string()),
            })
        }
    }
}

/// Best-effort extraction of `message` from an error body
pub(crate) fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        })
        | Ok(ErrorBody {
            error: Some(message),
            ..
        }) => message,
        _ if body.trim().is_empty() => "Unknown error".to_string(),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_data() {
        let envelope: ApiEnvelope<i64> =
            serde_json::from_value(json!({"success": true, "data": 5})).unwrap();
        assert_eq!(envelope.into_data("fines").unwrap(), 5);
    }

    #[test]
    fn test_rejected() {
        let envelope: ApiEnvelope<i64> = serde_json::from_value(
            json!({"success": false, "data": null, "message": "Book is not available"}),
        )
        .unwrap();
        let err = envelope.into_data("borrow").unwrap_err();
        assert!(matches!(err, ApiError::Rejected { ref message } if message == "Book is not available"));
    }

    #[test]
    fn test_missing_data() {
        let envelope: ApiEnvelope<i64> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(matches!(envelope.into_data("stats"), Err(ApiError::MissingData(_))));
    }

    #[test]
    fn test_into_unit_ignores_payload() {
        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_value(json!({"success": true, "data": null, "message": "Deleted"}))
                .unwrap();
        assert!(envelope.into_unit().is_ok());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"success":false,"message":"Member not found"}"#), "Member not found");
        assert_eq!(error_message(r#"{"error":"Forbidden"}"#), "Forbidden");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "Unknown error");
    }
}
