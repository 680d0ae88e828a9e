//! The identify probe form: input validation and the recorded outcome of a run.

use crate::api::{ApiError, IdentifyRequest, IdentifyResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please provide at least one contact method (email or phone number)")]
    NoContactMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifyForm {
    pub email: String,
    pub phone_number: String,
}

impl IdentifyForm {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email: email.unwrap_or_default(),
            phone_number: phone_number.unwrap_or_default(),
        }
    }

    /// Build the request body. Surrounding whitespace is trimmed and blank
    /// fields are left out.
    pub fn to_request(&self) -> Result<IdentifyRequest, FormError> {
        let email = non_blank(&self.email);
        let phone_number = non_blank(&self.phone_number);
        if email.is_none() && phone_number.is_none() {
            return Err(FormError::NoContactMethod);
        }
        Ok(IdentifyRequest {
            email,
            phone_number,
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// One submitted probe and what came back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiTestResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<IdentifyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub request: IdentifyRequest,
    pub duration_ms: u64,
}

impl ApiTestResult {
    pub fn from_outcome(
        request: IdentifyRequest,
        outcome: Result<IdentifyResponse, ApiError>,
        duration_ms: u64,
    ) -> Self {
        let (success, data, error) = match outcome {
            Ok(data) => (true, Some(data), None),
            Err(e) => (false, None, Some(e.display_message())),
        };
        Self {
            success,
            data,
            error,
            timestamp: Utc::now(),
            request,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ConsolidatedContact;
    use crate::contact::ContactId;
    use pretty_assertions::assert_eq;

    #[test]
    fn requires_one_method() {
        let form = IdentifyForm::new(Some("   ".to_string()), None);
        assert_eq!(form.to_request(), Err(FormError::NoContactMethod));
        assert_eq!(IdentifyForm::default().to_request(), Err(FormError::NoContactMethod));
    }

    #[test]
    fn trims_and_drops_blank_fields() {
        let form = IdentifyForm::new(Some(" doc@hillvalley.edu ".to_string()), Some("".to_string()));
        assert_eq!(
            form.to_request().unwrap(),
            IdentifyRequest {
                email: Some("doc@hillvalley.edu".to_string()),
                phone_number: None,
            }
        );

        let both = IdentifyForm::new(Some("a@x.com".to_string()), Some("123".to_string()));
        let req = both.to_request().unwrap();
        assert_eq!(req.phone_number.as_deref(), Some("123"));
    }

    #[test]
    fn result_from_outcome() {
        let req = IdentifyRequest {
            email: Some("a@x.com".to_string()),
            phone_number: None,
        };
        let ok = ApiTestResult::from_outcome(
            req.clone(),
            Ok(IdentifyResponse {
                contact: ConsolidatedContact {
                    primary_contact_id: ContactId::new("1"),
                    emails: vec!["a@x.com".to_string()],
                    phone_numbers: vec![],
                    secondary_contact_ids: vec![],
                },
            }),
            12,
        );
        assert!(ok.success);
        assert_eq!(ok.error, None);
        assert_eq!(ok.duration_ms, 12);

        let failed = ApiTestResult::from_outcome(
            req,
            Err(ApiError::Status {
                endpoint: "api/identify".to_string(),
                status: 500,
                message: "db unavailable".to_string(),
            }),
            40,
        );
        assert!(!failed.success);
        assert_eq!(failed.data, None);
        assert_eq!(failed.error.as_deref(), Some("db unavailable"));
    }
}
