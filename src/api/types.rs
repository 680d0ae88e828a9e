use crate::contact::ContactId;
use serde::{Deserialize, Serialize};

/// Probe body for `POST /api/identify`. At least one field is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: ConsolidatedContact,
}

/// The backend's consolidated view of one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
    pub primary_contact_id: ContactId,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub secondary_contact_ids: Vec<ContactId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Outcome of one tracked API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCallEvent {
    pub endpoint: String,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Receives call timings from [`ApiClient`](crate::api::ApiClient).
pub trait ApiCallObserver: Send + Sync {
    fn on_api_call(&self, event: &ApiCallEvent);
}

impl<F> ApiCallObserver for F
where
    F: Fn(&ApiCallEvent) + Send + Sync,
{
    fn on_api_call(&self, event: &ApiCallEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_omits_absent_fields() {
        let req = IdentifyRequest {
            email: None,
            phone_number: Some("123456".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"phoneNumber":"123456"}"#
        );
    }

    #[test]
    fn response_accepts_numeric_ids() {
        let json = r#"{"contact": {
            "primaryContactId": 1,
            "emails": ["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"],
            "phoneNumbers": ["123456"],
            "secondaryContactIds": [23]
        }}"#;
        let resp: IdentifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.contact.primary_contact_id, ContactId::new("1"));
        assert_eq!(resp.contact.secondary_contact_ids, vec![ContactId::new("23")]);
        assert_eq!(resp.contact.emails.len(), 2);
    }
}
