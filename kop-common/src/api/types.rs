//! Backend response envelope types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ========================================
// Envelope
// ========================================

/// Response envelope returned by every backend endpoint
///
/// # Examples
///
/// ```
/// use kop_common::api::types::ApiResponse;
///
/// let json = r#"{"success": true, "message": "OK", "data": [1, 2, 3]}"#;
/// let response: ApiResponse<Vec<u32>> = serde_json::from_str(json).unwrap();
///
/// assert!(response.success);
/// assert_eq!(response.data, Some(vec![1, 2, 3]));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the backend considers the request successful
    #[serde(default)]
    pub success: bool,

    /// Human-readable message (usually Indonesian, shown to the user)
    #[serde(default)]
    pub message: String,

    /// Payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Field validation errors, keyed by field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,

    /// Pagination metadata for list endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,

    /// Navigation links for list endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PaginationLinks>,
}

impl<T> ApiResponse<T> {
    /// Create a successful envelope carrying `data`
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            pagination: None,
            links: None,
        }
    }

    /// Create a failed envelope with a message and no payload
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
            pagination: None,
            links: None,
        }
    }

    /// First field validation error, in field-name order
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_ref()?
            .values()
            .flat_map(|messages| messages.iter())
            .map(String::as_str)
            .find(|m| !m.trim().is_empty())
    }

    /// Most specific user-facing message this envelope carries
    ///
    /// Prefers the backend `message`, then the first validation error.
    pub fn user_message(&self) -> Option<&str> {
        let message = self.message.trim();
        if !message.is_empty() {
            return Some(message);
        }
        self.first_error()
    }
}

// ========================================
// Pagination
// ========================================

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub current_page: u64,
    /// Rows per page
    pub per_page: u64,
    /// Total number of rows
    pub total: u64,
    /// Last page number
    pub last_page: u64,
    /// 1-indexed position of the first row on this page (absent when empty)
    #[serde(default)]
    pub from: Option<u64>,
    /// 1-indexed position of the last row on this page (absent when empty)
    #[serde(default)]
    pub to: Option<u64>,
}

impl Pagination {
    /// Whether a page follows this one
    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Page navigation links
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_envelope_deserialization_with_pagination() {
        let json = r#"{
            "success": true,
            "message": "Data anggota",
            "data": [{"id": 1}],
            "pagination": {"current_page": 1, "per_page": 10, "total": 25, "last_page": 3, "from": 1, "to": 10},
            "links": {"first": "/a?page=1", "last": "/a?page=3", "prev": null, "next": "/a?page=2"}
        }"#;
        let response: ApiResponse<Value> = serde_json::from_str(json).unwrap();

        assert!(response.success);
        let pagination = response.pagination.unwrap();
        assert_eq!(pagination.total, 25);
        assert!(pagination.has_next());
        assert_eq!(response.links.unwrap().next.as_deref(), Some("/a?page=2"));
    }

    #[test]
    fn test_envelope_missing_fields_default() {
        let response: ApiResponse<Value> = serde_json::from_str("{}").unwrap();

        assert!(!response.success);
        assert_eq!(response.message, "");
        assert!(response.data.is_none());
        assert!(response.user_message().is_none());
    }

    #[test]
    fn test_user_message_prefers_message() {
        let mut response: ApiResponse<Value> = ApiResponse::failure("Performa tidak ditemukan");
        response.errors = Some(BTreeMap::from([(
            "periode".to_string(),
            vec!["Format periode salah".to_string()],
        )]));

        assert_eq!(response.user_message(), Some("Performa tidak ditemukan"));
    }

    #[test]
    fn test_user_message_falls_back_to_validation_error() {
        let json = json!({
            "success": false,
            "message": "  ",
            "errors": {"kuadrant": ["Kuadrant harus 1-4"], "cdi": ["CDI harus angka"]}
        });
        let response: ApiResponse<Value> = serde_json::from_value(json).unwrap();

        // BTreeMap keeps field names ordered, so "cdi" comes first
        assert_eq!(response.user_message(), Some("CDI harus angka"));
    }

    #[test]
    fn test_ok_envelope_serialization_skips_empty_fields() {
        let response = ApiResponse::ok("Berhasil", json!({"id": 7}));
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"id\":7"));
        assert!(!json.contains("pagination"));
        assert!(!json.contains("errors"));
    }
}
