use serde::{Deserialize, Serialize};

/// Uniform wrapper for every `/api` response body except health.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(body, json!({"success": false, "error": "nope"}));

        let body =
            serde_json::to_value(ApiResponse::ok(Vec::<u8>::new()).with_message("hi")).unwrap();
        assert_eq!(body, json!({"success": true, "data": [], "message": "hi"}));
    }

    #[test]
    fn parses_error_envelope_without_data() {
        let parsed: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"success":false,"error":"bad"}"#).unwrap();
        assert!(!parsed.success);
        assert!(parsed.data.is_none());
        assert_eq!(parsed.error.as_deref(), Some("bad"));
    }

    #[derive(Debug, serde::Deserialize)]
    struct NoDefault {
        id: u32,
    }

    fn parse<T: serde::de::DeserializeOwned>(raw: &str) -> ApiResponse<T> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn payload_type_needs_no_default() {
        let ok: ApiResponse<NoDefault> = parse(r#"{"success":true,"data":{"id":7}}"#);
        assert_eq!(ok.data.map(|d| d.id), Some(7));

        let err: ApiResponse<NoDefault> = parse(r#"{"success":false,"error":"nope"}"#);
        assert!(err.data.is_none());
    }
}
