//! License record and activation endpoint structs.

use crate::KeystampError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Members that must be present as JSON strings.
const REQUIRED_STRING_FIELDS: &[&str] = &["license_id", "app_id", "device_hash", "signature"];

/// Members that may be absent or `null`, but are strings when present.
const OPTIONAL_STRING_FIELDS: &[&str] = &["plan", "issued_at", "expires_at"];

/// A signed license record as issued by the activation service.
///
/// The record keeps the issuer's full JSON document so that members this crate
/// does not interpret (`schema_version`, `nonce`, ...) stay covered by the
/// signature. Accessors are a read-only view; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct LicenseRecord {
    document: Map<String, Value>,
}

impl LicenseRecord {
    /// Build a record from a JSON object, enforcing the schema.
    pub fn from_document(document: Map<String, Value>) -> Result<Self, KeystampError> {
        for name in REQUIRED_STRING_FIELDS {
            match document.get(*name) {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(KeystampError::MalformedRecord(format!(
                        "{} must be a string",
                        name
                    )))
                }
                None => {
                    return Err(KeystampError::MalformedRecord(format!(
                        "missing required field {}",
                        name
                    )))
                }
            }
        }

        for name in OPTIONAL_STRING_FIELDS {
            match document.get(*name) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(KeystampError::MalformedRecord(format!(
                        "{} must be a string or null",
                        name
                    )))
                }
            }
        }

        match document.get("features") {
            None | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(KeystampError::MalformedRecord(
                    "features must be an object".to_string(),
                ))
            }
        }

        Ok(Self { document })
    }

    /// Parse a record from JSON text.
    pub fn from_json(json: &str) -> Result<Self, KeystampError> {
        let document: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| KeystampError::MalformedRecord(format!("not a JSON object: {}", e)))?;
        Self::from_document(document)
    }

    /// Serialize the record as pretty-printed JSON (storage form).
    pub fn to_json_pretty(&self) -> Result<String, KeystampError> {
        serde_json::to_string_pretty(&self.document)
            .map_err(|e| KeystampError::StoreIo(format!("Failed to serialize license: {}", e)))
    }

    /// The full issuer document, signature included.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Issuer-assigned license identifier.
    pub fn license_id(&self) -> &str {
        self.str_field("license_id").unwrap_or_default()
    }

    /// Application the license was issued for.
    pub fn app_id(&self) -> &str {
        self.str_field("app_id").unwrap_or_default()
    }

    /// Device binding, `SHA256:<hex>`.
    pub fn device_hash(&self) -> &str {
        self.str_field("device_hash").unwrap_or_default()
    }

    /// Signature field, `ed25519:<base64>`.
    pub fn signature(&self) -> &str {
        self.str_field("signature").unwrap_or_default()
    }

    /// Entitlement tier, if the issuer set one.
    pub fn plan(&self) -> Option<&str> {
        self.str_field("plan")
    }

    /// Issue timestamp as sent by the issuer.
    pub fn issued_at(&self) -> Option<&str> {
        self.str_field("issued_at")
    }

    /// Expiry timestamp as sent by the issuer; `None` means non-expiring.
    pub fn expires_at(&self) -> Option<&str> {
        self.str_field("expires_at")
    }

    /// Feature entitlements; values are opaque to this crate.
    pub fn features(&self) -> Option<&Map<String, Value>> {
        self.document.get("features").and_then(Value::as_object)
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.document.get(name).and_then(Value::as_str)
    }
}

impl TryFrom<Map<String, Value>> for LicenseRecord {
    type Error = KeystampError;

    fn try_from(document: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_document(document)
    }
}

impl From<LicenseRecord> for Map<String, Value> {
    fn from(record: LicenseRecord) -> Self {
        record.document
    }
}

/// Body of `POST /api/activate`.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateRequest<'a> {
    /// Activation code entered by the user.
    pub code: &'a str,
    /// Fingerprint of the device being activated.
    pub device_hash: &'a str,
    /// Application identifier.
    pub app_id: &'a str,
    /// Application version.
    pub app_version: &'a str,
}

/// Error codes the issuer returns for rejected activations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ActivationErrorCode {
    /// The code was already redeemed.
    CodeUsed,
    /// The code does not exist.
    CodeNotFound,
    /// The code is past its redemption deadline.
    CodeExpired,
    /// The issuer does not serve this application.
    InvalidAppId,
    /// The request was missing fields.
    InvalidRequest,
    /// The issuer failed internally.
    ServerError,
    /// A code this crate does not know, kept verbatim.
    Other(String),
}

impl ActivationErrorCode {
    /// Wire spelling of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CodeUsed => "CODE_USED",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::InvalidAppId => "INVALID_APP_ID",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ServerError => "SERVER_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ActivationErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "CODE_USED" => Self::CodeUsed,
            "CODE_NOT_FOUND" => Self::CodeNotFound,
            "CODE_EXPIRED" => Self::CodeExpired,
            "INVALID_APP_ID" => Self::InvalidAppId,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "SERVER_ERROR" => Self::ServerError,
            _ => Self::Other(code),
        }
    }
}

impl fmt::Display for ActivationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error object in a rejected activation response.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationErrorBody {
    /// Machine-readable code.
    pub code: ActivationErrorCode,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Raw activation response: `{"ok":true,"license":{..}}` or `{"ok":false,"error":{..}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateResponse {
    /// Whether activation succeeded.
    pub ok: bool,
    /// Issued license (present when `ok`).
    #[serde(default)]
    pub license: Option<LicenseRecord>,
    /// Rejection details (present when not `ok`).
    #[serde(default)]
    pub error: Option<ActivationErrorBody>,
}

impl ActivateResponse {
    /// Turn the response into the issued record or the issuer's rejection.
    pub fn into_result(self) -> Result<LicenseRecord, KeystampError> {
        match (self.ok, self.license, self.error) {
            (true, Some(license), _) => Ok(license),
            (true, None, _) => Err(KeystampError::Protocol(
                "activation succeeded without a license".to_string(),
            )),
            (false, _, Some(error)) => Err(KeystampError::Activation {
                code: error.code,
                message: error.message,
            }),
            (false, _, None) => Err(KeystampError::Protocol(
                "activation failed without an error object".to_string(),
            )),
        }
    }
}

/// Parse a raw activation response body.
pub fn parse_activate_response(body: &[u8]) -> Result<ActivateResponse, KeystampError> {
    serde_json::from_slice(body)
        .map_err(|e| KeystampError::Protocol(format!("Failed to parse activation response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUED_RECORD: &str = r#"{
        "schema_version": 1,
        "license_id": "LIC-20260209-4511",
        "app_id": "moments_ai",
        "plan": "lifetime",
        "device_hash": "SHA256:a4c1bf40a60835318b399d6bfa882e93465a9457ab1be8598820a11156acc154",
        "issued_at": "2026-02-09T11:59:51.955Z",
        "expires_at": "2099-12-31T23:59:59Z",
        "features": {"moments_interact": true, "ai_settings": true},
        "nonce": "65j1ebfko0g",
        "signature": "ed25519:AAAA"
    }"#;

    #[test]
    fn test_parse_issued_record() {
        let record = LicenseRecord::from_json(ISSUED_RECORD).unwrap();
        assert_eq!(record.license_id(), "LIC-20260209-4511");
        assert_eq!(record.app_id(), "moments_ai");
        assert_eq!(record.plan(), Some("lifetime"));
        assert_eq!(record.expires_at(), Some("2099-12-31T23:59:59Z"));
        assert_eq!(record.features().map(|f| f.len()), Some(2));
        assert_eq!(record.document()["nonce"], "65j1ebfko0g");
    }

    #[test]
    fn test_minimal_record() {
        let record = LicenseRecord::from_json(
            r#"{"license_id":"L1","app_id":"X","device_hash":"SHA256:abc","signature":"ed25519:AA=="}"#,
        )
        .unwrap();
        assert_eq!(record.plan(), None);
        assert_eq!(record.issued_at(), None);
        assert_eq!(record.expires_at(), None);
        assert!(record.features().is_none());
    }

    #[test]
    fn test_null_expiry_is_non_expiring() {
        let record = LicenseRecord::from_json(
            r#"{"license_id":"L1","app_id":"X","device_hash":"h","signature":"s","expires_at":null}"#,
        )
        .unwrap();
        assert_eq!(record.expires_at(), None);
    }

    #[test]
    fn test_missing_required_field() {
        let result = LicenseRecord::from_json(r#"{"license_id":"L1","app_id":"X","signature":"s"}"#);
        assert!(matches!(result, Err(KeystampError::MalformedRecord(msg)) if msg.contains("device_hash")));
    }

    #[test]
    fn test_mistyped_fields() {
        let result = LicenseRecord::from_json(
            r#"{"license_id":7,"app_id":"X","device_hash":"h","signature":"s"}"#,
        );
        assert!(matches!(result, Err(KeystampError::MalformedRecord(_))));

        let result = LicenseRecord::from_json(
            r#"{"license_id":"L1","app_id":"X","device_hash":"h","signature":"s","expires_at":4102444800}"#,
        );
        assert!(matches!(result, Err(KeystampError::MalformedRecord(_))));

        let result = LicenseRecord::from_json(
            r#"{"license_id":"L1","app_id":"X","device_hash":"h","signature":"s","features":[]}"#,
        );
        assert!(matches!(result, Err(KeystampError::MalformedRecord(_))));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            LicenseRecord::from_json("[1,2,3]"),
            Err(KeystampError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_serde_keeps_document() {
        let record = LicenseRecord::from_json(ISSUED_RECORD).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let restored: LicenseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_parse_success_response() {
        let body = format!(r#"{{"ok":true,"license":{}}}"#, ISSUED_RECORD);
        let record = parse_activate_response(body.as_bytes())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(record.license_id(), "LIC-20260209-4511");
    }

    #[test]
    fn test_parse_rejection_response() {
        let body = br#"{"ok":false,"error":{"code":"CODE_USED","message":"already used"}}"#;
        let result = parse_activate_response(body).unwrap().into_result();
        assert!(matches!(
            result,
            Err(KeystampError::Activation { code: ActivationErrorCode::CodeUsed, ref message }) if message == "already used"
        ));
    }

    #[test]
    fn test_unknown_error_code_preserved() {
        let body = br#"{"ok":false,"error":{"code":"RATE_LIMITED","message":"slow down"}}"#;
        let result = parse_activate_response(body).unwrap().into_result();
        match result {
            Err(KeystampError::Activation { code, .. }) => {
                assert_eq!(code, ActivationErrorCode::Other("RATE_LIMITED".to_string()));
                assert_eq!(code.to_string(), "RATE_LIMITED");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_inconsistent_responses() {
        let ok_without_license = parse_activate_response(br#"{"ok":true}"#).unwrap();
        assert!(matches!(ok_without_license.into_result(), Err(KeystampError::Protocol(_))));

        let failed_without_error = parse_activate_response(br#"{"ok":false}"#).unwrap();
        assert!(matches!(failed_without_error.into_result(), Err(KeystampError::Protocol(_))));
    }

    #[test]
    fn test_malformed_license_in_response() {
        let result = parse_activate_response(br#"{"ok":true,"license":{"license_id":"L1"}}"#);
        assert!(matches!(result, Err(KeystampError::Protocol(_))));
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_activate_response(b"<html>502</html>");
        assert!(matches!(result, Err(KeystampError::Protocol(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ActivateRequest {
            code: "ACT-1",
            device_hash: "SHA256:abc",
            app_id: "moments_ai",
            app_version: "1.0.0",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": "ACT-1",
                "device_hash": "SHA256:abc",
                "app_id": "moments_ai",
                "app_version": "1.0.0"
            })
        );
    }
}
