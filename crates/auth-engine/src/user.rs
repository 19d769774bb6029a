//! User record returned by the auth server.

use crate::ResolveError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_ROLE: &str = "user";

/// Signed-in user, normalized from the server payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Minimal identity forwarded to the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

/// Server payload before normalization.
///
/// Accounts created through Google carry `displayName`, others `name`; ids
/// come as `id` or the document store's `_id`.
#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "_id")]
    object_id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn id_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        // Extended JSON: { "$oid": "..." }
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(s)) => non_blank(Some(s.clone())),
            _ => None,
        },
        _ => None,
    }
}

impl UserRecord {
    /// Parse and normalize a successful response body.
    ///
    /// A body that is not a user record is reported as `OtherHttp` with the
    /// response status.
    pub fn from_response(status: u16, body: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::OtherHttp {
            status,
            body: format!("{}: {}", reason, body),
        };

        let raw: RawUser =
            serde_json::from_str(body).map_err(|_| invalid("malformed user payload"))?;

        let id = id_string(raw.id)
            .or_else(|| id_string(raw.object_id))
            .ok_or_else(|| invalid("user payload without id"))?;
        let email = non_blank(raw.email).ok_or_else(|| invalid("user payload without email"))?;
        let name = non_blank(raw.name)
            .or_else(|| non_blank(raw.display_name))
            .unwrap_or_else(|| email.clone());
        let role = non_blank(raw.role).unwrap_or_else(|| DEFAULT_ROLE.to_string());

        Ok(Self {
            id,
            name,
            email,
            role,
        })
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload() {
        let user = UserRecord::from_response(
            200,
            r#"{"id":"u1","name":"Ann","email":"a@x.com","role":"admin"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_display_name_and_object_id() {
        let user = UserRecord::from_response(
            200,
            r#"{"_id":"65f0c0ffee","displayName":"Ann Google","email":"a@x.com"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "65f0c0ffee");
        assert_eq!(user.name, "Ann Google");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_name_wins_over_display_name() {
        let user = UserRecord::from_response(
            200,
            r#"{"id":7,"name":"Ann","displayName":"Ann Google","email":"a@x.com"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "7");
        assert_eq!(user.name, "Ann");
    }

    #[test]
    fn test_blank_name_falls_back() {
        let user = UserRecord::from_response(
            200,
            r#"{"_id":{"$oid":"abc"},"name":"  ","email":"a@x.com"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "abc");
        assert_eq!(user.name, "a@x.com");
    }

    #[test]
    fn test_missing_email_is_other_http() {
        let err = UserRecord::from_response(200, r#"{"id":"u1","name":"Ann"}"#).unwrap_err();
        assert!(matches!(err, ResolveError::OtherHttp { status: 200, .. }));
    }

    #[test]
    fn test_malformed_body_is_other_http() {
        let err = UserRecord::from_response(200, "<html>").unwrap_err();
        assert!(matches!(err, ResolveError::OtherHttp { status: 200, .. }));
    }

    #[test]
    fn test_identity() {
        let user = UserRecord::from_response(
            200,
            r#"{"id":"u1","name":"Ann","email":"a@x.com"}"#,
        )
        .unwrap();

        assert_eq!(
            user.identity(),
            UserIdentity {
                name: "Ann".to_string(),
                email: "a@x.com".to_string()
            }
        );
    }
}
