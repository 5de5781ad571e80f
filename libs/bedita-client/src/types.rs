use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OAuth2-style grant types accepted by the `/auth` endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Password,
    ClientCredentials,
    RefreshToken,
}

/// Payload of an auth request.
///
/// Only the fields relevant to the chosen grant are serialized.
#[derive(Clone, Debug, Serialize)]
pub struct AuthData {
    pub grant_type: GrantType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl AuthData {
    /// Password-grant payload.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            grant_type: GrantType::Password,
            username: Some(username.into()),
            password: Some(password.into()),
            client_id: None,
            client_secret: None,
        }
    }

    /// Client-credentials-grant payload.
    #[must_use]
    pub fn client_credentials(client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            grant_type: GrantType::ClientCredentials,
            username: None,
            password: None,
            client_id: Some(client_id.into()),
            client_secret,
        }
    }

    /// Refresh-grant payload. The refresh token travels as the bearer
    /// credential, not in the body.
    #[must_use]
    pub fn refresh_token() -> Self {
        Self {
            grant_type: GrantType::RefreshToken,
            username: None,
            password: None,
            client_id: None,
            client_secret: None,
        }
    }
}

/// JSON:API resource object.
///
/// See <https://jsonapi.org/format/#document-resource-objects>. A resource
/// without `id` is a creation payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// A file to be sent through [`BEditaApiClient::upload`](crate::BEditaApiClient::upload).
#[derive(Clone, Debug)]
pub struct FileUpload {
    /// File name; used as the upload path segment when no explicit name is given
    pub name: Option<String>,
    /// Content type forwarded as the request `Content-Type`
    pub content_type: Option<String>,
    /// Raw file contents
    pub bytes: Bytes,
}

impl FileUpload {
    /// Create an upload payload from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Set the file name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grant_types_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(GrantType::ClientCredentials).unwrap(),
            json!("client_credentials")
        );
        assert_eq!(
            serde_json::to_value(GrantType::RefreshToken).unwrap(),
            json!("refresh_token")
        );
    }

    #[test]
    fn auth_data_omits_unset_fields() {
        let data = serde_json::to_value(AuthData::password("admin", "secret")).unwrap();
        assert_eq!(
            data,
            json!({"grant_type": "password", "username": "admin", "password": "secret"})
        );

        let data = serde_json::to_value(AuthData::refresh_token()).unwrap();
        assert_eq!(data, json!({"grant_type": "refresh_token"}));
    }

    #[test]
    fn resource_object_skips_absent_members() {
        let resource = ResourceObject {
            type_: "documents".into(),
            ..ResourceObject::default()
        };
        assert_eq!(
            serde_json::to_value(resource).unwrap(),
            json!({"type": "documents"})
        );
    }
}
