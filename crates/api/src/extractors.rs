//! Request extractors for account forms and request origins.

use std::convert::Infallible;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{
        HeaderMap,
        header::{CONTENT_TYPE, HOST},
        request::Parts,
    },
};
use serde::Deserialize;

use crate::error::ApiError;
use agrichain_core::identity::{RegisterInput, UpdateInput};
use agrichain_core::storage::PhotoUpload;

/// Multipart field carrying the profile photo.
const FILE_FIELD: &str = "file";

/// Account fields as sent by clients.
///
/// Accepted as `multipart/form-data` (the only way to attach a photo),
/// JSON, or a urlencoded form. Field names are the ones clients already use.
#[derive(Debug, Default, Deserialize)]
pub struct UserForm {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
    /// Password confirmation.
    #[serde(rename = "confPassword")]
    pub conf_password: Option<String>,
    /// Role tag.
    pub role: Option<String>,
    /// Phone number.
    pub nohp: Option<String>,
    /// Postal address.
    pub alamat: Option<String>,
    /// Uploaded photo (multipart only).
    #[serde(skip)]
    pub file: Option<PhotoUpload>,
}

impl UserForm {
    /// Input for registration; missing fields become empty and fail validation.
    #[must_use]
    pub fn into_register_input(self) -> RegisterInput {
        RegisterInput {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            confirm_password: self.conf_password.unwrap_or_default(),
            role: self.role.unwrap_or_default(),
            phone: self.nohp,
            address: self.alamat,
            photo: self.file,
        }
    }

    /// Input for an update; blank name or email counts as omitted.
    #[must_use]
    pub fn into_update_input(self) -> UpdateInput {
        UpdateInput {
            name: non_blank(self.name),
            email: non_blank(self.email),
            password: self.password,
            confirm_password: self.conf_password,
            role: self.role.unwrap_or_default(),
            phone: self.nohp,
            address: self.alamat,
            photo: self.file,
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if name == FILE_FIELD {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;

                // Browsers send an empty part when no file was chosen.
                if data.is_empty() && original_name.is_empty() {
                    continue;
                }
                form.file = Some(PhotoUpload {
                    original_name,
                    content_type,
                    data,
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            match name.as_str() {
                "name" => form.name = Some(value),
                "email" => form.email = Some(value),
                "password" => form.password = Some(value),
                "confPassword" => form.conf_password = Some(value),
                "role" => form.role = Some(value),
                "nohp" => form.nohp = Some(value),
                "alamat" => form.alamat = Some(value),
                _ => {}
            }
        }

        Ok(form)
    }
}

impl<S> FromRequest<S> for UserForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<Self>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            Ok(form)
        } else {
            let Json(form) = Json::<Self>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            Ok(form)
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Scheme and host the client used, such as `https://api.example.org`.
///
/// Honors `X-Forwarded-Proto` from a reverse proxy and defaults to `http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl RequestOrigin {
    /// The origin as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authority = parts.uri.authority().map(ToString::to_string);
        Ok(Self(origin_from_headers(
            &parts.headers,
            authority.as_deref(),
        )))
    }
}

fn origin_from_headers(headers: &HeaderMap, authority: Option<&str>) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("http");

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or(authority)
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_origin_from_host() {
        let map = headers(&[("host", "localhost:5000")]);
        assert_eq!(origin_from_headers(&map, None), "http://localhost:5000");
    }

    #[test]
    fn test_origin_honors_forwarded_proto() {
        let map = headers(&[
            ("host", "cassava-telti.isi-net.org"),
            ("x-forwarded-proto", "https, http"),
        ]);
        assert_eq!(
            origin_from_headers(&map, None),
            "https://cassava-telti.isi-net.org"
        );
    }

    #[test]
    fn test_origin_falls_back_to_authority() {
        assert_eq!(
            origin_from_headers(&HeaderMap::new(), Some("10.0.0.2:5000")),
            "http://10.0.0.2:5000"
        );
        assert_eq!(
            origin_from_headers(&HeaderMap::new(), None),
            "http://localhost"
        );
    }

    #[test]
    fn test_update_input_treats_blank_name_as_omitted() {
        let form = UserForm {
            name: Some("  ".to_string()),
            email: Some("budi@x.com".to_string()),
            role: Some("petani".to_string()),
            ..Default::default()
        };

        let input = form.into_update_input();
        assert_eq!(input.name, None);
        assert_eq!(input.email.as_deref(), Some("budi@x.com"));
        assert_eq!(input.role, "petani");
    }

    #[tokio::test]
    async fn test_json_form() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"name":"Budi","email":"budi@x.com","password":"a","confPassword":"a","role":"Petani"}"#,
            ))
            .unwrap();

        let form = UserForm::from_request(req, &()).await.unwrap();
        let input = form.into_register_input();
        assert_eq!(input.name, "Budi");
        assert_eq!(input.confirm_password, "a");
        assert_eq!(input.role, "Petani");
        assert!(input.photo.is_none());
    }

    #[tokio::test]
    async fn test_multipart_form_with_photo() {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            Budi\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"confPassword\"\r\n\r\n\
            secret1\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --XBOUNDARY--\r\n";
        let req = Request::builder()
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let form = UserForm::from_request(req, &()).await.unwrap();

        assert_eq!(form.name.as_deref(), Some("Budi"));
        assert_eq!(form.conf_password.as_deref(), Some("secret1"));
        let photo = form.file.expect("photo should be parsed");
        assert_eq!(photo.original_name, "me.png");
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(&photo.data[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn test_multipart_empty_file_part_is_ignored() {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            \r\n\
            --XBOUNDARY--\r\n";
        let req = Request::builder()
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let form = UserForm::from_request(req, &()).await.unwrap();
        assert!(form.file.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = UserForm::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }
}
