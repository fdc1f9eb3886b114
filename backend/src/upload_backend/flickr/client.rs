//! HTTP client for the photo host's legacy frob-based API
//!
//! Every call is signed with `md5(shared_secret + k1 + v1 + k2 + v2 ...)` over
//! the parameters sorted by key. Uploads are signed without the photo itself.

use std::collections::BTreeMap;
use std::time::Duration;

use md5::{Digest, Md5};
use quick_xml::de::from_str;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{FlickrError, FlickrResult};
use crate::types::FlickrSettings;
use crate::upload_backend::UploadFile;

const DEFAULT_AUTH_URL: &str = "https://www.flickr.com/services/auth/";
const DEFAULT_REST_URL: &str = "https://api.flickr.com/services/rest/";
const DEFAULT_UPLOAD_URL: &str = "https://up.flickr.com/services/upload/";

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Base URLs of the photo-host API
#[derive(Debug, Clone)]
pub struct FlickrEndpoints {
    /// Browser authorization page
    pub auth_url: Url,
    /// REST method endpoint
    pub rest_url: Url,
    /// Photo upload endpoint
    pub upload_url: Url,
}

impl Default for FlickrEndpoints {
    fn default() -> Self {
        Self {
            auth_url: Url::parse(DEFAULT_AUTH_URL).expect("Invalid default auth URL"),
            rest_url: Url::parse(DEFAULT_REST_URL).expect("Invalid default REST URL"),
            upload_url: Url::parse(DEFAULT_UPLOAD_URL).expect("Invalid default upload URL"),
        }
    }
}

/// Upload answer: `<rsp stat="ok"><photoid>..</photoid></rsp>`
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "@stat")]
    stat: String,
    photoid: Option<String>,
    err: Option<UploadResponseError>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadResponseError {
    #[serde(rename = "@code", default)]
    code: String,
    #[serde(rename = "@msg", default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct GetTokenResponse {
    stat: String,
    auth: Option<AuthBody>,
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    token: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(rename = "_content")]
    content: String,
}

/// Signed photo-host API client
pub struct FlickrClient {
    api_key: String,
    shared_secret: String,
    endpoints: FlickrEndpoints,
    http_client: ClientWithMiddleware,
}

impl FlickrClient {
    /// Creates a client for the public photo-host endpoints
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new(settings: &FlickrSettings) -> Self {
        Self::with_endpoints(settings, FlickrEndpoints::default())
    }

    /// Creates a client for custom endpoints
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn with_endpoints(settings: &FlickrSettings, endpoints: FlickrEndpoints) -> Self {
        let reqwest_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()
            .expect("Failed to create HTTP client");

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self {
            api_key: settings.key.clone(),
            shared_secret: settings.secret.clone(),
            endpoints,
            http_client,
        }
    }

    /// Signature over the given parameters
    #[must_use]
    pub fn sign(&self, params: &BTreeMap<&str, &str>) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.shared_secret.as_bytes());
        for (key, value) in params {
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn signed_params(&self, params: &[(&str, &str)]) -> Vec<(String, String)> {
        let sorted: BTreeMap<&str, &str> = params.iter().copied().collect();
        let api_sig = self.sign(&sorted);

        sorted
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .chain(std::iter::once(("api_sig".to_string(), api_sig)))
            .collect()
    }

    /// Browser URL asking the account owner to grant write permission
    #[must_use]
    pub fn authorize_url(&self) -> Url {
        let mut url = self.endpoints.auth_url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.signed_params(&[("api_key", self.api_key.as_str()), ("perms", "write")]));
        url
    }

    /// Exchanges the frob from the auth callback for a long-lived token
    ///
    /// # Errors
    ///
    /// Returns `FlickrError` if the request fails or the photo host refuses the frob
    #[instrument(skip(self))]
    pub async fn get_token(&self, frob: &str) -> FlickrResult<String> {
        let params = self.signed_params(&[
            ("method", "flickr.auth.getToken"),
            ("api_key", self.api_key.as_str()),
            ("frob", frob),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ]);

        let response = self
            .http_client
            .get(self.endpoints.rest_url.clone())
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FlickrError::Status(response.status().as_u16()));
        }

        let body = response.json::<GetTokenResponse>().await?;

        if body.stat != "ok" {
            return Err(FlickrError::Api {
                code: body.code.map_or_else(String::new, |code| code.to_string()),
                message: body.message.unwrap_or_default(),
            });
        }

        body.auth
            .map(|auth| auth.token.content)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| FlickrError::MalformedResponse("missing auth token".to_string()))
    }

    /// Uploads a photo and returns the photo id assigned by the host
    ///
    /// # Errors
    ///
    /// Returns `FlickrError` if the request fails or the photo host refuses the upload
    #[instrument(skip(self, auth_token, file), fields(filename = %file.filename))]
    pub async fn upload(
        &self,
        auth_token: &str,
        file: UploadFile,
        tags: &str,
    ) -> FlickrResult<String> {
        let params = self.signed_params(&[
            ("api_key", self.api_key.as_str()),
            ("auth_token", auth_token),
            ("tags", tags),
        ]);

        let mut photo = Part::bytes(file.bytes.to_vec()).file_name(file.filename);
        if let Some(content_type) = file
            .content_type
            .as_deref()
            .filter(|ct| ct.parse::<mime::Mime>().is_ok())
        {
            photo = photo.mime_str(content_type)?;
        }

        let form = params
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("photo", photo);

        let response = self
            .http_client
            .post(self.endpoints.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FlickrError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let photo_id = parse_upload_response(&body)?;

        debug!(photo_id = %photo_id, "Photo host accepted upload");
        Ok(photo_id)
    }
}

/// Extracts the photo id from an upload `<rsp>` document
fn parse_upload_response(body: &str) -> FlickrResult<String> {
    let response: UploadResponse = from_str(body)
        .map_err(|e| FlickrError::MalformedResponse(format!("invalid rsp document: {e}")))?;

    if response.stat != "ok" {
        let err = response.err.unwrap_or_default();
        return Err(FlickrError::Api {
            code: err.code,
            message: err.msg,
        });
    }

    response
        .photoid
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FlickrError::MalformedResponse("missing photoid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FlickrClient {
        FlickrClient::new(&FlickrSettings {
            key: "key".to_string(),
            secret: "signing".to_string(),
        })
    }

    #[test]
    fn test_sign_sorts_parameters() {
        let client = FlickrClient::new(&FlickrSettings {
            key: "key".to_string(),
            secret: "SECRET".to_string(),
        });
        let params = BTreeMap::from([("foo", "1"), ("bar", "2"), ("baz", "3")]);

        // md5("SECRETbar2baz3foo1")
        assert_eq!(client.sign(&params), "a626bf097044e8b6f7b9214f049f3cc7");
    }

    #[test]
    fn test_authorize_url() {
        let url = client().authorize_url();

        assert_eq!(url.host_str(), Some("www.flickr.com"));
        assert_eq!(url.path(), "/services/auth/");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("api_key".to_string(), "key".to_string()),
                ("perms".to_string(), "write".to_string()),
                // md5("signingapi_keykeypermswrite")
                (
                    "api_sig".to_string(),
                    "87edf3a32e3a63755a1216b371421f7b".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_parse_upload_ok() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok">
<photoid>1234567890</photoid>
</rsp>"#;

        assert_eq!(parse_upload_response(body).unwrap(), "1234567890");
    }

    #[test]
    fn test_parse_upload_fail() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="fail">
	<err code="98" msg="Invalid auth token" />
</rsp>"#;

        match parse_upload_response(body) {
            Err(FlickrError::Api { code, message }) => {
                assert_eq!(code, "98");
                assert_eq!(message, "Invalid auth token");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_decodes_entities() {
        let body = r#"<rsp stat="fail"><err code="5" msg="Filetype &quot;x&quot; &amp; size not allowed" /></rsp>"#;

        match parse_upload_response(body) {
            Err(FlickrError::Api { code, message }) => {
                assert_eq!(code, "5");
                assert_eq!(message, r#"Filetype "x" & size not allowed"#);
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_single_quoted_attributes() {
        assert_eq!(
            parse_upload_response("<rsp stat='ok'><photoid>42</photoid></rsp>").unwrap(),
            "42"
        );
    }

    #[test]
    fn test_parse_upload_garbage() {
        assert!(matches!(
            parse_upload_response("<html>oops</html>"),
            Err(FlickrError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_upload_response(r#"<rsp stat="ok"></rsp>"#),
            Err(FlickrError::MalformedResponse(_))
        ));
    }
}
