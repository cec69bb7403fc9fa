//! Per-API-family request dispatcher.
//!
//! A [`Dispatcher`] is bound to one endpoint and shares its credentials with
//! the other families of the same [`Exoscale`](crate::Exoscale) client. It
//! turns an [`HttpRequest`] into a signed wire request, sends it through its
//! [`HttpSession`], and maps the outcome:
//!
//! - transport failure: [`HttpError::Request`], unchanged;
//! - HTTP 404 on a single-resource request: [`ApiError::NotFound`];
//! - other error statuses: [`ApiError::Response`] with the provider's
//!   error payload (or the raw body);
//! - success: the parsed body wrapped in a [`Resource`].

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{Credentials, RequestSigner, SigningRequest};
use crate::clients::session::RawRequest;
use crate::clients::{
    ApiError, HttpError, HttpRequest, HttpResponse, HttpSession, InvalidHttpRequestError,
};
use crate::rest::{Clearable, Resource};

/// The API families served by an [`Exoscale`](crate::Exoscale) client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    /// Compute API.
    Compute,
    /// DNS API.
    Dns,
    /// Object storage API.
    Storage,
    /// Runstatus (status page) API.
    Runstatus,
    /// Identity and access management API.
    Iam,
}

impl ApiFamily {
    /// All families, in construction order.
    pub const ALL: [Self; 5] = [
        Self::Compute,
        Self::Dns,
        Self::Storage,
        Self::Runstatus,
        Self::Iam,
    ];

    /// Returns the lower-case family name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Dns => "dns",
            Self::Storage => "storage",
            Self::Runstatus => "runstatus",
            Self::Iam => "iam",
        }
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request sender for one API family.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`; it can be shared across tasks.
///
/// # Example
///
/// ```rust,ignore
/// use exoscale::clients::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder(HttpMethod::Get, "zone").build()?;
/// let zones = client.compute.send(request).await?;
/// println!("{:?}", zones.snapshot());
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    family: ApiFamily,
    endpoint: String,
    credentials: Arc<Credentials>,
    session: HttpSession,
    signer: Arc<dyn RequestSigner>,
    zone: Option<String>,
}

// Verify Dispatcher is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
};

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("family", &self.family)
            .field("endpoint", &self.endpoint)
            .field("key", self.credentials.key())
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher for `family` bound to `endpoint`.
    #[must_use]
    pub fn new(
        family: ApiFamily,
        endpoint: impl Into<String>,
        credentials: Arc<Credentials>,
        session: HttpSession,
        signer: Arc<dyn RequestSigner>,
    ) -> Self {
        Self {
            family,
            endpoint: endpoint.into(),
            credentials,
            session,
            signer,
            zone: None,
        }
    }

    /// Sets the zone this dispatcher operates in.
    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Returns the API family.
    #[must_use]
    pub const fn family(&self) -> ApiFamily {
        self.family
    }

    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the shared credentials.
    #[must_use]
    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Returns the zone, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns the underlying session.
    #[must_use]
    pub const fn session(&self) -> &HttpSession {
        &self.session
    }

    /// Sends `request` and returns the parsed JSON payload.
    ///
    /// An empty body yields `Value::Null`; a non-JSON body is returned as a
    /// JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - the request fails validation or signing,
    /// - the request cannot be carried out (`Request`),
    /// - a single-resource request gets a 404 (`Api(ApiError::NotFound)`),
    /// - any other non-2xx status is received (`Api(ApiError::Response)`).
    pub async fn send(&self, request: HttpRequest) -> Result<Resource<Value>, HttpError> {
        let response = self.execute(&request).await?;
        Ok(Resource::new(response.json()))
    }

    /// Sends `request` and deserializes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), plus [`HttpError::Decode`] when the body
    /// does not match `T`.
    pub async fn send_as<T>(&self, request: HttpRequest) -> Result<Resource<T>, HttpError>
    where
        T: DeserializeOwned + Clearable,
    {
        let response = self.execute(&request).await?;
        let value = serde_json::from_value(response.json())?;
        Ok(Resource::new(value))
    }

    /// Looks up a single resource, reporting absence as `Ok(None)`.
    ///
    /// The request is marked as a single-resource lookup regardless of how it
    /// was built.
    ///
    /// # Errors
    ///
    /// Same as [`send_as`](Self::send_as), except that
    /// [`ApiError::NotFound`] becomes `Ok(None)`.
    pub async fn find<T>(&self, mut request: HttpRequest) -> Result<Option<Resource<T>>, HttpError>
    where
        T: DeserializeOwned + Clearable,
    {
        request.single_resource = true;
        match self.send_as(request).await {
            Ok(resource) => Ok(Some(resource)),
            Err(HttpError::Api(ApiError::NotFound)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Builds the absolute URL for `path`, query string included.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::InvalidUrl`] if the endpoint and
    /// path do not form a valid URL.
    pub fn url_for(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<reqwest::Url, InvalidHttpRequestError> {
        let raw = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url =
            reqwest::Url::parse(&raw).map_err(|_| InvalidHttpRequestError::InvalidUrl { url: raw })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let body = request.body.as_ref().map(Value::to_string);
        let mut query = request.query_pairs();
        query.sort();

        let path = self.url_for(&request.path, &[])?.path().to_string();
        let signed = self.signer.sign(
            &self.credentials,
            &SigningRequest {
                method: request.http_method,
                path: &path,
                query: &query,
                body: body.as_deref(),
            },
        )?;
        query.extend(signed.query);

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(extra) = &request.extra_headers {
            headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        headers.extend(signed.headers);

        let raw = RawRequest {
            method: request.http_method,
            url: self.url_for(&request.path, &query)?,
            headers,
            body,
        };

        let response = self.session.send(&raw).await?;
        if response.is_ok() {
            return Ok(response);
        }

        if response.code == 404 && request.single_resource {
            tracing::debug!(family = %self.family, path = %request.path, "resource not found");
            return Err(ApiError::NotFound.into());
        }

        let error = Self::api_error(&response);
        tracing::debug!(
            family = %self.family,
            path = %request.path,
            status = response.code,
            request_id = response.request_id().unwrap_or_default(),
            "API returned an error"
        );
        Err(error.into())
    }

    /// Maps an error response to [`ApiError::Response`].
    fn api_error(response: &HttpResponse) -> ApiError {
        let error = response.json();
        let reason = provider_message(&error)
            .filter(|message| !message.is_empty())
            .map_or_else(|| response.reason.clone(), String::from);

        ApiError::Response {
            status: response.code,
            reason,
            error,
        }
    }
}

/// Extracts the provider's error message from an error payload.
///
/// Both `{"message": ...}` and the enveloped
/// `{"<command>response": {"errortext": ...}}` shapes are recognized.
fn provider_message(payload: &Value) -> Option<&str> {
    let object = payload.as_object()?;
    for key in ["message", "errortext", "error"] {
        if let Some(message) = object.get(key).and_then(Value::as_str) {
            return Some(message);
        }
    }
    object.values().find_map(|nested| {
        let nested = nested.as_object()?;
        ["errortext", "message"]
            .iter()
            .find_map(|key| nested.get(*key).and_then(Value::as_str))
    })
}
