use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use log::{debug, trace};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::signer::{percent_encode, url_encoded_query_string};
use crate::stream::MessageStream;
use crate::{Credential, Error, Json, OAuthParameters, Parameters, Result, Signer, OAUTH_KEY_PREFIX};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
#[cfg(feature = "multipart")]
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
#[cfg(feature = "multipart")]
const DEFAULT_FILE_NAME: &str = "media.jpg";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Called for every non-empty chunk with the chunk, the bytes received so
/// far, and the announced content length.
pub type ProgressHandler = Arc<dyn Fn(&[u8], usize, Option<u64>) + Send + Sync>;

/// Binary payload sent as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub parameter_name: String,
    pub data: Bytes,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

impl Attachment {
    pub fn new<TName, TData>(parameter_name: TName, data: TData) -> Self
    where
        TName: Into<String>,
        TData: Into<Bytes>,
    {
        Attachment {
            parameter_name: parameter_name.into(),
            data: data.into(),
            mime_type: None,
            file_name: None,
        }
    }

    pub fn mime_type<T: Into<String>>(self, mime_type: T) -> Self {
        Attachment {
            mime_type: Some(mime_type.into()),
            ..self
        }
    }

    pub fn file_name<T: Into<String>>(self, file_name: T) -> Self {
        Attachment {
            file_name: Some(file_name.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Authorization {
    None,
    OAuth1 {
        credential: Arc<Credential>,
        parameters: OAuthParameters<'static>,
    },
    Bearer(String),
    /// Percent-encoded consumer key and secret.
    Basic { key: String, secret: String },
}

/// Wire body of a [`SignedRequest`].
#[derive(Debug)]
pub enum Body {
    Empty,
    Form(String),
    /// One part per attachment, then one text part per remaining parameter.
    #[cfg(feature = "multipart")]
    Multipart(reqwest::multipart::Form),
}

/// A fully assembled request, ready for the transport.
///
/// Basic credentials and the multipart `Content-Type` are added by the
/// transport when the request is sent.
#[derive(Debug)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

/// A 2xx response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body on the current thread; an empty body is `{}`.
    pub fn json(&self) -> Result<Json> {
        if self.body.is_empty() {
            return Ok(Json::Object(BTreeMap::new()));
        }
        Ok(Json::parse(&self.body)?)
    }
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    Receiving,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug)]
pub(crate) struct StateCell(Mutex<RequestState>);

impl Default for StateCell {
    fn default() -> Self {
        StateCell(Mutex::new(RequestState::Idle))
    }
}

impl StateCell {
    pub(crate) fn get(&self) -> RequestState {
        *self.0.lock()
    }

    pub(crate) fn set(&self, next: RequestState) {
        let mut state = self.0.lock();
        trace!("request state {:?} -> {:?}", *state, next);
        *state = next;
    }

    pub(crate) fn finish<T>(&self, result: &Result<T>) {
        self.set(match result {
            Ok(_) => RequestState::Completed,
            Err(Error::Cancelled) => RequestState::Cancelled,
            Err(_) => RequestState::Failed,
        });
    }
}

pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    parameters: Parameters,
    attachments: Vec<Attachment>,
    encode_parameters: bool,
    timeout: Duration,
    authorization: Authorization,
    progress: Option<ProgressHandler>,
    cancellation: CancellationToken,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("parameters", &self.parameters.keys().collect::<Vec<_>>())
            .field("attachments", &self.attachments.len())
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    /// Start an unauthenticated request.
    pub fn new(method: Method, url: Url) -> Self {
        RequestBuilder {
            method,
            url,
            headers: HeaderMap::new(),
            parameters: Parameters::new(),
            attachments: Vec::new(),
            encode_parameters: true,
            timeout: DEFAULT_TIMEOUT,
            authorization: Authorization::None,
            progress: None,
            cancellation: CancellationToken::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Set signing information

    /// Sign with OAuth 1.0a using a fresh nonce and timestamp.
    pub fn sign(self, credential: Arc<Credential>) -> Self {
        self.sign_with_params(credential, OAuthParameters::new())
    }

    /// Sign with OAuth 1.0a using explicit OAuth parameters.
    pub fn sign_with_params(
        self,
        credential: Arc<Credential>,
        parameters: OAuthParameters<'_>,
    ) -> Self {
        RequestBuilder {
            authorization: Authorization::OAuth1 {
                credential,
                parameters: parameters.into_owned(),
            },
            ..self
        }
    }

    /// Enable HTTP bearer authentication.
    pub fn bearer_auth<T: fmt::Display>(self, token: T) -> Self {
        RequestBuilder {
            authorization: Authorization::Bearer(token.to_string()),
            ..self
        }
    }

    /// Enable HTTP basic authentication with the percent-encoded key pair.
    pub fn basic_auth(self, key: &str, secret: &str) -> Self {
        RequestBuilder {
            authorization: Authorization::Basic {
                key: percent_encode(key),
                secret: percent_encode(secret),
            },
            ..self
        }
    }

    // ------------------------------------------------------------------------
    // Request contents

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn parameter<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.parameters.insert(key.into(), value.to_string());
        self
    }

    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.parameters.extend(
            parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string())),
        );
        self
    }

    /// Add a binary part; any attachment turns the body into multipart.
    #[cfg(feature = "multipart")]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// With `false` the form body is sent as plain `key=value` text, for
    /// re-posting parameters that are already encoded.
    pub fn encode_parameters(self, encode_parameters: bool) -> Self {
        RequestBuilder {
            encode_parameters,
            ..self
        }
    }

    /// Enables a request timeout.
    ///
    /// For ordinary requests this bounds the whole exchange; for streams it
    /// only bounds connecting.
    pub fn timeout(self, timeout: Duration) -> Self {
        RequestBuilder { timeout, ..self }
    }

    pub fn on_progress<F>(self, handler: F) -> Self
    where
        F: Fn(&[u8], usize, Option<u64>) + Send + Sync + 'static,
    {
        RequestBuilder {
            progress: Some(Arc::new(handler)),
            ..self
        }
    }

    /// Tie the request to an external cancellation token.
    pub fn cancellation(self, cancellation: CancellationToken) -> Self {
        RequestBuilder {
            cancellation,
            ..self
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    // ------------------------------------------------------------------------
    // Assemble the wire request

    /// Lay out query string or body and attach the `Authorization` header.
    pub fn build(&self) -> Result<SignedRequest> {
        let mut url = self.url.clone();
        let mut headers = self.headers.clone();

        // oauth_* parameters only take part in signing
        let fields: Vec<(&str, &str)> = self
            .parameters
            .iter()
            .filter(|(k, _)| !k.starts_with(OAUTH_KEY_PREFIX))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        #[cfg(feature = "multipart")]
        if self.is_media_upload() {
            let form = multipart_form(&self.attachments, &fields)?;
            return self.finish(url, headers, Body::Multipart(form));
        }

        let body = if fields.is_empty() {
            Body::Empty
        } else if self.method == Method::GET || self.method == Method::HEAD || self.method == Method::DELETE {
            let query = url_encoded_query_string(fields);
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
                _ => query,
            };
            url.set_query(Some(&combined));
            Body::Empty
        } else if self.encode_parameters {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            Body::Form(url_encoded_query_string(fields))
        } else {
            // already encoded by the caller; sent without a form content type
            let raw: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            Body::Form(raw.join("&"))
        };

        self.finish(url, headers, body)
    }

    fn is_media_upload(&self) -> bool {
        !self.attachments.is_empty()
    }

    fn finish(&self, url: Url, mut headers: HeaderMap, body: Body) -> Result<SignedRequest> {
        let authorization = match self.authorization {
            Authorization::OAuth1 {
                ref credential,
                ref parameters,
            } => {
                let signer = Signer::new(&**credential, parameters.clone());
                Some(signer.generate_signature(
                    &self.method,
                    &self.url,
                    &self.parameters,
                    self.is_media_upload(),
                ))
            }
            Authorization::Bearer(ref token) => Some(format!("Bearer {}", token)),
            Authorization::None | Authorization::Basic { .. } => None,
        };
        if let Some(authorization) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        }

        Ok(SignedRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Hand the assembled request to a transport session.
    pub(crate) fn transport_request(&self, client: &reqwest::Client) -> Result<reqwest::RequestBuilder> {
        let signed = self.build()?;
        debug!("{} {}", signed.method, signed.url);

        let request = client
            .request(signed.method, signed.url)
            .headers(signed.headers);
        let request = match signed.body {
            Body::Empty => request,
            Body::Form(form) => request.body(form),
            #[cfg(feature = "multipart")]
            Body::Multipart(form) => request.multipart(form),
        };
        Ok(match self.authorization {
            Authorization::Basic { ref key, ref secret } => request.basic_auth(key, Some(secret)),
            _ => request,
        })
    }

    // ------------------------------------------------------------------------
    // Finish building the request and send it

    /// Send the request and read the whole body.
    ///
    /// # Errors
    ///
    /// Non-2xx responses fail with [`Error::Status`]; connection problems
    /// pass through as [`Error::Transport`]; a cancelled token yields
    /// [`Error::Cancelled`].
    pub async fn send(self) -> Result<Response> {
        let state = StateCell::default();
        self.execute(&state).await
    }

    /// Send the request and decode the body as JSON.
    ///
    /// Decoding runs on the blocking pool so large bodies do not stall the
    /// caller's executor; cancellation is checked again once it finishes.
    pub async fn send_json(self) -> Result<Json> {
        let cancellation = self.cancellation.clone();
        let response = self.send().await?;
        if response.body.is_empty() {
            return Ok(Json::Object(BTreeMap::new()));
        }
        let body = response.body;
        let parsed = tokio::task::spawn_blocking(move || Json::parse(&body)).await;
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match parsed {
            Ok(json) => Ok(json?),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }

    /// Spawn the exchange onto the runtime and return a handle to it.
    pub fn start(self) -> RequestHandle {
        let state = Arc::new(StateCell::default());
        let cancellation = self.cancellation.clone();
        let task_state = state.clone();
        let task = tokio::spawn(async move { self.execute(&task_state).await });
        RequestHandle {
            state,
            cancellation,
            task,
        }
    }

    /// Open a long-lived response and reassemble it into messages.
    pub async fn stream(self) -> Result<MessageStream> {
        let state = Arc::new(StateCell::default());
        let cancellation = self.cancellation.clone();
        let progress = self.progress.clone();

        let opened = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(Error::Cancelled),
            opened = self.open(&state, true) => opened,
        };
        if let Err(ref err) = opened {
            state.set(if err.is_cancelled() {
                RequestState::Cancelled
            } else {
                RequestState::Failed
            });
        }
        let response = opened?;

        if !response.status().is_success() {
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            state.set(RequestState::Failed);
            return Err(status_error(status, headers, &body));
        }

        Ok(MessageStream::new(response, progress, cancellation, state))
    }

    async fn execute(self, state: &StateCell) -> Result<Response> {
        let cancellation = self.cancellation.clone();
        let result = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(Error::Cancelled),
            result = self.exchange(state) => result,
        };
        state.finish(&result);
        result
    }

    async fn exchange(self, state: &StateCell) -> Result<Response> {
        let progress = self.progress.clone();
        let mut response = self.open(state, false).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let expected = response.content_length();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            trace!("received {} bytes ({} total)", chunk.len(), body.len());
            if chunk.is_empty() {
                continue;
            }
            if let Some(ref progress) = progress {
                progress(&chunk, body.len(), expected);
            }
        }

        classify(status, headers, Bytes::from(body))
    }

    /// Build, open a fresh transport session and wait for the response head.
    async fn open(self, state: &StateCell, streaming: bool) -> Result<reqwest::Response> {
        // one session per request; nothing is pooled across calls
        let client = reqwest::Client::builder().pool_max_idle_per_host(0);
        let client = if streaming {
            client.connect_timeout(self.timeout)
        } else {
            client.timeout(self.timeout)
        };
        let client = client.build()?;

        let request = self.transport_request(&client)?;
        state.set(RequestState::Sending);
        let response = request.send().await?;
        state.set(RequestState::Receiving);
        debug!("response status {}", response.status());
        Ok(response)
    }
}

/// Handle to a request running on the runtime.
#[derive(Debug)]
pub struct RequestHandle {
    state: Arc<StateCell>,
    cancellation: CancellationToken,
    task: JoinHandle<Result<Response>>,
}

impl RequestHandle {
    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    /// Abort the transfer; `wait` then reports [`Error::Cancelled`].
    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    pub async fn wait(self) -> Result<Response> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }
}

#[cfg(feature = "multipart")]
fn multipart_form(attachments: &[Attachment], fields: &[(&str, &str)]) -> Result<reqwest::multipart::Form> {
    use reqwest::multipart::{Form, Part};

    let mut form = Form::new();
    for attachment in attachments {
        let part = Part::bytes(attachment.data.to_vec())
            .file_name(
                attachment
                    .file_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            )
            .mime_str(attachment.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE))?;
        form = form.part(attachment.parameter_name.clone(), part);
    }
    for (key, value) in fields {
        form = form.text(key.to_string(), value.to_string());
    }
    Ok(form)
}

fn classify(status: StatusCode, headers: HeaderMap, body: Bytes) -> Result<Response> {
    if status.is_success() {
        Ok(Response {
            status,
            headers,
            body,
        })
    } else {
        Err(status_error(status, headers, &body))
    }
}

fn status_error(status: StatusCode, headers: HeaderMap, body: &[u8]) -> Error {
    let error_code = Json::parse(body)
        .ok()
        .and_then(|json| json["errors"][0]["code"].as_i64());
    let message = status_message(status, &String::from_utf8_lossy(body));
    debug!("request failed with {} (error code {:?})", status, error_code);
    Error::Status {
        status,
        headers,
        error_code,
        message,
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    let reason = match status.as_u16() {
        420 => Some("Enhance Your Calm"),
        _ => status.canonical_reason(),
    };
    match reason {
        Some(reason) => format!(
            "HTTP Status {}: {}, Response: {}",
            status.as_u16(),
            reason,
            body
        ),
        None => format!("HTTP Status {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn form(body: &Body) -> Option<&str> {
        match body {
            Body::Form(form) => Some(form),
            _ => None,
        }
    }

    fn transport(builder: &RequestBuilder) -> reqwest::Request {
        builder
            .transport_request(&reqwest::Client::new())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn get_parameters_go_to_query() {
        let request = RequestBuilder::new(Method::GET, url("https://api.example.com/1.1/x.json?a=1"))
            .parameter("screen_name", "jack dorsey")
            .parameter("oauth_callback", "oob")
            .build()
            .unwrap();

        assert_eq!(request.url.query(), Some("a=1&screen_name=jack%20dorsey"));
        assert!(matches!(request.body, Body::Empty));
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn post_parameters_go_to_form_body() {
        let request = RequestBuilder::new(Method::POST, url("https://api.example.com/1.1/update.json"))
            .parameter("status", "Hello Ladies + Gentlemen")
            .parameter("include_entities", true)
            .parameter("oauth_verifier", "pin")
            .build()
            .unwrap();

        assert_eq!(request.url.query(), None);
        assert_eq!(
            form(&request.body),
            Some("include_entities=true&status=Hello%20Ladies%20%2B%20Gentlemen")
        );
        assert_eq!(request.headers[CONTENT_TYPE], FORM_CONTENT_TYPE);
    }

    #[test]
    fn raw_form_body_is_not_reencoded() {
        let request = RequestBuilder::new(Method::POST, url("https://api.example.com/x"))
            .parameter("q", "a%20b")
            .encode_parameters(false)
            .build()
            .unwrap();

        assert_eq!(form(&request.body), Some("q=a%20b"));
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[cfg(feature = "multipart")]
    #[test]
    fn attachments_make_a_multipart_form() {
        let builder = RequestBuilder::new(Method::POST, url("https://upload.example.com/1.1/media/upload.json"))
            .parameter("status", "hi")
            .parameter("oauth_token", "never sent")
            .attachment(Attachment::new("media", &b"\x89PNG"[..]));

        let request = builder.build().unwrap();
        match request.body {
            Body::Multipart(ref form) => assert!(!form.boundary().is_empty()),
            ref other => panic!("expected multipart, got {:?}", other),
        }
        assert_eq!(request.url.query(), None);
        assert!(request.headers.get(CONTENT_TYPE).is_none());

        let sent = transport(&builder);
        let content_type = sent.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[cfg(feature = "multipart")]
    #[test]
    fn multipart_rejects_bad_mime_type() {
        let builder = RequestBuilder::new(Method::POST, url("https://upload.example.com/x"))
            .attachment(Attachment::new("media", vec![1u8]).mime_type("not a mime type"));
        assert!(matches!(builder.build(), Err(Error::Transport(_))));
    }

    #[cfg(feature = "multipart")]
    #[test]
    fn multipart_boundary_is_unique() {
        let builder = RequestBuilder::new(Method::POST, url("https://upload.example.com/x"))
            .attachment(Attachment::new("media", vec![1u8, 2, 3]).mime_type("image/gif").file_name("a.gif"));
        let first = transport(&builder);
        let second = transport(&builder);
        assert_ne!(first.headers()[CONTENT_TYPE], second.headers()[CONTENT_TYPE]);
    }

    #[test]
    fn oauth_header_is_attached() {
        let credential = Arc::new(Credential::new("ck", "cs"));
        let request = RequestBuilder::new(Method::GET, url("https://api.example.com/1.1/x.json"))
            .parameters([("a", "1"), ("b", "2")])
            .sign_with_params(
                credential,
                OAuthParameters::new()
                    .nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
                    .timestamp(1_318_622_958u64),
            )
            .build()
            .unwrap();

        let header = request.headers[AUTHORIZATION].to_str().unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\""));
        assert!(header.contains("oauth_signature=\"2XTJG8yjAYJWVgXuR8Ovi3DcRp8%3D\""));
    }

    #[test]
    fn basic_and_bearer_headers() {
        let basic = RequestBuilder::new(Method::POST, url("https://api.example.com/oauth2/token"))
            .basic_auth("xvz1evFS4wEEPTGEFPHBog", "L8qq9PZyRg6ieKGEKhZolGC0vJWLw8iEJ88DRdyOg");
        assert!(basic.build().unwrap().headers.get(AUTHORIZATION).is_none());
        assert_eq!(
            transport(&basic).headers()[AUTHORIZATION],
            "Basic eHZ6MWV2RlM0d0VFUFRHRUZQSEJvZzpMOHFxOVBaeVJnNmllS0dFS2hab2xHQzB2SldMdzhpRUo4OERSZHlPZw=="
        );

        let bearer = RequestBuilder::new(Method::GET, url("https://api.example.com/1.1/x.json"))
            .bearer_auth("AAAA")
            .build()
            .unwrap();
        assert_eq!(bearer.headers[AUTHORIZATION], "Bearer AAAA");
    }

    #[test]
    fn status_error_carries_server_code() {
        let err = classify(
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            Bytes::from_static(br#"{"errors":[{"code":34,"message":"Not Found"}]}"#),
        )
        .unwrap_err();

        match err {
            Error::Status {
                status,
                error_code,
                ref message,
                ..
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(error_code, Some(34));
                assert!(message.starts_with("HTTP Status 404: Not Found, Response: {"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn status_error_without_json_body() {
        let err = classify(StatusCode::from_u16(420).unwrap(), HeaderMap::new(), Bytes::from_static(b"calm"))
            .unwrap_err();
        assert_eq!(err.error_code(), None);
        assert_eq!(err.to_string(), "HTTP Status 420: Enhance Your Calm, Response: calm");
    }

    #[test]
    fn success_range() {
        for code in [200u16, 201, 204, 299] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(classify(status, HeaderMap::new(), Bytes::new()).is_ok());
        }
        let status = StatusCode::from_u16(300).unwrap();
        assert!(classify(status, HeaderMap::new(), Bytes::new()).is_err());
    }

    #[test]
    fn empty_body_decodes_to_object() {
        let response = Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert_eq!(response.json().unwrap(), Json::Object(BTreeMap::new()));
    }
}
