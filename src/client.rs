use std::sync::Arc;

use http::header::USER_AGENT;
use http::{HeaderValue, Method};

#[cfg(feature = "multipart")]
use crate::request::Attachment;
use crate::stream::MessageStream;
use crate::{
    AccessToken, ApiUrl, Config, Credential, CredentialStore, Json, Parameters, RequestBuilder,
    Result,
};

/// How requests from a [`Client`] are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// OAuth 1.0a signature on every request.
    OAuth1,
    /// Application-only auth: HTTP Basic with the consumer pair until a
    /// bearer token is held, `Bearer` afterwards.
    AppOnly,
}

/// Entry point for talking to the API.
///
/// Cloning is cheap and clones share the credential, so a token obtained
/// through one clone is used by all of them.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<Config>,
    credential: Arc<CredentialStore>,
    mode: AuthMode,
}

impl Client {
    /// Client holding only the consumer pair, ready for the token handshake.
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Self::from_credential(Credential::new(consumer_key, consumer_secret), AuthMode::OAuth1)
    }

    /// Client acting on behalf of a user.
    pub fn with_token<TKey, TSecret, TToken, TTokenSecret>(
        consumer_key: TKey,
        consumer_secret: TSecret,
        token: TToken,
        token_secret: TTokenSecret,
    ) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
        TToken: Into<String>,
        TTokenSecret: Into<String>,
    {
        Self::from_credential(
            Credential::new(consumer_key, consumer_secret).token(token, token_secret),
            AuthMode::OAuth1,
        )
    }

    /// Client using application-only auth.
    pub fn app_only<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Self::from_credential(Credential::new(consumer_key, consumer_secret), AuthMode::AppOnly)
    }

    pub fn from_credential(credential: Credential, mode: AuthMode) -> Self {
        Client {
            config: Arc::new(Config::default()),
            credential: Arc::new(CredentialStore::new(credential)),
            mode,
        }
    }

    pub fn with_config(self, config: Config) -> Self {
        Client {
            config: Arc::new(config),
            ..self
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Snapshot of the current credential.
    pub fn credential(&self) -> Arc<Credential> {
        self.credential.snapshot()
    }

    pub fn set_credential(&self, credential: Credential) {
        self.credential.replace(credential);
    }

    pub(crate) fn set_token(&self, token: Option<AccessToken>) {
        self.credential.replace_token(token);
    }

    // ------------------------------------------------------------------------
    // Request construction

    /// Start an authorized request to `path` below the selected base URL.
    pub fn request(&self, method: Method, base: ApiUrl, path: &str) -> Result<RequestBuilder> {
        let credential = self.credential.snapshot();
        let builder = self.unauthorized(method.clone(), base, path)?;
        Ok(match self.mode {
            AuthMode::OAuth1 => builder.sign(credential),
            AuthMode::AppOnly => match credential.access_token() {
                Some(token) => builder.bearer_auth(&token.key),
                None if method == Method::POST => {
                    builder.basic_auth(credential.consumer_key(), credential.consumer_secret())
                }
                None => builder,
            },
        })
    }

    /// Convenience method to make a `GET` request.
    pub fn get(&self, base: ApiUrl, path: &str) -> Result<RequestBuilder> {
        self.request(Method::GET, base, path)
    }

    /// Convenience method to make a `POST` request.
    pub fn post(&self, base: ApiUrl, path: &str) -> Result<RequestBuilder> {
        self.request(Method::POST, base, path)
    }

    /// Request with the configured timeout and user agent but no
    /// `Authorization` header yet.
    pub(crate) fn unauthorized(
        &self,
        method: Method,
        base: ApiUrl,
        path: &str,
    ) -> Result<RequestBuilder> {
        let url = self.config.endpoint(base, path)?;
        let builder = RequestBuilder::new(method, url).timeout(self.config.timeout);
        Ok(match self.config.user_agent {
            Some(ref user_agent) => builder.header(USER_AGENT, HeaderValue::from_str(user_agent)?),
            None => builder,
        })
    }

    // ------------------------------------------------------------------------
    // JSON endpoints

    /// Send a request and decode its JSON body.
    pub async fn json_request(
        &self,
        method: Method,
        base: ApiUrl,
        path: &str,
        parameters: Parameters,
    ) -> Result<Json> {
        self.request(method, base, path)?
            .parameters(parameters)
            .send_json()
            .await
    }

    pub async fn get_json(&self, path: &str, parameters: Parameters) -> Result<Json> {
        self.json_request(Method::GET, ApiUrl::Api, path, parameters).await
    }

    pub async fn post_json(&self, path: &str, parameters: Parameters) -> Result<Json> {
        self.json_request(Method::POST, ApiUrl::Api, path, parameters).await
    }

    /// Upload binary media as multipart to the upload host.
    #[cfg(feature = "multipart")]
    pub async fn post_media(
        &self,
        path: &str,
        parameters: Parameters,
        attachment: Attachment,
    ) -> Result<Json> {
        self.request(Method::POST, ApiUrl::Upload, path)?
            .parameters(parameters)
            .attachment(attachment)
            .send_json()
            .await
    }

    /// Open a streaming endpoint.
    pub async fn stream(
        &self,
        method: Method,
        base: ApiUrl,
        path: &str,
        parameters: Parameters,
    ) -> Result<MessageStream> {
        self.request(method, base, path)?
            .parameters(parameters)
            .stream()
            .await
    }
}
