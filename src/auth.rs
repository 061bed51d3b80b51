//! Token exchange: the three-legged OAuth 1.0a handshake, application-only
//! bearer tokens, and reverse auth.

use std::sync::Arc;

use http::Method;
use log::{debug, info};
use tokio::sync::oneshot;
use url::Url;

use crate::token_reader::{read_authorization_header, TokenReaderFuture};
use crate::{
    AccessToken, ApiUrl, AuthMode, Client, Credential, Error, Json, Result, TokenReaderError,
    OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY,
};

const REQUEST_TOKEN_PATH: &str = "oauth/request_token";
const AUTHORIZE_PATH: &str = "oauth/authorize";
const ACCESS_TOKEN_PATH: &str = "oauth/access_token";
const BEARER_TOKEN_PATH: &str = "oauth2/token";
const INVALIDATE_TOKEN_PATH: &str = "oauth2/invalidate_token";

impl Client {
    /// Obtain a request token for `callback_url` (`oob` for PIN flows).
    pub async fn request_token(&self, callback_url: &str) -> Result<AccessToken> {
        let token = self
            .request(Method::POST, ApiUrl::OAuth, REQUEST_TOKEN_PATH)?
            .parameter(OAUTH_CALLBACK_KEY, callback_url)
            .send()
            .parse_oauth_token()
            .await?;
        debug!("obtained request token {}", token.key);
        Ok(token)
    }

    /// Page the user visits to approve `request_token`.
    pub fn authorize_url(&self, request_token: &AccessToken, force_login: bool) -> Result<Url> {
        let mut url = self.config().endpoint(ApiUrl::OAuth, AUTHORIZE_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(OAUTH_TOKEN_KEY, &request_token.key);
            if force_login {
                query.append_pair("force_login", "true");
            }
        }
        Ok(url)
    }

    /// Trade an authorized request token for an access token and make it the
    /// client's credential.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::BadOAuthResponse`] before touching the network if
    /// the request token carries no verifier.
    pub async fn access_token(&self, request_token: &AccessToken) -> Result<AccessToken> {
        let verifier = request_token
            .verifier
            .as_deref()
            .ok_or(TokenReaderError::MissingVerifier)?;

        // signed with the request token's secret
        let signing = Credential::clone(&self.credential())
            .token(request_token.key.as_str(), request_token.secret.as_str());
        let token = self
            .unauthorized(Method::POST, ApiUrl::OAuth, ACCESS_TOKEN_PATH)?
            .sign(Arc::new(signing))
            .parameter(OAUTH_VERIFIER_KEY, verifier)
            .send()
            .parse_oauth_token()
            .await?;

        info!(
            "authorized as {}",
            token.screen_name().unwrap_or(token.key.as_str())
        );
        self.set_token(Some(token.clone()));
        Ok(token)
    }

    /// Begin the browser handshake.
    ///
    /// Send the user to [`PendingAuthorization::authorize_url`], hand the
    /// redirect to [`AuthorizationCallback::handle_open_url`], then await
    /// [`PendingAuthorization::finish`].
    pub async fn authorize(
        &self,
        callback_url: &str,
        force_login: bool,
    ) -> Result<(PendingAuthorization, AuthorizationCallback)> {
        let request_token = self.request_token(callback_url).await?;
        let authorize_url = self.authorize_url(&request_token, force_login)?;
        let (sender, receiver) = oneshot::channel();
        Ok((
            PendingAuthorization {
                client: self.clone(),
                request_token,
                authorize_url,
                receiver,
            },
            AuthorizationCallback { sender },
        ))
    }

    /// Obtain an application-only bearer token and make it the client's
    /// credential.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotAppOnly`] before touching the network unless
    /// the client was built with [`Client::app_only`].
    pub async fn bearer_token(&self) -> Result<AccessToken> {
        self.ensure_app_only()?;
        let credential = self.credential();
        let json = self
            .unauthorized(Method::POST, ApiUrl::OAuth, BEARER_TOKEN_PATH)?
            .basic_auth(credential.consumer_key(), credential.consumer_secret())
            .parameter("grant_type", "client_credentials")
            .send_json()
            .await?;

        let token = read_bearer_token(&json)?;
        self.set_token(Some(token.clone()));
        Ok(token)
    }

    /// Revoke the bearer token currently held; returns the revoked token.
    pub async fn invalidate_bearer_token(&self) -> Result<Option<AccessToken>> {
        self.ensure_app_only()?;
        let credential = self.credential();
        let current = match credential.access_token() {
            Some(token) => token.key.clone(),
            None => return Ok(None),
        };
        let json = self
            .unauthorized(Method::POST, ApiUrl::OAuth, INVALIDATE_TOKEN_PATH)?
            .basic_auth(credential.consumer_key(), credential.consumer_secret())
            .parameter("access_token", &current)
            .send_json()
            .await?;

        match json["access_token"].as_str() {
            Some(revoked) => {
                self.set_token(None);
                Ok(Some(AccessToken::new(revoked, "")))
            }
            None => Err(response_error(&json)),
        }
    }

    fn ensure_app_only(&self) -> Result<()> {
        match self.mode() {
            AuthMode::AppOnly => Ok(()),
            AuthMode::OAuth1 => Err(Error::NotAppOnly),
        }
    }

    /// First step of reverse auth: the signed request parameters, returned
    /// verbatim for the platform account framework to use.
    pub async fn reverse_auth_request_token(&self) -> Result<String> {
        let response = self
            .request(Method::POST, ApiUrl::OAuth, REQUEST_TOKEN_PATH)?
            .parameter("x_auth_mode", "reverse_auth")
            .send()
            .await?;
        Ok(response.text().into_owned())
    }

    /// Second step of reverse auth.
    ///
    /// `authentication_header` is the `OAuth ...` value produced by step one;
    /// the target consumer key is read from it.
    pub async fn reverse_auth_access_token(
        &self,
        authentication_header: &str,
    ) -> Result<AccessToken> {
        let fields = read_authorization_header(authentication_header);
        let target = fields.get(OAUTH_CONSUMER_KEY).ok_or_else(|| {
            TokenReaderError::TokenKeyNotFound(OAUTH_CONSUMER_KEY, authentication_header.to_string())
        })?;
        self.request(Method::POST, ApiUrl::OAuth, ACCESS_TOKEN_PATH)?
            .parameter("x_reverse_auth_target", target)
            .parameter("x_reverse_auth_parameters", authentication_header)
            .send()
            .parse_oauth_token()
            .await
    }
}

fn read_bearer_token(json: &Json) -> Result<AccessToken> {
    match json["token_type"].as_str() {
        Some("bearer") => match json["access_token"].as_str() {
            Some(key) => Ok(AccessToken::new(key, "")),
            None => Err(Error::InvalidBearerToken(json.to_string())),
        },
        Some(_) => Err(Error::InvalidBearerToken(json.to_string())),
        None => Err(response_error(json)),
    }
}

/// Turn an `errors` member into [`Error::Response`]; anything else is an
/// unexpected document.
fn response_error(json: &Json) -> Error {
    let errors = &json["errors"];
    let error = match errors {
        Json::Array(_) => &errors[0],
        _ => errors,
    };
    if error.as_object().is_none() {
        return Error::InvalidJsonResponse;
    }
    Error::Response {
        code: error["code"].as_i64().unwrap_or_default(),
        message: error["message"].as_str().unwrap_or_default().to_string(),
    }
}

/// Waiting half of [`Client::authorize`].
#[derive(Debug)]
pub struct PendingAuthorization {
    client: Client,
    request_token: AccessToken,
    authorize_url: Url,
    receiver: oneshot::Receiver<Url>,
}

impl PendingAuthorization {
    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    pub fn request_token(&self) -> &AccessToken {
        &self.request_token
    }

    /// Wait for the redirect and exchange its verifier for an access token.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] if the callback was dropped unused;
    /// [`Error::BadOAuthResponse`] if the redirect carried no verifier.
    pub async fn finish(self) -> Result<AccessToken> {
        let PendingAuthorization {
            client,
            request_token,
            receiver,
            ..
        } = self;
        let redirect = receiver.await.map_err(|_| Error::Cancelled)?;
        let verifier = redirect
            .query_pairs()
            .find(|(key, _)| key == OAUTH_VERIFIER_KEY)
            .map(|(_, value)| value.into_owned());
        let request_token = match verifier {
            Some(verifier) => request_token.with_verifier(verifier),
            None => request_token,
        };
        client.access_token(&request_token).await
    }
}

/// Delivering half of [`Client::authorize`]; wire it to whatever receives
/// the callback URL.
#[derive(Debug)]
pub struct AuthorizationCallback {
    sender: oneshot::Sender<Url>,
}

impl AuthorizationCallback {
    /// Returns `false` if nobody is waiting any more.
    pub fn handle_open_url(self, url: Url) -> bool {
        self.sender.send(url).is_ok()
    }
}
