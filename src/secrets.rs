use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);

    fn get_token_pair_option(&self) -> Option<(&str, &str)>;

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or((None, None))
    }
}

/// A token issued by the service: a request token during the handshake, a
/// user access token afterwards, or an app-only bearer token (empty secret).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessToken {
    pub key: String,
    pub secret: String,
    /// Only set between the user authorization step and the access token
    /// exchange.
    pub verifier: Option<String>,
    /// Other attributes returned alongside the token.
    pub remain: HashMap<String, String>,
}

impl AccessToken {
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        AccessToken {
            key: key.into(),
            secret: secret.into(),
            ..Default::default()
        }
    }

    pub fn with_verifier<T: Into<String>>(self, verifier: T) -> Self {
        AccessToken {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    pub fn screen_name(&self) -> Option<&str> {
        self.remain.get("screen_name").map(String::as_str)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.remain.get("user_id").map(String::as_str)
    }
}

/// Consumer key pair plus an optional user (or bearer) token.
///
/// Credentials are never mutated in place; build a new one and swap it into
/// a [`CredentialStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    consumer_key: String,
    consumer_secret: String,
    access_token: Option<AccessToken>,
}

impl Credential {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Credential {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: None,
        }
    }

    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        self.with_access_token(AccessToken::new(token, token_secret))
    }

    pub fn with_access_token(self, access_token: AccessToken) -> Self {
        Credential {
            access_token: Some(access_token),
            ..self
        }
    }

    pub fn without_access_token(self) -> Self {
        Credential {
            access_token: None,
            ..self
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }
}

impl SecretsProvider for Credential {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        self.access_token
            .as_ref()
            .map(|t| (t.key.as_str(), t.secret.as_str()))
    }
}

impl<T: SecretsProvider> SecretsProvider for Arc<T> {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (**self).get_consumer_key_pair()
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        (**self).get_token_pair_option()
    }
}

/// Shared, atomically replaceable credential.
///
/// Readers take a snapshot and keep signing with it even if a token exchange
/// swaps in a new credential meanwhile.
#[derive(Debug)]
pub struct CredentialStore {
    current: RwLock<Arc<Credential>>,
}

impl CredentialStore {
    pub fn new(credential: Credential) -> Self {
        CredentialStore {
            current: RwLock::new(Arc::new(credential)),
        }
    }

    pub fn snapshot(&self) -> Arc<Credential> {
        self.current.read().clone()
    }

    pub fn replace(&self, credential: Credential) {
        *self.current.write() = Arc::new(credential);
    }

    /// Swap in a credential carrying `token`, keeping the consumer pair.
    pub fn replace_token(&self, token: Option<AccessToken>) {
        let mut current = self.current.write();
        let base = Credential::clone(&current);
        let next = match token {
            Some(token) => base.with_access_token(token),
            None => base.without_access_token(),
        };
        *current = Arc::new(next);
    }
}
