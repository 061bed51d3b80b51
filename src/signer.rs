use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::hash::hmac_sha1;
use crate::{
    SecretsProvider, OAUTH_CONSUMER_KEY, OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERSION_KEY,
};

/// Caller-supplied request parameters, keyed by name.
pub type Parameters = BTreeMap<String, String>;

const OAUTH_VERSION: &str = "1.0";
const OAUTH_SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Unreserved characters stay literal; `[` and `]` are kept as well.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'[')
    .remove(b']');

/// Strict RFC 3986: only unreserved characters stay literal.
const STRICT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `input` the way signature base strings, headers, query
/// strings and form bodies expect.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Like [`percent_encode`], but `[` and `]` are escaped too.
pub fn percent_encode_all(input: &str) -> String {
    utf8_percent_encode(input, STRICT_ENCODE_SET).to_string()
}

/// `key=value` pairs, both sides percent-encoded, joined by `&` in the
/// iterator's order.
pub fn url_encoded_query_string<'a, I>(parameters: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    parameters
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn sorted_components<'a, I>(parameters: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut components: Vec<String> = parameters
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect();
    components.sort();
    components
}

/// Output of one signing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// `METHOD&url&parameters`, as fed to HMAC-SHA1.
    pub base_string: String,
    /// Base64 HMAC-SHA1 digest.
    pub signature: String,
    /// Value for the `Authorization` header.
    pub authorization: String,
}

#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// For media uploads the caller's form parameters travel in a multipart
    /// body and are left out of the signature base.
    pub fn generate_signature(
        &self,
        method: &Method,
        url: &Url,
        parameters: &Parameters,
        is_media_upload: bool,
    ) -> String {
        self.sign(method, url, parameters, is_media_upload)
            .authorization
    }

    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        parameters: &Parameters,
        is_media_upload: bool,
    ) -> Signature {
        let mut authorization = self.authorization_parameters();

        // caller-supplied oauth_* parameters override the defaults
        for (key, value) in parameters {
            if key.starts_with(OAUTH_KEY_PREFIX) {
                authorization.insert(key.clone(), value.clone());
            }
        }

        // query parameters already on the url are signed, not sent twice
        let mut base_url = url.clone();
        let url_query: Vec<(String, String)> = base_url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let mut signed: Vec<(&str, &str)> = authorization
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if !is_media_upload {
            signed.extend(
                parameters
                    .iter()
                    .filter(|(k, _)| !k.starts_with(OAUTH_KEY_PREFIX))
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
            signed.extend(url_query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let parameter_string = sorted_components(signed).join("&");
        let base_string = format!(
            "{}&{}&{}",
            method.as_str(),
            percent_encode(base_url.as_str()),
            percent_encode(&parameter_string)
        );

        let digest = hmac_sha1(self.signing_key().as_bytes(), base_string.as_bytes());
        let signature = BASE64_STANDARD.encode(digest);

        authorization.insert(OAUTH_SIGNATURE_KEY.to_string(), signature.clone());
        let components = sorted_components(
            authorization
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let header_fields: Vec<String> = components
            .iter()
            .filter_map(|component| component.split_once('='))
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();

        Signature {
            base_string,
            signature,
            authorization: format!("OAuth {}", header_fields.join(", ")),
        }
    }

    /// `percent(consumer_secret)&percent(token_secret)`; the token part is
    /// empty when no user token is held.
    pub fn signing_key(&self) -> String {
        let (_, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (_, token_secret) = self.secrets.get_token_option_pair();
        format!(
            "{}&{}",
            percent_encode(consumer_secret),
            percent_encode(token_secret.unwrap_or_default())
        )
    }

    fn authorization_parameters(&self) -> BTreeMap<String, String> {
        let (consumer_key, _) = self.secrets.get_consumer_key_pair();
        let (token, _) = self.secrets.get_token_option_pair();
        let params = &self.parameters;

        let mut authorization = BTreeMap::new();
        authorization.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());
        authorization.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            OAUTH_SIGNATURE_METHOD.to_string(),
        );
        authorization.insert(OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string());
        let timestamp = params
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);
        authorization.insert(OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string());
        let nonce = match params.nonce {
            Some(ref nonce) => nonce.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        authorization.insert(OAUTH_NONCE_KEY.to_string(), nonce);
        if let Some(token) = token {
            authorization.insert(OAUTH_TOKEN_KEY.to_string(), token.to_string());
        }
        authorization
    }
}

/// Per-request knobs for the `oauth_*` parameters. Unset nonce and
/// timestamp are generated fresh on every signing pass.
///
/// Callback and verifier are ordinary request parameters; any `oauth_*`
/// parameter on the request overrides the generated value.
#[derive(Debug, Clone, Default)]
pub struct OAuthParameters<'a> {
    nonce: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// Detach from borrowed data so the parameters can outlive the caller.
    pub fn into_owned(self) -> OAuthParameters<'static> {
        OAuthParameters {
            nonce: self.nonce.map(|nonce| Cow::Owned(nonce.into_owned())),
            timestamp: self.timestamp,
        }
    }
}
