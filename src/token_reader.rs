use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;

use crate::request::Response;
use crate::{AccessToken, Result, TokenReaderError, TokenReaderResult, OAUTH_TOKEN_KEY};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Add parse_oauth_token feature to a buffered [`Response`].
// this trait is sealed
pub trait TokenReader: private::Sealed {
    fn parse_oauth_token(&self) -> TokenReaderResult<AccessToken>;
}

impl TokenReader for Response {
    fn parse_oauth_token(&self) -> TokenReaderResult<AccessToken> {
        let text = std::str::from_utf8(&self.body).map_err(|_| TokenReaderError::NotUtf8)?;
        read_oauth_token(text)
    }
}

/// Add parse_oauth_token feature to the future returned by
/// [`RequestBuilder::send`](crate::RequestBuilder::send).
// this trait is also sealed
#[async_trait]
pub trait TokenReaderFuture: private::SealedWrapper {
    async fn parse_oauth_token(self) -> Result<AccessToken>;
}

#[async_trait]
impl<T> TokenReaderFuture for T
where
    T: Future<Output = Result<Response>> + Send,
{
    async fn parse_oauth_token(self) -> Result<AccessToken> {
        Ok(self.await?.parse_oauth_token()?)
    }
}

/// Parse an `application/x-www-form-urlencoded` token response.
pub fn read_oauth_token(text: &str) -> TokenReaderResult<AccessToken> {
    let mut destructured = serde_urlencoded::from_str::<HashMap<String, String>>(text)
        .map_err(|_| TokenReaderError::TokenKeyNotFound(OAUTH_TOKEN_KEY, text.to_string()))?;
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(key), Some(secret)) => Ok(AccessToken {
            key,
            secret,
            verifier: None,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}

/// Split an `OAuth k="v", ...` header value back into decoded pairs.
pub fn read_authorization_header(header: &str) -> HashMap<String, String> {
    let fields = header.trim().strip_prefix("OAuth").unwrap_or(header);
    fields
        .split(',')
        .filter_map(|field| field.trim().split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"');
            (
                key.trim().to_string(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}

mod private {
    use std::future::Future;

    use crate::request::Response;
    use crate::Result;

    pub trait Sealed {}
    impl Sealed for Response {}
    pub trait SealedWrapper {}
    impl<T> SealedWrapper for T where T: Future<Output = Result<Response>> {}
}
