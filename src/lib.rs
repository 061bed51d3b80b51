/*!
birdcall: OAuth 1.0a signed client core for the Twitter REST and streaming APIs.

# Overview

This library signs requests with OAuth 1.0a `HMAC-SHA1`, walks the token
handshake, sends requests through [reqwest](https://crates.io/crates/reqwest)
and decodes responses into a small dynamic [`Json`] value. Long-lived
streaming responses are reassembled into individual messages.

# How to use

## Basic usecase 1 - sending the tweet

```no_run
# async fn run() -> birdcall::Result<()> {
use birdcall::{Client, Parameters};

// prepare authorization info
let client = Client::with_token(
    "[CONSUMER_KEY]",
    "[CONSUMER_SECRET]",
    "[ACCESS_TOKEN]",
    "[TOKEN_SECRET]",
);

let mut parameters = Parameters::new();
parameters.insert("status".into(), "Hello, Twitter!".into());
let tweet = client.post_json("statuses/update.json", parameters).await?;
println!("posted {}", tweet["id_str"]);
# Ok(())
# }
```

## Basic usecase 2 - Acquiring OAuth token & secret

```no_run
# async fn run() -> birdcall::Result<()> {
use std::io;

let client = birdcall::Client::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");

// step 1: acquire request token & token secret
let request_token = client.request_token("oob").await?;

// step 2. acquire user pin
let url = client.authorize_url(&request_token, false)?;
println!("please access to: {}", url);

println!("input pin: ");
let mut user_input = String::new();
io::stdin().read_line(&mut user_input).unwrap();
let pin = user_input.trim();

// step 3. acquire access token; the client signs with it from now on
let token = client.access_token(&request_token.with_verifier(pin)).await?;
println!(
    "your token and secret is: \n token: {}\n secret: {}",
    token.key, token.secret
);
println!("other attributes: {:#?}", token.remain);
# Ok(())
# }
```

## Basic usecase 3 - Reading a stream

```no_run
# async fn run() -> birdcall::Result<()> {
use birdcall::{ApiUrl, Parameters, StreamMessage};
use http::Method;

let client = birdcall::Client::with_token("ck", "cs", "token", "secret");
let mut parameters = Parameters::new();
parameters.insert("track".into(), "rust".into());

let mut stream = client
    .stream(Method::POST, ApiUrl::Stream, "statuses/filter.json", parameters)
    .await?;
while let Some(message) = stream.next().await {
    match message? {
        StreamMessage::Message(tweet) => println!("{}", tweet["text"]),
        StreamMessage::StallWarning(warning) => eprintln!("{:?}", warning),
    }
}
# Ok(())
# }
```
*/
mod auth;
mod client;
mod config;
mod error;
pub mod hash;
mod json;
mod request;
mod secrets;
mod signer;
mod stream;
mod token_reader;
#[cfg(test)]
mod usage_test;

// exposed to external program
pub use auth::{AuthorizationCallback, PendingAuthorization};
pub use client::{AuthMode, Client};
pub use config::{ApiUrl, Config};
pub use error::{Error, JsonError, JsonResult, Result, TokenReaderError, TokenReaderResult};
pub use json::Json;
pub use request::{
    Attachment, Body, ProgressHandler, RequestBuilder, RequestHandle, RequestState, Response,
    SignedRequest,
};
pub use secrets::{AccessToken, Credential, CredentialStore, SecretsProvider};
pub use signer::{
    percent_encode, percent_encode_all, url_encoded_query_string, OAuthParameters, Parameters,
    Signature, Signer,
};
pub use stream::{MessageStream, Reassembler, StallWarning, StreamMessage};
pub use token_reader::{read_authorization_header, read_oauth_token, TokenReader, TokenReaderFuture};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub(crate) const OAUTH_TOKEN_KEY: &str = "oauth_token";
