use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{
    AccessToken, ApiUrl, Client, Config, Error, Json, Parameters, RequestState, StallWarning,
    StreamMessage,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn client_for(server: &MockServer, client: Client) -> Client {
    client.with_config(Config::new().with_host(&server.uri()))
}

fn params(pairs: &[(&str, &str)]) -> Parameters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn authorization_of(server: &MockServer, index: usize) -> String {
    let requests = server.received_requests().await.unwrap();
    requests[index]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn signed_get_with_query() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/home_timeline.json"))
        .and(query_param("count", "2"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1},{"id":2}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let timeline = client
        .get_json("statuses/home_timeline.json", params(&[("count", "2")]))
        .await
        .unwrap();

    assert_eq!(timeline[1]["id"].as_i64(), Some(2));
    let authorization = authorization_of(&server, 0).await;
    assert!(authorization.starts_with("OAuth "));
    assert!(authorization.contains("oauth_token=\"t\""));
}

#[tokio::test]
async fn not_found_carries_error_code() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"errors":[{"code":34,"message":"Not Found"}]}"#),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let err = client
        .get_json("users/show.json", params(&[("screen_name", "nobody")]))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.error_code(), Some(34));
    assert!(err.to_string().starts_with("HTTP Status 404: Not Found"));
}

#[tokio::test]
async fn empty_success_body_is_empty_object() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/friendships/destroy.json"))
        .and(body_string_contains("user_id=12"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let json = client
        .post_json("friendships/destroy.json", params(&[("user_id", "12")]))
        .await
        .unwrap();
    assert_eq!(json, Json::Object(Default::default()));
}

#[tokio::test]
async fn three_legged_token_exchange() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=req&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=acc&oauth_token_secret=acc-secret&user_id=12&screen_name=jack",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Client::new("ck", "cs"));
    let request_token = client.request_token("oob").await.unwrap();
    assert_eq!(request_token.key, "req");
    assert_eq!(request_token.remain["oauth_callback_confirmed"], "true");

    let token = client
        .access_token(&request_token.with_verifier("pin"))
        .await
        .unwrap();
    assert_eq!(token.screen_name(), Some("jack"));
    assert_eq!(
        client.credential().access_token().map(|t| t.key.as_str()),
        Some("acc")
    );

    let first = authorization_of(&server, 0).await;
    assert!(first.contains("oauth_callback=\"oob\""));
    assert!(!first.contains("oauth_token="));
    let second = authorization_of(&server, 1).await;
    assert!(second.contains("oauth_token=\"req\""));
    assert!(second.contains("oauth_verifier=\"pin\""));
}

#[tokio::test]
async fn browser_authorization_flow() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=req&oauth_token_secret=s"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=acc&oauth_token_secret=as"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Client::new("ck", "cs"));
    let (pending, callback) = client
        .authorize("birdcall://success", true)
        .await
        .unwrap();
    assert_eq!(
        pending.authorize_url().query(),
        Some("oauth_token=req&force_login=true")
    );

    let redirect = Url::parse("birdcall://success?oauth_token=req&oauth_verifier=v123").unwrap();
    assert!(callback.handle_open_url(redirect));

    let token = pending.finish().await.unwrap();
    assert_eq!(token, AccessToken::new("acc", "as"));
    assert!(authorization_of(&server, 1).await.contains("oauth_verifier=\"v123\""));
}

#[tokio::test]
async fn app_only_bearer_token() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("authorization", "Basic Y2s6Y3M="))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"token_type":"bearer","access_token":"AAAA"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(header("authorization", "Bearer AAAA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statuses":[]}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/invalidate_token"))
        .and(body_string_contains("access_token=AAAA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"AAAA"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Client::app_only("ck", "cs"));
    let token = client.bearer_token().await.unwrap();
    assert_eq!(token.key, "AAAA");
    assert_eq!(token.secret, "");

    let result = client
        .get_json("search/tweets.json", params(&[("q", "rust")]))
        .await
        .unwrap();
    assert!(result["statuses"].as_array().is_some());

    let revoked = client.invalidate_bearer_token().await.unwrap();
    assert_eq!(revoked.map(|t| t.key), Some("AAAA".to_string()));
    assert_eq!(client.credential().access_token(), None);
}

#[cfg(feature = "multipart")]
#[tokio::test]
async fn media_upload_is_multipart() {
    use crate::Attachment;

    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"media_id_string":"710"}"#))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let json = client
        .post_media(
            "media/upload.json",
            params(&[("media_category", "tweet_image")]),
            Attachment::new("media", vec![0xffu8, 0xd8, 0xff]).mime_type("image/jpeg"),
        )
        .await
        .unwrap();
    assert_eq!(json["media_id_string"].as_str(), Some("710"));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("Content-Disposition: form-data; name=\"media\"; filename=\"media.jpg\""));
    assert!(body.contains("Content-Type: image/jpeg"));
    assert!(body.contains("name=\"media_category\"\r\n\r\ntweet_image"));
    assert!(body.find("name=\"media\"") < body.find("name=\"media_category\""));
    assert!(!body.contains("oauth_"));
}

#[tokio::test]
async fn bearer_token_needs_app_only_client() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"token_type":"bearer","access_token":"AAAA"}"#),
        )
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let err = client.bearer_token().await.unwrap_err();
    assert!(matches!(err, Error::NotAppOnly));
    let err = client.invalidate_bearer_token().await.unwrap_err();
    assert!(matches!(err, Error::NotAppOnly));

    // the user token is untouched and still signs requests
    assert_eq!(
        client.credential().access_token(),
        Some(&AccessToken::new("t", "ts"))
    );
}

#[tokio::test]
async fn stream_delivers_messages() {
    init();
    let server = MockServer::start().await;
    let body = concat!(
        "{\"id\":1,\"text\":\"one\"}\r\n",
        "\r\n",
        "{\"warning\":{\"code\":\"FALLING_BEHIND\",\"message\":\"slow\",\"percent_full\":60}}\r\n",
        "{\"id\":2,\"text\":\"two\"}\r\n",
    );
    Mock::given(method("POST"))
        .and(path("/1.1/statuses/filter.json"))
        .and(body_string_contains("track=rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let mut stream = client
        .stream(
            Method::POST,
            ApiUrl::Stream,
            "statuses/filter.json",
            params(&[("track", "rust")]),
        )
        .await
        .unwrap();

    let mut messages = Vec::new();
    while let Some(message) = stream.next().await {
        messages.push(message.unwrap());
    }
    assert_eq!(messages.len(), 3);
    assert!(matches!(&messages[0], StreamMessage::Message(json) if json["id"].as_i64() == Some(1)));
    assert_eq!(
        messages[1],
        StreamMessage::StallWarning(StallWarning {
            code: Some("FALLING_BEHIND".into()),
            message: Some("slow".into()),
            percent_full: Some(60),
        })
    );
    assert!(matches!(&messages[2], StreamMessage::Message(json) if json["text"].as_str() == Some("two")));
    assert_eq!(stream.state(), RequestState::Completed);
}

#[tokio::test]
async fn stream_rejected_with_status() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/sample.json"))
        .respond_with(ResponseTemplate::new(420).set_body_string("Enhance your calm"))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let err = client
        .stream(Method::GET, ApiUrl::Stream, "statuses/sample.json", Parameters::new())
        .await
        .unwrap_err();
    assert_eq!(err.status_code().map(|s| s.as_u16()), Some(420));
    assert!(err.to_string().starts_with("HTTP Status 420: Enhance Your Calm"));
}

#[tokio::test]
async fn stop_cancels_request() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let handle = client.get(ApiUrl::Api, "slow.json").unwrap().start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop();

    let err = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn cancelled_state_is_reported() {
    init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/slow.json"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let builder = client.get(ApiUrl::Api, "slow.json").unwrap();
    let token = builder.cancellation_token();
    token.cancel();

    let handle = builder.start();
    let state = handle_state_after_finish(handle).await;
    assert_eq!(state, RequestState::Cancelled);
}

async fn handle_state_after_finish(handle: crate::RequestHandle) -> RequestState {
    for _ in 0..100 {
        match handle.state() {
            RequestState::Completed | RequestState::Failed | RequestState::Cancelled => break,
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    handle.state()
}

#[tokio::test]
async fn progress_sees_every_byte() {
    init();
    let server = MockServer::start().await;
    let payload = format!("{{\"text\":\"{}\"}}", "x".repeat(64 * 1024));
    Mock::given(method("GET"))
        .and(path("/1.1/big.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(payload.clone()))
        .mount(&server)
        .await;

    let client = client_for(&server, Client::with_token("ck", "cs", "t", "ts"));
    let seen = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));
    let (seen_in, total_in) = (seen.clone(), total.clone());
    let response = client
        .get(ApiUrl::Api, "big.json")
        .unwrap()
        .on_progress(move |chunk, received, expected| {
            assert!(!chunk.is_empty());
            seen_in.fetch_add(chunk.len(), Ordering::SeqCst);
            total_in.store(received, Ordering::SeqCst);
            assert!(expected.map_or(true, |e| received as u64 <= e));
        })
        .send()
        .await
        .unwrap();

    assert_eq!(response.body.len(), payload.len());
    assert_eq!(seen.load(Ordering::SeqCst), payload.len());
    assert_eq!(total.load(Ordering::SeqCst), payload.len());
}
