use std::time::Duration;

use crawl_engine::{FailureKind, FetchSettings, Fetcher, ReqwestFetcher};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_settings() -> FetchSettings {
    FetchSettings {
        allowed_domains: vec!["127.0.0.1".to_string()],
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn fetcher_returns_body_headers_and_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(local_settings());
    let url = format!("{}/doc", server.uri());

    let response = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, url);
    assert_eq!(response.redirect_count, 0);
    assert!(response
        .content_type()
        .is_some_and(|ct| ct.starts_with("text/html")));
    assert_eq!(response.body, b"<html>ok</html>");
}

#[tokio::test]
async fn fetcher_returns_not_found_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(local_settings());
    let url = format!("{}/missing", server.uri());

    let response = fetcher.fetch(&url).await.expect("status is not an error");
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn fetcher_follows_in_domain_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>moved</p>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(local_settings());
    let response = fetcher
        .fetch(&format!("{}/old", server.uri()))
        .await
        .expect("fetch ok");

    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, format!("{}/new", server.uri()));
    assert_eq!(response.redirect_count, 1);
}

#[tokio::test]
async fn fetcher_does_not_follow_offsite_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/away"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://example.org/elsewhere"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(local_settings());
    let url = format!("{}/away", server.uri());

    let response = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(response.status, 302);
    assert_eq!(response.final_url, url);
}

#[tokio::test]
async fn fetcher_rejects_offsite_url_without_request() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());

    let err = fetcher
        .fetch("https://example.org/page")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::OffsiteUrl);
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..local_settings()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..local_settings()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_unsupported_content_type_for_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(local_settings());
    let err = fetcher
        .fetch(&format!("{}/image", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "image/png".to_string()
        }
    );
}
