use mockito::Matcher;
use webthumb_lib::{
    ApiVariant, CaptureRequest, CaptureSession, HttpTransport, JobStatus, ReqwestTransport,
    RequestContext, WebthumbError,
};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn request_for(server: &mockito::ServerGuard) -> CaptureRequest {
    let profile = ApiVariant::Legacy
        .profile()
        .with_base_url(format!("{}/", server.url()));
    CaptureRequest::with_profile("http://webthumbnail.org", profile)
        .expect("request")
        .with_width(320)
        .with_height(240)
        .with_timeout(5)
}

#[tokio::test]
async fn transport_sends_referer_and_user_agent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .match_header("referer", "https://blog.example.com/post")
        .match_header(
            "user-agent",
            Matcher::Regex(r"^Webthumbnail\.org Client Rust/\S+ nginx/1\.25$".into()),
        )
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(PNG_BYTES)
        .create_async()
        .await;

    let transport = ReqwestTransport::new().expect("transport");
    let context = RequestContext::new()
        .with_referer("https://blog.example.com/post")
        .with_host_software("nginx/1.25");
    let url = request_for(&server).capture_url();

    let result = transport.get(&url, &context).await.expect("get");

    mock.assert_async().await;
    assert_eq!(result.status_code, 200);
    assert_eq!(result.content_type, "image/png");
    assert_eq!(result.content_length, PNG_BYTES.len() as u64);
    assert_eq!(result.body, PNG_BYTES);
}

#[tokio::test]
async fn transport_defaults_referer_placeholder() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .match_header("referer", "-")
        .with_body("finished")
        .create_async()
        .await;

    let transport = ReqwestTransport::new().expect("transport");
    let url = request_for(&server).status_url();
    let result = transport
        .get(&url, &RequestContext::default())
        .await
        .expect("get");

    mock.assert_async().await;
    assert_eq!(result.text(), "finished");
}

#[tokio::test]
async fn empty_body_is_a_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let transport = ReqwestTransport::new().expect("transport");
    let url = request_for(&server).capture_url();
    let err = transport
        .get(&url, &RequestContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WebthumbError::Transport(_)));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let transport = ReqwestTransport::new().expect("transport");
    let err = transport
        .get("http://127.0.0.1:1/?width=100", &RequestContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WebthumbError::Network(_)));
}

#[tokio::test]
async fn status_query_carries_action_parameter() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("width".into(), "320".into()),
            Matcher::UrlEncoded("height".into(), "240".into()),
            Matcher::UrlEncoded("format".into(), "png".into()),
            Matcher::UrlEncoded("screen".into(), "1024".into()),
            Matcher::UrlEncoded("url".into(), "http://webthumbnail.org".into()),
            Matcher::UrlEncoded("action".into(), "get-status".into()),
        ]))
        .with_body("loaded")
        .create_async()
        .await;

    let session = CaptureSession::new(ReqwestTransport::new().expect("transport"));
    let status = session
        .poll_status(&request_for(&server))
        .await
        .expect("status");

    mock.assert_async().await;
    assert_eq!(status, JobStatus::Pending);
}

#[tokio::test]
async fn capture_against_live_server_fetches_image() {
    let mut server = mockito::Server::new_async().await;
    let status = server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("action".into(), "get-status".into()))
        .with_body("finished")
        .expect(1)
        .create_async()
        .await;
    let capture = server
        .mock("GET", "/")
        .match_query(Matcher::Regex(
            r"^width=320&height=240&format=png&screen=1024&url=[^&]*$".into(),
        ))
        .with_header("content-type", "image/png")
        .with_body(PNG_BYTES)
        .expect(2)
        .create_async()
        .await;

    let session = CaptureSession::new(ReqwestTransport::new().expect("transport"));
    let result = session
        .capture(&request_for(&server), true)
        .await
        .expect("capture");

    status.assert_async().await;
    capture.assert_async().await;
    assert_eq!(result.body, PNG_BYTES);
    assert_eq!(result.content_type, "image/png");
}
