use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;
use webthumb_lib::{
    ApiVariant, CancellationToken, CaptureRequest, CaptureResult, CaptureSession, CaptureState,
    HttpTransport, JobStatus, RequestContext, SubmitPolicy, WebthumbError,
};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Answers status URLs from a script and everything else with a tiny PNG.
#[derive(Default)]
struct ScriptedTransport {
    statuses: Mutex<VecDeque<&'static str>>,
    submit_failures: Mutex<VecDeque<&'static str>>,
    calls: Mutex<Vec<String>>,
    referers: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn with_statuses(statuses: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            ..Self::default()
        })
    }

    fn failing_first_submit(statuses: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            submit_failures: Mutex::new(VecDeque::from(["connection refused"])),
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|url| url.ends_with("&action=get-status"))
            .count()
    }

    fn submit_calls(&self) -> usize {
        self.calls().len() - self.status_calls()
    }
}

impl HttpTransport for ScriptedTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
        context: &'a RequestContext,
    ) -> BoxFuture<'a, webthumb_lib::Result<CaptureResult>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.to_string());
            self.referers
                .lock()
                .unwrap()
                .push(context.referer().to_string());

            if url.ends_with("&action=get-status") {
                let body = self
                    .statuses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or("pending");
                return Ok(CaptureResult::new(body.as_bytes(), 200, "text/plain"));
            }

            if let Some(reason) = self.submit_failures.lock().unwrap().pop_front() {
                return Err(WebthumbError::transport(reason));
            }
            Ok(CaptureResult::new(PNG_BYTES, 200, "image/png"))
        })
    }
}

fn legacy_request(timeout: u64) -> CaptureRequest {
    CaptureRequest::new("http://webthumbnail.org", ApiVariant::Legacy)
        .expect("request")
        .with_width(320)
        .with_height(240)
        .with_timeout(timeout)
}

#[tokio::test(start_paused = true)]
async fn capture_returns_after_two_backoffs() {
    let transport = ScriptedTransport::with_statuses(&["pending", "pending", "finished"]);
    let session = CaptureSession::new(transport.clone());
    let request = legacy_request(5);

    let started = Instant::now();
    let result = session.capture(&request, true).await.expect("capture");

    assert_eq!(result.body, PNG_BYTES);
    assert_eq!(result.content_type, "image/png");
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(transport.status_calls(), 3);
    assert_eq!(transport.submit_calls(), 2);

    let calls = transport.calls();
    assert_eq!(calls.first(), Some(&request.capture_url()));
    assert_eq!(calls.last(), Some(&request.capture_url()));
}

#[tokio::test(start_paused = true)]
async fn capture_times_out_when_never_finished() {
    let transport = ScriptedTransport::with_statuses(&[]);
    let session = CaptureSession::new(transport.clone());

    let started = Instant::now();
    let err = session
        .capture(&legacy_request(3), true)
        .await
        .expect_err("should time out");

    assert!(matches!(err, WebthumbError::CaptureTimeout { timeout_secs: 3 }));
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(transport.status_calls(), 4);
    // No final fetch after a timeout.
    assert_eq!(transport.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_fails_on_first_pending() {
    let transport = ScriptedTransport::with_statuses(&["waiting"]);
    let session = CaptureSession::new(transport.clone());

    let started = Instant::now();
    let err = session.capture(&legacy_request(0), true).await.unwrap_err();

    assert!(matches!(err, WebthumbError::CaptureTimeout { .. }));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(transport.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_wait_skips_polling() {
    let transport = ScriptedTransport::with_statuses(&["pending"]);
    let session = CaptureSession::new(transport.clone());

    let result = session
        .capture(&legacy_request(120), false)
        .await
        .expect("capture");

    assert_eq!(result.body, PNG_BYTES);
    assert_eq!(transport.status_calls(), 0);
    assert_eq!(transport.submit_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_status_is_a_protocol_error() {
    let transport = ScriptedTransport::with_statuses(&["pending", "exploded"]);
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorder = states.clone();
    let session = CaptureSession::new(transport.clone()).on_state(Arc::new(move |state: CaptureState| {
        recorder.lock().unwrap().push(state);
    }));

    let err = session
        .capture(&legacy_request(10), true)
        .await
        .unwrap_err();

    match err {
        WebthumbError::Protocol(message) => assert!(message.contains("exploded")),
        other => panic!("expected protocol error, got {:?}", other),
    }
    assert_eq!(transport.status_calls(), 2);
    assert_eq!(
        states.lock().unwrap().last(),
        Some(&CaptureState::ProtocolError)
    );
}

#[tokio::test(start_paused = true)]
async fn poll_status_maps_bodies() {
    let transport = ScriptedTransport::with_statuses(&["finished", "loaded", "waiting", "nope"]);
    let session = CaptureSession::new(transport);
    let request = legacy_request(1);

    assert_eq!(session.poll_status(&request).await.unwrap(), JobStatus::Finished);
    assert_eq!(session.poll_status(&request).await.unwrap(), JobStatus::Pending);
    assert_eq!(session.poll_status(&request).await.unwrap(), JobStatus::Pending);
    assert!(matches!(
        session.poll_status(&request).await,
        Err(WebthumbError::Protocol(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn discarded_submit_failure_does_not_abort_capture() {
    let transport = ScriptedTransport::failing_first_submit(&["finished"]);
    let session = CaptureSession::new(transport.clone());

    let result = session.capture(&legacy_request(5), true).await;

    assert!(result.is_ok());
    assert_eq!(transport.submit_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn propagated_submit_failure_stops_immediately() {
    let transport = ScriptedTransport::failing_first_submit(&["finished"]);
    let session =
        CaptureSession::new(transport.clone()).with_submit_policy(SubmitPolicy::Propagate);

    let err = session
        .capture(&legacy_request(5), true)
        .await
        .unwrap_err();

    assert!(matches!(err, WebthumbError::Transport(_)));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn browser_variant_backs_off_two_seconds() {
    let transport = ScriptedTransport::with_statuses(&["pending", "pending", "finished"]);
    let session = CaptureSession::new(transport.clone());
    let request = CaptureRequest::new("http://example.com", ApiVariant::Browser)
        .unwrap()
        .with_render_mode("firefox")
        .unwrap();

    let started = Instant::now();
    session.capture(&request, true).await.expect("capture");

    assert_eq!(started.elapsed(), Duration::from_secs(4));
    assert!(transport.calls()[0].contains("&browser=firefox&"));
}

#[tokio::test(start_paused = true)]
async fn poll_interval_override_applies() {
    let transport = ScriptedTransport::with_statuses(&["pending", "finished"]);
    let session =
        CaptureSession::new(transport).with_poll_interval(Duration::from_millis(250));

    let started = Instant::now();
    session
        .capture(&legacy_request(5), true)
        .await
        .expect("capture");

    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_backoff() {
    let transport = ScriptedTransport::with_statuses(&[]);
    let token = CancellationToken::new();
    let session = CaptureSession::new(transport.clone()).with_cancellation(token.clone());
    let request = legacy_request(120);

    let started = Instant::now();
    let (result, _) = tokio::join!(session.capture(&request, true), async {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        token.cancel();
    });

    assert!(matches!(result, Err(WebthumbError::Cancelled)));
    assert_eq!(started.elapsed(), Duration::from_millis(2500));
    assert_eq!(transport.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_before_first_poll() {
    let transport = ScriptedTransport::with_statuses(&["finished"]);
    let token = CancellationToken::new();
    token.cancel();
    let session = CaptureSession::new(transport.clone()).with_cancellation(token);

    let err = session
        .capture(&legacy_request(5), true)
        .await
        .unwrap_err();

    assert!(matches!(err, WebthumbError::Cancelled));
    assert_eq!(transport.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn state_callback_follows_lifecycle() {
    let transport = ScriptedTransport::with_statuses(&["pending", "finished"]);
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorder = states.clone();
    let session = CaptureSession::new(transport).on_state(Arc::new(move |state: CaptureState| {
        recorder.lock().unwrap().push(state);
    }));

    session
        .capture(&legacy_request(5), true)
        .await
        .expect("capture");
    assert_eq!(
        *states.lock().unwrap(),
        vec![
            CaptureState::Idle,
            CaptureState::Submitted,
            CaptureState::Polling,
            CaptureState::Finished,
        ]
    );

    states.lock().unwrap().clear();
    let transport = ScriptedTransport::with_statuses(&[]);
    let recorder = states.clone();
    let session = CaptureSession::new(transport).on_state(Arc::new(move |state: CaptureState| {
        recorder.lock().unwrap().push(state);
    }));
    session
        .capture(&legacy_request(5), false)
        .await
        .expect("capture");
    assert_eq!(
        *states.lock().unwrap(),
        vec![
            CaptureState::Idle,
            CaptureState::Submitted,
            CaptureState::Finished,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn context_is_forwarded_to_every_call() {
    let transport = ScriptedTransport::with_statuses(&["finished"]);
    let session = CaptureSession::new(transport.clone())
        .with_context(RequestContext::new().with_referer("https://blog.example.com"));

    session
        .capture(&legacy_request(5), true)
        .await
        .expect("capture");

    let referers = transport.referers.lock().unwrap().clone();
    assert_eq!(referers.len(), 3);
    assert!(referers.iter().all(|r| r == "https://blog.example.com"));
}

#[tokio::test]
async fn capture_to_file_writes_body() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("thumb.png");
    let session = CaptureSession::new(ScriptedTransport::with_statuses(&["finished"]));

    let result = session
        .capture_to_file(&legacy_request(5), &path, true)
        .await
        .expect("capture to file");

    assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);
    assert_eq!(result.content_length, PNG_BYTES.len() as u64);
}

#[tokio::test]
async fn capture_to_file_reports_write_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("thumb.png");
    let session = CaptureSession::new(ScriptedTransport::with_statuses(&["finished"]));

    match session.capture_to_file(&legacy_request(5), &path, true).await {
        Err(WebthumbError::FileWrite { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected FileWrite error, got {:?}", other),
    }
}

#[tokio::test]
async fn capture_to_writer_streams_body() {
    let session = CaptureSession::new(ScriptedTransport::with_statuses(&[]));
    let mut sink: Vec<u8> = Vec::new();

    let result = session
        .capture_to_writer(&legacy_request(5), &mut sink, false)
        .await
        .expect("capture to writer");

    assert_eq!(sink, PNG_BYTES);
    assert_eq!(result.content_type, "image/png");
}
