//! Scripted HTTP exchanges against the gateway client.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{Receiver, channel};
use std::thread;
use std::time::Duration;

use medisynth::gateway::api::{ApiError, FilePart, MedicalApi};
use medisynth::gateway::auth_events;

/// Serve one canned response and hand back the raw request bytes.
fn serve_once(response: String) -> (String, Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = channel();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = stream.set_read_timeout(Some(Duration::from_millis(200)));
            let mut request = Vec::new();
            let mut buf = [0u8; 8192];
            while let Ok(read) = stream.read(&mut buf) {
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let _ = request_tx.send(request);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (format!("http://{addr}/api/v1"), request_rx)
}

fn json_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

fn received(request_rx: &Receiver<Vec<u8>>) -> String {
    let bytes = request_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("server saw no request");
    String::from_utf8_lossy(&bytes).into_owned()
}

#[test]
fn login_posts_form_credentials_and_parses_token() {
    let body = r#"{"access_token":"tok_research_1","token_type":"bearer"}"#;
    let (base, request_rx) = serve_once(json_response("200 OK", body));
    let api = MedicalApi::new(&base).unwrap();

    let response = api.login("researcher", "hunter&2").unwrap();
    assert_eq!(response.access_token, "tok_research_1");
    assert_eq!(response.token_type, "bearer");

    let request = received(&request_rx);
    assert!(request.starts_with("POST /api/v1/auth/login"));
    assert!(request.contains("username=researcher"));
    assert!(request.contains("password=hunter%262"));
}

#[test]
fn bearer_token_is_attached_once_set() {
    let body = r#"{"total_samples_generated":10,"active_models":1,"compute_usage_hours":2.5,"accuracy_metrics":{}}"#;
    let (base, request_rx) = serve_once(json_response("200 OK", body));
    let api = MedicalApi::new(&base).unwrap();
    api.set_auth_token(Some("tok_research_1".to_string()));

    let analytics = api.get_analytics().unwrap();
    assert_eq!(analytics.total_samples_generated, 10);
    assert!(analytics.privacy_metrics.is_none());

    let request = received(&request_rx);
    assert!(request.starts_with("GET /api/v1/analytics"));
    assert!(request.contains("Authorization: Bearer tok_research_1"));
}

#[test]
fn unauthorized_response_raises_exactly_one_hub_notification() {
    let hub = auth_events::subscribe();
    let body = r#"{"detail":"Not authenticated"}"#;
    let (base, _request_rx) = serve_once(json_response("401 Unauthorized", body));
    let api = MedicalApi::new(&base).unwrap();

    let error = api.get_analytics().unwrap_err();
    assert!(matches!(error, ApiError::Unauthorized));
    assert_eq!(
        hub.recv_timeout(Duration::from_secs(5)),
        Ok(auth_events::Unauthorized)
    );
    assert!(hub.try_recv().is_err());
}

#[test]
fn server_detail_surfaces_in_error_variants() {
    let body = r#"{"detail":"GAN simulator offline"}"#;
    let (base, _request_rx) = serve_once(json_response("500 Internal Server Error", body));
    let api = MedicalApi::new(&base).unwrap();

    match api.get_analytics().unwrap_err() {
        ApiError::ServerError(detail) => assert_eq!(detail, "GAN simulator offline"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn upload_sends_multipart_files_field() {
    let body = r#"{"task_id":"t-1","status":"queued","message":"Processing 2 files"}"#;
    let (base, request_rx) = serve_once(json_response("200 OK", body));
    let api = MedicalApi::new(&base).unwrap();

    let files = vec![
        FilePart {
            file_name: "scan_001.dcm".to_string(),
            content_type: "application/dicom".to_string(),
            bytes: b"DICM".to_vec(),
        },
        FilePart {
            file_name: "scan_002.dcm".to_string(),
            content_type: "application/dicom".to_string(),
            bytes: b"DICM".to_vec(),
        },
    ];
    let response = api.upload_dataset(&files).unwrap();
    assert_eq!(response.task_id, "t-1");
    assert_eq!(response.status, "queued");

    let request = received(&request_rx);
    assert!(request.starts_with("POST /api/v1/upload"));
    assert!(request.contains("multipart/form-data; boundary=medisynth-"));
    assert!(request.contains("name=\"files\"; filename=\"scan_001.dcm\""));
    assert!(request.contains("name=\"files\"; filename=\"scan_002.dcm\""));
}

#[test]
fn health_probe_hits_the_server_root() {
    let body = r#"{"status":"healthy","environment":"development"}"#;
    let (base, request_rx) = serve_once(json_response("200 OK", body));
    let api = MedicalApi::new(&base).unwrap();

    let health = api.get_health().unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.environment.as_deref(), Some("development"));

    let request = received(&request_rx);
    assert!(request.starts_with("GET /health"));
}
