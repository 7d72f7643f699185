//! End-to-end protocol tests over real TCP connections.

use std::time::Duration;

use line_lookup::observability::AuditRecord;
use line_lookup::protocol::Outcome;

mod common;

#[tokio::test]
async fn test_round_trip_responses() {
    let server = common::start_server("hello world", false, "").await;
    let path = server.path();

    assert_eq!(common::query(server.addr(), &path, "hello").await, "STRING EXISTS");
    assert_eq!(common::query(server.addr(), &path, "xyz").await, "STRING NOT FOUND");
    assert_eq!(
        common::query(server.addr(), "/etc/passwd", "root").await,
        "INVALID FILE PATH"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_legacy_client_key() {
    let server = common::start_server("hello world", false, "").await;
    let frame = format!("linuxpath={}&string=world", server.path());

    assert_eq!(
        common::send_raw(server.addr(), frame.as_bytes()).await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_malformed_then_valid() {
    let server = common::start_server("hello world", false, "").await;

    assert_eq!(common::send_raw(server.addr(), b"garbage").await, "Invalid request");
    assert_eq!(
        common::send_raw(server.addr(), b"allowedRootPath=/x&query=y").await,
        "Invalid request"
    );
    assert_eq!(
        common::query(server.addr(), &server.path(), "hello").await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_oversized_frame_is_rejected_not_truncated() {
    // The first 1024 bytes alone would match the file.
    let content = format!("hello{}", " ".repeat(1024));
    let server = common::start_server(&content, false, "").await;

    let mut frame = format!("allowedRootPath={}&string=hello", server.path()).into_bytes();
    while frame.len() < 1024 {
        frame.push(b' ');
    }
    frame.extend_from_slice(b"ZZZ");
    assert!(frame.len() > 1024);

    assert_eq!(common::send_raw(server.addr(), &frame).await, "Invalid request");
    assert_eq!(
        common::send_raw(server.addr(), &frame[..1024]).await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_identical_requests_are_idempotent() {
    let server = common::start_server("hello world", true, "").await;
    let path = server.path();

    let first = common::query(server.addr(), &path, "o w").await;
    let second = common::query(server.addr(), &path, "o w").await;
    assert_eq!(first, second);

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_fresh_read_observes_writes() {
    let server = common::start_server("hello world", true, "").await;
    let path = server.path();

    assert_eq!(common::query(server.addr(), &path, "updated").await, "STRING NOT FOUND");
    tokio::fs::write(&server.data_file, "updated content").await.unwrap();
    assert_eq!(common::query(server.addr(), &path, "updated").await, "STRING EXISTS");

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_cached_ignores_writes() {
    let server = common::start_server("hello world", false, "").await;
    let path = server.path();

    assert_eq!(common::query(server.addr(), &path, "updated").await, "STRING NOT FOUND");
    tokio::fs::write(&server.data_file, "updated content").await.unwrap();
    assert_eq!(common::query(server.addr(), &path, "updated").await, "STRING NOT FOUND");
    assert_eq!(common::query(server.addr(), &path, "hello").await, "STRING EXISTS");

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_deleted_file_reads_as_not_found() {
    let server = common::start_server("hello world", true, "").await;
    tokio::fs::remove_file(&server.data_file).await.unwrap();

    assert_eq!(
        common::query(server.addr(), &server.path(), "hello").await,
        "STRING NOT FOUND"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_audit_record_for_every_outcome() {
    let dir = tempfile::TempDir::new().unwrap();
    let audit = common::audit_path(dir.path());
    let server =
        common::start_server("hello world", false, &format!("audit_log={}\n", audit.display()))
            .await;
    let path = server.path();

    common::query(server.addr(), &path, "hello").await;
    common::query(server.addr(), &path, "absent").await;
    common::query(server.addr(), "/etc/passwd", "root").await;
    common::send_raw(server.addr(), b"garbage").await;
    server.running.shutdown().await;

    let content = tokio::fs::read_to_string(&audit).await.unwrap();
    let mut outcomes: Vec<Outcome> = content
        .lines()
        .map(|l| serde_json::from_str::<AuditRecord>(l).unwrap().outcome)
        .collect();
    outcomes.sort_by_key(|o| o.as_str());

    assert_eq!(
        outcomes,
        vec![
            Outcome::Found,
            Outcome::Malformed,
            Outcome::NotFound,
            Outcome::PathNotAllowed,
        ]
    );
}

#[tokio::test]
async fn test_silent_client_is_dropped() {
    let server = common::start_server("hello world", false, "read_timeout_ms=100\n").await;

    let mut silent = tokio::net::TcpStream::connect(server.addr()).await.unwrap();
    let mut buf = Vec::new();
    let read = tokio::time::timeout(
        Duration::from_secs(5),
        tokio::io::AsyncReadExt::read_to_end(&mut silent, &mut buf),
    )
    .await
    .expect("server kept a silent client open");
    assert!(read.is_ok());
    assert!(buf.is_empty());

    assert_eq!(
        common::query(server.addr(), &server.path(), "hello").await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;
}
