//! Concurrency and admission tests.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_queries_get_their_own_answers() {
    // Only even markers are present: [0][2][4]...
    let content: String = (0..50).step_by(2).map(|i| format!("[{i}]")).collect();
    let server = common::start_server(&content, false, "").await;
    let addr = server.addr();
    let path = server.path();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..50 {
        let path = path.clone();
        tasks.spawn(async move {
            let response = common::query(addr, &path, &format!("[{i}]")).await;
            (i, response)
        });
    }

    let mut answered = 0;
    while let Some(result) = tasks.join_next().await {
        let (i, response) = result.unwrap();
        let expected = if i % 2 == 0 { "STRING EXISTS" } else { "STRING NOT FOUND" };
        assert_eq!(response, expected, "query [{i}] got the wrong answer");
        answered += 1;
    }
    assert_eq!(answered, 50);

    server.running.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_small_pool_still_serves_burst() {
    let server = common::start_server("hello world", true, "workers=2\nbacklog=4\n").await;
    let addr = server.addr();
    let path = server.path();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..20 {
        let path = path.clone();
        tasks.spawn(async move { common::query(addr, &path, "world").await });
    }
    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap(), "STRING EXISTS");
    }

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_reject_policy_closes_overflow_only() {
    let server = common::start_server(
        "hello world",
        false,
        "workers=1\nbacklog=1\noverflow=reject\nread_timeout_ms=3000\n",
    )
    .await;
    let addr = server.addr();

    // Occupies the only worker.
    let busy = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    // Fills the only queue slot.
    let queued = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut rejected = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(1), rejected.read_to_end(&mut buf))
        .await
        .expect("overflow connection was not closed")
        .unwrap();
    assert!(buf.is_empty());

    drop(busy);
    drop(queued);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        common::query(addr, &server.path(), "hello").await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = common::start_server("hello world", false, "").await;
    let addr = server.addr();
    assert_eq!(
        common::query(addr, &server.path(), "hello").await,
        "STRING EXISTS"
    );

    server.running.shutdown().await;

    assert!(TcpStream::connect(addr).await.is_err());
}
