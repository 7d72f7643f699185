//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use line_lookup::config::loader::{parse_key_values, resolve};
use line_lookup::lifecycle::{start, Running};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// A running server over a temporary data file.
pub struct TestServer {
    pub running: Running,
    pub data_file: PathBuf,
    pub dir: TempDir,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.running.local_addr()
    }

    /// The data file path as a client would send it.
    pub fn path(&self) -> String {
        self.data_file.display().to_string()
    }
}

/// Start a server whose root is a file holding `content`.
///
/// `extra` is appended to the generated key=value config.
pub async fn start_server(content: &str, reread_on_query: bool, extra: &str) -> TestServer {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("sample.txt");
    tokio::fs::write(&data_file, content).await.unwrap();

    let text = format!(
        "linuxpath={}\nrereadOnQuery={}\nbind_address=127.0.0.1:0\n{}",
        data_file.display(),
        reread_on_query,
        extra
    );
    let config = resolve(parse_key_values(&text).unwrap()).await.unwrap();
    let running = start(config).await.unwrap();

    TestServer {
        running,
        data_file,
        dir,
    }
}

/// Send one raw frame and read the full response.
pub async fn send_raw(addr: SocketAddr, frame: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(frame).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not answer in time")
        .unwrap();
    String::from_utf8(response).unwrap()
}

/// Send a well-formed query for `path`.
pub async fn query(addr: SocketAddr, path: &str, needle: &str) -> String {
    send_raw(addr, format!("allowedRootPath={path}&string={needle}").as_bytes()).await
}

pub fn audit_path(dir: &Path) -> PathBuf {
    dir.join("audit.jsonl")
}
