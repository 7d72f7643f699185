use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use line_lookup::protocol::{Outcome, Request};
use line_lookup::security::limits::MAX_PAYLOAD_SIZE;

#[derive(Parser)]
#[command(name = "lookup-cli")]
#[command(about = "Send one query to a line-lookup server", long_about = None)]
struct Cli {
    /// Server address.
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    addr: String,

    /// File to search, as seen by the server.
    #[arg(short, long)]
    path: String,

    /// Seconds to wait for the response.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// String to look for. Prompted for when omitted.
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let query = match cli.query {
        Some(q) => q,
        None => prompt("Enter the sample query: ")?,
    };
    let request = Request {
        target_path: cli.path,
        query,
    };
    let frame = request.encode();
    if frame.len() > MAX_PAYLOAD_SIZE {
        return Err(format!("request is {} bytes, limit is {}", frame.len(), MAX_PAYLOAD_SIZE).into());
    }

    let mut stream = TcpStream::connect(&cli.addr).await?;
    stream.write_all(frame.as_bytes()).await?;

    let mut response = Vec::new();
    tokio::time::timeout(
        Duration::from_secs(cli.timeout),
        stream.read_to_end(&mut response),
    )
    .await??;

    let text = String::from_utf8_lossy(&response);
    println!("Server response: {}", text);
    match Outcome::from_response(&text) {
        Some(Outcome::Found | Outcome::NotFound) => Ok(()),
        Some(outcome) => Err(format!("request refused ({outcome})").into()),
        None => Err("unrecognised response from server".into()),
    }
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
