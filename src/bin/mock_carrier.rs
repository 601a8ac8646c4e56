//! Mock carrier API server
//!
//! Simulates the DHL tracking endpoint for local runs of the gateway.
//! Answers every request with a canned shipments payload.
//!
//! Behavior:
//! 1. Listens on a configurable port (default 8080)
//! 2. Responds with one shipment carrying the configured status code
//! 3. `--empty` answers with an empty shipment list
//! 4. `--fail` answers 503 (exercise the gateway's failure path)
//!
//! Usage:
//!   cargo run --bin mock_carrier -- --port 8080 --status-code transit

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Parser, Debug)]
#[command(name = "mock_carrier")]
#[command(about = "Mock DHL tracking API for local simulation")]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Status code reported for every shipment
    #[arg(short, long, default_value = "transit")]
    status_code: String,

    /// Answer with an empty shipment list
    #[arg(long)]
    empty: bool,

    /// Answer 503 on every request
    #[arg(long)]
    fail: bool,
}

fn response_body(args: &Args) -> String {
    if args.empty {
        return r#"{"shipments":[]}"#.to_string();
    }

    serde_json::json!({
        "shipments": [{
            "id": "mock",
            "service": "ecommerce",
            "origin": { "address": { "addressLocality": "Leipzig, DE" } },
            "destination": { "address": { "addressLocality": "Reykjavik, IS" } },
            "status": {
                "statusCode": args.status_code,
                "description": format!("mock shipment ({})", args.status_code)
            }
        }]
    })
    .to_string()
}

async fn handle_request(mut socket: TcpStream, status_line: &str, body: &str) {
    let mut buf = [0u8; 2048];
    let _ = socket.read(&mut buf).await;

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (status_line, body) = if args.fail {
        ("503 Service Unavailable".to_string(), r#"{"detail":"mock outage"}"#.to_string())
    } else {
        ("200 OK".to_string(), response_body(&args))
    };

    let listener = TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    println!("mock_carrier listening on port {} (status={})", args.port, status_line);

    loop {
        let (socket, addr) = listener.accept().await?;
        println!("request from {}", addr);

        let status_line = status_line.clone();
        let body = body.clone();
        tokio::spawn(async move {
            handle_request(socket, &status_line, &body).await;
        });
    }
}
