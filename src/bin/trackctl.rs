//! Control utility for the running tracking gateway
//!
//! Sends a single register/unregister command to the gateway's command
//! socket.
//!
//! Usage:
//!   trackctl register 00340434292135100186
//!   trackctl --addr 127.0.0.1:25840 unregister 00340434292135100186

use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(name = "trackctl")]
#[command(about = "Send register/unregister commands to a running dhl-tracker")]
struct Args {
    /// Command socket address of the gateway
    #[arg(short, long, default_value = "127.0.0.1:25840")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start tracking a package
    Register {
        /// DHL tracking number
        package_id: String,
    },
    /// Stop tracking a package
    Unregister {
        /// DHL tracking number
        package_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let line = match &args.command {
        Command::Register { package_id } => format!("register {}\n", package_id),
        Command::Unregister { package_id } => format!("unregister {}\n", package_id),
    };

    let mut stream = TcpStream::connect(&args.addr).await.map_err(|e| {
        format!("failed to connect to {} (is dhl-tracker running?): {}", args.addr, e)
    })?;

    stream.write_all(line.as_bytes()).await?;
    stream.shutdown().await?;

    println!("sent: {}", line.trim());
    Ok(())
}
