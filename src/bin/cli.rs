//! AtlasLog CLI Client
//!
//! Command-line interface for interacting with AtlasLog.

use std::io::{self, Read, Write};

use atlaslog::network::Client;
use clap::{Parser, Subcommand};

/// AtlasLog CLI
#[derive(Parser, Debug)]
#[command(name = "atlaslog-cli")]
#[command(about = "CLI for the AtlasLog commit log")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a record and print its offset
    Append {
        /// Record contents, or "-" to read from stdin
        data: String,
    },

    /// Read the record at an offset
    Read {
        /// The offset to read
        offset: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> atlaslog::Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Append { data } => {
            let data = if data == "-" {
                let mut buf = Vec::new();
                io::stdin().read_to_end(&mut buf)?;
                buf
            } else {
                data.into_bytes()
            };
            let offset = client.append(&data)?;
            println!("{}", offset);
        }
        Commands::Read { offset } => {
            let data = client.read(&offset)?;
            let mut stdout = io::stdout();
            stdout.write_all(&data)?;
            stdout.write_all(b"\n")?;
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
