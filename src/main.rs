use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use biolens::models;
use biolens::session::{ChatSession, Sender};
use biolens::upload::{UploadClient, UploadInput};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start an interactive analysis chat session.
    Chat,
    /// Upload a single file and print its stored URL.
    Upload {
        /// Path to the image or data file to upload.
        path: PathBuf,
    },
    /// List the available analysis models.
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for BIOLENS_BACKEND_URL and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,biolens=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat => {
            info!("Starting interactive chat session...");
            run_chat().await.context("Chat session failed")?;
        }
        Commands::Upload { path } => {
            let client = UploadClient::from_env();
            info!(backend = client.base_url(), "Uploading {}", path.display());
            let input = UploadInput::from_path(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match client.upload(input).await {
                Ok(uploaded) => {
                    println!("{}", uploaded.url);
                    if let Some(mime) = uploaded.mime_type {
                        println!("mime type: {mime}");
                    }
                }
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Models => {
            for card in models::CATALOG {
                println!("{card}\n");
            }
        }
    }

    Ok(())
}

async fn run_chat() -> Result<()> {
    let mut session = ChatSession::from_env();
    println!("biolens chat. Commands: /image <path>, /data <path>, /search <query>, /models, /quit");
    println!("Anything else is sent as a chat message.");

    let stdin = io::stdin();
    // Index of the first transcript entry not yet printed.
    let mut printed = 0;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "/quit" || line == "/exit" {
            break;
        } else if line == "/models" {
            for card in models::CATALOG {
                println!("{card}\n");
            }
            continue;
        } else if let Some(path) = line.strip_prefix("/image ") {
            match UploadInput::from_path(Path::new(path.trim())) {
                Ok(input) => session.upload_image(input).await,
                Err(err) => {
                    eprintln!("Could not read {}: {err}", path.trim());
                    continue;
                }
            }
        } else if let Some(path) = line.strip_prefix("/data ") {
            match UploadInput::from_path(Path::new(path.trim())) {
                Ok(input) => session.upload_data(input).await,
                Err(err) => {
                    eprintln!("Could not read {}: {err}", path.trim());
                    continue;
                }
            }
        } else if let Some(query) = line.strip_prefix("/search ") {
            session.search(query.trim()).await;
            println!("search sent");
            continue;
        } else {
            session.send_message(line).await;
        }

        if let Some(err) = session.last_error.take() {
            eprintln!("{err}");
        }
        for message in &session.messages[printed..] {
            let who = match message.sender {
                Sender::User => "you",
                Sender::Assistant => "assistant",
            };
            println!("[{}] {}: {}", message.timestamp, who, message.text);
        }
        printed = session.messages.len();
    }

    Ok(())
}
