//! gdrive-push CLI - push files to Google Drive with overwrite semantics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gdrive_push::{DriveClient, OauthCredentials};

/// CLI tool for pushing files to Google Drive.
#[derive(Parser)]
#[command(name = "gdrive-push")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OAuth2 client id.
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    client_id: String,

    /// OAuth2 client secret.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// OAuth2 refresh token.
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file, replacing any same-named files in the destination.
    Upload {
        /// Local file to upload.
        file: PathBuf,

        /// MIME type of the file (guessed from the extension if omitted).
        #[arg(long)]
        mime: Option<String>,

        /// Destination folder id (Drive root if omitted).
        #[arg(long)]
        parent: Option<String>,
    },

    /// Search files by title substring.
    Search {
        /// Title substring to match.
        title: String,

        /// Restrict matches to children of this folder id.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Delete every file matching a title substring.
    DeleteAll {
        /// Title substring to match.
        title: String,

        /// Restrict matches to children of this folder id.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Find or create a folder.
    Mkdir {
        /// Folder name.
        name: String,

        /// Parent folder id (Drive root if omitted).
        #[arg(long)]
        parent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let client = DriveClient::new(OauthCredentials {
        client_id: cli.client_id,
        client_secret: cli.client_secret,
        refresh_token: cli.refresh_token,
    });

    match cli.command {
        Commands::Upload { file, mime, parent } => {
            let mime = mime.unwrap_or_else(|| {
                mime_guess::from_path(&file)
                    .first_or_octet_stream()
                    .to_string()
            });

            let uploaded = client
                .upload(&file, &mime, parent.as_deref())
                .await
                .with_context(|| format!("Failed to upload {:?}", file))?;

            println!("Uploaded {} ({})", uploaded.title, uploaded.id);
        }

        Commands::Search { title, parent } => {
            let files = client
                .search(&title, parent.as_deref())
                .await
                .with_context(|| format!("Failed to search for {:?}", title))?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {:>10} {:<30} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(100));
                for file in files {
                    println!("{}", file);
                }
            }
        }

        Commands::DeleteAll { title, parent } => {
            let removed = client
                .delete_all(&title, parent.as_deref())
                .await
                .with_context(|| format!("Failed to delete files matching {:?}", title))?;

            if removed.is_empty() {
                println!("Nothing to delete.");
            } else {
                println!("Deleted {} file(s):", removed.len());
                for file in removed {
                    println!("  {} ({})", file.title, file.id);
                }
            }
        }

        Commands::Mkdir { name, parent } => {
            let folder = client
                .create_folder(&name, parent.as_deref())
                .await
                .with_context(|| format!("Failed to create folder {:?}", name))?;

            println!("Folder {} ({})", folder.title, folder.id);
        }
    }

    Ok(())
}
