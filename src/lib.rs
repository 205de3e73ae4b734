//! gdrive_push - a thin facade over the Google Drive v2 API.
//!
//! This library provides functionality to:
//! - Upload files with overwrite semantics (same-titled files are deleted
//!   before the new content is inserted)
//! - Search files by title, transparently paging through all results
//! - Delete every file matching a title, sequentially
//! - Find or create folders
//!
//! Authentication uses the OAuth2 refresh-token grant; the access token is
//! fetched once per client and reused across calls.
//!
//! # Example
//!
//! ```no_run
//! use gdrive_push::{DriveClient, OauthCredentials};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DriveClient::new(OauthCredentials {
//!         client_id: "client-id".to_string(),
//!         client_secret: "client-secret".to_string(),
//!         refresh_token: "refresh-token".to_string(),
//!     });
//!
//!     let uploaded = client.upload("notes.txt", "text/plain", None).await?;
//!     println!("uploaded as {}", uploaded.id);
//!
//!     for file in client.search("notes", None).await? {
//!         println!("{}", file);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

// Re-exports for convenience
pub use auth::{Authenticator, Credential};
pub use client::{DriveClient, FOLDER_MIME_TYPE};
pub use error::{DriveError, Result};
pub use models::{FileResource, FileSummary, OauthCredentials};
