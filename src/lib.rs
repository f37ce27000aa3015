//! photos_audit - find local photos and videos that are not in Google Photos.
//!
//! This library provides functionality to:
//! - Authenticate against the Google Photos Library API (cached token or browser flow)
//! - Enumerate every filename stored in the remote library
//! - Scan a local folder for media files and report those with no same-named remote item
//!
//! # Example
//!
//! ```no_run
//! use photos_audit::{enumerate_filenames, run_audit, AuditConfig, Authenticator, PhotosClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AuditConfig::default();
//!     let auth = Authenticator::from_config(&config)?;
//!     let client = PhotosClient::from_config(auth, &config);
//!
//!     let remote = enumerate_filenames(&client, config.page_size).await;
//!     let summary = run_audit(&config, &remote, "/home/me/Pictures")?;
//!     println!("{} files missing", summary.missing.len());
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod auth;
pub mod client;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod models;
pub mod oauth;
pub mod reconcile;
pub mod scanner;
pub mod token_store;

// Re-exports for convenience
pub use audit::{run_audit, validate_directory, AuditSummary};
pub use auth::{Authenticator, CachedFileSource, CredentialSource, InteractiveFlowSource};
pub use client::{MediaItemSource, PhotosClient};
pub use config::{AuditConfig, MediaKinds};
pub use enumerator::{enumerate_filenames, Enumeration, RemoteFilenameSet};
pub use error::{AuditError, Result};
pub use reconcile::{find_missing, write_report, MissingList};
pub use scanner::{scan_directory, LocalFileEntry, SupportedExtensions};
