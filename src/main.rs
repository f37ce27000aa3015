//! photos_audit CLI - list local media files missing from Google Photos.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Input;
use tracing_subscriber::EnvFilter;

use photos_audit::config::{
    DEFAULT_CLIENT_SECRETS_FILE, DEFAULT_PAGE_SIZE, DEFAULT_TOKEN_CACHE_FILE, PHOTOS_API_BASE,
};
use photos_audit::{
    enumerate_filenames, run_audit, validate_directory, AuditConfig, AuditError, Authenticator,
    MediaKinds, PhotosClient,
};

/// Find local photos and videos that are not in your Google Photos library.
#[derive(Parser)]
#[command(name = "photos_audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Local folder to check. Prompted for when omitted.
    folder: Option<PathBuf>,

    /// Path to the OAuth client JSON downloaded from the Google Cloud console.
    #[arg(long, env = "PHOTOS_AUDIT_CLIENT_SECRETS", default_value = DEFAULT_CLIENT_SECRETS_FILE)]
    client_secrets: PathBuf,

    /// Where access and refresh tokens are cached between runs.
    #[arg(long, env = "PHOTOS_AUDIT_TOKEN_CACHE", default_value = DEFAULT_TOKEN_CACHE_FILE)]
    token_cache: PathBuf,

    /// Only consider photo formats, not videos.
    #[arg(long)]
    photos_only: bool,

    /// Report file (defaults to media_not_in_google_photos.txt or photos_not_in_google_photos.txt).
    #[arg(long, short = 'o', env = "PHOTOS_AUDIT_OUTPUT")]
    output: Option<PathBuf>,

    /// Items requested per page from the Library API (1-100).
    #[arg(long, env = "PHOTOS_AUDIT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Library API base URL.
    #[arg(long, env = "PHOTOS_AUDIT_API_BASE", default_value = PHOTOS_API_BASE, hide = true)]
    api_base: String,

    /// Print the authorization URL without launching a browser.
    #[arg(long)]
    no_browser: bool,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> (AuditConfig, Option<PathBuf>) {
        let media_kinds = if self.photos_only {
            MediaKinds::PhotosOnly
        } else {
            MediaKinds::PhotosAndVideos
        };
        let mut config = AuditConfig::for_media_kinds(media_kinds);
        config.client_secrets_path = self.client_secrets;
        config.token_cache_path = self.token_cache;
        config.page_size = self.page_size;
        config.api_base = self.api_base;
        config.open_browser = !self.no_browser;
        if let Some(output) = self.output {
            config.report_path = output;
        }
        (config, self.folder)
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "photos_audit=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, folder) = cli.into_config();
    config.validate()?;

    let auth = Authenticator::from_config(&config).with_context(|| {
        format!(
            "Failed to load OAuth client from {:?}",
            config.client_secrets_path
        )
    })?;
    // Authorize up front so a missing or revoked credential fails before any listing.
    auth.get_access_token()
        .await
        .context("Could not authorize with Google Photos")?;
    let client = PhotosClient::from_config(auth, &config);

    println!("Fetching list of media from Google Photos... (This may take a while for large libraries)");
    let remote = enumerate_filenames(&client, config.page_size).await;
    println!(
        "Found {} media items in Google Photos.",
        remote.filenames().len()
    );
    if remote.is_truncated() {
        println!(
            "Warning: listing stopped after {} page(s) because of an error; results are partial.",
            remote.pages()
        );
    }

    let folder = match folder {
        Some(folder) => folder,
        None => {
            let input: String = Input::new()
                .with_prompt("Enter the full path to the folder you want to check")
                .interact_text()
                .context("Failed to read folder path")?;
            PathBuf::from(input)
        }
    };

    let folder = match validate_directory(&folder) {
        Err(AuditError::InvalidDirectory(path)) => {
            anyhow::bail!("The provided path is not a valid directory: {}", path.display())
        }
        other => other?,
    };

    match config.media_kinds {
        MediaKinds::PhotosOnly => println!("Scanning local folder for photos..."),
        MediaKinds::PhotosAndVideos => println!("Scanning local folder for photos and videos..."),
    }
    let summary = run_audit(&config, &remote, &folder).context("Failed to audit local folder")?;

    println!("\nFinished!");
    for line in summary.summary_lines(config.media_kinds) {
        println!("{}", line);
    }

    Ok(())
}
