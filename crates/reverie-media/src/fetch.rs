//! Validated asset download.
//!
//! Assets are probed with a HEAD request before any body transfer so a
//! declared oversize resource is rejected without pulling bytes. The body
//! is then streamed to disk; a failed or oversize transfer never leaves a
//! partial file behind for the caller to mistake for a valid asset.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Fail if a declared size exceeds the configured maximum.
///
/// A missing declaration passes the gate; the streaming cap in [`fetch`]
/// still bounds the transfer in that case.
fn check_declared_size(url: &str, declared: Option<u64>, max_bytes: u64) -> MediaResult<()> {
    match declared {
        Some(len) if len > max_bytes => Err(MediaError::TooLarge {
            url: url.to_string(),
            declared_bytes: len,
            max_bytes,
        }),
        _ => Ok(()),
    }
}

/// Download one asset to `dest`, validating availability and size first.
///
/// Validation order:
/// 1. HEAD probe; unreachable or non-success status fails with `NotFound`
///    before any body is requested.
/// 2. Declared `Content-Length` above `max_bytes` fails with `TooLarge`
///    with zero body bytes written.
/// 3. The body is streamed to `dest`; stream or disk errors fail with
///    `TransferFailed`, and bytes received beyond `max_bytes` fail with
///    `TooLarge`. In both cases the partial file is removed.
///
/// No internal retry; retry policy belongs to the caller.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    dest: impl AsRef<Path>,
    max_bytes: u64,
) -> MediaResult<()> {
    let dest = dest.as_ref();

    let head = client
        .head(url)
        .send()
        .await
        .map_err(|e| MediaError::not_found(url, e.to_string()))?;
    if !head.status().is_success() {
        return Err(MediaError::not_found(url, head.status().to_string()));
    }

    check_declared_size(url, head.content_length(), max_bytes)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::transfer_failed(url, e.to_string()))?;
    if !response.status().is_success() {
        return Err(MediaError::transfer_failed(
            url,
            format!("download returned status {}", response.status()),
        ));
    }

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                discard_partial(dest).await;
                return Err(MediaError::transfer_failed(url, e.to_string()));
            }
        };

        written += chunk.len() as u64;
        if written > max_bytes {
            // Server omitted or understated Content-Length.
            discard_partial(dest).await;
            return Err(MediaError::TooLarge {
                url: url.to_string(),
                declared_bytes: written,
                max_bytes,
            });
        }

        if let Err(e) = file.write_all(&chunk).await {
            discard_partial(dest).await;
            return Err(MediaError::transfer_failed(url, e.to_string()));
        }
    }

    if let Err(e) = file.flush().await {
        discard_partial(dest).await;
        return Err(MediaError::transfer_failed(url, e.to_string()));
    }
    drop(file);

    info!(url = %url, dest = %dest.display(), bytes = written, "Fetched asset");
    Ok(())
}

/// Remove a partially written file, logging rather than masking the
/// original failure if removal itself fails.
async fn discard_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(dest = %dest.display(), "Removed partial download"),
        Err(e) => warn!(dest = %dest.display(), "Failed to remove partial download: {}", e),
    }
}
