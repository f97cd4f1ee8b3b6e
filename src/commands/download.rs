//! HTTP download command.
//!
//! Streamed GET with a bounded retry on transient upstream errors. Progress
//! is surfaced through `tracing` at debug level; never journaled.

use crate::commands::{readable_size, CommandOutcome};
use crate::config::DownloadConfig;
use anyhow::Context as _;
use std::io::{Read as _, Write as _};
use std::path::Path;
use tracing::debug;

const RETRYABLE_STATUS: [u16; 3] = [502, 503, 504];
const CHUNK_SIZE: usize = 8192;

/// Download `url` to `dest`.
///
/// Honors `config.allow`; retries up to `config.retries` times with linear
/// backoff on 502/503/504. Other HTTP failures surface immediately.
pub fn download_file(config: &DownloadConfig, url: &str, dest: &str) -> CommandOutcome {
    if !config.allow {
        return CommandOutcome::Failed(
            "Downloads are not enabled for this workspace.".to_string(),
        );
    }
    match fetch(url, dest, config.retries) {
        Ok(bytes) => CommandOutcome::Applied(format!(
            "Successfully downloaded and locally stored file: '{}' (Size: {})",
            dest,
            readable_size(bytes)
        )),
        Err(err) => CommandOutcome::Failed(format!("Failed to download {}: {:#}", url, err)),
    }
}

fn fetch(url: &str, dest: &str, retries: u32) -> anyhow::Result<u64> {
    let target = Path::new(dest);
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let client = reqwest::blocking::Client::new();
    let mut attempt = 0u32;
    let mut response = loop {
        let response = client.get(url).send().context("request failed")?;
        let status = response.status();
        if RETRYABLE_STATUS.contains(&status.as_u16()) && attempt < retries {
            attempt += 1;
            debug!(url, status = status.as_u16(), attempt, "retrying transient upstream error");
            std::thread::sleep(std::time::Duration::from_secs(u64::from(attempt)));
            continue;
        }
        break response.error_for_status()?;
    };

    let total = response.content_length().unwrap_or(0);
    let mut file =
        std::fs::File::create(target).with_context(|| format!("failed to create {}", dest))?;
    let mut downloaded = 0u64;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = response.read(&mut buf).context("read failed mid-stream")?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read])?;
        downloaded += read as u64;
        debug!(
            url,
            progress = %format!("{} / {}", readable_size(downloaded), readable_size(total)),
            "downloading"
        );
    }
    Ok(downloaded)
}
