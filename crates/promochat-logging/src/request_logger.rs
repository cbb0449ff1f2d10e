use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::safe_truncate;

/// Everything needed to describe one outbound backend request
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    pub backend: &'a str,
    pub url: &'a str,
    pub model: &'a str,
    pub api_key: Option<&'a str>,
    pub body: &'a serde_json::Value,
}

impl RequestLog<'_> {
    fn redacted_key(&self) -> Option<String> {
        self.api_key
            .filter(|k| !k.is_empty())
            .map(|k| format!("{}***", k.chars().take(6).collect::<String>()))
    }

    fn describe_url(&self) -> String {
        match reqwest::Url::parse(self.url) {
            Ok(parsed) => format!(
                "URL: {}\nHost: {}\nPort: {}\nScheme: {}\n",
                self.url,
                parsed.host_str().unwrap_or("unknown"),
                parsed
                    .port_or_known_default()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                parsed.scheme()
            ),
            Err(_) => format!("URL: {}\n", self.url),
        }
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request(request: &RequestLog<'_>, verbose: bool) {
    log::debug!(
        "{} request to {} (model {})",
        request.backend,
        request.url,
        request.model
    );

    if !verbose {
        return;
    }

    eprintln!("\n{}", "═".repeat(80).bright_cyan());
    eprintln!(
        "{}",
        format!("🔍 {} REQUEST", request.backend.to_uppercase())
            .bright_cyan()
            .bold()
    );
    eprintln!("{}", "═".repeat(80).bright_cyan());
    eprint!("{}", request.describe_url());

    if let Some(key) = request.redacted_key() {
        eprintln!("{}: Bearer {}", "Authorization".bright_yellow(), key);
    }

    eprintln!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(request.body) {
        Ok(json) => {
            if json.chars().count() > 5000 {
                eprintln!("{}", safe_truncate(&json, 5000));
                eprintln!(
                    "\n{}",
                    format!("... (truncated, total {} bytes)", json.len()).bright_black()
                );
            } else {
                eprintln!("{}", json);
            }
        }
        Err(e) => eprintln!("{}", format!("Error serializing request: {}", e).red()),
    }

    eprintln!("{}", "═".repeat(80).bright_cyan());
}

/// Log HTTP request to a file in `logs_dir` for persistent debugging.
/// Returns the path of the written file.
pub fn log_request_to_file(request: &RequestLog<'_>, logs_dir: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let model_name = request.model.replace(['/', ':'], "-");
    let file_path = logs_dir.join(format!("req-{}-{}.txt", timestamp, model_name));

    let mut log_content = String::new();
    log_content.push_str(&format!(
        "HTTP REQUEST LOG ({})\n",
        request.backend.to_uppercase()
    ));
    log_content.push_str("========================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", timestamp));
    log_content.push_str(&format!("Model: {}\n\n", request.model));
    log_content.push_str(&request.describe_url());
    log_content.push('\n');

    log_content.push_str("Headers:\n");
    log_content.push_str("  Content-Type: application/json\n");
    if let Some(key) = request.redacted_key() {
        log_content.push_str(&format!("  Authorization: Bearer {}\n", key));
    }

    log_content.push_str("\nRequest Body:\n");
    match serde_json::to_string_pretty(request.body) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => {
            log_content.push_str(&format!("Error serializing request: {}\n", e));
        }
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    log::debug!("Request logged to {}", file_path.display());
    Ok(file_path)
}

/// Log a non-success HTTP response
pub fn log_response_error(backend: &str, status: reqwest::StatusCode, body: &str, verbose: bool) {
    log::warn!(
        "{} returned {}: {}",
        backend,
        status,
        safe_truncate(body, 300)
    );

    if verbose {
        eprintln!(
            "{}",
            format!(
                "📥 {} {} {}",
                backend,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
            .red()
        );
    }
}

/// Log streaming chunk for debugging (console output)
pub fn log_stream_chunk(chunk_num: usize, data: &str, verbose: bool) {
    log::trace!("stream chunk #{} ({} bytes)", chunk_num, data.len());

    if !verbose {
        return;
    }

    eprintln!(
        "{}",
        format!(
            "📦 Stream Chunk #{}: {}",
            chunk_num,
            if data.chars().count() > 200 {
                format!("{} ({} bytes)", safe_truncate(data, 200), data.len())
            } else {
                data.to_string()
            }
        )
        .bright_black()
    );
}
