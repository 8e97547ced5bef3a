//! Delivery server for the persisted feed and audio files.
//!
//! Serves whatever the last pipeline run wrote to disk; it shares nothing
//! with the run loop except the path convention.

use std::fs;

use tiny_http::{Header, Response, Server};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

const FEED_MAX_AGE_SECS: u32 = 300;
const AUDIO_MAX_AGE_SECS: u32 = 86_400;

struct Reply {
    status: u16,
    content_type: &'static str,
    cache_max_age: Option<u32>,
    body: Vec<u8>,
}

impl Reply {
    fn ok(content_type: &'static str, cache_max_age: Option<u32>, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            cache_max_age,
            body,
        }
    }

    fn not_found(message: &str) -> Self {
        Self {
            status: 404,
            content_type: "text/plain",
            cache_max_age: None,
            body: message.as_bytes().to_vec(),
        }
    }
}

/// Blocking request loop. Runs until the process is terminated.
pub fn serve(config: &Config) -> Result<()> {
    let server = Server::http(("0.0.0.0", config.port))
        .map_err(|e| AppError::Server(e.to_string()))?;
    info!("listening on 0.0.0.0:{}", config.port);

    for request in server.incoming_requests() {
        let reply = resolve(request.url(), config);
        let mut response = Response::from_data(reply.body)
            .with_status_code(reply.status)
            .with_header(header("Content-Type", reply.content_type));
        if let Some(max_age) = reply.cache_max_age {
            response = response.with_header(header(
                "Cache-Control",
                &format!("public, must-revalidate, max-age={max_age}"),
            ));
        }

        if let Err(e) = request.respond(response) {
            warn!("failed to respond: {e}");
        }
    }

    Ok(())
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).expect("valid header")
}

fn resolve(url: &str, config: &Config) -> Reply {
    let path = url.split('?').next().unwrap_or(url);

    match path {
        "/" => Reply::ok("text/plain", None, b"Welcome to Bookcast!".to_vec()),
        "/health" => Reply::ok("text/plain", None, b"OK".to_vec()),
        "/rss" => match fs::read(config.feed_path()) {
            Ok(body) => Reply::ok("application/rss+xml", Some(FEED_MAX_AGE_SECS), body),
            Err(_) => Reply::not_found("Feed not found"),
        },
        _ => match path.strip_prefix("/audio/") {
            Some(id) if is_valid_audio_id(id) => match fs::read(config.audio_path(id)) {
                Ok(body) => Reply::ok("audio/mpeg", Some(AUDIO_MAX_AGE_SECS), body),
                Err(_) => Reply::not_found("Audio file not found"),
            },
            Some(_) => Reply::not_found("Audio file not found"),
            None => Reply::not_found("Not found"),
        },
    }
}

// Topic ids are UUIDs; anything else cannot name an audio file and must
// not reach the filesystem.
fn is_valid_audio_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
