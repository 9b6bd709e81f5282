// Project-wide constants
//
// Centralised here so addresses, route paths and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default bind address for the gateway server (localhost only).
pub const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:3000";

/// Default base URL of the external analysis service.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Environment variable that overrides the analysis service base URL.
pub const BACKEND_URL_ENV: &str = "PYTHON_API_URL";

/// Environment variable that overrides the gateway bind address.
pub const BIND_ADDR_ENV: &str = "DECK_DEBATER_BIND";

/// Credential the analysis service needs. Only its presence is ever reported.
pub const DEFAULT_CREDENTIAL_ENV: &str = "ANTHROPIC_API_KEY";

/// Largest deck upload accepted by the gateway (50MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Deck type hint sent with analyze requests when the upload did not classify the deck.
pub const DEFAULT_DECK_TYPE: &str = "AI/ML Platform";

/// MIME type of `.pptx` presentations.
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Gateway route paths (what the browser calls).
pub mod routes {
    pub const UPLOAD: &str = "/api/python/upload";
    pub const ANALYZE: &str = "/api/python/analyze";
    pub const PERSONAS: &str = "/api/python/personas";
    pub const TTS: &str = "/api/python/tts";
    pub const HEALTH: &str = "/api/python/health";
    pub const CHECK_API_KEY: &str = "/api/check-api-key";
}
