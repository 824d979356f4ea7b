//! Centralized defaults
//!
//! Single source of truth for model ids, endpoints and limits. Settings
//! defaults and the resolver both read from here.

/// Reasoning model identifiers
pub mod models {
    /// Fast model used for clause extraction
    pub const EXTRACTION_DEFAULT: &str = "gemini-3-flash-preview";

    /// Deeper model used for adversarial risk detection
    pub const REASONING_DEFAULT: &str = "gemini-3-pro-preview";
}

pub mod endpoints {
    /// Google Generative Language API
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com";
}

/// Environment variables consulted for the process-default credential, in order
pub mod env {
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const API_KEY: &str = "API_KEY";

    pub const CREDENTIAL_FALLBACKS: [&str; 2] = [GEMINI_API_KEY, API_KEY];
}

pub mod limits {
    /// Characters of document text sent to extraction
    pub const MAX_DOCUMENT_CHARS: usize = 45_000;

    /// Thinking token budget for the risk-detection call
    pub const THINKING_BUDGET: u32 = 15_000;
}

/// Timeouts (seconds)
pub mod timeouts {
    /// HTTP server request timeout
    pub const SERVER_REQUEST_SECS: u64 = 30;

    /// Single reasoning-service request; detection with thinking enabled is slow
    pub const REASONING_REQUEST_SECS: u64 = 180;
}
