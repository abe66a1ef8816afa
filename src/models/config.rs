use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_VAR: &str = "API_KEY";
pub const DEFAULT_GALLERY_BASE_URL: &str = "http://localhost:5173";
pub const DEFAULT_CONTEXT: &str = "виртуальная примерка";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub allowed_origins: Vec<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub api_key_var: String,
    pub max_body_bytes: u64,
    pub upstream_timeout_secs: u64,
    pub gallery_base_url: String,
    pub context: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
            max_body_bytes: 26_214_400,
            upstream_timeout_secs: 120,
            gallery_base_url: DEFAULT_GALLERY_BASE_URL.to_string(),
            context: DEFAULT_CONTEXT.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.allowed_origins),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            api_key_var: env::var("API_KEY_VAR").unwrap_or(defaults.api_key_var),
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
            gallery_base_url: env::var("GALLERY_BASE_URL").unwrap_or(defaults.gallery_base_url),
            context: env::var("TRYON_CONTEXT").unwrap_or(defaults.context),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Credential source backed by the configured environment variable.
    pub fn credentials(&self) -> Credentials {
        Credentials::Env(self.api_key_var.clone())
    }
}

/// Where the server-held model credential comes from.
///
/// Resolved on every call, so a key added to the environment of a running
/// process is picked up by the next request.
#[derive(Debug, Clone)]
pub enum Credentials {
    Env(String),
    Static(Option<String>),
}

impl Credentials {
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            Credentials::Env(var) => env::var(var).ok(),
            Credentials::Static(value) => value.clone(),
        };
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
}

/// Settings for the client side: where the proxy lives and where gallery
/// images are served from.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub gallery_base_url: String,
    pub context: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost:8080/api/generate".to_string(),
            gallery_base_url: DEFAULT_GALLERY_BASE_URL.to_string(),
            context: DEFAULT_CONTEXT.to_string(),
            timeout_secs: 180,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            proxy_url: env::var("TRYON_PROXY_URL").unwrap_or(defaults.proxy_url),
            gallery_base_url: env::var("GALLERY_BASE_URL").unwrap_or(defaults.gallery_base_url),
            context: env::var("TRYON_CONTEXT").unwrap_or(defaults.context),
            timeout_secs: env::var("TRYON_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}
