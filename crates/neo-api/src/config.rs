//! API configuration.

/// How analyze-video hands jobs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Run the job on this process's runtime
    Inline,
    /// Enqueue on the Redis stream for `neo-worker`
    Queue,
}

impl DispatchMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Some(Self::Inline),
            "queue" => Some(Self::Queue),
            _ => None,
        }
    }
}

/// Which cache implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    /// In-process map; state is lost on restart
    Memory,
}

impl CacheBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    pub dispatch: DispatchMode,
    pub cache_backend: CacheBackend,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 20,
            max_body_size: 10 * 1024 * 1024, // 10MB
            dispatch: DispatchMode::Inline,
            cache_backend: CacheBackend::Redis,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            dispatch: std::env::var("ANALYSIS_DISPATCH")
                .ok()
                .and_then(|s| DispatchMode::parse(&s))
                .unwrap_or(defaults.dispatch),
            cache_backend: std::env::var("CACHE_BACKEND")
                .ok()
                .and_then(|s| CacheBackend::parse(&s))
                .unwrap_or(defaults.cache_backend),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn dispatch_and_cache_backend_from_env() {
        std::env::set_var("ANALYSIS_DISPATCH", "Queue");
        std::env::set_var("CACHE_BACKEND", "memory");
        let config = ApiConfig::from_env();
        assert_eq!(config.dispatch, DispatchMode::Queue);
        assert_eq!(config.cache_backend, CacheBackend::Memory);

        std::env::set_var("ANALYSIS_DISPATCH", "carrier-pigeon");
        assert_eq!(ApiConfig::from_env().dispatch, DispatchMode::Inline);

        std::env::remove_var("ANALYSIS_DISPATCH");
        std::env::remove_var("CACHE_BACKEND");
    }

    #[test]
    #[serial]
    fn cors_origins_are_split_and_trimmed() {
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        assert_eq!(
            ApiConfig::from_env().cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        std::env::remove_var("CORS_ORIGINS");
    }
}
