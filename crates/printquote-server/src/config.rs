//! Server settings

use std::convert::Infallible;
use std::str::FromStr;

use axum::http::HeaderValue;
use clap::Args;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Settings for `printquote serve`.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "QUOTE_SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: String,

    /// Comma-separated CORS origins, or `*` for any
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "*")]
    pub allowed_origins: AllowedOrigins,

    /// Largest accepted request body in MiB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 64)]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            allowed_origins: AllowedOrigins::Any,
            max_upload_mb: 64,
        }
    }
}

impl ServerConfig {
    /// Body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// CORS origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for AllowedOrigins {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Ok(AllowedOrigins::Any)
        } else {
            Ok(AllowedOrigins::List(origins))
        }
    }
}

impl AllowedOrigins {
    /// CORS layer for this policy. An explicit list also allows credentials.
    pub fn cors_layer(&self) -> CorsLayer {
        match self {
            AllowedOrigins::Any => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
            AllowedOrigins::List(origins) => {
                let values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            warn!(origin = %origin, "ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect();
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(values))
                    .allow_methods(AllowMethods::mirror_request())
                    .allow_headers(AllowHeaders::mirror_request())
                    .allow_credentials(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!("*".parse::<AllowedOrigins>().unwrap(), AllowedOrigins::Any);
        assert_eq!("".parse::<AllowedOrigins>().unwrap(), AllowedOrigins::Any);
        assert_eq!(
            " https://a.example , https://b.example,".parse::<AllowedOrigins>().unwrap(),
            AllowedOrigins::List(vec!["https://a.example".into(), "https://b.example".into()])
        );
    }

    #[test]
    fn test_upload_limit() {
        let config = ServerConfig {
            max_upload_mb: 2,
            ..Default::default()
        };
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
