use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 8080;

/// Environment-driven gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
}

impl GatewayConfig {
    /// Read `GATEWAY_ADDR` / `GATEWAY_PORT`, falling back to 0.0.0.0:8080
    pub fn from_env() -> Self {
        let host = std::env::var("GATEWAY_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("GATEWAY_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let addr = format!("{}:{}", host, port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        Self { addr }
    }
}
