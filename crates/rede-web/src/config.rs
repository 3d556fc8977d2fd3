use anyhow::Context;

pub struct WebConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    pub host: String,
    pub port: u16,
    pub cookie_key: [u8; 32],
}

impl WebConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("REDE_WEB_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".into())
            .trim_end_matches('/')
            .to_string();
        let host = std::env::var("REDE_WEB_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("REDE_WEB_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("REDE_WEB_PORT must be a port number")?;

        let encoded = std::env::var("REDE_WEB_COOKIE_KEY")
            .context("REDE_WEB_COOKIE_KEY is required (base64 of 32 random bytes)")?;
        let cookie_key = rede_crypto::keys::key_from_base64(&encoded)
            .context("REDE_WEB_COOKIE_KEY must be base64 of exactly 32 bytes")?;

        Ok(Self {
            api_url,
            host,
            port,
            cookie_key,
        })
    }
}
