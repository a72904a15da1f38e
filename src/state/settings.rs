use anyhow::Context;

/// Backend connection settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub store_url: String,
    pub store_key: String,
}

impl AppSettings {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            store_url: std::env::var("BOLAO_STORE_URL")
                .context("BOLAO_STORE_URL is not set")?,
            store_key: std::env::var("BOLAO_STORE_KEY")
                .context("BOLAO_STORE_KEY is not set")?,
        })
    }
}
