use anyhow::{bail, Context};
use jewelmusic::webhooks::DEFAULT_TOLERANCE_SECS;
use secrecy::SecretString;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;

/// Receiver settings, read from the environment.
#[derive(Debug)]
pub struct ReceiverConfig {
    pub secret: SecretString,
    pub port: u16,
    pub tolerance_secs: u64,
    pub data_dir: Option<PathBuf>,
    /// Externally reachable base URL; when set the endpoint registers itself on startup.
    pub public_url: Option<String>,
}

impl ReceiverConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret = match get("JEWELMUSIC_WEBHOOK_SECRET") {
            Some(s) if !s.trim().is_empty() => SecretString::from(s),
            _ => bail!("JEWELMUSIC_WEBHOOK_SECRET must be set"),
        };

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {p}"))?,
            None => DEFAULT_PORT,
        };

        let tolerance_secs = match get("JEWELMUSIC_WEBHOOK_TOLERANCE") {
            Some(t) => t
                .parse()
                .with_context(|| format!("invalid JEWELMUSIC_WEBHOOK_TOLERANCE: {t}"))?,
            None => DEFAULT_TOLERANCE_SECS,
        };

        Ok(Self {
            secret,
            port,
            tolerance_secs,
            data_dir: get("JEWELMUSIC_DATA_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
            public_url: get("JEWELMUSIC_PUBLIC_URL").filter(|u| !u.is_empty()),
        })
    }
}
