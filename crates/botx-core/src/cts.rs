//! Chat-server records and the per-host token cache.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

/// Token obtained from a chat server for one bot.
#[derive(Debug, Clone)]
pub struct BotCredentials {
    /// The bot the token was issued to.
    pub bot_id: Uuid,
    /// The bearer token itself.
    pub token: String,
}

/// One chat-server deployment the application talks to.
///
/// Registered up front; `credentials` is filled lazily on the first
/// successful token fetch and overwritten on re-authentication. Records are
/// never evicted.
#[derive(Debug, Clone)]
pub struct Cts {
    /// Host name identifying the deployment.
    pub host: String,
    /// Shared secret for signature computation.
    pub secret_key: String,
    /// Cached token, once acquired.
    pub credentials: Option<BotCredentials>,
}

impl Cts {
    /// Creates a record with no cached credentials.
    pub fn new(host: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            secret_key: secret_key.into(),
            credentials: None,
        }
    }

    /// Computes the token-request signature for `bot_id`.
    ///
    /// Upper-case base16 of HMAC-SHA256 over the hyphenated bot id, keyed
    /// with the host's secret.
    pub fn calculate_signature(&self, bot_id: Uuid) -> String {
        calculate_signature(&self.secret_key, bot_id)
    }
}

/// Upper-case base16 HMAC-SHA256 of `bot_id` under `secret_key`.
pub fn calculate_signature(secret_key: &str, bot_id: Uuid) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(bot_id.to_string().as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Shared per-host credential cache.
///
/// One mutex guards the whole map: token writes happen only on the outbound
/// path and acquisitions are rare, so contention is negligible.
#[derive(Default)]
pub struct CredentialsStore {
    hosts: Mutex<HashMap<String, Cts>>,
}

impl CredentialsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chat server. A record for the same host is replaced.
    pub fn register(&self, cts: Cts) {
        self.hosts.lock().insert(cts.host.clone(), cts);
    }

    /// Whether `host` has been registered.
    pub fn knows(&self, host: &str) -> bool {
        self.hosts.lock().contains_key(host)
    }

    /// The cached token for `host`, if one was acquired.
    pub fn token_for(&self, host: &str) -> ApiResult<Option<String>> {
        let hosts = self.hosts.lock();
        let cts = hosts
            .get(host)
            .ok_or_else(|| ApiError::UnknownHost(host.to_string()))?;
        Ok(cts.credentials.as_ref().map(|c| c.token.clone()))
    }

    /// The token-request signature for `bot_id` on `host`.
    pub fn signature_for(&self, host: &str, bot_id: Uuid) -> ApiResult<String> {
        let hosts = self.hosts.lock();
        let cts = hosts
            .get(host)
            .ok_or_else(|| ApiError::UnknownHost(host.to_string()))?;
        Ok(cts.calculate_signature(bot_id))
    }

    /// Caches a freshly acquired token on the host record.
    pub fn set_token(&self, host: &str, bot_id: Uuid, token: String) -> ApiResult<()> {
        let mut hosts = self.hosts.lock();
        let cts = hosts
            .get_mut(host)
            .ok_or_else(|| ApiError::UnknownHost(host.to_string()))?;
        cts.credentials = Some(BotCredentials { bot_id, token });
        Ok(())
    }

    /// Drops the cached token so the next call re-authenticates.
    pub fn invalidate(&self, host: &str) {
        if let Some(cts) = self.hosts.lock().get_mut(host) {
            if cts.credentials.take().is_some() {
                debug!(host = %host, "Invalidated cached token");
            }
        }
    }
}
