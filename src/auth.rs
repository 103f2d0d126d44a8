//! Auth token lookup for solve/debug requests.
//!
//! The token is consulted once per request and never cached here; whoever
//! signs the user in owns writing it.

const KEYRING_SERVICE: &str = "coder-overlay";
const KEYRING_ACCOUNT: &str = "api-token";
const TOKEN_ENV: &str = "SOLVER_API_TOKEN";

pub trait TokenStore: Send + Sync {
    /// Current bearer token, `None` when the user is signed out.
    fn token(&self) -> Option<String>;
}

/// Token from `SOLVER_API_TOKEN`, else the OS keychain.
pub struct KeychainTokenStore {
    service: String,
    account: String,
}

impl KeychainTokenStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            account: KEYRING_ACCOUNT.to_string(),
        }
    }
}

impl Default for KeychainTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeychainTokenStore {
    fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Some(token);
            }
        }

        let entry = match keyring::Entry::new(&self.service, &self.account) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("[AUTH] Keyring unavailable: {}", e);
                return None;
            }
        };
        match entry.get_password() {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                log::info!("[AUTH] No token stored, user is signed out");
                None
            }
            Err(e) => {
                log::warn!("[AUTH] Failed to read token from keychain: {}", e);
                None
            }
        }
    }
}
