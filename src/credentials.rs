use crate::errors::{Result, TidyError};
use crate::remote::GITHUB_HOST;
use base64::Engine;
use serde::Deserialize;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PRIMARY_TOKEN_VAR: &str = "GH_TOKEN";
pub const SECONDARY_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const CONFIG_DIR_VAR: &str = "GH_CONFIG_DIR";
const HOSTS_FILE: &str = "hosts.yml";
const KEYRING_SERVICE: &str = "gh:github.com";
/// How the gh CLI (through go-keyring) encodes secrets in the macOS keychain
const GO_KEYRING_BASE64_PREFIX: &str = "go-keyring-base64:";

pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
    fn home_dir(&self) -> Option<PathBuf>;
}

pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// A platform credential store queried by service and account.
pub trait SecretStore {
    /// `Ok(None)` when nothing is stored under that pair
    fn get(&self, service: &str, account: &str) -> Result<Option<String>>;
}

pub struct Keyring;

impl SecretStore for Keyring {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(service, account)
            .map_err(|e| TidyError::Credential(format!("invalid keyring entry: {}", e)))?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(decode_go_keyring(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TidyError::Credential(format!("keyring lookup failed: {}", e))),
        }
    }
}

fn decode_go_keyring(secret: String) -> String {
    let Some(encoded) = secret.strip_prefix(GO_KEYRING_BASE64_PREFIX) else {
        return secret;
    };
    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or(secret),
        Err(e) => {
            log::debug!("keyring secret has the go-keyring prefix but is not base64: {}", e);
            secret
        }
    }
}

/// One host record of the gh CLI `hosts.yml`
#[derive(Debug, Default, Deserialize)]
pub struct HostConfig {
    pub oauth_token: Option<String>,
    /// Active account, set by multi-account gh versions
    pub user: Option<String>,
    #[serde(default)]
    pub users: HashMap<String, Option<UserConfig>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub oauth_token: Option<String>,
}

impl HostConfig {
    pub fn token(&self) -> Option<String> {
        non_empty(self.oauth_token.clone()).or_else(|| {
            let user = self.users.get(self.user.as_deref()?)?.as_ref()?;
            non_empty(user.oauth_token.clone())
        })
    }
}

pub fn parse_hosts(content: &str) -> Result<HashMap<String, HostConfig>> {
    let hosts: Option<HashMap<String, Option<HostConfig>>> = serde_yaml::from_str(content)?;
    Ok(hosts
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(host, config)| config.map(|config| (host, config)))
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Finds a GitHub token the way the gh CLI would.
///
/// Sources are tried in order and the first non-empty token wins:
/// `GH_TOKEN`, `GITHUB_TOKEN`, the `oauth_token` of github.com in gh's
/// `hosts.yml`, then the platform keyring. A source that is missing or
/// broken is logged and skipped.
pub struct CredentialResolver<E: Environment, S: SecretStore> {
    env: E,
    store: S,
}

impl CredentialResolver<ProcessEnvironment, Keyring> {
    pub fn from_system() -> Self {
        Self::new(ProcessEnvironment, Keyring)
    }
}

impl<E: Environment, S: SecretStore> CredentialResolver<E, S> {
    pub fn new(env: E, store: S) -> Self {
        Self { env, store }
    }

    pub fn resolve(&self) -> Result<String> {
        let hosts_path = self.hosts_file_path();
        let host_cell = OnceCell::new();
        let host = || {
            host_cell
                .get_or_init(|| hosts_path.as_ref().and_then(|path| load_host_config(path)))
                .as_ref()
        };

        self.env_token(PRIMARY_TOKEN_VAR)
            .or_else(|| self.env_token(SECONDARY_TOKEN_VAR))
            .or_else(|| {
                let token = host().and_then(HostConfig::token)?;
                log::info!("using GitHub token from gh config file");
                Some(token)
            })
            .or_else(|| self.keyring_token(host().and_then(|h| h.user.as_deref())))
            .ok_or_else(|| {
                let file = hosts_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| HOSTS_FILE.to_string());
                TidyError::Credential(format!(
                    "no GitHub token found in {}, {}, {} or the system keyring",
                    PRIMARY_TOKEN_VAR, SECONDARY_TOKEN_VAR, file
                ))
            })
    }

    /// Where gh keeps its configuration
    pub fn config_dir(&self) -> Option<PathBuf> {
        let var = |key: &str| non_empty(self.env.var(key)).map(PathBuf::from);

        if let Some(dir) = var(CONFIG_DIR_VAR) {
            return Some(dir);
        }
        if let Some(dir) = var("XDG_CONFIG_HOME") {
            return Some(dir.join("gh"));
        }
        if cfg!(windows) {
            if let Some(dir) = var("APPDATA") {
                return Some(dir.join("GitHub CLI"));
            }
        }
        self.env.home_dir().map(|home| home.join(".config").join("gh"))
    }

    fn hosts_file_path(&self) -> Option<PathBuf> {
        let dir = self.config_dir();
        if dir.is_none() {
            log::debug!("could not find home directory, skipping gh config file");
        }
        dir.map(|dir| dir.join(HOSTS_FILE))
    }

    fn env_token(&self, key: &str) -> Option<String> {
        let token = non_empty(self.env.var(key))?;
        log::info!("using GitHub token from {}", key);
        Some(token)
    }

    fn keyring_token(&self, active_user: Option<&str>) -> Option<String> {
        std::iter::once("")
            .chain(active_user)
            .find_map(|account| match self.store.get(KEYRING_SERVICE, account) {
                Ok(token) => {
                    let token = non_empty(token)?;
                    log::info!("using GitHub token from system keyring");
                    Some(token)
                }
                Err(e) => {
                    log::debug!("keyring account '{}': {}", account, e);
                    None
                }
            })
    }
}

fn load_host_config(path: &Path) -> Option<HostConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("could not read gh config file {}: {}", path.display(), e);
            return None;
        }
    };
    match parse_hosts(&content) {
        Ok(mut hosts) => hosts.remove(GITHUB_HOST),
        Err(e) => {
            log::debug!("could not parse gh config file {}: {}", path.display(), e);
            None
        }
    }
}
