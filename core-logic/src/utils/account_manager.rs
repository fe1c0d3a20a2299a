use crate::config::{AccountCredential, AccountEntry, ProxySource};
use crate::error::ConfigError;
use crate::traits::AccountSource;
use crate::utils::proxy_manager::{ProxyAssignment, ProxyManager};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub struct AccountManager;

impl AccountManager {
    /// Reads one bearer token per line. Missing files and files without any
    /// token are both fatal.
    pub fn load_credentials(path: &str) -> Result<Vec<AccountCredential>, ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_string(),
            msg: e.to_string(),
        })?;

        let credentials: Vec<AccountCredential> = content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .filter_map(AccountCredential::new)
            .collect();

        if credentials.is_empty() {
            return Err(ConfigError::NoAccounts {
                path: path.to_string(),
            });
        }

        info!("Loaded {} accounts from {}", credentials.len(), path);
        Ok(credentials)
    }

    /// Pairs credentials with proxies by position.
    ///
    /// A structured entry with several proxies expands into one account entry
    /// per proxy, all sharing the credential. Accounts without a proxy run direct.
    pub fn pair(credentials: Vec<AccountCredential>, proxies: ProxyAssignment) -> Vec<AccountEntry> {
        match proxies {
            ProxyAssignment::None => credentials
                .into_iter()
                .map(|credential| AccountEntry {
                    credential,
                    proxy: None,
                })
                .collect(),
            ProxyAssignment::Positional(list) => {
                if list.len() > credentials.len() {
                    warn!(
                        "{} proxies for {} accounts; extra proxies are ignored",
                        list.len(),
                        credentials.len()
                    );
                }
                let mut list = list.into_iter();
                credentials
                    .into_iter()
                    .map(|credential| AccountEntry {
                        credential,
                        proxy: list.next(),
                    })
                    .collect()
            }
            ProxyAssignment::PerAccount(lists) => {
                let mut lists = lists.into_iter();
                let mut entries = Vec::new();
                for credential in credentials {
                    let proxies = lists.next().unwrap_or_default();
                    if proxies.is_empty() {
                        entries.push(AccountEntry {
                            credential,
                            proxy: None,
                        });
                        continue;
                    }
                    for proxy in proxies {
                        entries.push(AccountEntry {
                            credential: credential.clone(),
                            proxy: Some(proxy),
                        });
                    }
                }
                entries
            }
        }
    }
}

/// Loads accounts from a credential file plus whichever proxy file wins.
#[derive(Debug, Clone)]
pub struct FileAccountSource {
    pub credentials_file: String,
    pub proxy_file: String,
    pub proxy_json_file: String,
    pub proxy_source: ProxySource,
}

#[async_trait]
impl AccountSource for FileAccountSource {
    async fn load_accounts(&self) -> Result<Vec<AccountEntry>, ConfigError> {
        let credentials = AccountManager::load_credentials(&self.credentials_file)?;
        let proxies =
            ProxyManager::resolve(self.proxy_source, &self.proxy_file, &self.proxy_json_file)?;
        Ok(AccountManager::pair(credentials, proxies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyDescriptor;

    fn creds(tokens: &[&str]) -> Vec<AccountCredential> {
        tokens
            .iter()
            .filter_map(|t| AccountCredential::new(t))
            .collect()
    }

    #[test]
    fn test_positional_pairing_leaves_extra_accounts_direct() {
        let entries = AccountManager::pair(
            creds(&["a", "b", "c"]),
            ProxyAssignment::Positional(vec![ProxyDescriptor::new("http://p1:80")]),
        );

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].proxy, Some(ProxyDescriptor::new("http://p1:80")));
        assert!(entries[1].proxy.is_none());
        assert!(entries[2].proxy.is_none());
    }

    #[test]
    fn test_per_account_lists_expand_entries() {
        let entries = AccountManager::pair(
            creds(&["a", "b"]),
            ProxyAssignment::PerAccount(vec![
                vec![
                    ProxyDescriptor::new("http://p1:80"),
                    ProxyDescriptor::new("socks5://p2:1080"),
                ],
                vec![],
            ]),
        );

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].credential.token(), "a");
        assert_eq!(entries[1].credential.token(), "a");
        assert_eq!(entries[1].proxy, Some(ProxyDescriptor::new("socks5://p2:1080")));
        assert_eq!(entries[2].credential.token(), "b");
        assert!(entries[2].proxy.is_none());
    }

    #[test]
    fn test_missing_credentials_file_is_fatal() {
        let err = AccountManager::load_credentials("no-such-data.txt").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
