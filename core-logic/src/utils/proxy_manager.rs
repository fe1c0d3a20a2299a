use crate::config::{ProxyDescriptor, ProxySource};
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Proxies as read from whichever source won, not yet paired with accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyAssignment {
    /// Flat file: line i belongs to account i.
    Positional(Vec<ProxyDescriptor>),
    /// Structured file: element i lists every proxy for account i.
    PerAccount(Vec<Vec<ProxyDescriptor>>),
    None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StructuredEntry {
    One(String),
    Many(Vec<String>),
    Empty(()),
}

pub struct ProxyManager;

impl ProxyManager {
    /// Picks exactly one proxy source according to `source` and loads it.
    pub fn resolve(
        source: ProxySource,
        flat_path: &str,
        structured_path: &str,
    ) -> Result<ProxyAssignment, ConfigError> {
        let flat_exists = Path::new(flat_path).exists();
        let structured_exists = Path::new(structured_path).exists();

        match source {
            ProxySource::None => Ok(ProxyAssignment::None),
            ProxySource::Flat => Self::load_flat(flat_path).map(ProxyAssignment::Positional),
            ProxySource::Structured => {
                Self::load_structured(structured_path).map(ProxyAssignment::PerAccount)
            }
            ProxySource::Auto => {
                if structured_exists {
                    if flat_exists {
                        warn!(
                            "Both {} and {} exist; using {} (set proxy_source to choose)",
                            structured_path, flat_path, structured_path
                        );
                    }
                    Self::load_structured(structured_path).map(ProxyAssignment::PerAccount)
                } else if flat_exists {
                    Self::load_flat(flat_path).map(ProxyAssignment::Positional)
                } else {
                    warn!("No proxy file found. Running without proxies.");
                    Ok(ProxyAssignment::None)
                }
            }
        }
    }

    /// Loads one descriptor per line. A missing file yields no proxies.
    pub fn load_flat(path: &str) -> Result<Vec<ProxyDescriptor>, ConfigError> {
        if !Path::new(path).exists() {
            warn!("{} not found. Running without proxies.", path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_string(),
            msg: e.to_string(),
        })?;

        let proxies: Vec<ProxyDescriptor> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(ProxyDescriptor::new)
            .collect();

        info!("Loaded {} proxies from {}", proxies.len(), path);
        Ok(proxies)
    }

    /// Loads a JSON array where each element is a proxy string, a list of
    /// proxy strings, or null.
    pub fn load_structured(path: &str) -> Result<Vec<Vec<ProxyDescriptor>>, ConfigError> {
        if !Path::new(path).exists() {
            warn!("{} not found. Running without proxies.", path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_string(),
            msg: e.to_string(),
        })?;

        let entries: Vec<StructuredEntry> =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let proxies: Vec<Vec<ProxyDescriptor>> = entries
            .into_iter()
            .map(|entry| {
                let raw = match entry {
                    StructuredEntry::One(p) => vec![p],
                    StructuredEntry::Many(list) => list,
                    StructuredEntry::Empty(()) => Vec::new(),
                };
                raw.into_iter()
                    .filter(|p| !p.trim().is_empty())
                    .map(ProxyDescriptor::new)
                    .collect()
            })
            .collect();

        let total: usize = proxies.iter().map(Vec::len).sum();
        info!(
            "Loaded {} proxies for {} accounts from {}",
            total,
            proxies.len(),
            path
        );
        Ok(proxies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_flat_skips_blank_and_comment_lines() {
        let file = write_temp("http://1.1.1.1:80\n\n# disabled\n  socks5://2.2.2.2:1080  \n");
        let proxies = ProxyManager::load_flat(file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            proxies,
            vec![
                ProxyDescriptor::new("http://1.1.1.1:80"),
                ProxyDescriptor::new("socks5://2.2.2.2:1080"),
            ]
        );
    }

    #[test]
    fn test_structured_accepts_strings_lists_and_null() {
        let file = write_temp(r#"["http://a:1", ["socks5://b:2", "c:3"], null, []]"#);
        let proxies = ProxyManager::load_structured(file.path().to_str().unwrap()).unwrap();

        assert_eq!(proxies.len(), 4);
        assert_eq!(proxies[0], vec![ProxyDescriptor::new("http://a:1")]);
        assert_eq!(proxies[1].len(), 2);
        assert!(proxies[2].is_empty());
        assert!(proxies[3].is_empty());
    }

    #[test]
    fn test_structured_rejects_malformed_json() {
        let file = write_temp("{not json");
        let err = ProxyManager::load_structured(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_auto_prefers_structured_when_both_exist() {
        let flat = write_temp("http://flat:1\n");
        let structured = write_temp(r#"["http://structured:1"]"#);

        let assignment = ProxyManager::resolve(
            ProxySource::Auto,
            flat.path().to_str().unwrap(),
            structured.path().to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(
            assignment,
            ProxyAssignment::PerAccount(vec![vec![ProxyDescriptor::new(
                "http://structured:1"
            )]])
        );
    }

    #[test]
    fn test_auto_falls_back_to_flat_then_none() {
        let flat = write_temp("http://flat:1\n");
        let missing = "definitely-missing-proxy.json";

        let assignment =
            ProxyManager::resolve(ProxySource::Auto, flat.path().to_str().unwrap(), missing)
                .unwrap();
        assert_eq!(
            assignment,
            ProxyAssignment::Positional(vec![ProxyDescriptor::new("http://flat:1")])
        );

        let assignment =
            ProxyManager::resolve(ProxySource::Auto, "missing-proxies.txt", missing).unwrap();
        assert_eq!(assignment, ProxyAssignment::None);
    }

    #[test]
    fn test_explicit_none_ignores_files() {
        let flat = write_temp("http://flat:1\n");
        let assignment =
            ProxyManager::resolve(ProxySource::None, flat.path().to_str().unwrap(), "x.json")
                .unwrap();
        assert_eq!(assignment, ProxyAssignment::None);
    }
}
