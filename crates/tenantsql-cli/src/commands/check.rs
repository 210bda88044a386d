//! `tenantsql check-config` command implementation.
//!
//! Loads a configuration file, validates it, and confirms the audit backend
//! it names can be initialized.

use std::path::Path;

use anyhow::Result;
use tenantsql_audit::create_storage;
use tenantsql_core::{TenantId, TenantSqlConfig};

use super::Outcome;

pub fn run(path: &Path, json: bool) -> Result<Outcome> {
    let result = check(path);

    if json {
        let payload = match &result {
            Ok(config) => serde_json::json!({ "valid": true, "config": config }),
            Err(message) => serde_json::json!({ "valid": false, "error": message }),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        match &result {
            Ok(config) => print_summary(path, config),
            Err(message) => {
                eprintln!("✗ {}: {message}", path.display());
            }
        }
    }

    Ok(match result {
        Ok(_) => Outcome::Accepted,
        Err(_) => Outcome::Rejected,
    })
}

fn check(path: &Path) -> Result<TenantSqlConfig, String> {
    let config = TenantSqlConfig::from_file(path).map_err(|e| e.to_string())?;
    create_storage(&config.audit).map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_summary(path: &Path, config: &TenantSqlConfig) {
    println!("✓ {} is valid", path.display());
    println!("  namespace prefix: {}", config.namespace.prefix);
    if let Ok(example) = config.namespace_for(&TenantId::from(1u64)) {
        println!("  tenant 1 namespace: {example}");
    }
    println!("  dialect: {}", config.rewrite.dialect);
    println!("  max depth: {}", config.rewrite.max_depth);
    println!(
        "  audit: {}",
        if config.audit.enabled {
            format!("{:?}", config.audit.storage).to_lowercase()
        } else {
            "disabled".to_string()
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("tenantsql.yaml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "namespace:\n  prefix: acct_\nrewrite:\n  dialect: mysql\n  max_depth: 8\n",
        );
        assert_eq!(run(&path, false).unwrap(), Outcome::Accepted);
        assert_eq!(check(&path).unwrap().namespace.prefix, "acct_");
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "namespace:\n  prefix: \"bad-prefix\"\n");
        assert_eq!(run(&path, true).unwrap(), Outcome::Rejected);
    }

    #[test]
    fn test_file_audit_without_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "audit:\n  storage: file\n");
        assert!(check(&path).is_err());
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            run(&dir.path().join("missing.yaml"), false).unwrap(),
            Outcome::Rejected
        );
    }
}
