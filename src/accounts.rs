use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;

/// Read-only UID to display name mapping for sub-accounts.
///
/// The built-in table covers the known accounts; `--accounts <file.toml>`
/// replaces it with an `[accounts]` table from disk.
#[derive(Debug, Clone)]
pub struct NameTable {
    names: HashMap<String, String>,
}

#[derive(Deserialize)]
struct NameTableFile {
    accounts: HashMap<String, String>,
}

impl Default for NameTable {
    fn default() -> Self {
        let names = [
            ("455712604", "Account2"),
            ("455718923", "Account3"),
            ("455740215", "Account5"),
            ("455762817", "Account7"),
        ]
        .into_iter()
        .map(|(uid, name)| (uid.to_string(), name.to_string()))
        .collect();
        NameTable { names }
    }
}

impl NameTable {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::format_err!("Failed to read account table {path}: {e}"))?;
        let file: NameTableFile = toml::from_str(&content)?;
        Ok(NameTable { names: file.accounts })
    }

    /// Resolution order: table entry, then API-supplied username, then a
    /// generic "UID <uid>" label.
    pub fn resolve(&self, uid: &str, username: &str) -> String {
        if let Some(name) = self.names.get(uid) {
            return name.clone();
        }
        if !username.is_empty() {
            return username.to_string();
        }
        format!("UID {uid}")
    }
}


// eof
