//! Table descriptions: which fields the text search covers, which field
//! is the key facet, and what a list view shows.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name in the row store.
    pub table: String,
    /// Fields the free-text facet searches.
    pub search_on: Vec<String>,
    /// The categorical key field (may be multi-valued).
    pub key_field: String,
    /// The field drilled into under a single selected key.
    #[serde(default = "default_url_field")]
    pub url_field: String,
    /// Fields a list view displays, in order.
    pub layout: Vec<String>,
    /// Optional key → category map for the frequency tree's middle layer.
    #[serde(default)]
    pub categories: HashMap<String, String>,
}

fn default_url_field() -> String {
    "url".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    pub tables: Vec<TableConfig>,
}

impl ExploreConfig {
    pub fn from_toml_file(path: &Path) -> ExploreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ExploreError::Config(e.to_string()))
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.table.clone()).collect()
    }
}

impl Default for ExploreConfig {
    /// The three activity tables a browser export carries.
    fn default() -> Self {
        ExploreConfig {
            tables: vec![
                TableConfig {
                    table: "browsinghistory".to_string(),
                    search_on: vec!["url".to_string(), "title".to_string()],
                    key_field: "domain".to_string(),
                    url_field: "url".to_string(),
                    layout: vec!["date".to_string(), "url".to_string(), "title".to_string()],
                    categories: HashMap::new(),
                },
                TableConfig {
                    table: "searchhistory".to_string(),
                    search_on: vec!["word".to_string()],
                    key_field: "word".to_string(),
                    url_field: "query".to_string(),
                    layout: vec!["date".to_string(), "query".to_string()],
                    categories: HashMap::new(),
                },
                TableConfig {
                    table: "youtube".to_string(),
                    search_on: vec!["channel".to_string(), "title".to_string()],
                    key_field: "channel".to_string(),
                    url_field: "title".to_string(),
                    layout: vec![
                        "date".to_string(),
                        "channel".to_string(),
                        "title".to_string(),
                    ],
                    categories: HashMap::new(),
                },
            ],
        }
    }
}
