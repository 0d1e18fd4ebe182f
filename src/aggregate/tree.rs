//! Frequency tree: the hierarchical shape bubble/cloud views consume.
//!
//! One synthetic root; an optional layer of category nodes; one node per
//! distinct key with its count and member ids; and, when a single key is
//! drilled into, one node per distinct URL under that key.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::facet::key::KeyCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Category,
    Key,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub name: String,
    /// Parent node name; `None` only for the root.
    pub parent: Option<String>,
    pub count: u64,
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyTree {
    pub nodes: Vec<TreeNode>,
}

impl FrequencyTree {
    /// Assemble the tree from key counts, an optional key→category map,
    /// and optional drill-down URL counts under `drill_key`.
    pub fn build(
        keys: &KeyCounts,
        categories: &HashMap<String, String>,
        drill_key: Option<&str>,
        urls: &KeyCounts,
    ) -> FrequencyTree {
        let mut nodes = vec![TreeNode {
            kind: NodeKind::Root,
            name: "root".to_string(),
            parent: None,
            count: 0,
            ids: Vec::new(),
        }];

        // Only categories actually used by a present key become nodes.
        let used: BTreeSet<&str> = keys
            .keys()
            .filter_map(|key| categories.get(key))
            .map(String::as_str)
            .collect();
        for category in used {
            nodes.push(TreeNode {
                kind: NodeKind::Category,
                name: category.to_string(),
                parent: Some("root".to_string()),
                count: 1,
                ids: Vec::new(),
            });
        }

        for (key, entry) in keys {
            let parent = categories
                .get(key)
                .cloned()
                .unwrap_or_else(|| "root".to_string());
            nodes.push(TreeNode {
                kind: NodeKind::Key,
                name: key.clone(),
                parent: Some(parent),
                count: entry.count,
                ids: entry.ids.clone(),
            });
        }

        if let Some(drill_key) = drill_key {
            for (url, entry) in urls {
                nodes.push(TreeNode {
                    kind: NodeKind::Url,
                    name: url.clone(),
                    parent: Some(drill_key.to_string()),
                    count: entry.count,
                    ids: entry.ids.clone(),
                });
            }
        }

        FrequencyTree { nodes }
    }

    /// The node for a given name, if present.
    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The synthetic root is always present.
        self.nodes.len() <= 1
    }
}
