use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::patch::trimmed;
use crate::ConfigError;

/// Three-level category labels, coarse to specific. Stored as plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPath {
    pub level0: String,
    #[serde(default)]
    pub level1: Option<String>,
    #[serde(default)]
    pub level2: Option<String>,
}

impl CategoryPath {
    #[must_use]
    pub fn new(level0: &str, level1: Option<&str>, level2: Option<&str>) -> Self {
        Self {
            level0: level0.trim().to_string(),
            level1: trimmed(level1),
            level2: trimmed(level2),
        }
    }

    /// The most specific non-empty label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.segments().last().copied().unwrap_or_default()
    }

    /// Non-empty labels from the top down, stopping at the first gap.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(3);
        for level in [
            Some(self.level0.as_str()),
            self.level1.as_deref(),
            self.level2.as_deref(),
        ] {
            match level.map(str::trim) {
                Some(label) if !label.is_empty() => out.push(label),
                _ => break,
            }
        }
        out
    }

    #[must_use]
    pub fn breadcrumb(&self) -> String {
        self.segments().join(" / ")
    }

    /// Checks that `level0` is set and that `level2` is only used under a `level1`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.level0.trim().is_empty() {
            return Err("level0 must be non-empty".to_string());
        }
        if self.level2.is_some() && self.level1.is_none() {
            return Err(format!(
                "category '{}' sets level2 without level1",
                self.breadcrumb()
            ));
        }
        Ok(())
    }
}

/// A category as listed in the seed file or created by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeed {
    #[serde(flatten)]
    pub path: CategoryPath,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Attribute keys that tell variants apart; only meaningful on a `level0` entry.
    #[serde(default)]
    pub variant_fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategorySeed>,
}

/// Load and validate the category seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut file: CategoriesFile = serde_yaml::from_str(&content)?;
    for seed in &mut file.categories {
        seed.path = CategoryPath::new(
            &seed.path.level0,
            seed.path.level1.as_deref(),
            seed.path.level2.as_deref(),
        );
    }

    validate_categories(&file)?;

    Ok(file)
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for seed in &file.categories {
        seed.path.check().map_err(ConfigError::Validation)?;

        if !seed.variant_fields.is_empty() && seed.path.level1.is_some() {
            return Err(ConfigError::Validation(format!(
                "category '{}': variant_fields may only be set on a level0 entry",
                seed.path.breadcrumb()
            )));
        }

        let key = seed.path.breadcrumb().to_lowercase();
        if !seen.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{}'",
                seed.path.breadcrumb()
            )));
        }
    }

    Ok(())
}

/// One node of the derived category tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub name: String,
    pub level: u8,
    pub path: CategoryPath,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Products at this node or anywhere below it.
    pub product_count: i64,
    pub children: Vec<CategoryNode>,
}

#[derive(Default)]
struct Draft {
    description: Option<String>,
    icon: Option<String>,
    product_count: i64,
    children: BTreeMap<String, Draft>,
}

/// Folds explicit categories and per-path product counts into a tree.
///
/// Paths that only appear on products still get nodes. Children are
/// ordered by label.
#[must_use]
pub fn build_category_tree(
    categories: &[CategorySeed],
    product_counts: &[(CategoryPath, i64)],
) -> Vec<CategoryNode> {
    let mut roots: BTreeMap<String, Draft> = BTreeMap::new();

    for seed in categories {
        if let Some(node) = draft_at(&mut roots, &seed.path.segments()) {
            if seed.description.is_some() {
                node.description.clone_from(&seed.description);
            }
            if seed.icon.is_some() {
                node.icon.clone_from(&seed.icon);
            }
        }
    }

    for (path, count) in product_counts {
        let segments = path.segments();
        for depth in 1..=segments.len() {
            if let Some(node) = draft_at(&mut roots, &segments[..depth]) {
                node.product_count += count;
            }
        }
    }

    finish(roots, &[])
}

fn draft_at<'a>(map: &'a mut BTreeMap<String, Draft>, segments: &[&str]) -> Option<&'a mut Draft> {
    let (first, rest) = segments.split_first()?;
    let node = map.entry((*first).to_string()).or_default();
    if rest.is_empty() {
        Some(node)
    } else {
        draft_at(&mut node.children, rest)
    }
}

fn finish(map: BTreeMap<String, Draft>, parents: &[&str]) -> Vec<CategoryNode> {
    map.into_iter()
        .map(|(name, draft)| {
            let mut segments: Vec<&str> = parents.to_vec();
            segments.push(&name);
            let path = CategoryPath::new(
                segments[0],
                segments.get(1).copied(),
                segments.get(2).copied(),
            );
            let level = u8::try_from(parents.len()).unwrap_or(u8::MAX);
            let children = finish(draft.children, &segments);
            CategoryNode {
                level,
                path,
                description: draft.description,
                icon: draft.icon,
                product_count: draft.product_count,
                children,
                name,
            }
        })
        .collect()
}
