// Persona catalog: the static registry of reviewer identities
//
// Built in from data/personas.toml; can also be loaded from a TOML file or
// rebuilt from the analysis service's /personas payload.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/personas.toml");

/// Focus area a reviewer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaCategory {
    Technical,
    Business,
    Ethics,
}

impl PersonaCategory {
    pub const ALL: [PersonaCategory; 3] = [Self::Technical, Self::Business, Self::Ethics];

    /// Map a free-form group label ("Technical", "Product & Business",
    /// "Governance") onto a category.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("tech") {
            Some(Self::Technical)
        } else if lower.contains("business") || lower.contains("product") {
            Some(Self::Business)
        } else if lower.contains("ethic") || lower.contains("governance") {
            Some(Self::Ethics)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Business => "business",
            Self::Ethics => "ethics",
        }
    }
}

impl fmt::Display for PersonaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer persona. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique key sent to the analysis service (e.g., "ai_architect")
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub emoji: String,
    pub category: PersonaCategory,
    #[serde(default = "default_color")]
    pub color: String,
    /// Capability tags shown next to the persona
    #[serde(default)]
    pub expertise: Vec<String>,
    /// TTS voice used by the analysis service for this persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_color() -> String {
    "#999999".to_string()
}

#[derive(Deserialize)]
struct CatalogFile {
    personas: Vec<Persona>,
}

/// Ordered, id-unique collection of personas
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// Build a catalog, rejecting blank or duplicate ids.
    pub fn new(personas: Vec<Persona>) -> Result<Self> {
        let mut seen = HashSet::new();
        for persona in &personas {
            if persona.id.trim().is_empty() {
                bail!("Persona '{}' has an empty id", persona.name);
            }
            if !seen.insert(persona.id.as_str()) {
                bail!("Duplicate persona id in catalog: {}", persona.id);
            }
        }
        Ok(Self { personas })
    }

    /// The six built-in reviewers
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG).context("Failed to parse builtin persona catalog")
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents).context("Invalid persona catalog TOML")?;
        Self::new(file.personas)
    }

    /// Load a catalog from a TOML file with a `[[personas]]` array
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read persona catalog from {}", path.display()))?;
        Self::from_toml(&contents)
    }

    /// Rebuild a catalog from the analysis service's `/personas` payload.
    ///
    /// The service reports `{personas: [{id, name, role, emoji, color}],
    /// by_category: {label: [ids]}}`, with the groups sometimes under
    /// `categories` instead. Categories come from the group labels;
    /// personas the labels don't place fall back to `known`'s entry for the
    /// same id, then to `Business`. Entries without an id are skipped.
    pub fn from_service_payload(payload: &Value, known: &PersonaCatalog) -> Result<Self> {
        let Some(items) = payload.get("personas").and_then(Value::as_array) else {
            bail!("Persona payload has no 'personas' array");
        };

        let mut grouped: BTreeMap<&str, PersonaCategory> = BTreeMap::new();
        let groups = payload
            .get("by_category")
            .or_else(|| payload.get("categories"))
            .and_then(Value::as_object);
        if let Some(groups) = groups {
            for (label, ids) in groups {
                let Some(category) = PersonaCategory::from_label(label) else {
                    tracing::debug!("Unrecognised persona group label: {}", label);
                    continue;
                };
                for id in ids.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    grouped.insert(id, category);
                }
            }
        }

        let text = |item: &Value, key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let mut personas = Vec::with_capacity(items.len());
        for item in items {
            let Some(id) = text(item, "id").filter(|id| !id.trim().is_empty()) else {
                tracing::warn!("Skipping persona without an id: {}", item);
                continue;
            };
            let builtin = known.get(&id);
            let category = grouped
                .get(id.as_str())
                .copied()
                .or_else(|| builtin.map(|p| p.category))
                .unwrap_or(PersonaCategory::Business);

            personas.push(Persona {
                name: text(item, "name")
                    .or_else(|| builtin.map(|p| p.name.clone()))
                    .unwrap_or_else(|| id.clone()),
                role: text(item, "role")
                    .or_else(|| builtin.map(|p| p.role.clone()))
                    .unwrap_or_default(),
                emoji: text(item, "emoji")
                    .or_else(|| builtin.map(|p| p.emoji.clone()))
                    .unwrap_or_default(),
                color: text(item, "color")
                    .or_else(|| builtin.map(|p| p.color.clone()))
                    .unwrap_or_else(default_color),
                expertise: builtin.map(|p| p.expertise.clone()).unwrap_or_default(),
                voice: text(item, "voice").or_else(|| builtin.and_then(|p| p.voice.clone())),
                image: text(item, "image").or_else(|| builtin.and_then(|p| p.image.clone())),
                category,
                id,
            });
        }

        Self::new(personas)
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Persona ids in catalog order
    pub fn ids(&self) -> Vec<String> {
        self.personas.iter().map(|p| p.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn in_category(&self, category: PersonaCategory) -> impl Iterator<Item = &Persona> {
        self.personas.iter().filter(move |p| p.category == category)
    }

    /// Ids grouped by category, each group in catalog order
    pub fn by_category(&self) -> BTreeMap<PersonaCategory, Vec<String>> {
        let mut groups: BTreeMap<PersonaCategory, Vec<String>> = BTreeMap::new();
        for persona in &self.personas {
            groups
                .entry(persona.category)
                .or_default()
                .push(persona.id.clone());
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
