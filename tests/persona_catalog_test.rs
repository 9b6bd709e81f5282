// Integration tests for the persona catalog

use anyhow::Result;
use serde_json::json;
use std::collections::HashSet;

use deck_debater::personas::{PersonaCatalog, PersonaCategory};
use deck_debater::session::SessionStore;

#[test]
fn test_builtin_catalog_covers_every_category() -> Result<()> {
    let catalog = PersonaCatalog::builtin()?;
    assert_eq!(catalog.len(), 6);

    for category in PersonaCategory::ALL {
        assert!(
            catalog.in_category(category).next().is_some(),
            "no persona in category {category}"
        );
    }

    let ids: HashSet<_> = catalog.ids().into_iter().collect();
    assert_eq!(ids.len(), catalog.len(), "persona ids must be unique");
    Ok(())
}

#[test]
fn test_builtin_personas_are_complete() -> Result<()> {
    for persona in PersonaCatalog::builtin()?.iter() {
        assert!(!persona.name.is_empty(), "{} has no name", persona.id);
        assert!(!persona.role.is_empty(), "{} has no role", persona.id);
        assert!(persona.color.starts_with('#'), "{} color {}", persona.id, persona.color);
        assert!(!persona.expertise.is_empty(), "{} has no expertise", persona.id);
    }
    Ok(())
}

#[test]
fn test_catalog_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("personas.toml");
    std::fs::write(
        &path,
        r#"
        [[personas]]
        id = "cfo"
        name = "Morgan Lee"
        role = "Chief Financial Officer"
        emoji = "💰"
        category = "business"
        expertise = ["unit economics", "runway"]
        "#,
    )?;

    let catalog = PersonaCatalog::load(&path)?;
    let cfo = catalog.get("cfo").expect("cfo should load");
    assert_eq!(cfo.category, PersonaCategory::Business);
    assert_eq!(cfo.color, "#999999");
    Ok(())
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PersonaCatalog::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read persona catalog"));
}

#[test]
fn test_service_catalog_feeds_store_selection() -> Result<()> {
    let builtin = PersonaCatalog::builtin()?;
    let payload = json!({
        "personas": [
            {"id": "ai_architect", "name": "Dr. Sarah Chen", "emoji": "🏗️"},
            {"id": "ai_investor", "name": "Michael Torres"},
            {"name": "No id, skipped"}
        ],
        "by_category": {
            "Technical": ["ai_architect"],
            "Product & Business": ["ai_investor"]
        }
    });

    let catalog = PersonaCatalog::from_service_payload(&payload, &builtin)?;
    assert_eq!(catalog.ids(), vec!["ai_architect", "ai_investor"]);

    let mut store = SessionStore::new();
    store.load_personas(catalog);
    assert_eq!(store.selected_ids(), vec!["ai_architect", "ai_investor"]);
    assert_eq!(
        store.categories().get(&PersonaCategory::Business),
        Some(&vec!["ai_investor".to_string()])
    );

    // Toggle twice restores the original selection
    let before = store.selected_ids();
    store.toggle_persona("ai_investor");
    assert!(!store.is_selected("ai_investor"));
    store.toggle_persona("ai_investor");
    assert_eq!(store.selected_ids(), before);
    Ok(())
}
