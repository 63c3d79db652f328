//! Character example: a hero assembled from parts
//!
//! This example demonstrates:
//! - Loading feature sets and modifiers from a JSON catalog
//! - Building a character from body, weapon and armor nodes
//! - Timed buffs expiring across ticks
//! - Comparing weapons with a what-if query before equipping
//!
//! Run with `RUST_LOG=statgraph=debug` to see modifier and hierarchy events.

use statgraph::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CATALOG: &str = r#"{
    "feature_sets": {
        "hero": [
            { "name": "Damage", "kind": "additive", "base_value": 10.0 },
            { "name": "Weight", "kind": "additive", "base_value": 70.0 },
            { "name": "Speed", "kind": "multiplicative", "base_value": 1.0 }
        ],
        "short_sword": [
            { "name": "Damage", "kind": "additive", "base_value": 6.0 },
            { "name": "Weight", "kind": "additive", "base_value": 2.0 }
        ],
        "war_hammer": [
            { "name": "Damage", "kind": "additive", "base_value": 14.0 },
            { "name": "Weight", "kind": "additive", "base_value": 9.0 },
            { "name": "Speed", "kind": "multiplicative", "base_value": 0.8 }
        ],
        "chainmail": [
            { "name": "Weight", "kind": "additive", "base_value": 12.0 },
            { "name": "Speed", "kind": "multiplicative", "base_value": 0.9 }
        ]
    },
    "modifiers": [
        { "id": "battle_cry", "feature_name": "Damage", "factor": 1.5,
          "kind": "multiplicative", "duration": 2.0 }
    ]
}"#;

/// The hero's body: derives a rigid-body mass from its total weight.
struct Hero;

impl NodeBehavior for Hero {
    fn initial_features(&self, catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError> {
        catalog.feature_set("hero")
    }

    fn post_process(&self, features: &[Feature], effects: &mut EngineEffects) {
        if let Some(weight) = features.iter().find(|f| f.name().matches("Weight")) {
            effects.set("mass", weight.current_value());
        }
    }
}

fn print_features(label: &str, features: &[Feature]) {
    println!("{}:", label);
    for feature in features {
        println!("  {:<8} {:>8.2}", feature.name(), feature.current_value());
    }
}

fn main() -> Result<(), StatGraphError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = Arc::new(Catalog::from_json_str(CATALOG)?);
    let mut graph = StatGraph::new(catalog);

    let hero = graph.spawn_node("Character", Arc::new(Hero), None)?;
    let body = graph.object_of(hero).ok_or(StatGraphError::UnknownNode(hero))?;
    let right_hand = graph.spawn_object(Some(body))?;

    graph.spawn_node("Weapon", Arc::new(CatalogFeatures::new("short_sword")), Some(right_hand))?;
    graph.spawn_node("Armor", Arc::new(CatalogFeatures::new("chainmail")), Some(body))?;

    graph.tick(0.0)?;
    print_features("Equipped", graph.try_node(hero)?.features());
    println!("  mass     {:>8.2}", graph.try_node(hero)?.effects().get("mass").unwrap_or(0.0));

    // Would a war hammer be better?
    let hammer = graph.build_detached_node("Weapon", Arc::new(CatalogFeatures::new("war_hammer")))?;
    let with_hammer = graph.features_with_hypothetical_nodes(hero, &[&hammer])?;
    print_features("\nWhat-if (sword + hammer)", &with_hammer);

    println!("\nBattle cry for 2s:");
    graph.grant_modifier(hero, "battle_cry")?;
    for step in 0..4 {
        graph.tick(0.75)?;
        let damage = graph.try_node(hero)?.feature_value("Damage", "").unwrap_or(0.0);
        println!("  t={:.2}s damage={:.2}", (step + 1) as f64 * 0.75, damage);
    }

    Ok(())
}
