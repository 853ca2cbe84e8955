//! Assignment Engine Tour
//!
//! Run with: `RUST_LOG=trueno_ab=debug cargo run --example assignment_tour`
//!
//! Walks one visitor through a server request cycle: fresh assignment,
//! cookie echo on the next request, a debug override, a forced variant and
//! a reset.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trueno_ab::registry::{self, Registry};
use trueno_ab::store::{HeaderMedium, StorageMedium};
use trueno_ab::{variant_for_render, AssignmentEngine, EngineConfig, TracingSink};

const REGISTRY_JSON: &str = r#"{
    "checkout-button": {
        "variants": [{"id": "A", "weight": 1}, {"id": "B", "weight": 1}],
        "defaultVariant": "A"
    },
    "pricing-page": {
        "variants": [{"id": "control", "weight": 9}, {"id": "annual-first", "weight": 1}]
    }
}"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-AB Assignment Tour ===\n");

    let registry = registry::install(Registry::from_json(REGISTRY_JSON)?)?;
    for experiment in registry.all() {
        let split: Vec<String> = experiment
            .variants()
            .iter()
            .map(|v| format!("{}={}%", v.id(), experiment.percentage(v.id())))
            .collect();
        println!("   {:<16} {}", experiment.id(), split.join(" "));
    }

    // 1. First request: nothing stored, fresh assignment
    println!("\n1. First request (no cookie)");
    let request = HeaderMedium::from_request(None);
    let assigned = {
        let mut engine = AssignmentEngine::builder(Arc::clone(&registry), &request)
            .analytics(TracingSink)
            .build();
        engine.get_variant("checkout-button")
    };
    let set_cookie = request.take_set_cookie_headers();
    println!("   checkout-button -> {assigned}");
    println!("   Set-Cookie: {}", set_cookie.join(" | "));

    // 2. Second request echoes the cookie
    println!("\n2. Second request (cookie echoed)");
    let cookie = set_cookie
        .first()
        .and_then(|header| header.split(';').next())
        .unwrap_or_default()
        .to_string();
    let request = HeaderMedium::from_request(Some(&cookie));
    let mut engine = AssignmentEngine::builder(Arc::clone(&registry), &request)
        .analytics(TracingSink)
        .build();
    println!("   checkout-button -> {}", engine.get_variant("checkout-button"));
    println!(
        "   render without assigning: pricing-page -> {}",
        variant_for_render(
            &registry,
            request.read("ab_assignments").as_deref(),
            "pricing-page",
            &EngineConfig::default()
        )
    );

    // 3. Debug override for this request only
    println!("\n3. Debug override (?ab_override=checkout-button:B)");
    let mut debug = AssignmentEngine::builder(Arc::clone(&registry), &request)
        .query("?ab_override=checkout-button:B")
        .build();
    println!("   checkout-button -> {}", debug.get_variant("checkout-button"));
    println!("   stored remains  -> {}", engine.get_all_assignments()["checkout-button"].variant_id());

    // 4. Force and reset
    println!("\n4. Force and clear");
    engine.force_variant("checkout-button", "B");
    println!("   forced          -> {}", engine.get_variant("checkout-button"));
    engine.clear_assignments();
    println!("   after clear     -> {} stored", engine.get_all_assignments().len());

    println!("\nAll demos completed successfully!");
    Ok(())
}
