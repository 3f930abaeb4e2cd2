#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end discovery over the link-time registration table.
//!
//! Everything in this binary registers through `register_module!`, exactly
//! the way plugin crates do, so these tests cover the inventory path that
//! the unit tests bypass with explicit definition lists.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bootkit::{
    bootstrap::{self, BootstrapOptions},
    config::{section_or_default, ConfigProvider, JsonConfig},
    startup_entry, AppStartup, Capability, CapabilityId, CapabilityRef, Manifest, ModuleRegistry,
    RegistryTypeFinder, ServiceHub, StaticModuleRegistry, TypeEntry, TypeFinder,
};

const GREETER: CapabilityId = CapabilityId::new("greeter", 1);

static SERVICES_CONFIGURED: AtomicUsize = AtomicUsize::new(0);

pub trait Greeting: Send + Sync {
    fn greet(&self) -> String;
}

struct ConfiguredGreeting(String);

impl Greeting for ConfiguredGreeting {
    fn greet(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct GreeterConfig {
    greeting: Option<String>,
}

#[derive(Default)]
struct GreeterStartup;

impl AppStartup for GreeterStartup {
    fn order(&self) -> i32 {
        7
    }

    fn configure_services(
        &self,
        services: &ServiceHub,
        config: &dyn ConfigProvider,
    ) -> anyhow::Result<()> {
        let cfg: GreeterConfig = section_or_default(config, "greeter")?;
        let greeting = cfg.greeting.unwrap_or_else(|| "hello".to_owned());
        services.register::<dyn Greeting>(Arc::new(ConfiguredGreeting(greeting)));
        SERVICES_CONFIGURED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn greeter_manifest() -> Manifest {
    Manifest::Ready(vec![
        startup_entry::<GreeterStartup>("discovery_tests::GreeterStartup"),
        TypeEntry::concrete("discovery_tests::EnglishGreeter")
            .with_capability(CapabilityRef::closed(GREETER, vec!["English"])),
    ])
}

fn lazy_manifest() -> Manifest {
    Manifest::Ready(vec![TypeEntry::concrete("discovery_tests::LateGreeter")
        .with_capability(CapabilityRef::closed(GREETER, vec!["Late"]))])
}

bootkit::register_module!(name: "greeter", manifest: greeter_manifest);
bootkit::register_module!(name: "late_greeter", lazy, manifest: lazy_manifest);

fn registry() -> Arc<StaticModuleRegistry> {
    Arc::new(StaticModuleRegistry::from_inventory().unwrap())
}

#[test]
fn inventory_registrations_are_visible_to_the_registry() {
    let registry = registry();
    assert_eq!(registry.len(), 2);

    let loaded: Vec<_> = registry.list_loaded().iter().map(|h| h.name()).collect();
    assert_eq!(loaded, ["greeter"], "lazy module is not loaded eagerly");

    registry.load("late_greeter").unwrap();
    let loaded: Vec<_> = registry.list_loaded().iter().map(|h| h.name()).collect();
    assert_eq!(loaded, ["greeter", "late_greeter"]);
}

#[test]
fn open_generic_scan_spans_eagerly_and_explicitly_loaded_modules() {
    let finder = RegistryTypeFinder::new(registry()).with_extra_modules(["late_greeter"]);

    let matches = finder
        .find_types(&Capability::unbound(GREETER), true)
        .unwrap();
    let names: Vec<_> = matches.iter().map(|m| m.entry.type_name()).collect();
    assert_eq!(
        names,
        [
            "discovery_tests::EnglishGreeter",
            "discovery_tests::LateGreeter"
        ]
    );
}

#[test]
fn bootstrap_build_wires_services_from_registered_startups() {
    let sections = JsonConfig::new()
        .with_section("greeter", serde_json::json!({ "greeting": "configured hello" }));
    let opts = BootstrapOptions::new(registry(), Arc::new(sections));

    let app = bootstrap::build(&opts).unwrap();

    let greeting = app.services.get::<dyn Greeting>().unwrap();
    assert_eq!(greeting.greet(), "configured hello");
    assert!(SERVICES_CONFIGURED.load(Ordering::SeqCst) >= 1);
}
