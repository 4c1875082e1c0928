//! Tests for injector hierarchies, modules and error propagation.

use std::sync::Arc;

use component_store_di::prelude::*;
use component_store_di::ModuleId;
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────────
// Test Types
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Config {
    name: String,
}

struct Service {
    config: Arc<Config>,
}

impl Injectable for Service {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
        Ok(Self {
            config: resolver.get::<Config>()?,
        })
    }
}

struct Ping;
struct Pong;

impl Injectable for Ping {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
        resolver.get::<Pong>()?;
        Ok(Ping)
    }
}

impl Injectable for Pong {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
        resolver.get::<Ping>()?;
        Ok(Pong)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("disk unavailable")]
struct DiskError;

struct Broken;

impl Injectable for Broken {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
        Err(InjectorError::construction(&resolver.path()[0], DiskError))
    }
}

struct CoreModule;

impl Module for CoreModule {
    fn providers(&self) -> Vec<Provider> {
        vec![
            Provider::value(
                Token::of::<Config>(),
                Config {
                    name: "core".into(),
                },
            ),
            Provider::class::<Service>(Token::of::<Service>()),
        ]
    }
}

struct RepeatableModule;

impl Module for RepeatableModule {
    fn providers(&self) -> Vec<Provider> {
        Vec::new()
    }

    fn is_unique(&self) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Hierarchy
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn child_delegates_to_parent() {
    let root = Arc::new(Injector::builder().add_module(CoreModule).build().unwrap());
    let child = root.child().build().unwrap();

    let from_child = child.get::<Service>().unwrap();
    let from_root = root.get::<Service>().unwrap();

    // Built and cached by the injector that owns the provider.
    assert!(Arc::ptr_eq(&from_child, &from_root));
    assert!(!child.is_instantiated(&Token::of::<Service>()));
}

#[test]
fn child_registration_shadows_parent() {
    let root = Arc::new(Injector::builder().add_module(CoreModule).build().unwrap());
    let child = root
        .child()
        .provide(Provider::class::<Service>(Token::of::<Service>()))
        .build()
        .unwrap();

    let from_child = child.get::<Service>().unwrap();
    let from_root = root.get::<Service>().unwrap();

    assert!(!Arc::ptr_eq(&from_child, &from_root));
    assert_eq!(from_child.config.name, "core");
}

#[test]
fn contains_walks_ancestors() {
    let root = Arc::new(Injector::builder().add_module(CoreModule).build().unwrap());
    let child = root.child().build().unwrap();

    assert!(child.contains(&Token::of::<Config>()));
    assert!(!child.provides(&Token::of::<Config>()));
    assert!(!child.contains(&Token::of::<Ping>()));
}

// ─────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn duplicate_unique_module_fails_build() {
    let result = Injector::builder()
        .add_module(CoreModule)
        .add_module(CoreModule)
        .build();

    match result {
        Err(InjectorError::DuplicateModule(name)) => {
            assert_eq!(name, ModuleId::of::<CoreModule>().type_name());
        }
        other => panic!("expected DuplicateModule, got {other:?}"),
    }
}

#[test]
fn repeatable_module_can_be_added_twice() {
    let result = Injector::builder()
        .add_module(RepeatableModule)
        .add_module(RepeatableModule)
        .build();
    assert!(result.is_ok());
}

// ─────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn mutual_dependency_is_a_cycle() {
    let injector = Injector::new([
        Provider::class::<Ping>(Token::of::<Ping>()),
        Provider::class::<Pong>(Token::of::<Pong>()),
    ]);

    let err = injector.get::<Ping>().err().unwrap();
    assert!(matches!(err, InjectorError::Cycle { .. }));
    assert_eq!(err.to_string().matches(" -> ").count(), 2);
}

#[test]
fn missing_dependency_reports_path() {
    let injector = Injector::new([Provider::class::<Service>(Token::of::<Service>())]);

    let err = injector.get::<Service>().err().unwrap();
    let message = err.to_string();
    assert!(message.contains("Config"));
    assert!(message.contains("Service"));
}

#[test]
fn construction_error_keeps_source() {
    let injector = Injector::new([Provider::class::<Broken>(Token::of::<Broken>())]);

    let err = injector.get::<Broken>().err().unwrap();
    let source = core::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("disk unavailable"));
    assert!(!injector.is_instantiated(&Token::of::<Broken>()));
}

proptest! {
    #[test]
    fn unique_tokens_are_distinct(labels in proptest::collection::vec("[a-z]{0,8}", 1..32)) {
        let tokens: Vec<Token> = labels.iter().map(|label| Token::unique(label.as_str())).collect();
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }
}
