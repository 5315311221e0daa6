//! Unit tests for the module loader facade.

use std::path::PathBuf;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::error::ImportError;
use crate::namespace::Module;
use crate::runtime::{Client, Unit};
use crate::tests::support::CallLog;

const GREETER_V1: &str = r#"
[[attribute]]
name = "load"
capability = "loader"
units = [{ kind = "component", name = "greeter" }]

[[attribute]]
name = "unload"
capability = "unloader"
units = [{ kind = "component", name = "greeter" }]
"#;

const GREETER_V2: &str = r#"
[[attribute]]
name = "load"
capability = "loader"
units = [{ kind = "component", name = "greeter-v2" }]

[[attribute]]
name = "unload"
capability = "unloader"
units = [{ kind = "component", name = "greeter-v2" }]
"#;

#[fixture]
fn log() -> CallLog {
    CallLog::default()
}

fn catalog_loader(log: &CallLog, names: &[&str]) -> ModuleLoader {
    let loader = ModuleLoader::default();
    for name in names {
        let module_log = log.clone();
        let tag = (*name).to_owned();
        loader
            .catalog()
            .define(*name, move || Ok(module_log.paired_module(&tag)));
    }
    loader
}

#[test]
fn specs_convert_by_type() {
    let expected_name = ModuleSpec::Name("ext.greeter".into());
    let expected_path = ModuleSpec::Path("greeter.toml".into());

    assert_eq!(ModuleSpec::from("ext.greeter"), expected_name);
    assert_eq!(ModuleSpec::from(String::from("ext.greeter")), expected_name);
    assert_eq!(ModuleSpec::from(PathBuf::from("greeter.toml")), expected_path);
    assert_eq!(ModuleSpec::from(Path::new("greeter.toml")), expected_path);
    assert_eq!(expected_name.to_string(), "ext.greeter");
}

#[rstest]
fn batch_runs_in_order(log: CallLog) {
    let mut loader = catalog_loader(&log, &["ext.a", "ext.b"]);
    let mut client = Client::new();

    loader
        .load_many(["ext.b", "ext.a"], &mut client)
        .expect("batch loads");

    assert_eq!(log.entries(), ["load:ext.b", "load:ext.a"]);
}

#[rstest]
fn batch_stops_at_first_failure(log: CallLog) {
    let mut loader = catalog_loader(&log, &["ext.a", "ext.c"]);
    let mut client = Client::new();

    let err = loader
        .load_many(["ext.a", "ext.missing", "ext.c"], &mut client)
        .expect_err("missing module stops the batch");

    assert_eq!(err.identity(), "ext.missing");
    assert!(loader.is_loaded(&"ext.a".into()));
    assert!(!loader.is_loaded(&"ext.c".into()));
    assert_eq!(log.entries(), ["load:ext.a"]);
}

#[rstest]
fn reload_and_unload_batches_use_catalog(log: CallLog) {
    let mut loader = catalog_loader(&log, &["ext.a"]);
    let mut client = Client::new();

    loader.load_many(["ext.a"], &mut client).expect("load");
    loader.reload_many(["ext.a"], &mut client).expect("reload");
    loader.unload_many(["ext.a"], &mut client).expect("unload");

    assert_eq!(
        log.entries(),
        ["load:ext.a", "unload:ext.a", "load:ext.a", "unload:ext.a"]
    );
    assert!(loader.named_modules().table().is_empty());
}

#[test]
fn path_modules_register_units_with_client() {
    let dir = TempDir::new().expect("create temp dir");
    let file = dir.path().join("greeter.toml");
    std::fs::write(&file, GREETER_V1).expect("write module");
    let mut loader = ModuleLoader::default();
    let mut client = Client::new();

    loader.load_many([&file], &mut client).expect("load");
    assert_eq!(client.units(), [Unit::component("greeter")]);

    std::fs::write(&file, GREETER_V2).expect("rewrite module");
    loader.reload_many([&file], &mut client).expect("reload");
    assert_eq!(client.units(), [Unit::component("greeter-v2")]);

    loader.unload_many([&file], &mut client).expect("unload");
    assert!(client.units().is_empty());
    assert!(loader.path_modules().table().is_empty());
}

#[rstest]
#[case::current_dir(&["."])]
#[case::parent_dir(&["sub", ".."])]
#[case::nested_parent_dirs(&["sub", "deeper", "..", ".."])]
fn path_spelling_does_not_change_identity(#[case] detour: &[&str]) {
    let dir = TempDir::new().expect("create temp dir");
    std::fs::create_dir_all(dir.path().join("sub").join("deeper")).expect("create subdirectories");
    let file = dir.path().join("greeter.toml");
    std::fs::write(&file, GREETER_V1).expect("write module");
    let mut respelled = dir.path().to_path_buf();
    respelled.extend(detour);
    respelled.push("greeter.toml");
    let mut loader = ModuleLoader::default();
    let mut client = Client::new();

    loader.load_many([&file], &mut client).expect("load");

    assert!(loader.is_loaded(&ModuleSpec::from(respelled.clone())));
    let err = loader
        .load_many([respelled], &mut client)
        .expect_err("same file is already loaded");
    assert!(matches!(err, ModuleError::StateConflict { .. }), "got {err:?}");
    assert_eq!(loader.path_modules().table().len(), 1);
    assert_eq!(client.units(), [Unit::component("greeter")]);
}

#[cfg(unix)]
#[test]
fn symlinked_module_shares_identity_with_target() {
    let dir = TempDir::new().expect("create temp dir");
    let file = dir.path().join("greeter.toml");
    std::fs::write(&file, GREETER_V1).expect("write module");
    let link = dir.path().join("alias.toml");
    std::os::unix::fs::symlink(&file, &link).expect("create symlink");
    let mut loader = ModuleLoader::default();
    let mut client = Client::new();

    loader.load_many([&link], &mut client).expect("load through link");
    let err = loader
        .load_many([&file], &mut client)
        .expect_err("target is already loaded");

    assert!(matches!(err, ModuleError::StateConflict { .. }), "got {err:?}");
    loader.unload_many([&file], &mut client).expect("unload by target");
    assert!(client.units().is_empty());
}

#[test]
fn names_never_resolve_to_files() {
    let dir = TempDir::new().expect("create temp dir");
    let file = dir.path().join("greeter.toml");
    std::fs::write(&file, GREETER_V1).expect("write module");
    let mut loader = ModuleLoader::default();
    let mut client = Client::new();

    let as_name = file.display().to_string();
    let err = loader
        .load_many([as_name], &mut client)
        .expect_err("a name is looked up in the catalog");

    let ModuleError::FailedLoad { source, .. } = &err else {
        panic!("expected failed load, got {err:?}");
    };
    assert!(matches!(
        source.downcast_ref::<ImportError>(),
        Some(ImportError::UnitNotFound { .. })
    ));
    assert!(client.units().is_empty());
}

#[test]
fn catalog_module_is_shared_with_loader() {
    let catalog = Arc::new(ModuleCatalog::new());
    let loader = ModuleLoader::new(PathStrategy::default(), Arc::clone(&catalog));
    catalog.define("ext.shared", || Ok(Module::default()));

    assert!(Arc::ptr_eq(loader.catalog(), &catalog));
}

#[rstest]
#[tokio::test]
async fn async_batches_match_sync_behaviour(log: CallLog) {
    let mut loader = catalog_loader(&log, &["ext.a", "ext.b"]);
    let mut client = Client::new();

    loader
        .load_many_async(["ext.a", "ext.b"], &mut client)
        .await
        .expect("async load");
    loader
        .reload_many_async(["ext.b"], &mut client)
        .await
        .expect("async reload");
    loader
        .unload_many_async(["ext.a", "ext.b"], &mut client)
        .await
        .expect("async unload");

    assert_eq!(
        log.entries(),
        [
            "load:ext.a",
            "load:ext.b",
            "unload:ext.b",
            "load:ext.b",
            "unload:ext.a",
            "unload:ext.b",
        ]
    );
}
