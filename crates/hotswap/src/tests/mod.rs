//! Crate-level integration and BDD tests.

use std::path::Path;

use tempfile::TempDir;

use crate::loader::ModuleLoader;
use crate::runtime::{Client, Unit, UnitKind};

pub(crate) mod support;

#[test]
fn file_and_catalog_modules_share_one_runtime() {
    let dir = TempDir::new().expect("create temp dir");
    let file = dir.path().join("listener.toml");
    std::fs::write(
        &file,
        r#"
[[attribute]]
name = "listen"
capability = "loader"
units = [{ kind = "listener", name = "on-message" }]

[[attribute]]
name = "stop"
capability = "unloader"
units = [{ kind = "listener", name = "on-message" }]
"#,
    )
    .expect("write module");

    let mut loader = ModuleLoader::default();
    loader.catalog().define("ext.greeter", || {
        crate::source::parse_module(
            r#"
[[attribute]]
name = "setup"
capability = "loader"
units = [{ kind = "component", name = "greeter" }]

[[attribute]]
name = "teardown"
capability = "unloader"
units = [{ kind = "component", name = "greeter" }]
"#,
        )
        .map_err(Into::into)
    });
    let mut client = Client::new();

    loader
        .load_many([file.as_path()], &mut client)
        .expect("file module loads");
    loader
        .load_many(["ext.greeter"], &mut client)
        .expect("catalog module loads");

    assert_eq!(
        client.units(),
        [
            Unit::new(UnitKind::Listener, "on-message"),
            Unit::component("greeter"),
        ]
    );

    loader
        .unload_many([Path::new(&file)], &mut client)
        .expect("file module unloads");
    assert_eq!(client.units(), [Unit::component("greeter")]);
}
