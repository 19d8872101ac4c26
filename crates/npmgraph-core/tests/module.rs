use npmgraph_core::manifest::PackageManifest;
use npmgraph_core::module::{parse_key, Module};
use npmgraph_core::scope::{PackageScope, ScopeFilter};

#[test]
fn module_from_registry_manifest() {
    let manifest: PackageManifest = serde_json::from_str(
        r#"{ "name": "@scope/pkg", "version": "2.0.0", "peerDependencies": { "react": ">=16" } }"#,
    )
    .unwrap();
    let module = Module::from_manifest(manifest);
    assert_eq!(module.key(), "@scope/pkg@2.0.0");
    assert_eq!(module.manifest.all_dependencies()["react"], ">=16");

    let (name, version) = parse_key(module.key()).unwrap();
    assert_eq!(name, module.name());
    assert_eq!(version, Some(module.version()));
}

#[test]
fn stub_modules_are_still_scoped_by_name() {
    let scope = PackageScope::all(Vec::new());
    let stub = Module::stub("@private/missing", Some("^1.0.0"));
    assert!(stub.is_stub());
    assert_eq!(stub.key(), "@private/missing@^1.0.0");
    assert!(scope.is_in_scope(&stub));
}
