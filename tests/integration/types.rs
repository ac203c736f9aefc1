use asset_deps::constants::UNKNOWN_LAST_MODIFIED;
use asset_deps::core::AssetDepsError;
use asset_deps::dependency::DependencySpec;
use asset_deps::registry::Registry;
use asset_deps::test_utils::{TestProject, text_type};
use asset_deps::types::{Content, ContentKind, TypeBundle};
use futures::StreamExt;
use futures::stream;

#[test]
fn test_longest_suffix_wins() {
    let registry = Registry::new();
    registry.register_extension("js", "X");
    registry.register_extension("8.3.js", "Y");

    assert_eq!(registry.type_for_path("jquery-1.8.3.js").as_deref(), Some("Y"));
    assert_eq!(registry.type_for_path("a.js").as_deref(), Some("X"));
}

#[test]
fn test_package_bundles_cannot_be_readable() {
    let registry = Registry::new();
    let readers = [
        TypeBundle::new().read(|_dep| async { Ok(String::new()) }),
        TypeBundle::new().create_read_stream(|_dep| Ok(stream::empty().boxed())),
    ];

    for bundle in readers {
        let err = registry.register_package_type("group", bundle).unwrap_err();
        assert!(matches!(err, AssetDepsError::ConfigurationError { .. }));
    }
    assert!(registry.get_type("group").is_none());
}

#[test]
fn test_create_dependency_with_unknown_type_lists_types() {
    let registry = Registry::new();
    let err = registry
        .create_dependency(DependencySpec::default().with_type("unknown"), "/dir", None)
        .unwrap_err();

    assert!(err.to_string().contains("Registered types: css, dependencies"));
}

#[test]
fn test_kind_helpers_tag_content() {
    let registry = Registry::new();
    registry.register_javascript_type("coffee", text_type("")).unwrap();
    registry.register_stylesheet_type("less", text_type("")).unwrap();

    assert_eq!(registry.get_type("coffee").unwrap().kind(), ContentKind::Script);
    assert_eq!(registry.get_type("less").unwrap().kind(), ContentKind::Stylesheet);
}

#[tokio::test]
async fn test_streamed_type_reads_all_chunks() {
    let registry = Registry::new();
    registry
        .register_type(
            "parts",
            TypeBundle::new().create_read_stream(|dep| {
                let name = dep.path().to_string();
                Ok(stream::iter(vec![
                    Ok(Content::Text(format!("/* {name} */\n"))),
                    Ok(Content::Text("body".to_string())),
                ])
                .boxed())
            }),
        )
        .unwrap();

    let deps = registry
        .normalize_dependencies(vec!["parts:x".into()], "/dir", None)
        .await
        .unwrap();
    assert_eq!(deps[0].read_to_string().await.unwrap(), "/* x */\nbody");
}

#[tokio::test]
async fn test_resource_transform_type_reads_and_transforms() {
    let project = TestProject::builder()
        .with_file("ui/button.tpl", "<button>{{label}}</button>")
        .build()
        .unwrap();
    let registry = Registry::new();
    registry
        .register_javascript_type(
            "tpl",
            Registry::create_resource_transform_type(|source: String| async move {
                Ok(format!("export default {};", serde_json::to_string(&source)?))
            }),
        )
        .unwrap();
    registry.register_extension("tpl", "tpl");

    let deps = registry
        .normalize_dependencies(vec!["ui/button.tpl".into()], project.path(), None)
        .await
        .unwrap();

    assert_eq!(deps[0].content_kind(), ContentKind::Script);
    assert_eq!(
        deps[0].read_to_string().await.unwrap(),
        r#"export default "<button>{{label}}</button>";"#
    );
    assert!(deps[0].last_modified().await.unwrap() > 0);
}

#[tokio::test]
async fn test_custom_key_and_last_modified() {
    let registry = Registry::new();
    registry
        .register_type(
            "remote",
            text_type("x")
                .calculate_key(|dep| format!("remote/{}", dep.path()))
                .get_last_modified(|_dep| async { Ok(42) }),
        )
        .unwrap();

    let dep = registry
        .create_dependency(DependencySpec::typed("remote", "lib"), "/dir", None)
        .unwrap();
    assert_eq!(dep.key(), "remote/lib");
    assert_eq!(dep.last_modified().await.unwrap(), 42);
}

#[tokio::test]
async fn test_package_defaults() {
    let registry = Registry::new();
    let deps = registry
        .normalize_dependencies(
            vec![DependencySpec {
                package: Some("node_modules/ui".to_string()),
                dependencies: Some(vec!["ui.js".into()]),
                ..DependencySpec::default()
            }
            .into()],
            "/site",
            None,
        )
        .await
        .unwrap();

    let package = &deps[0];
    assert_eq!(package.type_name(), "package");
    assert_eq!(package.path(), "node_modules/ui");
    assert_eq!(package.last_modified().await.unwrap(), UNKNOWN_LAST_MODIFIED);
    assert_eq!(package.dependencies().await.unwrap().len(), 1);
    assert!(package.read_stream().is_err());
}
