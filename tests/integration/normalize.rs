use asset_deps::core::AssetDepsError;
use asset_deps::dependency::{DependencySpec, Descriptor};
use asset_deps::normalizer::{Normalized, Normalizer};
use asset_deps::registry::Registry;
use asset_deps::test_utils::{CallCounter, init_test_logging, text_type};

#[tokio::test]
async fn test_widget_end_to_end() {
    init_test_logging(None);
    let registry = Registry::new();
    registry.register_type("widget", text_type("hi")).unwrap();

    let deps = registry
        .normalize_dependencies(vec!["widget:thing".into()], "/dir", None)
        .await
        .unwrap();

    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].type_name(), "widget");
    assert_eq!(deps[0].path(), "thing");
    assert_eq!(deps[0].read_to_string().await.unwrap(), "hi");
}

#[tokio::test]
async fn test_prefixed_string_and_object_are_equivalent() {
    let registry = Registry::new();
    registry.register_type("pkg", text_type("")).unwrap();

    let deps = registry
        .normalize_dependencies(
            vec!["pkg:foo/bar".into(), DependencySpec::typed("pkg", "foo/bar").into()],
            "/dir",
            None,
        )
        .await
        .unwrap();

    for dep in &deps {
        assert_eq!(dep.type_name(), "pkg");
        assert_eq!(dep.path(), "foo/bar");
        assert_eq!(dep.key(), deps[0].key());
    }
}

#[tokio::test]
async fn test_empty_input_runs_no_normalizer() {
    let registry = Registry::new();
    let calls = CallCounter::new();
    let counter = calls.clone();
    registry.add_normalizer(Normalizer::new("count", move |_descriptor, _ctx| {
        counter.hit();
        Ok(Normalized::Unchanged)
    }));

    let deps = registry.normalize_dependencies(Vec::new(), "/dir", None).await.unwrap();
    assert!(deps.is_empty());
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_expansion_into_three_reruns_full_chain() {
    let registry = Registry::new();
    let seen = CallCounter::new();
    let counter = seen.clone();

    // Added first, so it runs after the expander
    registry.add_normalizer(Normalizer::new("count", move |_descriptor, _ctx| {
        counter.hit();
        Ok(Normalized::Unchanged)
    }));
    registry.add_normalizer(Normalizer::new_async("bundle", |descriptor, _ctx| async move {
        Ok(match descriptor {
            Descriptor::Path(path) if path == "bundle:core" => Normalized::Expanded(vec![
                "js:core/a.js".into(),
                "js:core/b.js".into(),
                "css:core/c.css".into(),
            ]),
            _ => Normalized::Unchanged,
        })
    }));

    let deps = registry
        .normalize_dependencies(vec!["bundle:core".into()], "/dir", None)
        .await
        .unwrap();

    let summary: Vec<(&str, &str)> = deps.iter().map(|d| (d.type_name(), d.path())).collect();
    assert_eq!(
        summary,
        vec![("js", "core/a.js"), ("js", "core/b.js"), ("css", "core/c.css")]
    );
    // The expanded element never reached "count"; each of the three did
    assert_eq!(seen.count(), 3);
}

#[tokio::test]
async fn test_order_is_preserved_around_expansion() {
    let registry = Registry::new();
    registry.add_normalizer(Normalizer::new("pair", |descriptor, _ctx| {
        Ok(match descriptor {
            Descriptor::Path(path) if path == "pair" => {
                Normalized::Expanded(vec!["x.js".into(), "y.js".into()])
            }
            _ => Normalized::Unchanged,
        })
    }));

    let deps = registry
        .normalize_dependencies(vec!["a.js".into(), "pair".into(), "b.js".into()], "/dir", None)
        .await
        .unwrap();

    let paths: Vec<&str> = deps.iter().map(|d| d.path()).collect();
    assert_eq!(paths, vec!["a.js", "x.js", "y.js", "b.js"]);
}

#[tokio::test]
async fn test_normalizer_error_returns_no_partial_result() {
    let registry = Registry::new();
    registry.add_normalizer(Normalizer::new_async("reject", |descriptor, _ctx| async move {
        if descriptor.path() == Some("broken.js") {
            anyhow::bail!("cannot resolve");
        }
        Ok(Normalized::Unchanged)
    }));

    let err = registry
        .normalize_dependencies(vec!["ok.js".into(), "broken.js".into()], "/dir", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AssetDepsError>(),
        Some(AssetDepsError::NormalizerFailed { .. })
    ));
    assert!(format!("{err:#}").contains("cannot resolve"));
}

#[tokio::test]
async fn test_unknown_type_aborts_run() {
    let registry = Registry::new();
    let err = registry
        .normalize_dependencies(vec!["a.js".into(), "nope:b".into()], "/dir", None)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("'nope'"));
    assert!(message.contains("css, dependencies, intersection, js, package, require"));
}

#[tokio::test]
async fn test_windows_drive_letter_is_not_a_type() {
    let registry = Registry::new();
    let deps = registry
        .normalize_dependencies(vec![r"C:\site\app.js".into()], "/dir", None)
        .await
        .unwrap();
    assert_eq!(deps[0].type_name(), "js");
    assert_eq!(deps[0].path(), r"C:\site\app.js");
}

#[tokio::test]
async fn test_nested_package_descriptors_normalize_in_turn() {
    let registry = Registry::new();
    let spec: DependencySpec =
        serde_json::from_str(r#"{"intersection": ["a.js", {"path": "b.css"}]}"#).unwrap();

    let deps = registry.normalize_dependencies(vec![spec.into()], "/dir", None).await.unwrap();
    let group = &deps[0];
    assert_eq!(group.type_name(), "intersection");
    assert!(group.is_package());

    let nested = registry
        .normalize_dependencies(group.dependencies().await.unwrap(), group.directory(), None)
        .await
        .unwrap();
    let types: Vec<&str> = nested.iter().map(|d| d.type_name()).collect();
    assert_eq!(types, vec!["js", "css"]);
}
