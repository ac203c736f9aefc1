use asset_deps::dependency::DependencySpec;
use asset_deps::registry::Registry;
use asset_deps::test_utils::TestProject;

fn project() -> TestProject {
    TestProject::builder()
        .with_files(&[
            ("js/a.js", "a"),
            ("js/b.js", "b"),
            ("js/vendor/c.js", "c"),
            ("css/site.css", "body {}"),
        ])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_glob_expands_before_typing() {
    let project = project();
    let registry = Registry::new();

    let deps = registry
        .normalize_dependencies(vec!["js/*.js".into(), "css/*.css".into()], project.path(), None)
        .await
        .unwrap();

    let summary: Vec<(&str, &str)> = deps.iter().map(|d| (d.type_name(), d.path())).collect();
    assert_eq!(summary, vec![("js", "js/a.js"), ("js", "js/b.js"), ("css", "css/site.css")]);
    assert_eq!(deps[0].read_to_string().await.unwrap(), "a");
}

#[tokio::test]
async fn test_recursive_glob_keeps_prefix_and_fields() {
    let project = project();
    let registry = Registry::new();
    let spec = DependencySpec::default()
        .with_path("css:js/**/*.js")
        .with_property("media", serde_json::json!("print"));

    let deps = registry.normalize_dependencies(vec![spec.into()], project.path(), None).await.unwrap();

    assert_eq!(deps.len(), 3);
    for dep in &deps {
        assert_eq!(dep.type_name(), "css");
        assert_eq!(dep.property("media"), Some(&serde_json::json!("print")));
    }
    assert_eq!(deps[2].path(), "js/vendor/c.js");
}

#[tokio::test]
async fn test_unmatched_glob_disappears() {
    let project = project();
    let registry = Registry::new();

    let deps = registry
        .normalize_dependencies(vec!["js/*.coffee".into(), "js/a.js".into()], project.path(), None)
        .await
        .unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].path(), "js/a.js");
}

#[tokio::test]
async fn test_bracketed_file_names_survive_expansion() {
    let project = TestProject::builder()
        .with_files(&[("pages/[id].js", "dynamic"), ("pages/main.js", "main"), ("lib.js", "lib")])
        .build()
        .unwrap();
    let registry = Registry::new();

    let deps = registry
        .normalize_dependencies(vec!["pages/*.js".into()], project.path(), None)
        .await
        .unwrap();
    let paths: Vec<&str> = deps.iter().map(|d| d.path()).collect();
    assert_eq!(paths, vec!["pages/[id].js", "pages/main.js"]);
    assert_eq!(deps[0].read_to_string().await.unwrap(), "dynamic");

    let deps = registry
        .normalize_dependencies(
            vec!["pages/[id].js".into(), "js:lib.js?v=2".into()],
            project.path(),
            None,
        )
        .await
        .unwrap();
    let summary: Vec<(&str, &str)> = deps.iter().map(|d| (d.type_name(), d.path())).collect();
    assert_eq!(summary, vec![("js", "pages/[id].js"), ("js", "lib.js?v=2")]);
}
