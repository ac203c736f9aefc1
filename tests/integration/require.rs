use asset_deps::constants::UNKNOWN_LAST_MODIFIED;
use asset_deps::core::AsyncValue;
use asset_deps::dependency::DependencyContext;
use asset_deps::registry::Registry;
use asset_deps::require::RequireExtensionOptions;
use asset_deps::test_utils::{CallCounter, TestProject, counting_require_options};
use asset_deps::types::Content;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_separate_handlers_never_share_memoization() {
    let registry = Registry::new();
    let calls = CallCounter::new();
    registry
        .register_require_extension("less", counting_require_options("x", 1_000, &calls))
        .unwrap();
    let ctx = DependencyContext::new("/site");

    let first = registry.get_require_handler("/site/theme.less", &ctx).unwrap();
    let second = registry.get_require_handler("/site/theme.less", &ctx).unwrap();

    assert_eq!(first.last_modified().await.unwrap(), 1_000);
    assert_eq!(first.last_modified().await.unwrap(), 1_000);
    assert_eq!(calls.count(), 1);

    assert_eq!(second.last_modified().await.unwrap(), 1_000);
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn test_concurrent_consumers_share_one_computation() {
    let registry = Registry::new();
    let calls = CallCounter::new();
    registry
        .register_require_extension("less", counting_require_options("x", 7, &calls))
        .unwrap();
    let handler = registry
        .get_require_handler("/site/a.less", &DependencyContext::new("/site"))
        .unwrap();

    let mut callbacks = Vec::new();
    for _ in 0..5 {
        let (tx, rx) = oneshot::channel();
        handler.on_last_modified(move |outcome| {
            let _ = tx.send(outcome.map_err(|e| e.to_string()));
        });
        callbacks.push(rx);
    }
    let awaited = join_all((0..5).map(|_| handler.last_modified())).await;

    for outcome in awaited {
        assert_eq!(outcome.unwrap(), 7);
    }
    for rx in callbacks {
        assert_eq!(rx.await.unwrap(), Ok(7));
    }
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_object_mode_extension() {
    let project = TestProject::builder().with_file("data/site.json5", "{}").build().unwrap();
    let registry = Registry::new();
    registry
        .register_require_extension(
            "json5",
            RequireExtensionOptions::new()
                .object(true)
                .read(|_path, _ctx| async { Ok(Content::Object(serde_json::json!({"title": "Home"}))) }),
        )
        .unwrap();

    let handler = registry
        .get_require_handler(project.join("data/site.json5"), &DependencyContext::new(project.path()))
        .unwrap();
    assert!(handler.is_object());
    assert!(handler.last_modified().await.unwrap() > 0);

    let deps = registry
        .normalize_dependencies(vec!["require:data/site.json5".into()], project.path(), None)
        .await
        .unwrap();
    assert_eq!(deps[0].read_to_string().await.unwrap(), r#"{"title":"Home"}"#);
}

#[tokio::test]
async fn test_require_type_round_trip() {
    let registry = Registry::new();
    registry
        .register_require_type(
            "yaml",
            RequireExtensionOptions::new()
                .read(|path, _ctx| {
                    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                    async move { Ok(Content::Text(format!("# {}", name.unwrap_or_default()))) }
                }),
        )
        .unwrap();

    assert_eq!(&*registry.get_require_extension_names(), &[".js", ".json", ".yaml"].map(String::from));

    let deps = registry
        .normalize_dependencies(vec!["config/app.yaml".into()], "/site", None)
        .await
        .unwrap();
    let nested = deps[0].dependencies().await.unwrap();
    let leaf = nested[0].as_instance().unwrap();

    assert_eq!(leaf.type_name(), "require");
    assert_eq!(leaf.read_to_string().await.unwrap(), "# app.yaml");
    assert_eq!(leaf.last_modified().await.unwrap(), UNKNOWN_LAST_MODIFIED);
}

#[tokio::test]
async fn test_missing_require_extension() {
    let registry = Registry::new();
    let ctx = DependencyContext::new("/site");
    assert!(registry.get_require_handler("/site/Makefile", &ctx).is_none());
    assert!(registry.get_require_handler("/site/a.toml", &ctx).is_none());

    let deps = registry
        .normalize_dependencies(vec!["require:a.toml".into()], "/site", None)
        .await
        .unwrap();
    assert!(deps[0].read_stream().is_err());
}

#[tokio::test]
async fn test_async_value_first_settlement_wins() {
    let value: AsyncValue<i64, String> = AsyncValue::new();
    let early = value.subscribe();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    value.done(move |outcome| log.lock().unwrap().push(outcome));

    assert!(value.resolve(1));
    assert!(!value.resolve(2));
    assert!(!value.reject("late".to_string()));

    let late = value.subscribe();
    assert_eq!(early.await.unwrap(), Ok(1));
    assert_eq!(late.await.unwrap(), Ok(1));
    assert_eq!(*seen.lock().unwrap(), vec![Ok(1)]);
}
