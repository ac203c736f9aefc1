use assert_cmd::Command;
use asset_deps::test_utils::TestProject;
use predicates::prelude::*;

fn asset_deps() -> Command {
    let mut cmd = Command::cargo_bin("asset-deps").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_normalize_prints_types_and_paths() {
    let project = TestProject::builder()
        .with_files(&[("js/a.js", ""), ("js/b.js", "")])
        .build()
        .unwrap();

    asset_deps()
        .current_dir(project.path())
        .args(["--quiet", "normalize", "js/*.js", "css:theme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("js/a.js"))
        .stdout(predicate::str::contains("js/b.js"))
        .stdout(predicate::str::contains("theme"));
}

#[test]
fn test_normalize_json_output() {
    let project = TestProject::builder().build().unwrap();

    let output = asset_deps()
        .current_dir(project.path())
        .args(["normalize", "--json", r#"{"package": "widgets"}"#])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["type"], "package");
    assert_eq!(parsed[0]["path"], "widgets");
}

#[test]
fn test_unknown_type_fails_with_suggestion() {
    let project = TestProject::builder().build().unwrap();

    asset_deps()
        .current_dir(project.path())
        .args(["normalize", "jss:app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported dependency type 'jss'"))
        .stderr(predicate::str::contains("Did you mean 'js'?"));
}

#[test]
fn test_config_file_adds_extensions() {
    let project = TestProject::builder()
        .with_config("[extensions]\njsx = \"js\"\n")
        .build()
        .unwrap();

    asset_deps()
        .current_dir(project.path())
        .args(["type-for", "App.jsx", "README"])
        .assert()
        .success()
        .stdout(predicate::str::contains("App.jsx  js"))
        .stdout(predicate::str::contains("README  -"));
}

#[test]
fn test_explicit_config_path() {
    let project = TestProject::builder().build().unwrap();
    let config = project
        .write("settings/deps.toml", "[require]\ninnate-extensions = [\".mjs\"]\n")
        .unwrap();

    asset_deps()
        .arg("--config")
        .arg(&config)
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains(".mjs"))
        .stdout(predicate::str::contains(".json").not());
}

#[test]
fn test_invalid_config_is_reported() {
    let project = TestProject::builder().with_config("[glob]\nenabled = 3\n").build().unwrap();

    asset_deps()
        .current_dir(project.path())
        .arg("types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration file"));
}
