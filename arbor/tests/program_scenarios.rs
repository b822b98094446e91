//! End-to-end behaviour of programs built from command directories.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use arbor::{
    Capture, CommandProps, Component, ComponentRegistry, Error, FnComponent, MarkdownLoader,
    Program, ProgramOptions, Terminal,
};
use serde_json::{json, Value};
use tempfile::TempDir;

type Call = (String, Value, Vec<Value>);

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    fn component(&self, label: &'static str) -> Arc<dyn Component> {
        let calls = Arc::clone(&self.calls);
        Arc::new(FnComponent::new(move |props: &CommandProps| {
            calls.lock().unwrap().push((
                label.to_string(),
                Value::Object(props.options.clone()),
                props.args.clone(),
            ));
            Ok(format!("{label} ran"))
        }))
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn program(dir: &Path, recorder: &Recorder) -> (Program, Capture) {
    let mut registry = ComponentRegistry::new();
    for label in ["a", "b", "c", "d"] {
        registry.register(label, recorder.component(label));
    }
    let (terminal, capture) = Terminal::capture();
    let options = ProgramOptions::new(dir)
        .with_name("app")
        .with_version("1.2.3")
        .with_terminal(terminal)
        .with_loader(Arc::new(MarkdownLoader::with_components(registry)));
    (Program::new(options), capture)
}

/// Root `index` plus a `build` command requiring `--target`.
fn build_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.md", "---\ndescription: Demo program\ncomponent: a\n---\n");
    write(
        dir.path(),
        "build.md",
        "---\ndescription: Build the project\ncomponent: b\noptions:\n  type: object\n  properties:\n    target:\n      type: string\n      description: '__arbor_option_config__{\"description\":\"Target environment\",\"alias\":\"t\"}'\n  required: [target]\n---\n",
    );
    dir
}

/// `db/` with an index aliased `d` and a `migrate` subcommand.
fn db_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "db/index.md", "---\ndescription: Database tools\nalias: d\ncomponent: c\n---\n");
    write(dir.path(), "db/migrate.md", "---\ndescription: Run migrations\ncomponent: d\n---\n");
    dir
}

#[tokio::test]
async fn test_bare_invocation_runs_root_index() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    program.run(["app"]).await.unwrap();

    assert_eq!(recorder.calls(), vec![("a".to_string(), json!({}), vec![])]);
    assert_eq!(capture.stdout(), "a ran\n");
}

#[tokio::test]
async fn test_build_with_target() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "build", "--target", "prod"]).await.unwrap();

    assert_eq!(
        recorder.calls(),
        vec![("b".to_string(), json!({"target": "prod"}), vec![])]
    );
}

#[tokio::test]
async fn test_embedded_alias_is_accepted() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "build", "-t", "staging"]).await.unwrap();

    assert_eq!(recorder.calls()[0].1, json!({"target": "staging"}));
}

#[tokio::test]
async fn test_build_without_target_fails_validation() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "build"]).await.unwrap_err();

    assert!(matches!(error, Error::Validation(_)));
    assert_eq!(error.exit_code(), 1);
    assert!(recorder.calls().is_empty());
    let stderr = capture.stderr();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(stderr.contains("target"), "{stderr}");
    assert_eq!(capture.stdout(), "");
}

#[tokio::test]
async fn test_help_lists_commands_with_decoded_descriptions() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    program.run(["app", "--help"]).await.unwrap();
    let help = capture.stdout();
    assert!(help.contains("Demo program"), "{help}");
    assert!(help.contains("build"), "{help}");
    assert!(help.contains("Show help for command"), "{help}");
    assert!(help.contains("Show version number"), "{help}");

    program.run(["app", "help", "build"]).await.unwrap();
    let help = capture.stdout();
    assert!(help.contains("Target environment"), "{help}");
    assert!(!help.contains("__arbor_option_config__"), "{help}");
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_version_flag() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    program.run(["app", "-v"]).await.unwrap();
    assert!(capture.stdout().contains("1.2.3"));
}

#[tokio::test]
async fn test_unknown_flag_is_a_usage_error() {
    let dir = build_fixture();
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "build", "--nope"]).await.unwrap_err();
    assert!(matches!(error, Error::Usage(_)));
    assert_eq!(error.exit_code(), 2);
    assert!(error.is_reported());
    assert!(capture.stderr().contains("--nope"));
}

#[tokio::test]
async fn test_directory_index_is_runnable_group() {
    let dir = db_fixture();
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "db"]).await.unwrap();
    program.run(["app", "db", "migrate"]).await.unwrap();
    program.run(["app", "d"]).await.unwrap();
    program.run(["app", "d", "migrate"]).await.unwrap();

    let labels: Vec<_> = recorder.calls().into_iter().map(|call| call.0).collect();
    assert_eq!(labels, ["c", "d", "c", "d"]);
}

#[tokio::test]
async fn test_group_without_handler_shows_help_and_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "cache/clear.md", "---\ndescription: Clear the cache\n---\ncleared");
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "cache"]).await.unwrap_err();

    assert!(matches!(error, Error::MissingSubcommand { ref path } if path == "cache"));
    assert_eq!(error.exit_code(), 1);
    assert!(capture.stderr().contains("Clear the cache"));
}

#[tokio::test]
async fn test_default_child_runs_for_bare_group() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "repo/status.md", "---\nisDefault: true\ncomponent: c\n---\n");
    write(dir.path(), "repo/log.md", "---\ncomponent: d\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "repo"]).await.unwrap();
    program.run(["app", "repo", "log"]).await.unwrap();

    let labels: Vec<_> = recorder.calls().into_iter().map(|call| call.0).collect();
    assert_eq!(labels, ["c", "d"]);
}

#[tokio::test]
async fn test_default_child_wins_over_root_index() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.md", "---\ncomponent: a\n---\n");
    write(dir.path(), "status.md", "---\nisDefault: true\ncomponent: b\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app"]).await.unwrap();

    assert_eq!(recorder.calls(), vec![("b".to_string(), json!({}), vec![])]);
}

#[tokio::test]
async fn test_default_child_wins_over_group_index() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "db/index.md", "---\ncomponent: c\n---\n");
    write(dir.path(), "db/migrate.md", "---\nisDefault: true\ncomponent: d\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "db"]).await.unwrap();

    let labels: Vec<_> = recorder.calls().into_iter().map(|call| call.0).collect();
    assert_eq!(labels, ["d"]);
}

#[tokio::test]
async fn test_inert_command_does_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "notes.md", "---\ndescription: Just notes\n---\n");
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    program.run(["app", "notes"]).await.unwrap();

    assert_eq!(capture.stdout(), "");
    assert_eq!(capture.stderr(), "");
}

#[tokio::test]
async fn test_alias_clash_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "deploy.md", "---\nalias: d\ncomponent: a\n---\n");
    write(dir.path(), "d.md", "---\ncomponent: b\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "d"]).await.unwrap_err();

    assert!(matches!(error, Error::DuplicateCommand { ref name, .. } if name == "d"));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_help_alias_is_reserved() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "guide.md", "---\nalias: help\ncomponent: a\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "guide"]).await.unwrap_err();

    assert!(matches!(error, Error::ReservedName { ref name, .. } if name == "help"));
}

#[tokio::test]
async fn test_variadic_arguments_are_flattened() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "lint.md",
        "---\ncomponent: b\nargs:\n  type: array\n  prefixItems:\n    - type: string\n      x-cli: {name: mode}\n    - type: array\n      items: {type: string}\n      x-cli: {name: files}\n  minItems: 1\n---\n",
    );
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    program.run(["app", "lint", "strict", "a.rs", "b.rs"]).await.unwrap();

    assert_eq!(
        recorder.calls()[0].2,
        vec![json!("strict"), json!("a.rs"), json!("b.rs")]
    );
}

#[tokio::test]
async fn test_missing_required_argument_fails_validation() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "lint.md",
        "---\ncomponent: b\nargs:\n  type: array\n  prefixItems:\n    - type: string\n  minItems: 1\n---\n",
    );
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "lint"]).await.unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
}

#[tokio::test]
async fn test_templates_render_through_custom_app() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "_app.md", "[{{ app.name }}] {{ content }}");
    write(
        dir.path(),
        "greet.md",
        "---\noptions:\n  type: object\n  properties:\n    name:\n      type: string\n      default: world\n---\nhello {{ options.name }}",
    );
    let recorder = Recorder::default();
    let (program, capture) = program(dir.path(), &recorder);

    program.run(["app", "greet"]).await.unwrap();
    program.run(["app", "greet", "--name", "arbor"]).await.unwrap();

    assert_eq!(capture.stdout(), "[app] hello world\n[app] hello arbor\n");
}

#[tokio::test]
async fn test_name_and_version_from_package_manifest() {
    let project = TempDir::new().unwrap();
    write(
        project.path(),
        "Cargo.toml",
        "[package]\nname = \"deployer\"\nversion = \"0.4.0\"\ndescription = \"Ship it\"\n",
    );
    write(project.path(), "commands/ping.md", "pong");
    let (terminal, capture) = Terminal::capture();
    let program = Program::new(
        ProgramOptions::new(project.path().join("commands")).with_terminal(terminal),
    );

    let cli = program.build(Some("ignored")).await.unwrap();
    assert_eq!(cli.app().name(), "deployer");
    assert_eq!(cli.app().version(), Some("0.4.0"));
    assert_eq!(cli.app().description(), "Ship it");

    program.run(["deployer", "--version"]).await.unwrap();
    assert!(capture.stdout().contains("0.4.0"));
}

#[tokio::test]
async fn test_discovery_errors_are_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.md", "fine");
    write(dir.path(), "broken.md", "---\ndescription: [oops\n---\n");
    let recorder = Recorder::default();
    let (program, _capture) = program(dir.path(), &recorder);

    let error = program.run(["app", "ok"]).await.unwrap_err();
    assert!(matches!(error, Error::Module { .. }));
    assert!(!error.is_reported());
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_config_is_visible_to_templates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "where.md", "region={{ app.config.region }}");
    let (terminal, capture) = Terminal::capture();
    let mut config = serde_json::Map::new();
    config.insert("region".into(), json!("eu-west-1"));
    let program = Program::new(
        ProgramOptions::new(dir.path())
            .with_name("app")
            .with_config(config)
            .with_terminal(terminal),
    );

    program.run(["app", "where"]).await.unwrap();
    assert_eq!(capture.stdout(), "region=eu-west-1\n");
}
