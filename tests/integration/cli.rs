//! The `vlx` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use vlx_view::test_utils::ViewTree;

/// `vlx` run from the tree's root with its view and cache roots, isolated from
/// any user-wide config.
fn vlx(tree: &ViewTree) -> Command {
    let mut cmd = Command::cargo_bin("vlx").unwrap();
    cmd.current_dir(tree.root())
        .env("XDG_CONFIG_HOME", tree.root().join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--views")
        .arg(tree.views())
        .arg("--cache")
        .arg(tree.cache());
    cmd
}

#[test]
fn test_render_with_set_values() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<h1>@yield('title', 'Site')</h1>@yield('content')").unwrap();
    tree.write("welcome", "@extends('layouts.app')@section('content')Hi {{ user.name }} ({{ user.age }})@endsection")
        .unwrap();

    vlx(&tree)
        .args(["render", "welcome", "--set", "user.name=<Ada>", "--set", "user.age=36"])
        .assert()
        .success()
        .stdout("<h1>Site</h1>Hi &lt;Ada&gt; (36)");
}

#[test]
fn test_render_data_file_to_output() {
    let tree = ViewTree::new().unwrap();
    tree.write("list", "@foreach(i in items){{ i }};@endforeach").unwrap();
    fs::write(tree.root().join("data.json"), r#"{"items": [1, 2, 3]}"#).unwrap();
    let out = tree.root().join("out.html");

    vlx(&tree)
        .args(["render", "list", "--data", "data.json", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(&out).unwrap(), "1;2;3;");
}

#[test]
fn test_render_missing_view_fails() {
    let tree = ViewTree::new().unwrap();
    vlx(&tree)
        .args(["render", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("View [nope] not found"));
}

#[test]
fn test_render_unbound_variable_fails() {
    let tree = ViewTree::new().unwrap();
    tree.write("profile", "{{ user.nme }}").unwrap();
    vlx(&tree)
        .args(["render", "profile", "--set", "user.name=Ada"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user.nme").and(predicate::str::contains("user.name")));
}

#[test]
fn test_exists() {
    let tree = ViewTree::new().unwrap();
    tree.write("auth.login", "<form/>").unwrap();

    vlx(&tree)
        .args(["exists", "auth.login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auth.login ->").and(predicate::str::contains("login.vlx.html")));

    vlx(&tree).args(["exists", "auth.logout"]).assert().failure().code(1);
}

#[test]
fn test_compile_show_prints_host_template() {
    let tree = ViewTree::new().unwrap();
    tree.write("cond", "@if(a)<b>{{ a }}</b>@endif").unwrap();
    vlx(&tree)
        .args(["compile", "cond", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{% if a %}<b>{{ escape_html(value=a) }}</b>{% endif %}"));
}

#[test]
fn test_compile_all_then_cache_list_and_clear() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "@yield('content')").unwrap();
    tree.write("home", "@extends('layouts.app')@section('content')x@endsection").unwrap();
    tree.write("about", "about").unwrap();

    vlx(&tree)
        .args(["compile", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 3 view(s)"));

    vlx(&tree)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("home")
                .and(predicate::str::contains("about"))
                .and(predicate::str::contains("(2 template(s))")),
        );

    vlx(&tree)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 removed"));

    vlx(&tree).args(["cache"]).assert().success().stdout(predicate::str::contains("No compiled views cached"));
}

#[test]
fn test_compile_all_reports_failures() {
    let tree = ViewTree::new().unwrap();
    tree.write("good", "ok").unwrap();
    tree.write("bad", "@if(x").unwrap();

    vlx(&tree)
        .args(["compile", "--all"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("✓ good").and(predicate::str::contains("✗ bad")))
        .stderr(predicate::str::contains("1 of 2 view(s) failed to compile"));
}

#[test]
fn test_no_cache_flag_leaves_cache_dir_untouched() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "x").unwrap();
    vlx(&tree).args(["--no-cache", "render", "home"]).assert().success().stdout("x");
    assert!(!tree.cache().exists());
}

#[test]
fn test_debug_flag_recompiles_edits() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "one").unwrap();
    vlx(&tree).args(["render", "home"]).assert().success().stdout("one");

    tree.write("home", "two").unwrap();
    vlx(&tree).args(["--debug", "render", "home"]).assert().success().stdout("two");
}

#[test]
fn test_config_show_reflects_project_file() {
    let tree = ViewTree::new().unwrap();
    tree.write_config("extension = \".tpl\"\n\n[ambient]\napp_name = \"Velocix\"\n").unwrap();
    fs::write(tree.views().join("home.tpl"), "{{ app_name }}").unwrap();

    vlx(&tree)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("extension = \".tpl\"").and(predicate::str::contains("app_name = \"Velocix\"")));

    vlx(&tree).args(["render", "home"]).assert().success().stdout("Velocix");
}

#[test]
fn test_invalid_config_fails() {
    let tree = ViewTree::new().unwrap();
    tree.write_config("extension = \"tpl\"\n").unwrap();
    vlx(&tree)
        .args(["config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("extension"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let tree = ViewTree::new().unwrap();
    vlx(&tree).args(["-v", "-q", "config"]).assert().failure();
}
