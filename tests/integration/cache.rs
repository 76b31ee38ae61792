//! Compiled view caching against the filesystem.

use serde_json::json;
use std::sync::Arc;
use std::thread;
use vlx_view::engine::ViewEngine;
use vlx_view::test_utils::ViewTree;

fn render(engine: &ViewEngine, identity: &str) -> String {
    engine.render(identity, &json!({})).unwrap()
}

#[test]
fn test_entries_persist_across_engines() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "hello").unwrap();

    let first = tree.engine();
    assert_eq!(render(&first, "home"), "hello");
    let path = first.cache_path("home").unwrap().unwrap();
    assert!(path.starts_with(tree.cache()));
    assert!(path.is_file());

    let second = tree.engine();
    let cache = second.cache().unwrap();
    let entries = cache.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].identity, "home");
    assert!(cache.get("home", second.loader()).is_some());
    assert_eq!(render(&second, "home"), "hello");
}

#[test]
fn test_edits_anywhere_in_the_chain_invalidate() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "[@yield('content')]@include('partials.footer')").unwrap();
    tree.write("partials.footer", "f1").unwrap();
    tree.write("home", "@extends('layouts.app')@section('content')v1@endsection").unwrap();

    let engine = tree.engine();
    assert_eq!(render(&engine, "home"), "[v1]f1");
    assert_eq!(render(&engine, "home"), "[v1]f1");

    tree.write("home", "@extends('layouts.app')@section('content')v2@endsection").unwrap();
    assert_eq!(render(&engine, "home"), "[v2]f1");

    tree.write("layouts.app", "(@yield('content'))@include('partials.footer')").unwrap();
    assert_eq!(render(&engine, "home"), "(v2)f1");

    tree.write("partials.footer", "f2").unwrap();
    assert_eq!(render(&engine, "home"), "(v2)f2");

    tree.remove("partials.footer").unwrap();
    assert_eq!(render(&engine, "home"), "(v2)<!-- Include not found: partials.footer -->");

    tree.write("partials.footer", "back").unwrap();
    assert_eq!(render(&engine, "home"), "(v2)back");
}

#[test]
fn test_fresh_engine_ignores_stale_entry() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "old").unwrap();
    assert_eq!(render(&tree.engine(), "home"), "old");

    tree.write("home", "new").unwrap();
    assert_eq!(render(&tree.engine(), "home"), "new");
}

#[test]
fn test_disabled_cache_writes_nothing() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "x").unwrap();
    let mut config = tree.config();
    config.cache_enabled = false;

    let engine = ViewEngine::from_config(&config);
    assert!(engine.cache().is_none());
    assert_eq!(render(&engine, "home"), "x");
    assert_eq!(engine.cache_path("home").unwrap(), None);
    assert!(!tree.cache().exists());
}

#[test]
fn test_force_recompile_still_refreshes_entries() {
    let tree = ViewTree::new().unwrap();
    tree.write("home", "x").unwrap();
    let mut config = tree.config();
    config.force_recompile = true;

    let engine = ViewEngine::from_config(&config);
    assert!(engine.cache().unwrap().force_recompile());
    assert_eq!(render(&engine, "home"), "x");
    assert_eq!(engine.cache().unwrap().list().unwrap().len(), 1);
}

#[test]
fn test_clear_removes_persisted_entries() {
    let tree = ViewTree::new().unwrap();
    tree.write("a", "a").unwrap();
    tree.write("b.c", "b").unwrap();
    let engine = tree.engine();
    render(&engine, "a");
    render(&engine, "b.c");

    let cache = engine.cache().unwrap();
    assert_eq!(cache.clear().unwrap(), 2);
    assert!(cache.list().unwrap().is_empty());
    assert_eq!(render(&engine, "a"), "a");
}

#[test]
fn test_concurrent_renders_share_one_engine() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<p>@yield('content')</p>").unwrap();
    tree.write("greet", "@extends('layouts.app')@section('content')Hello {{ n }}@endsection").unwrap();
    let engine = Arc::new(tree.engine());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.render("greet", &json!({ "n": n })).unwrap())
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<p>Hello {n}</p>"));
    }
    assert_eq!(engine.cache().unwrap().list().unwrap().len(), 1);
}
