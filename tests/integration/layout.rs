//! Layout inheritance, sections, yields and includes.

use serde_json::json;
use vlx_view::constants::MAX_LAYOUT_DEPTH;
use vlx_view::core::ViewError;
use vlx_view::test_utils::ViewTree;

/// Write a chain of `count` templates: `v0` is the view, `v{count-1}` the base
/// layout, and every template in between wraps the section below it.
fn write_chain(tree: &ViewTree, count: usize) {
    tree.write("v0", "@extends('v1')@section('s0')core@endsection").unwrap();
    for i in 1..count - 1 {
        tree.write(
            &format!("v{i}"),
            &format!("@extends('v{}')@section('s{i}')[{i} @yield('s{}')]@endsection", i + 1, i - 1),
        )
        .unwrap();
    }
    tree.write(&format!("v{}", count - 1), &format!("<main>@yield('s{}')</main>", count - 2)).unwrap();
}

fn nested(levels: usize) -> String {
    (1..=levels).fold("core".to_string(), |inner, i| format!("[{i} {inner}]"))
}

#[test]
fn test_section_fills_yield_or_default_applies() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<h1>@yield('title', 'Default')</h1>").unwrap();
    tree.write("with", "@extends('layouts.app')\n@section('title', 'Hi')").unwrap();
    tree.write("without", "@extends('layouts.app')").unwrap();

    let engine = tree.engine();
    assert_eq!(engine.render("with", &json!({})).unwrap(), "<h1>Hi</h1>");
    assert_eq!(engine.render("without", &json!({})).unwrap(), "<h1>Default</h1>");
}

#[test]
fn test_block_sections_and_expression_defaults() {
    let tree = ViewTree::new().unwrap();
    tree.write(
        "layouts.app",
        "<title>@yield('title', site.name)</title>\n<main>@yield('content')</main>\n<aside>@yield('sidebar')</aside>",
    )
    .unwrap();
    tree.write(
        "home",
        "@extends('layouts.app')\n\n@section('content')\n    <p>{{ message }}</p>\n@endsection\n\nignored text",
    )
    .unwrap();

    let html = tree.engine().render("home", &json!({"site": {"name": "A&B"}, "message": "hi"})).unwrap();
    assert_eq!(html, "<title>A&amp;B</title>\n<main><p>hi</p></main>\n<aside></aside>");
}

#[test]
fn test_compound_section_values_and_defaults_are_evaluated() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<title>@yield('title')</title><i>@yield('admin', user.admin and not banned)</i>").unwrap();
    tree.write("home", "@extends('layouts.app')@section('title', user.first ~ ' & ' ~ user.last)").unwrap();

    let html = tree
        .engine()
        .render("home", &json!({"user": {"first": "Ada", "last": "<L>", "admin": true}, "banned": false}))
        .unwrap();
    assert_eq!(html, "<title>Ada &amp; &lt;L&gt;</title><i>true</i>");
}

#[test]
fn test_ten_template_chain_nests_in_order() {
    let tree = ViewTree::new().unwrap();
    write_chain(&tree, 10);
    let html = tree.engine().render("v0", &json!({})).unwrap();
    assert_eq!(html, format!("<main>{}</main>", nested(8)));
}

#[test]
fn test_chain_depth_limit() {
    let tree = ViewTree::new().unwrap();
    write_chain(&tree, MAX_LAYOUT_DEPTH);
    let html = tree.engine().render("v0", &json!({})).unwrap();
    assert_eq!(html, format!("<main>{}</main>", nested(MAX_LAYOUT_DEPTH - 2)));

    let tree = ViewTree::new().unwrap();
    write_chain(&tree, MAX_LAYOUT_DEPTH + 1);
    let err = tree.engine().render("v0", &json!({})).unwrap_err();
    match err.downcast_ref::<ViewError>() {
        Some(ViewError::LayoutCycleDetected {
            depth,
            chain,
        }) => {
            assert_eq!(*depth, MAX_LAYOUT_DEPTH + 1);
            assert!(chain.starts_with("v0 -> v1 -> "));
            assert!(chain.ends_with(&format!("-> v{MAX_LAYOUT_DEPTH}")));
        }
        other => panic!("expected LayoutCycleDetected, got {other:?}"),
    }
}

#[test]
fn test_self_extending_view_is_a_cycle() {
    let tree = ViewTree::new().unwrap();
    tree.write("loop", "@extends('loop')@section('a', 'x')").unwrap();
    let err = tree.engine().render("loop", &json!({})).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewError>(),
        Some(ViewError::LayoutCycleDetected {
            ..
        })
    ));
}

#[test]
fn test_sections_reach_grandparent_and_descendants_win() {
    let tree = ViewTree::new().unwrap();
    tree.write("base", "@yield('title')|@yield('body')").unwrap();
    tree.write("mid", "@extends('base')@section('title', 'Mid')@section('body')<div>@yield('content')</div>@endsection")
        .unwrap();
    tree.write("page", "@extends('mid')@section('title', 'Page')@section('content')C@endsection").unwrap();
    tree.write("plain", "@extends('mid')@section('content')D@endsection").unwrap();

    let engine = tree.engine();
    assert_eq!(engine.render("page", &json!({})).unwrap(), "Page|<div>C</div>");
    assert_eq!(engine.render("plain", &json!({})).unwrap(), "Mid|<div>D</div>");
}

#[test]
fn test_missing_include_renders_marker() {
    let tree = ViewTree::new().unwrap();
    tree.write("page", "a@include('partials.gone')b").unwrap();
    let html = tree.engine().render("page", &json!({})).unwrap();
    assert_eq!(html, "a<!-- Include not found: partials.gone -->b");
}

#[test]
fn test_missing_layout_is_fatal() {
    let tree = ViewTree::new().unwrap();
    tree.write("page", "@extends('layouts.gone')@section('content')x@endsection").unwrap();
    let err = tree.engine().render("page", &json!({})).unwrap_err();
    match err.downcast_ref::<ViewError>() {
        Some(ViewError::TemplateNotFound {
            identity,
            ..
        }) => assert_eq!(identity, "layouts.gone"),
        other => panic!("expected TemplateNotFound, got {other:?}"),
    }
}

#[test]
fn test_includes_share_scope_and_nest() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<nav>@include('partials.nav')</nav>@yield('content')").unwrap();
    tree.write("partials.nav", "@foreach(link in links)@include('partials.link')@endforeach").unwrap();
    tree.write("partials.link", "<a>{{ link }}</a>").unwrap();
    tree.write("home", "@extends('layouts.app')@section('content')Hi {{ user }}@endsection").unwrap();

    let html = tree.engine().render("home", &json!({"links": ["x", "<y>"], "user": "Ada"})).unwrap();
    assert_eq!(html, "<nav><a>x</a><a>&lt;y&gt;</a></nav>Hi Ada");
}

#[test]
fn test_recursive_include_is_bounded() {
    let tree = ViewTree::new().unwrap();
    tree.write("tree", "node @include('tree')").unwrap();
    let err = tree.engine().render("tree", &json!({})).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewError>(),
        Some(ViewError::IncludeDepthExceeded {
            ..
        })
    ));
}

#[test]
fn test_standalone_view_drops_section_markers() {
    let tree = ViewTree::new().unwrap();
    tree.write("solo", "@section('title', 'gone')@section('body')kept@endsection|@yield('x', 'dflt')").unwrap();
    assert_eq!(tree.engine().render("solo", &json!({})).unwrap(), "kept|dflt");
}

#[test]
fn test_unquoted_layout_name_is_invalid() {
    let tree = ViewTree::new().unwrap();
    tree.write("page", "@extends(layout)").unwrap();
    let err = tree.engine().render("page", &json!({})).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewError>(),
        Some(ViewError::InvalidDirective {
            ..
        })
    ));
}

#[test]
fn test_empty_inline_section_value_fails_at_compile_time() {
    let tree = ViewTree::new().unwrap();
    tree.write("layouts.app", "<h1>@yield('title')</h1>").unwrap();
    tree.write("page", "@extends('layouts.app')\n@section('title',)").unwrap();

    let err = tree.engine().compile("page").unwrap_err();
    match err.downcast_ref::<ViewError>() {
        Some(ViewError::InvalidDirective {
            directive,
            line,
            ..
        }) => {
            assert_eq!(directive, "@section");
            assert_eq!(*line, 2);
        }
        other => panic!("expected InvalidDirective, got {other:?}"),
    }
}
