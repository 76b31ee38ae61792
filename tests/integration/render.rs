//! End-to-end rendering through `ViewEngine`.

use serde_json::json;
use vlx_view::compiler::Compiler;
use vlx_view::core::ViewError;
use vlx_view::engine::escape_html_str;
use vlx_view::loader::FileSystemLoader;
use vlx_view::test_utils::{ViewTree, init_test_logging};

#[test]
fn test_escaped_output_and_raw_output() {
    init_test_logging(None);
    let tree = ViewTree::new().unwrap();
    tree.write("echo", "{{ v }}|{!! v !!}").unwrap();
    let engine = tree.engine();

    for (value, escaped) in [
        ("<script>alert(1)</script>", "&lt;script&gt;alert(1)&lt;/script&gt;"),
        (r#"a & b "quoted""#, "a &amp; b &quot;quoted&quot;"),
        ("it's > 3", "it&#039;s &gt; 3"),
        ("plain", "plain"),
    ] {
        let html = engine.render("echo", &json!({ "v": value })).unwrap();
        assert_eq!(html, format!("{escaped}|{value}"));
    }
}

#[test]
fn test_escaped_and_raw_forms_agree_on_compound_expressions() {
    let tree = ViewTree::new().unwrap();
    let data = json!({"n": 2, "a": true, "b": false, "xs": [1, 2], "first": "<A>", "last": "&B", "name": "ada"});
    let cases = [
        ("a and b", "false"),
        ("a or b", "true"),
        ("not b", "true"),
        ("n > 1", "true"),
        ("n == 2 and a", "true"),
        ("n * 3", "6"),
        ("2 in xs", "true"),
        (r#"first ~ " " ~ last"#, "<A> &B"),
        ("name | upper", "ADA"),
        ("xs | length", "2"),
        ("range(end=n) | length", "2"),
    ];

    for (i, (expression, _)) in cases.iter().enumerate() {
        tree.write(&format!("case{i}"), &format!("{{{{ {expression} }}}}|{{!! {expression} !!}}")).unwrap();
    }
    let engine = tree.engine();
    for (i, (expression, raw)) in cases.iter().enumerate() {
        let html = engine.render(&format!("case{i}"), &data).unwrap();
        assert_eq!(html, format!("{}|{raw}", escape_html_str(raw)), "expression `{expression}`");
    }
}

#[test]
fn test_non_string_values() {
    let tree = ViewTree::new().unwrap();
    tree.write("values", "{{ n }} {{ f }} {{ b }} {{ list }}").unwrap();
    let html = tree
        .engine()
        .render("values", &json!({"n": 42, "f": 2.5, "b": true, "list": [1, "<x>"]}))
        .unwrap();
    assert_eq!(html, "42 2.5 true [1,&quot;&lt;x&gt;&quot;]");
}

#[test]
fn test_conditional_branches() {
    let tree = ViewTree::new().unwrap();
    tree.write("cond", "@if(a and b)yes@elseif(items | length > 1)many@else no@endif").unwrap();

    let loader = FileSystemLoader::new(tree.views(), ".vlx.html");
    let compiled = Compiler::new().compile("cond", &loader).unwrap().compiled;
    assert_eq!(compiled, "{% if a and b %}yes{% elif items | length > 1 %}many{% else %} no{% endif %}");

    let engine = tree.engine();
    let render = |data| engine.render("cond", &data).unwrap();
    assert_eq!(render(json!({"a": true, "b": true, "items": []})), "yes");
    assert_eq!(render(json!({"a": true, "b": false, "items": [1, 2]})), "many");
    assert_eq!(render(json!({"a": false, "b": false, "items": [1]})), " no");
}

#[test]
fn test_outer_condition_is_located_by_depth() {
    let tree = ViewTree::new().unwrap();
    tree.write("scan", "@if(foo(bar(1,2), baz))X@endif").unwrap();
    let loader = FileSystemLoader::new(tree.views(), ".vlx.html");
    let compiled = Compiler::new().compile("scan", &loader).unwrap().compiled;
    assert_eq!(compiled, "{% if foo(bar(1,2), baz) %}X{% endif %}");
}

#[test]
fn test_loops_and_nested_directives() {
    let tree = ViewTree::new().unwrap();
    tree.write(
        "list",
        "<ul>\n@foreach(item in items)\n@if(item.done)<li class=\"done\">{{ item.title }}</li>@else<li>{{ item.title }}</li>@endif\n@endforeach\n</ul>",
    )
    .unwrap();
    let html = tree
        .engine()
        .render(
            "list",
            &json!({"items": [{"title": "Write", "done": true}, {"title": "Ship & tell", "done": false}]}),
        )
        .unwrap();
    assert_eq!(
        html,
        "<ul>\n\n<li class=\"done\">Write</li>\n\n<li>Ship &amp; tell</li>\n\n</ul>"
    );
}

#[test]
fn test_for_alias_and_while() {
    let tree = ViewTree::new().unwrap();
    tree.write("loops", "@for(n in nums){{ n }}@endfor;@while(false)never@endwhile.").unwrap();
    let html = tree.engine().render("loops", &json!({"nums": [1, 2, 3]})).unwrap();
    assert_eq!(html, "123;.");
}

#[test]
fn test_literal_host_syntax_renders_verbatim() {
    let tree = ViewTree::new().unwrap();
    tree.write("docs", "Tera uses {% tags %} and {# comments #}.").unwrap();
    let html = tree.engine().render("docs", &json!({})).unwrap();
    assert_eq!(html, "Tera uses {% tags %} and {# comments #}.");
}

#[test]
fn test_ambient_values_from_config() {
    let tree = ViewTree::new().unwrap();
    tree.write("footer", "{{ app_name }} for {{ user.name }}").unwrap();
    let mut config = tree.config();
    config.ambient.insert("app_name".to_string(), json!("Velocix"));
    config.ambient.insert("user".to_string(), json!({"name": "guest"}));

    let engine = vlx_view::engine::ViewEngine::from_config(&config);
    assert_eq!(engine.render("footer", &json!({})).unwrap(), "Velocix for guest");
    assert_eq!(engine.render("footer", &json!({"user": {"name": "Ada"}})).unwrap(), "Velocix for Ada");
}

#[test]
fn test_undefined_variable_suggests_names() {
    let tree = ViewTree::new().unwrap();
    tree.write("profile", "Hello {{ user.nme }}").unwrap();
    let err = tree.engine().render("profile", &json!({"user": {"name": "Ada"}})).unwrap_err();

    match err.downcast_ref::<ViewError>() {
        Some(ViewError::VariableNotFound {
            variable,
            suggestions,
            ..
        }) => {
            assert_eq!(variable, "user.nme");
            assert!(suggestions.contains(&"user.name".to_string()));
        }
        other => panic!("expected VariableNotFound, got {other:?}"),
    }
}

#[test]
fn test_unbalanced_directive_is_fatal() {
    let tree = ViewTree::new().unwrap();
    tree.write("broken", "ok\nok\n@if(user.name == 'x'\nrest").unwrap();
    let err = tree.engine().render("broken", &json!({})).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewError>(),
        Some(ViewError::UnbalancedDelimiter {
            line: 3,
            ..
        })
    ));
}

#[test]
fn test_exists_and_view_path() {
    let tree = ViewTree::new().unwrap();
    let written = tree.write("auth.login", "<form/>").unwrap();
    let engine = tree.engine();

    assert!(engine.exists("auth.login"));
    assert!(!engine.exists("auth.logout"));
    assert!(!engine.exists("auth/login"));
    assert_eq!(engine.view_path("auth.login").unwrap(), written);
}

#[test]
fn test_compilation_is_idempotent() {
    let tree = ViewTree::new().unwrap();
    tree.write("base", "@yield('z')@yield('a')@yield('m', 'M')").unwrap();
    tree.write("part", "<p>{{ x }}</p>").unwrap();
    tree.write(
        "child",
        "@extends('base')@section('z', 'Z')@section('a')@include('part')@include('gone')@endsection",
    )
    .unwrap();

    let loader = FileSystemLoader::new(tree.views(), ".vlx.html");
    let compiler = Compiler::new();
    let first = compiler.compile("child", &loader).unwrap();
    let second = compiler.compile("child", &loader).unwrap();
    assert_eq!(first.compiled, second.compiled);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.dependencies, second.dependencies);
}
