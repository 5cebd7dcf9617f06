//! Compilation order, condition synthesis and redirect handling.

use rule_compiler::annotations::redirect::{
    RedirectCmd, RESPONSE_STATUS_ANNOTATION, SCHEME_SET_ANNOTATION, URL_SET_ANNOTATION,
};
use rule_compiler::annotations::route::{COOKIE_ANNOTATION, HEADER_ANNOTATION};
use rule_compiler::compiler::ADVANCED_MODE;
use rule_compiler::compiler::table::RouteTable;
use rule_compiler::{Annotations, CompileError, RuleAction, RuleCompiler, RuleKind, ValidationError};

mod common;

use common::annotations;

fn advanced_sources(compiler: &RuleCompiler) -> Vec<String> {
    compiler
        .compile()
        .unwrap()
        .advanced
        .into_iter()
        .map(|rule| rule.source)
        .collect()
}

#[test]
fn test_exact_host_before_wildcard_regardless_of_insertion() {
    let header = annotations(&[(HEADER_ANNOTATION, "X-A: 1")]);

    for reversed in [false, true] {
        let mut compiler = RuleCompiler::new(RuleKind::Route);
        let mut puts = vec![("ns/exact", "example.com"), ("ns/wild", "*.example.com")];
        if reversed {
            puts.reverse();
        }
        for (source, host) in puts {
            compiler.put(source, host, "/foo", &header, "t", 1).unwrap();
        }
        assert_eq!(advanced_sources(&compiler), vec!["ns/exact", "ns/wild"]);
    }
}

#[test]
fn test_exact_path_before_prefix_path() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    compiler
        .put(
            "ns/prefix",
            "example.com",
            "/foo*",
            &annotations(&[(COOKIE_ANNOTATION, "c: 1"), (HEADER_ANNOTATION, "X-A: 1")]),
            "t",
            1,
        )
        .unwrap();
    compiler
        .put(
            "ns/exact",
            "example.com",
            "/foo/bar",
            &annotations(&[(HEADER_ANNOTATION, "X-A: 1")]),
            "t",
            2,
        )
        .unwrap();

    assert_eq!(advanced_sources(&compiler), vec!["ns/exact", "ns/prefix"]);
}

#[test]
fn test_priority_class_then_create_time_in_one_bucket() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    compiler
        .put("ns/plain", "example.com", "/foo", &Annotations::new(), "t", 1)
        .unwrap();
    compiler
        .put(
            "ns/late",
            "example.com",
            "/foo",
            &annotations(&[(HEADER_ANNOTATION, "X-A: 2")]),
            "t",
            9,
        )
        .unwrap();
    compiler
        .put(
            "ns/early",
            "example.com",
            "/foo",
            &annotations(&[(HEADER_ANNOTATION, "X-A: 1")]),
            "t",
            3,
        )
        .unwrap();

    assert_eq!(
        advanced_sources(&compiler),
        vec!["ns/early", "ns/late", "ns/plain"]
    );
    let rules = compiler.compile().unwrap();
    assert_eq!(rules.basic.len(), 1);
    assert_eq!(rules.basic[0].action, RuleAction::AdvancedMode);
}

#[test]
fn test_cookie_outranks_older_header() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    let rules = [
        ("ingress1", annotations(&[])),
        ("ingress2", annotations(&[(HEADER_ANNOTATION, "X-A: aaa")])),
        ("ingress3", annotations(&[(COOKIE_ANNOTATION, "c: bbb")])),
        (
            "ingress4",
            annotations(&[(COOKIE_ANNOTATION, "c: ccc"), (HEADER_ANNOTATION, "X-D: ddd")]),
        ),
    ];
    for (created, (source, annots)) in (1..).zip(rules) {
        compiler
            .put(source, "example.com", "/foo", &annots, "t", created)
            .unwrap();
    }

    assert_eq!(
        advanced_sources(&compiler),
        vec!["ingress4", "ingress3", "ingress2", "ingress1"]
    );
}

#[test]
fn test_compile_is_deterministic() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    for (i, host) in ["b.com", "a.com", "*.a.com", "*"].into_iter().enumerate() {
        compiler
            .put(
                &format!("ns/{i}"),
                host,
                "/x*",
                &annotations(&[(HEADER_ANNOTATION, "X-A: 1")]),
                "t",
                i as u64,
            )
            .unwrap();
    }
    let first = compiler.compile().unwrap();
    assert_eq!(compiler.compile().unwrap(), first);
    assert_eq!(
        advanced_sources(&compiler),
        vec!["ns/0", "ns/1", "ns/2", "ns/3"]
    );
}

#[test]
fn test_wildcard_prefix_condition_literal() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    compiler
        .put("ns/api", "*.example.com", "/api*", &Annotations::new(), "ns_api", 1)
        .unwrap();

    let rules = compiler.compile().unwrap();
    assert_eq!(
        rules.basic[0].condition,
        r#"req_host_regmatch("(?i)^[^.]+\.example\.com")&&req_path_element_prefix_in("/api", false)"#
    );
}

#[test]
fn test_any_host_any_path_is_vacuous() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    compiler
        .put(
            "ns/all",
            "*",
            "*",
            &annotations(&[(HEADER_ANNOTATION, "X-A: 1")]),
            "t",
            1,
        )
        .unwrap();

    let rules = compiler.compile().unwrap();
    assert_eq!(
        rules.advanced[0].condition,
        r#"req_header_value_in("X-A", "1", false)"#
    );
}

#[test]
fn test_route_table_uses_advanced_mode_placeholder() {
    let mut compiler = RuleCompiler::new(RuleKind::Route);
    compiler
        .put("ns/a", "example.com", "/foo", &Annotations::new(), "ns_a", 1)
        .unwrap();
    compiler
        .put(
            "ns/b",
            "example.com",
            "/foo",
            &annotations(&[(COOKIE_ANNOTATION, "beta: 1")]),
            "ns_b",
            2,
        )
        .unwrap();

    let table = RouteTable::from_compiled(&compiler.compile().unwrap(), Default::default());
    assert_eq!(table.basic.len(), 1);
    assert_eq!(table.basic[0].cluster, ADVANCED_MODE);
    let clusters: Vec<&str> = table.advanced.iter().map(|r| r.cluster.as_str()).collect();
    assert_eq!(clusters, vec!["ns_b", "ns_a"]);
}

fn redirect_put(pairs: &[(&str, &str)]) -> Result<RuleCompiler, CompileError> {
    let mut compiler = RuleCompiler::new(RuleKind::Redirect);
    compiler.put("ns/r", "example.com", "/old", &annotations(pairs), "", 1)?;
    Ok(compiler)
}

fn redirect_status(compiler: &RuleCompiler) -> u16 {
    match &compiler.compile().unwrap().basic[0].action {
        RuleAction::Redirect { status, .. } => *status,
        other => panic!("expected redirect, got {:?}", other),
    }
}

#[test]
fn test_redirect_status_bounds() {
    let err = redirect_put(&[
        (SCHEME_SET_ANNOTATION, "https"),
        (RESPONSE_STATUS_ANNOTATION, "200"),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(ValidationError::StatusCode { .. })
    ));

    let moved = redirect_put(&[
        (SCHEME_SET_ANNOTATION, "https"),
        (RESPONSE_STATUS_ANNOTATION, "301"),
    ])
    .unwrap();
    assert_eq!(redirect_status(&moved), 301);

    let default = redirect_put(&[(SCHEME_SET_ANNOTATION, "https")]).unwrap();
    assert_eq!(redirect_status(&default), 302);
}

#[test]
fn test_redirect_actions_are_exclusive() {
    let mut compiler = RuleCompiler::new(RuleKind::Redirect);
    let err = compiler
        .put(
            "ns/r",
            "example.com",
            "/old",
            &annotations(&[
                (URL_SET_ANNOTATION, "https://example.org/new"),
                (SCHEME_SET_ANNOTATION, "https"),
            ]),
            "",
            1,
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::MultipleActions(ref keys) if keys.len() == 2));
    assert!(compiler.index().is_empty());
}

#[test]
fn test_status_override_without_action() {
    let err = redirect_put(&[(RESPONSE_STATUS_ANNOTATION, "301")]).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(ValidationError::UnexpectedAnnotation { .. })
    ));
}

#[test]
fn test_redirect_action_carried_to_rule() {
    let compiler = redirect_put(&[(URL_SET_ANNOTATION, "/new")]).unwrap();
    match &compiler.compile().unwrap().basic[0].action {
        RuleAction::Redirect { action, status } => {
            assert_eq!(action.cmd, RedirectCmd::UrlSet);
            assert_eq!(action.params, vec!["/new".to_string()]);
            assert_eq!(*status, 302);
        }
        other => panic!("expected redirect, got {:?}", other),
    }
}
