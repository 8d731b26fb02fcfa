//! Integration tests for end-to-end checking.
//!
//! These tests run the whole pipeline, from source text through tokenization,
//! parsing, scope building and abstract evaluation, and look only at the
//! resulting diagnostics.

use std::{fs, path::PathBuf};

use flowcheck::{check, check_source, lexer::lexer::tokenize, parser::parser::parse, CheckOptions, CheckResult};

fn run(source: &str) -> CheckResult {
    check_source(source, "test.js", &CheckOptions::default()).unwrap()
}

fn locations(result: &CheckResult) -> Vec<(u32, u32)> {
    result
        .diagnostics()
        .iter()
        .map(|d| (d.location.line, d.location.column))
        .collect()
}

#[test]
fn test_clean_program_has_no_errors() {
    let source = "
        var total = 0;
        function add(a, b) { return a + b; }
        var list = [1, 2, 3];
        total = add(total, list.length);
        var message = 'total: ' + total;
        console.log(message);
    ";

    let result = run(source);
    assert!(!result.has_errors(), "{:?}", result.diagnostics());
}

#[test]
fn test_unresolved_read_reported_once() {
    let result = run("var a = 1;\nvar b = a + missing;\nfunction f() { return missing; }\n");

    assert_eq!(locations(&result), vec![(2, 12), (3, 22)]);
    assert_eq!(result.diagnostics()[0].message, "No such item in scope: `missing`.");
}

#[test]
fn test_unresolved_read_in_repeated_calls() {
    let result = run("function f() { return missing; }\nf();\nf();\n");
    assert_eq!(result.diagnostics().len(), 1);
}

#[test]
fn test_const_write_is_reported_read_is_not() {
    let result = run("const limit = 3;\nvar twice = limit * 2;\nlimit = 4;\n");

    assert_eq!(locations(&result), vec![(3, 0)]);
    assert_eq!(result.diagnostics()[0].message, "Assigning to a constant: `limit`.");
}

#[test]
fn test_dead_branch_errors_are_skipped() {
    let result = run("if (false) {\n  1 - 'x';\n} else {\n  2 - 'y';\n}\n");
    assert_eq!(locations(&result), vec![(4, 2)]);

    let result = run("if (true) {\n  var ok = 1;\n} else {\n  2 - 'y';\n}\n");
    assert!(!result.has_errors());
}

#[test]
fn test_unknown_condition_checks_both_branches() {
    let result = run("var c = JSON.parse('1');\nif (c) {\n  1 - 'x';\n} else {\n  2 - 'y';\n}\n");
    assert_eq!(locations(&result), vec![(3, 2), (5, 2)]);
}

#[test]
fn test_recursion_is_not_fatal() {
    let source = "function f(n) { return n <= 0 ? 0 : f(n - 1); }\nvar r = f(10);\nvar s = f(JSON.parse('3'));\n";
    let result = run(source);

    assert!(!result.has_errors(), "{:?}", result.diagnostics());
}

#[test]
fn test_union_argument_branches_checked_separately() {
    let source = "
        function size(v) {
            if (typeof v === 'string') { return v.length; } else { return v * 1; }
        }
        var input = JSON.parse('0') ? 'text' : 7;
        var n = size(input) - 1;
    ";

    assert!(!run(source).has_errors());
}

#[test]
fn test_union_argument_reports_for_failing_branch_only() {
    let source = "function neg(v) {\n  return -v;\n}\nneg(JSON.parse('0') ? 'a' : 1);\n";
    let result = run(source);

    assert_eq!(locations(&result), vec![(2, 9)]);
    assert_eq!(
        result.diagnostics()[0].trace,
        vec!["neg (test.js:2:9)".to_string(), "test.js:4:0".to_string()]
    );
}

#[test]
fn test_closed_object_members() {
    let result = run("var p = { x: 1 };\nvar a = p.x;\nvar b = p.y;\n");

    assert_eq!(locations(&result), vec![(3, 8)]);
    assert_eq!(result.diagnostics()[0].message, "No property 'y' defined on { x: 1 }.");
}

#[test]
fn test_var_hoists_and_let_stays_in_block() {
    let result = run("function f() {\n  { var a = 1; }\n  return a;\n}\nf();\n");
    assert!(!result.has_errors());

    let result = run("function g() {\n  { let b = 1; }\n  return b;\n}\ng();\n");
    assert_eq!(locations(&result), vec![(3, 9)]);
}

#[test]
fn test_duplicate_declarations() {
    let result = run("let a = 1;\nlet a = 2;\n");
    assert_eq!(result.diagnostics()[0].message, "Multiple declarations for `a`.");
}

#[test]
fn test_parse_errors_are_fatal() {
    let error = check_source("var = 1;", "test.js", &CheckOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");

    let error = check_source("var a = 1 ++ 2;", "test.js", &CheckOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedSyntax");
}

#[test]
fn test_check_on_parsed_tree() {
    let ast = parse(tokenize("var a = 'x' * 2;").unwrap(), "tree.js").unwrap();
    let result = check(&ast).unwrap();

    assert!(result.has_errors());
    assert_eq!(result.into_diagnostics().len(), 1);
}

#[test]
fn test_custom_globals() {
    let options = CheckOptions::default().with_globals(["window"]);
    let result = check_source("window.alert('hi'); console.log(1);", "test.js", &options).unwrap();

    // Only `console` is missing from the replaced prelude
    assert_eq!(result.diagnostics().len(), 1);
}

#[test]
fn test_fixtures() {
    let directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut files: Vec<PathBuf> = fs::read_dir(&directory)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "js"))
        .collect();
    files.sort();

    assert!(!files.is_empty());

    for path in files {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let should_fail = name.starts_with("fail");
        assert!(should_fail || name.starts_with("pass"), "unexpected fixture {}", name);

        let source = fs::read_to_string(&path).unwrap();
        let result = check_source(&source, &name, &CheckOptions::default()).unwrap();

        let report: Vec<String> = result.diagnostics().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            result.has_errors(),
            should_fail,
            "{}: {}\n{}",
            name,
            if should_fail { "false negative" } else { "false positive" },
            report.join("\n")
        );
    }
}
