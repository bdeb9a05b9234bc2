mod common;

use common::{render, vars};
use linetmpl::{
    DirectiveSignal, EvalError, Location, ModifierError, OperandError, ParseError, RenderError, Value, Variables,
};

#[test]
fn unknown_variable_names_variable_and_line() {
    let err = render("header\n{{ a }}\n\n{{ b }}\n", vars([("a", Value::Int(1))])).unwrap_err();
    assert_eq!(
        err,
        RenderError::Eval(EvalError::UnknownVariable {
            at: Location::new("test.tmpl", 4),
            name: "b".into(),
            expr: "b".into(),
        })
    );
    assert!(err.is_engine_failure());
    assert_eq!(err.to_string(), "test.tmpl:4: unknown variable `b` in `b`");
}

#[test]
fn unknown_attribute() {
    let err = render(":set v = entity.name + 'x'\n", vars([("entity", Value::from(linetmpl::Record::new()))]))
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::Eval(EvalError::UnknownAttribute { ref object, ref attribute, .. })
            if object == "entity" && attribute == "name"
    ));
}

#[test]
fn nested_parentheses_are_rejected() {
    let bools = || vars([("a", Value::Bool(true)), ("b", Value::Bool(false)), ("c", Value::Bool(true))]);
    let err = render(":if (a and (b or c))\nx\n:end-if\n", bools()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Eval(EvalError::Grouping { ref reason, .. }) if reason.contains("nested")
    ));

    let out = render(":if a and (b or c)\nx\n:end-if\n", bools()).unwrap();
    assert_eq!(out.text(), Some("x\n"));
}

#[test]
fn malformed_groupings() {
    for expr in ["1 +", "(1 + 2", "1 + 2)", "()", "1 2", "'open"] {
        let err = render(&format!("{{{{ {expr} }}}}"), Variables::new()).unwrap_err();
        assert!(
            matches!(err, RenderError::Eval(EvalError::Grouping { .. })),
            "{expr}: {err:?}"
        );
    }
}

#[test]
fn misplaced_operator_is_not_an_unknown_variable() {
    let err = render(":if a == == b\nx\n:end-if\n", vars([("a", Value::Int(1))])).unwrap_err();
    assert!(
        matches!(err, RenderError::Eval(EvalError::Grouping { ref reason, .. }) if reason.contains("`==`")),
        "{err:?}"
    );
}

#[test]
fn unknown_operator() {
    let err = render("{{ 1 ** 2 }}", Variables::new()).unwrap_err();
    assert!(matches!(err, RenderError::Eval(EvalError::UnknownOperator { ref name, .. }) if name == "**"));
}

#[test]
fn operand_errors_report_the_side() {
    let err = render("{{ 'a' - 1 }}", Variables::new()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Eval(EvalError::Operand { source: OperandError::Left { found: "string" }, .. })
    ));

    let err = render("{{ 1 + 'a' }}", Variables::new()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Eval(EvalError::Operand { source: OperandError::Right { found: "string" }, .. })
    ));

    let err = render("{{ 1 % 0 }}", Variables::new()).unwrap_err();
    assert_eq!(err.to_string(), "test.tmpl:1: operator `%` failed in `1 % 0`: division by zero");
}

#[test]
fn modifier_errors() {
    let err = render("\n{{ name | shout }}\n", Variables::new()).unwrap_err();
    assert_eq!(
        err,
        RenderError::Parse(ParseError::UnknownModifier {
            at: Location::new("test.tmpl", 2),
            name: "shout".into(),
        })
    );

    let err = render("{{ name | replace('a') }}", Variables::new()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Parse(ParseError::ModifierArity { ref expected, found: 1, .. }) if expected == "2"
    ));

    let err = render("{{ n | join }}", vars([("n", Value::Int(3))])).unwrap_err();
    assert_eq!(
        err,
        RenderError::Eval(EvalError::Modifier {
            at: Location::new("test.tmpl", 1),
            name: "join".into(),
            source: ModifierError::new("cannot join a integer"),
        })
    );
}

#[test]
fn parse_errors_abort_before_execution() {
    let err = render(":fatal-error should not run\n:for x in xs\n", Variables::new()).unwrap_err();
    assert_eq!(
        err,
        RenderError::Parse(ParseError::Unterminated {
            at: Location::new("test.tmpl", 2),
            keyword: "for".into(),
            expected: "end-for".into(),
        })
    );
    assert_eq!(err.to_string(), "test.tmpl:2: `for` block is never closed (expected `end-for`)");
}

#[test]
fn invalid_continuation_names_line_and_text() {
    let err = render(":if a\n:else\nx\n:elseif b\ny\n:end-if\n", Variables::new()).unwrap_err();
    assert_eq!(
        err,
        RenderError::Parse(ParseError::InvalidContinuation {
            at: Location::new("test.tmpl", 4),
            keyword: "elseif".into(),
            text: ":elseif b".into(),
        })
    );
}

#[test]
fn malformed_arguments() {
    for (text, keyword) in [
        (":set 1x = 2", "set"),
        (":call field(name)", "call"),
        (":if\n:end-if", "if"),
        (":for x\n:end-for", "for"),
        (":spaceless now\n:end-spaceless", "spaceless"),
        (":func (a)\n:end-func", "func"),
    ] {
        let err = render(text, Variables::new()).unwrap_err();
        assert!(
            matches!(err, RenderError::Parse(ParseError::Malformed { keyword: ref k, .. }) if k == keyword),
            "{text}: {err:?}"
        );
    }
}

#[test]
fn evaluation_stops_at_first_error() {
    let text = ":for x in [1, 0, 2]\n{{ 10 / x }}\n:end-for\n";
    let err = render(text, Variables::new()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Eval(EvalError::Operand { source: OperandError::DivisionByZero, .. })
    ));
}

#[test]
fn fatal_error_is_not_an_engine_failure() {
    let err = render(":if true\n:fatal-error unsupported {{ kind }}\n:end-if\n", vars([("kind", Value::from("enum"))]))
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::Directive(DirectiveSignal::Fatal {
            at: Location::new("test.tmpl", 2),
            message: "unsupported enum".into(),
        })
    );
    assert!(!err.is_engine_failure());
}
