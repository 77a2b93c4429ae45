use super::api::JsParser;
use super::api::Rule;
use super::ast::*;

use pest::consumes_to;
use pest::fails_with;
use pest::parses_to;

fn parse_body(code: &str) -> Vec<StatementType> {
    JsParser::parse_to_ast_from_str(code)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", code, e))
        .body
}

fn parse_single_expression(code: &str) -> ExpressionType {
    let mut body = parse_body(code);
    assert_eq!(body.len(), 1, "expected one statement in {:?}", code);
    match body.remove(0) {
        StatementType::ExpressionStatement { expression, .. } => *expression,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

// ============================================================================
// Token level
// ============================================================================

#[test]
fn test_decimal_number() {
    parses_to! {
        parser: JsParser,
        input: "10.25",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 5)
        ]
    };
}

#[test]
fn test_hex_number() {
    parses_to! {
        parser: JsParser,
        input: "0x1F",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 4)
        ]
    };
}

#[test]
fn test_string_with_escaped_quote() {
    parses_to! {
        parser: JsParser,
        input: r"'a\'b'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 6)
        ]
    };
}

#[test]
fn test_string_with_raw_newline_fails() {
    fails_with! {
        parser: JsParser,
        input: "\"test single\n string\"",
        rule: Rule::string_literal,
        positives: vec![Rule::string_literal],
        negatives: vec![],
        pos: 0
    };
}

#[test]
fn test_identifier() {
    parses_to! {
        parser: JsParser,
        input: "$foo_1",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 6)
        ]
    };
}

#[test]
fn test_property_access() {
    parses_to! {
        parser: JsParser,
        input: ".foo",
        rule: Rule::property_access,
        tokens: [
            property_access(0, 4, [
                identifier_name(1, 4)
            ])
        ]
    };
}

#[test]
fn test_formal_parameters() {
    parses_to! {
        parser: JsParser,
        input: "(a, b)",
        rule: Rule::formal_parameters,
        tokens: [
            formal_parameters(0, 6, [
                identifier(1, 2),
                identifier(4, 5)
            ])
        ]
    };
}

#[test]
fn test_compound_assignment_operator() {
    parses_to! {
        parser: JsParser,
        input: ">>>=",
        rule: Rule::assignment_operator,
        tokens: [
            assignment_operator(0, 4)
        ]
    };
}

#[test]
fn test_equality_is_not_assignment() {
    fails_with! {
        parser: JsParser,
        input: "==",
        rule: Rule::assignment_operator,
        positives: vec![Rule::assignment_operator],
        negatives: vec![],
        pos: 0
    };
}

// ============================================================================
// AST
// ============================================================================

#[test]
fn test_var_declaration() {
    let body = parse_body("var x = 5, y;");
    match &body[0] {
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(d)) => {
            assert_eq!(d.kind, VariableDeclarationKind::Var);
            assert_eq!(d.declarations.len(), 2);
            assert_eq!(d.declarations[0].id.name, "x");
            assert!(d.declarations[1].init.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_const_requires_initializer() {
    assert!(JsParser::parse_to_ast_from_str("const a;").is_err());
}

#[test]
fn test_operator_precedence() {
    match parse_single_expression("1 + 2 * 3") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_left_associative_subtraction() {
    match parse_single_expression("5 - 2 - 1") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Subtract,
            left,
            ..
        } => assert!(matches!(
            *left,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Subtract,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_to_global() {
    match parse_single_expression("y = x + 1;") {
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::Equals,
            left,
            ..
        } => assert!(matches!(*left, ExpressionType::Identifier(ref id) if id.name == "y")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_target() {
    assert!(JsParser::parse_to_ast_from_str("1 = 2").is_err());
    assert!(JsParser::parse_to_ast_from_str("a + b = 2").is_err());
}

#[test]
fn test_incomplete_binary_expression_fails() {
    assert!(JsParser::parse_to_ast_from_str("2+").is_err());
}

#[test]
fn test_member_call_chain() {
    match parse_single_expression("a.b(1)[c]") {
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => match *object {
            ExpressionType::CallExpression {
                callee, arguments, ..
            } => {
                assert_eq!(arguments.len(), 1);
                assert!(matches!(
                    *callee,
                    ExpressionType::MemberExpression(
                        MemberExpressionType::SimpleMemberExpression { .. }
                    )
                ));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_new_expression_with_arguments() {
    match parse_single_expression("new Error('x')") {
        ExpressionType::NewExpression { arguments, .. } => assert_eq!(arguments.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_arrow_function_concise_body() {
    match parse_single_expression("(a, b) => a + b") {
        ExpressionType::FunctionExpression(f) => {
            assert!(f.is_arrow);
            assert_eq!(f.params.len(), 2);
            assert!(matches!(f.body, FunctionBodyData::Expression(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parenthesized_is_not_arrow() {
    assert!(matches!(
        parse_single_expression("(a)"),
        ExpressionType::Identifier(_)
    ));
}

#[test]
fn test_object_literal_keys() {
    match parse_single_expression("({ a: 1, 'b': 2, 3: 4, c })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 4);
            assert!(matches!(properties[0].key, PropertyKeyData::Identifier(_)));
            assert!(matches!(properties[1].key, PropertyKeyData::Literal(_)));
            assert!(matches!(properties[3].value, ExpressionType::Identifier(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_string_escapes() {
    match parse_single_expression(r#""a\tb\x41\u0042\uD83D\uDE00""#) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) => assert_eq!(s, "a\tbAB\u{1F600}"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_number_literals() {
    assert!(matches!(
        parse_single_expression("42"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(42)),
            ..
        })
    ));
    assert!(matches!(
        parse_single_expression("0xff"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(255)),
            ..
        })
    ));
    match parse_single_expression("1.5e3") {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)),
            ..
        }) => assert_eq!(f, 1500.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_for_in_and_for() {
    let body = parse_body("for (var k in o) {} for (var i = 0; i < 3; i++) {}");
    assert!(matches!(body[0], StatementType::ForInStatement(_)));
    assert!(matches!(body[1], StatementType::ForStatement { .. }));
}

#[test]
fn test_try_catch_finally() {
    let body = parse_body("try { throw 1 } catch (e) { } finally { }");
    match &body[0] {
        StatementType::TryStatement {
            handler, finalizer, ..
        } => {
            assert_eq!(
                handler.as_ref().and_then(|h| h.param.as_ref()).map(|p| p.name.as_str()),
                Some("e")
            );
            assert!(finalizer.is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(JsParser::parse_to_ast_from_str("var if = 1;").is_err());
    assert_eq!(parse_body("var iffy = 1;").len(), 1);
}

#[test]
fn test_comments_and_optional_semicolons() {
    let body = parse_body("// head\nvar a = 1\n/* mid */ a = 2\n");
    assert_eq!(body.len(), 2);
}

#[test]
fn test_line_col() {
    assert_eq!(line_col("a\nbc", 3), (2, 2));
    assert_eq!(line_col("abc", 0), (1, 1));
}
