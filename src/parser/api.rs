use std::collections::HashMap;
use std::rc::Rc;

use lazy_static::lazy_static;
use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::{Parser, Span};
use pest_derive::Parser;

use super::ast::*;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

type ParseResult<T> = Result<T, Error<Rule>>;

lazy_static! {
    static ref SINGLE_CHAR_ESCAPES: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('n', '\n');
        m.insert('t', '\t');
        m.insert('r', '\r');
        m.insert('b', '\u{0008}');
        m.insert('f', '\u{000C}');
        m.insert('v', '\u{000B}');
        m.insert('0', '\0');
        m.insert('\\', '\\');
        m.insert('\'', '\'');
        m.insert('"', '"');
        m
    };
}

impl JsParser {
    pub fn parse_to_ast_from_str(script: &str) -> ParseResult<ProgramData> {
        let mut pairs = JsParser::parse(Rule::script, script)?;
        let script_pair = pairs.next().ok_or_else(|| empty_parse_error(script))?;
        let meta = get_meta(&script_pair);
        let mut body = vec![];
        for pair in script_pair.into_inner() {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            body.push(build_ast_from_statement(pair)?);
        }
        Ok(ProgramData {
            meta,
            body,
            source: Rc::from(script),
        })
    }
}

fn empty_parse_error(script: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: "Empty parse result".to_string(),
        },
        pest::Position::from_start(script),
    )
}

fn custom_error(message: String, span: Span) -> Error<Rule> {
    Error::new_from_span(ErrorVariant::CustomError { message }, span)
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    custom_error(message, pair.as_span())
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::k_break
            | Rule::k_catch
            | Rule::k_continue
            | Rule::k_do
            | Rule::k_else
            | Rule::k_finally
            | Rule::k_for
            | Rule::k_function
            | Rule::k_if
            | Rule::k_in
            | Rule::k_new
            | Rule::k_return
            | Rule::k_throw
            | Rule::k_try
            | Rule::k_while
    )
}

/// Inner pairs of a production with keyword tokens dropped.
fn children(pair: Pair<Rule>) -> Vec<Pair<Rule>> {
    pair.into_inner()
        .filter(|p| !is_keyword(p.as_rule()))
        .collect()
}

fn next_child<'i, I>(iter: &mut I, span: Span<'i>) -> ParseResult<Pair<'i, Rule>>
where
    I: Iterator<Item = Pair<'i, Rule>>,
{
    iter.next()
        .ok_or_else(|| custom_error("Incomplete production".to_string(), span))
}

fn only_child(pair: Pair<Rule>) -> ParseResult<Pair<Rule>> {
    let span = pair.as_span();
    next_child(&mut children(pair).into_iter(), span)
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn build_ast_from_statement(pair: Pair<Rule>) -> ParseResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_ast_from_block(pair)?),
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::variable_statement => StatementType::DeclarationStatement(
            DeclarationType::VariableDeclaration(build_ast_from_variable_declaration_list(
                only_child(pair)?,
            )?),
        ),
        Rule::function_declaration => StatementType::DeclarationStatement(
            DeclarationType::FunctionDeclaration(Rc::new(build_ast_from_function(pair, false)?)),
        ),
        Rule::expression_statement => StatementType::ExpressionStatement {
            meta,
            expression: Box::new(build_ast_from_expression(only_child(pair)?)?),
        },
        Rule::if_statement => {
            let mut iter = children(pair).into_iter();
            let test = build_ast_from_expression(next_child(&mut iter, span)?)?;
            let consequent = build_ast_from_statement(next_child(&mut iter, span)?)?;
            let alternate = match iter.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let mut iter = children(pair).into_iter();
            let test = build_ast_from_expression(next_child(&mut iter, span)?)?;
            let body = build_ast_from_statement(next_child(&mut iter, span)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::do_while_statement => {
            let mut iter = children(pair).into_iter();
            let body = build_ast_from_statement(next_child(&mut iter, span)?)?;
            let test = build_ast_from_expression(next_child(&mut iter, span)?)?;
            StatementType::DoWhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::for_statement => build_ast_from_for_statement(pair)?,
        Rule::for_in_statement => build_ast_from_for_in_statement(pair)?,
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::return_statement => {
            let argument = match children(pair).into_iter().next() {
                Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => StatementType::ThrowStatement {
            meta,
            argument: Box::new(build_ast_from_expression(only_child(pair)?)?),
        },
        Rule::try_statement => build_ast_from_try_statement(pair)?,
        _ => return Err(get_unexpected_error(1, &pair)),
    })
}

fn build_ast_from_block(pair: Pair<Rule>) -> ParseResult<BlockStatementData> {
    let meta = get_meta(&pair);
    let mut body = vec![];
    for inner_pair in children(pair) {
        body.push(build_ast_from_statement(inner_pair)?);
    }
    Ok(BlockStatementData { meta, body })
}

fn build_variable_kind(pair: &Pair<Rule>) -> ParseResult<VariableDeclarationKind> {
    Ok(match pair.as_str() {
        "var" => VariableDeclarationKind::Var,
        "let" => VariableDeclarationKind::Let,
        "const" => VariableDeclarationKind::Const,
        _ => return Err(get_unexpected_error(2, pair)),
    })
}

fn build_ast_from_variable_declaration_list(
    pair: Pair<Rule>,
) -> ParseResult<VariableDeclarationData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let kind = build_variable_kind(&next_child(&mut iter, span)?)?;
    let mut declarations = vec![];
    for declarator in iter {
        let declarator_meta = get_meta(&declarator);
        let declarator_span = declarator.as_span();
        let mut inner_iter = children(declarator).into_iter();
        let id = build_identifier(next_child(&mut inner_iter, declarator_span)?);
        let init = match inner_iter.next() {
            Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
            None => {
                if kind == VariableDeclarationKind::Const {
                    return Err(custom_error(
                        "Missing initializer in const declaration".to_string(),
                        declarator_span,
                    ));
                }
                None
            }
        };
        declarations.push(VariableDeclaratorData {
            meta: declarator_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> ParseResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for inner_pair in children(pair) {
        match inner_pair.as_rule() {
            Rule::for_init => {
                let init_pair = only_child(inner_pair)?;
                init = Some(if init_pair.as_rule() == Rule::variable_declaration_list {
                    VariableDeclarationOrExpression::VariableDeclaration(
                        build_ast_from_variable_declaration_list(init_pair)?,
                    )
                } else {
                    VariableDeclarationOrExpression::Expression(Box::new(
                        build_ast_from_expression(init_pair)?,
                    ))
                });
            }
            Rule::for_test => {
                test = Some(Box::new(build_ast_from_expression(only_child(inner_pair)?)?));
            }
            Rule::for_update => {
                update = Some(Box::new(build_ast_from_expression(only_child(inner_pair)?)?));
            }
            _ => body = Some(Box::new(build_ast_from_statement(inner_pair)?)),
        }
    }
    let body = body.ok_or_else(|| custom_error("Missing loop body".to_string(), span))?;
    Ok(StatementType::ForStatement {
        meta,
        init,
        test,
        update,
        body,
    })
}

fn build_ast_from_for_in_statement(pair: Pair<Rule>) -> ParseResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let binding_pair = next_child(&mut iter, span)?;
    let binding_span = binding_pair.as_span();
    let mut binding_iter = children(binding_pair).into_iter();
    let first = next_child(&mut binding_iter, binding_span)?;
    let left = if first.as_rule() == Rule::variable_kind {
        let kind = build_variable_kind(&first)?;
        let id = build_identifier(next_child(&mut binding_iter, binding_span)?);
        ForInBinding::Declaration { kind, id }
    } else {
        let target = build_ast_from_expression(first)?;
        validate_assignment_target(&target, binding_span)?;
        ForInBinding::Target(Box::new(target))
    };
    let right = build_ast_from_expression(next_child(&mut iter, span)?)?;
    let body = build_ast_from_statement(next_child(&mut iter, span)?)?;
    Ok(StatementType::ForInStatement(ForInData {
        meta,
        left,
        right: Box::new(right),
        body: Box::new(body),
    }))
}

fn build_ast_from_try_statement(pair: Pair<Rule>) -> ParseResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let block = build_ast_from_block(next_child(&mut iter, span)?)?;
    let mut handler = None;
    let mut finalizer = None;
    for clause in iter {
        match clause.as_rule() {
            Rule::catch_clause => {
                let clause_meta = get_meta(&clause);
                let clause_span = clause.as_span();
                let mut param = None;
                let mut body = None;
                for p in children(clause) {
                    if p.as_rule() == Rule::identifier {
                        param = Some(build_identifier(p));
                    } else {
                        body = Some(build_ast_from_block(p)?);
                    }
                }
                let body = body.ok_or_else(|| {
                    custom_error("Missing catch block".to_string(), clause_span)
                })?;
                handler = Some(CatchClauseData {
                    meta: clause_meta,
                    param,
                    body,
                });
            }
            Rule::finally_clause => {
                finalizer = Some(build_ast_from_block(only_child(clause)?)?);
            }
            _ => return Err(get_unexpected_error(3, &clause)),
        }
    }
    Ok(StatementType::TryStatement {
        meta,
        block,
        handler,
        finalizer,
    })
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn build_ast_from_function(pair: Pair<Rule>, is_expression: bool) -> ParseResult<FunctionData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for inner_pair in children(pair) {
        match inner_pair.as_rule() {
            Rule::identifier => id = Some(build_identifier(inner_pair)),
            Rule::formal_parameters => params = build_formal_parameters(inner_pair),
            Rule::function_body => body = Some(build_ast_from_function_body(inner_pair)?),
            _ => return Err(get_unexpected_error(4, &inner_pair)),
        }
    }
    if !is_expression && id.is_none() {
        return Err(custom_error(
            "Function statements require a function name".to_string(),
            span,
        ));
    }
    Ok(FunctionData {
        meta,
        id,
        params,
        body: FunctionBodyData::Statements(body.unwrap_or_default()),
        is_arrow: false,
    })
}

fn build_formal_parameters(pair: Pair<Rule>) -> Vec<IdentifierData> {
    children(pair).into_iter().map(build_identifier).collect()
}

fn build_ast_from_function_body(pair: Pair<Rule>) -> ParseResult<Vec<StatementType>> {
    let mut statements = vec![];
    for inner_pair in children(pair) {
        statements.push(build_ast_from_statement(inner_pair)?);
    }
    Ok(statements)
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> ParseResult<FunctionData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let params_pair = only_child(next_child(&mut iter, span)?)?;
    let params = if params_pair.as_rule() == Rule::identifier {
        vec![build_identifier(params_pair)]
    } else {
        build_formal_parameters(params_pair)
    };
    let body_pair = next_child(&mut iter, span)?;
    let body = if body_pair.as_rule() == Rule::function_body {
        FunctionBodyData::Statements(build_ast_from_function_body(body_pair)?)
    } else {
        FunctionBodyData::Expression(Box::new(build_ast_from_expression(body_pair)?))
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_arrow: true,
    })
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn build_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(&pair),
    }
}

fn validate_assignment_target(target: &ExpressionType, span: Span) -> ParseResult<()> {
    match target {
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => Ok(()),
        _ => Err(custom_error(
            "Invalid left-hand side in assignment".to_string(),
            span,
        )),
    }
}

fn build_ast_from_expression(pair: Pair<Rule>) -> ParseResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut expressions = vec![];
            for inner_pair in children(pair) {
                expressions.push(build_ast_from_expression(inner_pair)?);
            }
            if expressions.len() == 1 {
                expressions.remove(0)
            } else {
                ExpressionType::SequenceExpression { meta, expressions }
            }
        }
        Rule::assignment_expression => {
            let mut iter = children(pair).into_iter();
            let first = next_child(&mut iter, span)?;
            match iter.next() {
                None => build_ast_from_expression(first)?,
                Some(operator_pair) => {
                    let target_span = first.as_span();
                    let left = build_ast_from_expression(first)?;
                    validate_assignment_target(&left, target_span)?;
                    let operator = get_assignment_operator(&operator_pair)?;
                    let right = build_ast_from_expression(next_child(&mut iter, span)?)?;
                    ExpressionType::AssignmentExpression {
                        meta,
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
            }
        }
        Rule::arrow_function => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_arrow_function(pair)?))
        }
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(pair, true)?))
        }
        Rule::conditional_expression => {
            let mut iter = children(pair).into_iter();
            let test = build_ast_from_expression(next_child(&mut iter, span)?)?;
            match iter.next() {
                None => test,
                Some(consequent_pair) => {
                    let consequent = build_ast_from_expression(consequent_pair)?;
                    let alternate = build_ast_from_expression(next_child(&mut iter, span)?)?;
                    ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    }
                }
            }
        }
        Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::bitwise_or_expression
        | Rule::bitwise_xor_expression
        | Rule::bitwise_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::shift_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_ast_from_binary_chain(pair)?,
        Rule::unary_expression => build_ast_from_unary_expression(pair)?,
        Rule::postfix_expression => {
            let mut iter = children(pair).into_iter();
            let argument_pair = next_child(&mut iter, span)?;
            match iter.next() {
                None => build_ast_from_expression(argument_pair)?,
                Some(operator_pair) => {
                    let argument_span = argument_pair.as_span();
                    let argument = build_ast_from_expression(argument_pair)?;
                    validate_assignment_target(&argument, argument_span)?;
                    ExpressionType::UpdateExpression {
                        meta,
                        operator: get_update_operator(&operator_pair)?,
                        argument: Box::new(argument),
                        prefix: false,
                    }
                }
            }
        }
        Rule::left_hand_side_expression | Rule::member_expression => {
            build_ast_from_member_chain(pair)?
        }
        Rule::new_expression => {
            let mut iter = children(pair).into_iter();
            let callee = build_ast_from_expression(next_child(&mut iter, span)?)?;
            let arguments = match iter.next() {
                Some(p) => build_arguments(p)?,
                None => vec![],
            };
            ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments,
            }
        }
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::identifier => ExpressionType::Identifier(build_identifier(pair)),
        Rule::null_literal | Rule::boolean_literal | Rule::numeric_literal | Rule::string_literal => {
            ExpressionType::Literal(build_ast_from_literal(pair)?)
        }
        Rule::array_literal => {
            let mut elements = vec![];
            for inner_pair in children(pair) {
                elements.push(build_ast_from_expression(inner_pair)?);
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for inner_pair in children(pair) {
                properties.push(build_ast_from_property_assignment(inner_pair)?);
            }
            ExpressionType::ObjectExpression { meta, properties }
        }
        Rule::parenthesized_expression => build_ast_from_expression(only_child(pair)?)?,
        _ => return Err(get_unexpected_error(5, &pair)),
    })
}

fn build_ast_from_binary_chain(pair: Pair<Rule>) -> ParseResult<ExpressionType> {
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let mut left = build_ast_from_expression(next_child(&mut iter, span)?)?;
    while let Some(operator_pair) = iter.next() {
        let right_pair = next_child(&mut iter, span)?;
        let meta = Meta {
            start_index: span.start(),
            end_index: right_pair.as_span().end(),
        };
        let right = Box::new(build_ast_from_expression(right_pair)?);
        left = match operator_pair.as_rule() {
            Rule::logical_or_operator => ExpressionType::LogicalExpression {
                meta,
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right,
            },
            Rule::logical_and_operator => ExpressionType::LogicalExpression {
                meta,
                operator: LogicalOperator::And,
                left: Box::new(left),
                right,
            },
            _ => ExpressionType::BinaryExpression {
                meta,
                operator: get_binary_operator(&operator_pair)?,
                left: Box::new(left),
                right,
            },
        };
    }
    Ok(left)
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> ParseResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let first = next_child(&mut iter, span)?;
    Ok(match first.as_rule() {
        Rule::prefix_operator => {
            let argument_pair = next_child(&mut iter, span)?;
            let argument_span = argument_pair.as_span();
            let argument = build_ast_from_expression(argument_pair)?;
            validate_assignment_target(&argument, argument_span)?;
            ExpressionType::UpdateExpression {
                meta,
                operator: get_update_operator(&first)?,
                argument: Box::new(argument),
                prefix: true,
            }
        }
        Rule::unary_operator => {
            let operator = match first.as_str() {
                "-" => UnaryOperator::Minus,
                "+" => UnaryOperator::Plus,
                "!" => UnaryOperator::LogicalNot,
                "~" => UnaryOperator::BitwiseNot,
                "typeof" => UnaryOperator::TypeOf,
                "void" => UnaryOperator::Void,
                "delete" => UnaryOperator::Delete,
                _ => return Err(get_unexpected_error(6, &first)),
            };
            let argument = build_ast_from_expression(next_child(&mut iter, span)?)?;
            ExpressionType::UnaryExpression {
                meta,
                operator,
                argument: Box::new(argument),
            }
        }
        _ => build_ast_from_expression(first)?,
    })
}

fn build_ast_from_member_chain(pair: Pair<Rule>) -> ParseResult<ExpressionType> {
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let mut object = build_ast_from_expression(next_child(&mut iter, span)?)?;
    for suffix in iter {
        let meta = Meta {
            start_index: span.start(),
            end_index: suffix.as_span().end(),
        };
        object = match suffix.as_rule() {
            Rule::arguments => ExpressionType::CallExpression {
                meta,
                callee: Box::new(object),
                arguments: build_arguments(suffix)?,
            },
            Rule::property_access => {
                ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                    meta,
                    object: Box::new(object),
                    property: build_identifier(only_child(suffix)?),
                })
            }
            Rule::computed_access => {
                ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                    meta,
                    object: Box::new(object),
                    property: Box::new(build_ast_from_expression(only_child(suffix)?)?),
                })
            }
            _ => return Err(get_unexpected_error(7, &suffix)),
        };
    }
    Ok(object)
}

fn build_arguments(pair: Pair<Rule>) -> ParseResult<Vec<ExpressionType>> {
    let mut arguments = vec![];
    for inner_pair in children(pair) {
        arguments.push(build_ast_from_expression(inner_pair)?);
    }
    Ok(arguments)
}

fn build_ast_from_property_assignment(pair: Pair<Rule>) -> ParseResult<PropertyData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut iter = children(pair).into_iter();
    let first = next_child(&mut iter, span)?;
    if first.as_rule() == Rule::identifier {
        // Shorthand `{ x }`.
        let id = build_identifier(first);
        return Ok(PropertyData {
            meta,
            key: PropertyKeyData::Identifier(id.clone()),
            value: ExpressionType::Identifier(id),
        });
    }
    let key_pair = only_child(first)?;
    let key = if key_pair.as_rule() == Rule::identifier_name {
        PropertyKeyData::Identifier(build_identifier(key_pair))
    } else {
        PropertyKeyData::Literal(build_ast_from_literal(key_pair)?)
    };
    let value = build_ast_from_expression(next_child(&mut iter, span)?)?;
    Ok(PropertyData { meta, key, value })
}

fn get_binary_operator(pair: &Pair<Rule>) -> ParseResult<BinaryOperator> {
    Ok(match pair.as_str() {
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "<<" => BinaryOperator::BitwiseLeftShift,
        ">>" => BinaryOperator::BitwiseRightShift,
        ">>>" => BinaryOperator::BitwiseUnsignedRightShift,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "|" => BinaryOperator::BitwiseOr,
        "^" => BinaryOperator::BitwiseXor,
        "&" => BinaryOperator::BitwiseAnd,
        "in" => BinaryOperator::In,
        "instanceof" => BinaryOperator::InstanceOf,
        _ => return Err(get_unexpected_error(8, pair)),
    })
}

fn get_assignment_operator(pair: &Pair<Rule>) -> ParseResult<AssignmentOperator> {
    Ok(match pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
        ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
        ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
        "|=" => AssignmentOperator::BitwiseOrEquals,
        "^=" => AssignmentOperator::BitwiseXorEquals,
        "&=" => AssignmentOperator::BitwiseAndEquals,
        _ => return Err(get_unexpected_error(9, pair)),
    })
}

fn get_update_operator(pair: &Pair<Rule>) -> ParseResult<UpdateOperator> {
    Ok(match pair.as_str() {
        "++" => UpdateOperator::PlusPlus,
        "--" => UpdateOperator::MinusMinus,
        _ => return Err(get_unexpected_error(10, pair)),
    })
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn build_ast_from_literal(pair: Pair<Rule>) -> ParseResult<LiteralData> {
    let meta = get_meta(&pair);
    let value = match pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(pair.as_str() == "true"),
        Rule::numeric_literal => LiteralType::NumberLiteral(build_numeric_literal(&pair)?),
        Rule::string_literal => LiteralType::StringLiteral(unescape_string_literal(&pair)?),
        _ => return Err(get_unexpected_error(11, &pair)),
    };
    Ok(LiteralData { meta, value })
}

fn build_numeric_literal(pair: &Pair<Rule>) -> ParseResult<NumberLiteralType> {
    let text = pair.as_str();
    if text.starts_with("0x") || text.starts_with("0X") {
        let digits = &text[2..];
        return Ok(match i64::from_str_radix(digits, 16) {
            Ok(v) => NumberLiteralType::IntegerLiteral(v),
            Err(_) => NumberLiteralType::FloatLiteral(digits.chars().fold(0.0, |acc, c| {
                acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64
            })),
        });
    }
    if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        return text
            .parse::<f64>()
            .map(NumberLiteralType::FloatLiteral)
            .map_err(|e| custom_error(format!("Invalid number: {}", e), pair.as_span()));
    }
    match text.parse::<i64>() {
        Ok(v) => Ok(NumberLiteralType::IntegerLiteral(v)),
        Err(_) => text
            .parse::<f64>()
            .map(NumberLiteralType::FloatLiteral)
            .map_err(|e| custom_error(format!("Invalid number: {}", e), pair.as_span())),
    }
}

fn read_hex_digits<I: Iterator<Item = char>>(chars: &mut I, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn unescape_string_literal(pair: &Pair<Rule>) -> ParseResult<String> {
    let raw = pair.as_str();
    // Quotes are single byte characters.
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let invalid = |what: &str| custom_error(format!("Invalid {} escape sequence", what), pair.as_span());
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err(invalid("trailing")),
        };
        match escaped {
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let code = read_hex_digits(&mut chars, 2).ok_or_else(|| invalid("hexadecimal"))?;
                out.push(std::char::from_u32(code).ok_or_else(|| invalid("hexadecimal"))?);
            }
            'u' => {
                let code = read_hex_digits(&mut chars, 4).ok_or_else(|| invalid("unicode"))?;
                let mut resolved = std::char::from_u32(code);
                if (0xD800..0xDC00).contains(&code) {
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        if let Some(low) = read_hex_digits(&mut lookahead, 4) {
                            if (0xDC00..0xE000).contains(&low) {
                                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                                resolved = std::char::from_u32(combined);
                                chars = lookahead;
                            }
                        }
                    }
                }
                out.push(resolved.unwrap_or('\u{FFFD}'));
            }
            other => out.push(*SINGLE_CHAR_ESCAPES.get(&other).unwrap_or(&other)),
        }
    }
    Ok(out)
}
