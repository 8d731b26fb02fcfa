use crate::{
    ast::{
        ast::{NodeId, NodeKind},
        expressions::{AssignOp, BinaryOp, Literal, LogicalOp, MemberKey, UnaryOp},
        statements::{Function, FunctionKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{TokenKind, RESERVED_LOOKUP},
    Position,
};

use super::{lookups::BindingPower, parser::Parser, stmt::parse_block_stmt};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.get_position();
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Number => NodeKind::Literal(Literal::Number(parse_number(&token.value, start)?)),
        TokenKind::String => NodeKind::Literal(Literal::String(token.value.clone())),
        TokenKind::True => NodeKind::Literal(Literal::Boolean(true)),
        TokenKind::False => NodeKind::Literal(Literal::Boolean(false)),
        TokenKind::Null => NodeKind::Literal(Literal::Null),
        TokenKind::This => NodeKind::This,
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    Ok(parser.push(kind, start))
}

fn parse_number(text: &str, position: Position) -> Result<f64, Error> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).map(|value| value as f64).ok(),
        None => text.parse::<f64>().ok(),
    };

    parsed.ok_or_else(|| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: text.to_string(),
            },
            position,
        )
    })
}

pub fn parse_identifier_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    if parser.peek_kind(1) == TokenKind::Arrow {
        return parse_arrow_expr(parser);
    }

    let start = parser.get_position();
    let name = parser.expect(TokenKind::Identifier)?.value;
    Ok(parser.push(NodeKind::Identifier { name }, start))
}

pub fn parse_binary_expr(parser: &mut Parser, left: NodeId, bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    let operator_token = parser.advance().clone();
    let op = BinaryOp::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start,
        )
    })?;

    // Exponentiation is right associative
    let right_bp = if op == BinaryOp::Pow {
        BindingPower::Multiplicative
    } else {
        bp
    };
    let right = parse_expr(parser, right_bp)?;

    Ok(parser.push(NodeKind::Binary { op, left, right }, start))
}

pub fn parse_logical_expr(parser: &mut Parser, left: NodeId, bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    let op = match parser.advance().kind {
        TokenKind::And => LogicalOp::And,
        _ => LogicalOp::Or,
    };
    let right = parse_expr(parser, bp)?;

    Ok(parser.push(NodeKind::Logical { op, left, right }, start))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.get_position();
    let operator_token = parser.advance().clone();
    let op = UnaryOp::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start,
        )
    })?;
    let argument = parse_expr(parser, BindingPower::Exponent)?;

    Ok(parser.push(NodeKind::Unary { op, argument }, start))
}

pub fn parse_update_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.current_token().clone();
    Err(Error::new(
        ErrorImpl::UnsupportedSyntax {
            construct: token.value,
        },
        token.span.start,
    ))
}

pub fn parse_update_postfix_expr(
    parser: &mut Parser,
    _left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    parse_update_prefix_expr(parser)
}

pub fn parse_assignment_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;

    match parser.kind_of(left) {
        NodeKind::Identifier { .. } | NodeKind::Member { .. } => (),
        other => {
            return Err(Error::new(
                ErrorImpl::InvalidTarget {
                    node: other.name().to_string(),
                },
                start,
            ))
        }
    }

    let operator_token = parser.advance().clone();
    let op = AssignOp::from_token(operator_token.kind).unwrap_or(AssignOp::Assign);

    // Right associative: `a = b = c`
    let value = parse_expr(parser, BindingPower::Comma)?;

    Ok(parser.push(
        NodeKind::Assign {
            op,
            target: left,
            value,
        },
        start,
    ))
}

pub fn parse_conditional_expr(parser: &mut Parser, test: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(test).start;
    parser.expect(TokenKind::Question)?;
    let consequent = parse_expr(parser, BindingPower::Comma)?;
    parser.expect(TokenKind::Colon)?;
    let alternate = parse_expr(parser, BindingPower::Comma)?;

    Ok(parser.push(
        NodeKind::Conditional {
            test,
            consequent,
            alternate,
        },
        start,
    ))
}

pub fn parse_sequence_expr(parser: &mut Parser, left: NodeId, bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    let mut expressions = vec![left];

    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        expressions.push(parse_expr(parser, bp)?);
    }

    Ok(parser.push(NodeKind::Sequence { expressions }, start))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    if parser.is_arrow_ahead() {
        return parse_arrow_expr(parser);
    }

    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// Parses a comma separated list up to `close`, allowing a trailing comma.
fn parse_expr_list(parser: &mut Parser, close: TokenKind) -> Result<Vec<NodeId>, Error> {
    let mut items = vec![];

    while parser.current_token_kind() != close {
        items.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != close {
            return Err(parser.unexpected());
        }
    }

    parser.expect(close)?;
    Ok(items)
}

pub fn parse_call_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    parser.expect(TokenKind::OpenParen)?;
    let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;

    Ok(parser.push(
        NodeKind::Call {
            callee: left,
            arguments,
        },
        start,
    ))
}

pub fn parse_new_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;

    // Stops before the argument list
    let callee = parse_expr(parser, BindingPower::Call)?;

    let arguments = if parser.current_token_kind() == TokenKind::OpenParen {
        parser.advance();
        parse_expr_list(parser, TokenKind::CloseParen)?
    } else {
        vec![]
    };

    Ok(parser.push(NodeKind::New { callee, arguments }, start))
}

pub fn parse_member_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    parser.expect(TokenKind::Dot)?;

    let token = parser.current_token().clone();
    let is_name = token.kind == TokenKind::Identifier || RESERVED_LOOKUP.contains_key(token.value.as_str());
    if !is_name {
        return Err(parser.unexpected_detailed("expected property name after `.`"));
    }
    parser.advance();

    Ok(parser.push(
        NodeKind::Member {
            object: left,
            property: MemberKey::Named(token.value),
        },
        start,
    ))
}

pub fn parse_computed_member_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    let start = parser.span_of(left).start;
    parser.expect(TokenKind::OpenBracket)?;
    let key = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(parser.push(
        NodeKind::Member {
            object: left,
            property: MemberKey::Computed(key),
        },
        start,
    ))
}

pub fn parse_array_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;
    let elements = parse_expr_list(parser, TokenKind::CloseBracket)?;

    Ok(parser.push(NodeKind::Array { elements }, start))
}

pub fn parse_object_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    // { key: value, "other": 2, 3: x, shorthand }
    let start = parser.advance().span.start;
    let mut properties = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let property_start = parser.get_position();
        let key_token = parser.current_token().clone();

        let key = match key_token.kind {
            TokenKind::Identifier | TokenKind::String => key_token.value.clone(),
            TokenKind::Number => {
                crate::value::value::number_to_string(parse_number(&key_token.value, property_start)?)
            }
            _ if RESERVED_LOOKUP.contains_key(key_token.value.as_str()) => key_token.value.clone(),
            _ => return Err(parser.unexpected_detailed("expected property name")),
        };
        parser.advance();

        let value = if parser.current_token_kind() == TokenKind::Colon {
            parser.advance();
            parse_expr(parser, BindingPower::Comma)?
        } else if key_token.kind == TokenKind::Identifier {
            parser.push(NodeKind::Identifier { name: key.clone() }, property_start)
        } else {
            return Err(parser.unexpected_detailed("expected `:` after property name"));
        };

        properties.push(parser.push(NodeKind::Property { key, value }, property_start));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseCurly {
            return Err(parser.unexpected());
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(parser.push(NodeKind::Object { properties }, start))
}

/// Parses `(a, b)` parameter lists into `Param` nodes.
pub fn parse_params(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let mut params = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        let start = parser.get_position();
        let error = parser.unexpected_detailed("expected parameter name");
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
        params.push(parser.push(NodeKind::Param { name }, start));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected());
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(params)
}

/// Parses `function name?(params) { body }` once the kind is known.
pub fn parse_function(parser: &mut Parser, kind: FunctionKind) -> Result<NodeId, Error> {
    let start = parser.expect(TokenKind::Function)?.span.start;

    let name = if parser.current_token_kind() == TokenKind::Identifier {
        Some(parser.advance().value.clone())
    } else if kind == FunctionKind::Declaration {
        return Err(parser.unexpected_detailed("expected function name"));
    } else {
        None
    };

    let params = parse_params(parser)?;
    let body = parse_block_stmt(parser)?;

    Ok(parser.push(
        NodeKind::Function(Function {
            kind,
            name,
            params,
            body,
            expression_body: false,
        }),
        start,
    ))
}

pub fn parse_function_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parse_function(parser, FunctionKind::Expression)
}

pub fn parse_arrow_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.get_position();

    let params = if parser.current_token_kind() == TokenKind::Identifier {
        let name = parser.advance().value.clone();
        vec![parser.push(NodeKind::Param { name }, start)]
    } else {
        parse_params(parser)?
    };

    parser.expect(TokenKind::Arrow)?;

    let (body, expression_body) = if parser.current_token_kind() == TokenKind::OpenCurly {
        (parse_block_stmt(parser)?, false)
    } else {
        (parse_expr(parser, BindingPower::Comma)?, true)
    };

    Ok(parser.push(
        NodeKind::Function(Function {
            kind: FunctionKind::Arrow,
            name: None,
            params,
            body,
            expression_body,
        }),
        start,
    ))
}
