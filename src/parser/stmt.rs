use crate::{
    ast::{
        ast::{NodeId, NodeKind},
        statements::{DeclKind, FunctionKind},
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{expr::parse_function, parser::Parser};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()) {
        let handler = *handler;
        return handler(parser);
    }

    let start = parser.get_position();
    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.consume_semicolon()?;

    Ok(parser.push(NodeKind::ExprStmt { expr }, start))
}

pub fn parse_empty_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.expect(TokenKind::Semicolon)?.span.start;
    Ok(parser.push(NodeKind::Empty, start))
}

/// Parses `var a = 1, b` without the trailing semicolon.
fn parse_var_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let start_token = parser.advance().clone();
    let kind = match start_token.kind {
        TokenKind::Const => DeclKind::Const,
        TokenKind::Let => DeclKind::Let,
        _ => DeclKind::Var,
    };

    let mut declarators = vec![];

    loop {
        let start = parser.get_position();
        let error = parser.unexpected_detailed("expected identifier during variable declaration");
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

        let init = if parser.current_token_kind() == TokenKind::Assignment {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Comma)?)
        } else {
            None
        };

        if kind == DeclKind::Const && init.is_none() {
            return Err(parser.unexpected_detailed("expected rhs in constant definition"));
        }

        declarators.push(parser.push(NodeKind::Declarator { name, init }, start));

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    Ok(parser.push(NodeKind::VarDecl { kind, declarators }, start_token.span.start))
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let declaration = parse_var_decl(parser)?;
    parser.consume_semicolon()?;
    Ok(declaration)
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    parse_function(parser, FunctionKind::Declaration)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;

    parser.expect(TokenKind::OpenParen)?;
    let test = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    let consequent = parse_stmt(parser)?;

    let alternate = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(parse_stmt(parser)?)
    } else {
        None
    };

    Ok(parser.push(
        NodeKind::If {
            test,
            consequent,
            alternate,
        },
        start,
    ))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut body = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected_detailed("expected `}` before end of input"));
        }
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(parser.push(NodeKind::Block { body }, start))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;

    let ends_here = matches!(
        parser.current_token_kind(),
        TokenKind::Semicolon | TokenKind::CloseCurly | TokenKind::EOF
    ) || parser.on_new_line();

    let argument = if ends_here {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    parser.consume_semicolon()?;

    Ok(parser.push(NodeKind::Return { argument }, start))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;

    parser.expect(TokenKind::OpenParen)?;
    let test = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;
    let body = parse_stmt(parser)?;

    Ok(parser.push(NodeKind::While { test, body }, start))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    // for (init; test; update) body
    let start = parser.advance().span.start;
    parser.expect(TokenKind::OpenParen)?;

    let init = match parser.current_token_kind() {
        TokenKind::Semicolon => None,
        TokenKind::Var | TokenKind::Let | TokenKind::Const => Some(parse_var_decl(parser)?),
        _ => Some(parse_expr(parser, BindingPower::Default)?),
    };
    parser.expect(TokenKind::Semicolon)?;

    let test = match parser.current_token_kind() {
        TokenKind::Semicolon => None,
        _ => Some(parse_expr(parser, BindingPower::Default)?),
    };
    parser.expect(TokenKind::Semicolon)?;

    let update = match parser.current_token_kind() {
        TokenKind::CloseParen => None,
        _ => Some(parse_expr(parser, BindingPower::Default)?),
    };
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_stmt(parser)?;

    Ok(parser.push(
        NodeKind::For {
            init,
            test,
            update,
            body,
        },
        start,
    ))
}

pub fn parse_try_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;
    let block = parse_block_stmt(parser)?;

    let handler = if parser.current_token_kind() == TokenKind::Catch {
        let catch_start = parser.advance().span.start;

        let param = if parser.current_token_kind() == TokenKind::OpenParen {
            parser.advance();
            let param_start = parser.get_position();
            let name = parser.expect(TokenKind::Identifier)?.value;
            let param = parser.push(NodeKind::Param { name }, param_start);
            parser.expect(TokenKind::CloseParen)?;
            Some(param)
        } else {
            None
        };

        let body = parse_block_stmt(parser)?;
        Some(parser.push(NodeKind::Catch { param, body }, catch_start))
    } else {
        None
    };

    let finalizer = if parser.current_token_kind() == TokenKind::Finally {
        parser.advance();
        Some(parse_block_stmt(parser)?)
    } else {
        None
    };

    if handler.is_none() && finalizer.is_none() {
        return Err(parser.unexpected_detailed("expected `catch` or `finally` after `try` block"));
    }

    Ok(parser.push(
        NodeKind::Try {
            block,
            handler,
            finalizer,
        },
        start,
    ))
}

pub fn parse_throw_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start;
    let argument = parse_expr(parser, BindingPower::Default)?;
    parser.consume_semicolon()?;

    Ok(parser.push(NodeKind::Throw { argument }, start))
}

pub fn parse_jump_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.advance().clone();
    parser.consume_semicolon()?;

    let kind = if token.kind == TokenKind::Break {
        NodeKind::Break
    } else {
        NodeKind::Continue
    };
    Ok(parser.push(kind, token.span.start))
}
