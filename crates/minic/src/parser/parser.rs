//! Recursive descent parser

use crate::ast::*;
use crate::common::{CompileError, CompileResult, Span};
use crate::lexer::{Lexer, Token, TokenKind};

/// Deepest statement/expression nesting the parser accepts
pub const MAX_NESTING: usize = 128;

/// Recursive descent parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
        })
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> CompileResult<Program> {
        let start_span = self.current.span;
        let mut items = Vec::new();

        while !self.at_end() {
            items.push(self.parse_statement()?);
        }

        Ok(Program::new(items, start_span.merge(self.current.span)))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            let span = self.advance()?.span;
            Ok((name, span))
        } else {
            Err(CompileError::parser(
                format!("expected identifier, found {}", self.current.kind),
                self.current.span,
            ))
        }
    }

    /// Is the current token an identifier directly followed by `=`?
    fn at_assignment(&mut self) -> CompileResult<bool> {
        if !matches!(self.current.kind, TokenKind::Identifier(_)) {
            return Ok(false);
        }
        Ok(matches!(self.lexer.peek()?.kind, TokenKind::Eq))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> CompileResult<T>) -> CompileResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::parser(
                format!("nesting exceeds {} levels", MAX_NESTING),
                self.current.span,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Types and declarations
    // =========================================================================

    fn parse_type(&mut self) -> CompileResult<Type> {
        let ty = match self.current.kind {
            TokenKind::Int => Type::Int,
            TokenKind::Float => Type::Float,
            TokenKind::Bool => Type::Bool,
            TokenKind::Str => Type::Str,
            TokenKind::Void => Type::Void,
            _ => {
                return Err(CompileError::parser(
                    format!("expected type, found {}", self.current.kind),
                    self.current.span,
                ));
            }
        };
        self.advance()?;
        Ok(ty)
    }

    /// Parse `type name ...`: either a function or a variable declaration
    fn parse_typed_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        let ty = self.parse_type()?;
        let (name, _) = self.expect_identifier()?;

        if self.check(&TokenKind::LParen) {
            return self.parse_function_rest(ty, name, start_span);
        }

        let decl = self.parse_var_decl_rest(ty, name, start_span)?;
        let end = self.expect(TokenKind::Semi)?.span;
        let span = start_span.merge(end);
        Ok(Stmt::new(StmtKind::Declaration(VarDecl { span, ..decl }), span))
    }

    fn parse_var_decl_rest(&mut self, ty: Type, name: String, start_span: Span) -> CompileResult<VarDecl> {
        let init = if self.match_token(&TokenKind::Eq)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let end = init.as_ref().map_or(start_span, |e| e.span);
        Ok(VarDecl::new(ty, name, init, start_span.merge(end)))
    }

    fn parse_function_rest(&mut self, return_type: Type, name: String, start_span: Span) -> CompileResult<Stmt> {
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        let span = start_span.merge(body.span);
        let func = FuncDecl::new(return_type, name, params, body, span);
        Ok(Stmt::new(StmtKind::Function(func), span))
    }

    fn parse_parameter_list(&mut self) -> CompileResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let start_span = self.current.span;
            let ty = self.parse_type()?;
            let (name, name_span) = self.expect_identifier()?;
            params.push(Param::new(ty, name, start_span.merge(name_span)));

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(params)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;

        if self.current.kind.is_type_keyword() {
            return self.parse_typed_statement();
        }

        if self.at_assignment()? {
            let stmt = self.parse_assignment()?;
            let end = self.expect(TokenKind::Semi)?.span;
            return Ok(Stmt::new(stmt.kind, start_span.merge(end)));
        }

        match self.current.kind {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }

            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),

            _ => {
                let expr = self.parse_expression()?;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Stmt::new(StmtKind::Expr(expr), start_span.merge(end)))
            }
        }
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start_span = self.current.span;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }

        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Block::new(stmts, start_span.merge(end)))
    }

    /// Parse `name = expr` without the trailing semicolon
    fn parse_assignment(&mut self) -> CompileResult<Stmt> {
        let (name, name_span) = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let span = name_span.merge(value.span);
        Ok(Stmt::new(StmtKind::Assign { name, value }, span))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_block = self.parse_block()?;
        let mut end = then_block.span;

        let else_block = if self.match_token(&TokenKind::Else)? {
            let block = if self.check(&TokenKind::If) {
                // `else if` is an else block holding a single if statement
                let nested = self.parse_statement()?;
                let span = nested.span;
                Block::new(vec![nested], span)
            } else {
                self.parse_block()?
            };
            end = block.span;
            Some(block)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_block,
                else_block,
            },
            start_span.merge(end),
        ))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let span = start_span.merge(body.span);

        Ok(Stmt::new(StmtKind::While { condition, body }, span))
    }

    fn parse_for_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        // Init: declaration or assignment
        let init = if self.check(&TokenKind::Semi) {
            None
        } else if self.current.kind.is_type_keyword() {
            let decl_start = self.current.span;
            let ty = self.parse_type()?;
            let (name, _) = self.expect_identifier()?;
            let decl = self.nested(|p| p.parse_var_decl_rest(ty, name, decl_start))?;
            let span = decl.span;
            Some(Box::new(Stmt::new(StmtKind::Declaration(decl), span)))
        } else if self.at_assignment()? {
            Some(Box::new(self.nested(|p| p.parse_assignment())?))
        } else {
            return Err(CompileError::parser(
                format!("expected declaration or assignment in for initializer, found {}", self.current.kind),
                self.current.span,
            ));
        };
        self.expect(TokenKind::Semi)?;

        let condition = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semi)?;

        // Update: assignment or expression
        let update = if self.check(&TokenKind::RParen) {
            None
        } else if self.at_assignment()? {
            Some(Box::new(self.nested(|p| p.parse_assignment())?))
        } else {
            let expr = self.nested(|p| p.parse_expression())?;
            let span = expr.span;
            Some(Box::new(Stmt::new(StmtKind::Expr(expr), span)))
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        let span = start_span.merge(body.span);

        Ok(Stmt::new(
            StmtKind::For {
                init,
                condition,
                update,
                body,
            },
            span,
        ))
    }

    fn parse_return_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let end = self.expect(TokenKind::Semi)?.span;
        Ok(Stmt::new(StmtKind::Return(value), start_span.merge(end)))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_logical_or_expression()
    }

    fn parse_logical_or_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_logical_and_expression, |kind| match kind {
            TokenKind::PipePipe => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_logical_and_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_equality_expression, |kind| match kind {
            TokenKind::AmpAmp => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_relational_expression, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn parse_relational_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_additive_expression, |kind| match kind {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_multiplicative_expression, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(Self::parse_unary_expression, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    /// One left-associative precedence level: `operand (op operand)*`
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Self) -> CompileResult<Expr>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> CompileResult<Expr> {
        let mut left = operand(self)?;
        let mut height = expr_height(&left);

        while let Some(op) = operator(&self.current.kind) {
            self.advance()?;
            let right = operand(self)?;
            height = 1 + height.max(expr_height(&right));
            // Chains nest to the left, so each operator adds a level
            left = self.bounded(Expr::binary(op, left, right), height)?;
        }
        Ok(left)
    }

    /// Reject `expr` if its subtree would end deeper than the nesting limit
    fn bounded(&self, expr: Expr, height: usize) -> CompileResult<Expr> {
        if self.depth + height > MAX_NESTING {
            return Err(CompileError::parser(
                format!("expression nesting exceeds {} levels", MAX_NESTING),
                expr.span,
            ));
        }
        Ok(expr)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary_expression(),
        };
        let start_span = self.advance()?.span;

        // `-123` is a single literal so that i64::MIN is expressible
        if let (UnaryOp::Neg, TokenKind::IntLiteral(digits)) = (op, &self.current.kind) {
            let text = format!("-{}", digits);
            let span = start_span.merge(self.advance()?.span);
            return int_literal(&text, span);
        }

        let operand = self.nested(|p| p.parse_unary_expression())?;
        let height = 1 + expr_height(&operand);
        let span = start_span.merge(operand.span);
        self.bounded(Expr::unary(op, operand, span), height)
    }

    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let token = self.advance()?;
        let span = token.span;

        match token.kind {
            TokenKind::IntLiteral(text) => int_literal(&text, span),
            TokenKind::FloatLiteral(text) => {
                let value = text.parse::<f64>().map_err(|_| {
                    CompileError::parser(format!("invalid float literal '{}'", text), span)
                })?;
                Ok(Expr::float(value, span))
            }
            TokenKind::StringLiteral(text) => Ok(Expr::string(unescape(&text, span)?, span)),
            TokenKind::True => Ok(Expr::boolean(true, span)),
            TokenKind::False => Ok(Expr::boolean(false, span)),
            TokenKind::Identifier(name) => {
                if self.match_token(&TokenKind::LParen)? {
                    let args = self.parse_argument_list()?;
                    let end = self.expect(TokenKind::RParen)?.span;
                    let height = 1 + args.iter().map(expr_height).max().unwrap_or(0);
                    self.bounded(Expr::call(name, args, span.merge(end)), height)
                } else {
                    Ok(Expr::variable(name, span))
                }
            }
            TokenKind::LParen => {
                let mut inner = self.nested(|p| p.parse_expression())?;
                let end = self.expect(TokenKind::RParen)?.span;
                inner.span = span.merge(end);
                Ok(inner)
            }
            other => Err(CompileError::parser(
                format!("expected expression, found {}", other),
                span,
            )),
        }
    }

    fn parse_argument_list(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.nested(|p| p.parse_expression())?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(args)
    }
}

fn int_literal(text: &str, span: Span) -> CompileResult<Expr> {
    let value = text.parse::<i64>().map_err(|_| {
        CompileError::parser(format!("integer literal '{}' is out of range", text), span)
    })?;
    Ok(Expr::int(value, span))
}

/// Levels from `expr` down to its deepest leaf, counting `expr` itself.
///
/// Only called on subtrees that already passed the nesting check, so the
/// recursion stays within `MAX_NESTING`.
fn expr_height(expr: &Expr) -> usize {
    let below = match &expr.kind {
        ExprKind::Unary { operand, .. } => expr_height(operand),
        ExprKind::Binary { left, right, .. } => expr_height(left).max(expr_height(right)),
        ExprKind::Call { args, .. } => args.iter().map(expr_height).max().unwrap_or(0),
        _ => 0,
    };
    1 + below
}

/// Strip the quotes from a string literal and resolve its escapes
fn unescape(literal: &str, span: Span) -> CompileResult<String> {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(CompileError::parser(
                    format!("unknown escape sequence '\\{}'", other),
                    span,
                ));
            }
            None => return Err(CompileError::parser("unterminated escape sequence", span)),
        }
    }

    Ok(out)
}
