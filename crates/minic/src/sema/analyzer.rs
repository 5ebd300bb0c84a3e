//! Semantic analyzer - scope resolution and type checking

use crate::ast::*;
use crate::common::{SemaResult, SemanticError, SemanticErrorKind, Span};
use log::debug;
use super::scope::{ScopeTable, Symbol};
use super::types::TypeChecker;

/// Default bound on statement/expression nesting during analysis
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Analyzer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaConfig {
    /// Deepest AST nesting analyzed before failing with `StackExhausted`
    pub max_depth: usize,
    /// Accept `int` values where `float` is declared
    pub widen_int_to_float: bool,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            widen_int_to_float: false,
        }
    }
}

/// Function whose body is currently being analyzed
#[derive(Debug)]
struct FunctionContext {
    name: String,
    return_type: Type,
    saw_return: bool,
}

/// Semantic analyzer for type checking
pub struct SemanticAnalyzer {
    config: SemaConfig,
    checker: TypeChecker,
    scopes: ScopeTable,
    current_function: Option<FunctionContext>,
    depth: usize,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::with_config(SemaConfig::default())
    }

    pub fn with_config(config: SemaConfig) -> Self {
        Self {
            config,
            checker: TypeChecker::with_widening(config.widen_int_to_float),
            scopes: ScopeTable::new(),
            current_function: None,
            depth: 0,
        }
    }

    pub fn config(&self) -> &SemaConfig {
        &self.config
    }

    /// Analyze a program, filling in the type of every expression.
    ///
    /// Stops at the first violation. Each call starts from an empty scope
    /// table, so an analyzer can be reused after a failure.
    pub fn analyze(&mut self, program: &mut Program) -> SemaResult<()> {
        self.scopes = ScopeTable::new();
        self.current_function = None;
        self.depth = 0;

        debug!("analyzing program with {} top-level statements", program.items.len());

        self.with_scope(|this| this.analyze_stmts(&mut program.items))?;

        if self.scopes.depth() != 0 {
            return Err(SemanticError::internal(
                format!("{} scope(s) left open after analysis", self.scopes.depth()),
                program.span,
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Scope and depth discipline
    // =========================================================================

    /// Run `f` inside a fresh child scope, closing it on every exit path
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> SemaResult<T>) -> SemaResult<T> {
        self.scopes.enter_scope();
        let result = f(self);
        let exited = self.scopes.exit_scope();
        let value = result?;
        exited?;
        Ok(value)
    }

    fn descend<T>(&mut self, span: Span, f: impl FnOnce(&mut Self) -> SemaResult<T>) -> SemaResult<T> {
        if self.depth >= self.config.max_depth {
            return Err(SemanticError::new(
                SemanticErrorKind::StackExhausted,
                format!("nesting depth exceeds the limit of {}", self.config.max_depth),
                span,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn analyze_stmts(&mut self, stmts: &mut [Stmt]) -> SemaResult<()> {
        for stmt in stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    fn analyze_block(&mut self, block: &mut Block) -> SemaResult<()> {
        self.with_scope(|this| this.analyze_stmts(&mut block.stmts))
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        let span = stmt.span;
        self.descend(span, |this| this.analyze_stmt_kind(&mut stmt.kind, span))
    }

    fn analyze_stmt_kind(&mut self, kind: &mut StmtKind, span: Span) -> SemaResult<()> {
        match kind {
            StmtKind::Declaration(decl) => self.analyze_var_decl(decl),
            StmtKind::Assign { name, value } => self.analyze_assign(name, value, span),
            StmtKind::If { condition, then_block, else_block } => {
                self.check_condition(condition, "if")?;
                self.analyze_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.analyze_block(else_block)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                self.check_condition(condition, "while")?;
                self.analyze_block(body)
            }
            StmtKind::For { init, condition, update, body } => {
                // One scope spans the header and the body
                self.with_scope(|this| {
                    if let Some(init) = init {
                        this.analyze_stmt(init)?;
                    }
                    if let Some(condition) = condition {
                        this.check_condition(condition, "for")?;
                    }
                    if let Some(update) = update {
                        this.analyze_stmt(update)?;
                    }
                    this.analyze_block(body)
                })
            }
            StmtKind::Function(func) => self.analyze_func_decl(func),
            StmtKind::Return(value) => self.analyze_return(value.as_mut(), span),
            StmtKind::Block(block) => self.analyze_block(block),
            StmtKind::Expr(expr) => {
                self.analyze_expr(expr)?;
                Ok(())
            }
        }
    }

    fn analyze_var_decl(&mut self, decl: &mut VarDecl) -> SemaResult<()> {
        // Declared before the initializer is analyzed, so `int x = x;` resolves
        self.scopes.declare(Symbol::variable(&decl.name, decl.ty.clone(), decl.span))?;

        if !decl.ty.is_value() {
            return Err(SemanticError::new(
                SemanticErrorKind::TypeMismatch,
                format!("variable '{}' cannot have type '{}'", decl.name, decl.ty),
                decl.span,
            ));
        }

        if let Some(init) = &mut decl.init {
            let actual = self.analyze_expr(init)?;
            if !self.checker.is_compatible(&decl.ty, &actual) {
                return Err(SemanticError::new(
                    SemanticErrorKind::TypeMismatch,
                    format!(
                        "cannot initialize '{}' of type '{}' with a value of type '{}'",
                        decl.name, decl.ty, actual
                    ),
                    init.span,
                ));
            }
        }
        Ok(())
    }

    fn analyze_assign(&mut self, name: &str, value: &mut Expr, span: Span) -> SemaResult<()> {
        let symbol = self.scopes.resolve(name, span)?;
        if symbol.is_function() {
            return Err(SemanticError::new(
                SemanticErrorKind::TypeMismatch,
                format!("cannot assign to function '{}'", name),
                span,
            ));
        }
        let declared = symbol.ty.clone();

        let actual = self.analyze_expr(value)?;
        if !self.checker.is_compatible(&declared, &actual) {
            return Err(SemanticError::new(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "cannot assign a value of type '{}' to '{}' of type '{}'",
                    actual, name, declared
                ),
                value.span,
            ));
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut Expr, construct: &str) -> SemaResult<()> {
        let ty = self.analyze_expr(condition)?;
        if ty.is_bool() {
            Ok(())
        } else {
            Err(SemanticError::new(
                SemanticErrorKind::InvalidConditionType,
                format!("{} condition must be 'bool', found '{}'", construct, ty),
                condition.span,
            ))
        }
    }

    fn analyze_func_decl(&mut self, func: &mut FuncDecl) -> SemaResult<()> {
        // Declared before the body so recursive calls resolve
        self.scopes.declare(Symbol::function(&func.name, func.signature(), func.span))?;

        let outer = self.current_function.replace(FunctionContext {
            name: func.name.clone(),
            return_type: func.return_type.clone(),
            saw_return: false,
        });

        // Parameters and top-level locals share one frame
        let result = self.with_scope(|this| {
            for param in &func.params {
                this.scopes.declare(Symbol::parameter(&param.name, param.ty.clone(), param.span))?;
                if !param.ty.is_value() {
                    return Err(SemanticError::new(
                        SemanticErrorKind::TypeMismatch,
                        format!("parameter '{}' cannot have type '{}'", param.name, param.ty),
                        param.span,
                    ));
                }
            }
            this.analyze_stmts(&mut func.body.stmts)
        });

        let context = std::mem::replace(&mut self.current_function, outer);
        result?;

        let saw_return = context.is_some_and(|ctx| ctx.saw_return);
        if !saw_return && !func.return_type.is_void() {
            return Err(SemanticError::new(
                SemanticErrorKind::ReturnTypeMismatch,
                format!(
                    "function '{}' is declared to return '{}' but never returns a value",
                    func.name, func.return_type
                ),
                func.span,
            ));
        }

        debug!("function '{}': {}", func.name, func.signature());
        Ok(())
    }

    fn analyze_return(&mut self, value: Option<&mut Expr>, span: Span) -> SemaResult<()> {
        if self.current_function.is_none() {
            return Err(SemanticError::new(
                SemanticErrorKind::ReturnOutsideFunction,
                "'return' outside of a function body",
                span,
            ));
        }

        let (actual, value_span) = match value {
            Some(expr) => (self.analyze_expr(expr)?, expr.span),
            None => (Type::Void, span),
        };

        let checker = self.checker;
        let Some(ctx) = self.current_function.as_mut() else {
            return Err(SemanticError::internal("function context lost during return", span));
        };
        ctx.saw_return = true;

        if checker.is_compatible(&ctx.return_type, &actual) {
            Ok(())
        } else {
            Err(SemanticError::new(
                SemanticErrorKind::ReturnTypeMismatch,
                format!(
                    "function '{}' returns '{}' but this returns '{}'",
                    ctx.name, ctx.return_type, actual
                ),
                value_span,
            ))
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Analyze an expression and record its type in the node
    fn analyze_expr(&mut self, expr: &mut Expr) -> SemaResult<Type> {
        let span = expr.span;
        let ty = self.descend(span, |this| this.analyze_expr_kind(&mut expr.kind, span))?;
        expr.ty = Some(ty.clone());
        Ok(ty)
    }

    fn analyze_expr_kind(&mut self, kind: &mut ExprKind, span: Span) -> SemaResult<Type> {
        match kind {
            ExprKind::IntLiteral(_) => Ok(Type::Int),
            ExprKind::FloatLiteral(_) => Ok(Type::Float),
            ExprKind::BoolLiteral(_) => Ok(Type::Bool),
            ExprKind::StringLiteral(_) => Ok(Type::Str),

            ExprKind::Variable(name) => Ok(self.scopes.resolve(name, span)?.ty.clone()),

            ExprKind::Unary { op, operand } => {
                let operand_ty = self.analyze_expr(operand)?;
                self.checker.unary_result_type(*op, &operand_ty, span)
            }

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.analyze_expr(left)?;
                let right_ty = self.analyze_expr(right)?;
                self.checker.binary_result_type(*op, &left_ty, &right_ty, span)
            }

            ExprKind::Call { name, args } => self.analyze_call(name, args, span),
        }
    }

    fn analyze_call(&mut self, name: &str, args: &mut [Expr], span: Span) -> SemaResult<Type> {
        let symbol = self.scopes.resolve(name, span)?;
        let Some((params, ret)) = symbol.signature() else {
            return Err(SemanticError::new(
                SemanticErrorKind::NotCallable,
                format!(
                    "'{}' is a {} of type '{}', not a function",
                    name,
                    symbol.kind.describe(),
                    symbol.ty
                ),
                span,
            ));
        };
        let (params, ret) = (params.to_vec(), ret.clone());

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_types.push(self.analyze_expr(arg)?);
        }

        if args.len() != params.len() {
            return Err(SemanticError::new(
                SemanticErrorKind::ArityMismatch,
                format!(
                    "function '{}' expects {} argument(s) but {} were supplied",
                    name,
                    params.len(),
                    args.len()
                ),
                span,
            ));
        }

        for (index, ((expected, actual), arg)) in params.iter().zip(&arg_types).zip(args.iter()).enumerate() {
            if !self.checker.is_compatible(expected, actual) {
                return Err(SemanticError::new(
                    SemanticErrorKind::ArgumentTypeMismatch,
                    format!(
                        "argument {} of '{}' expects '{}', found '{}'",
                        index + 1,
                        name,
                        expected,
                        actual
                    ),
                    arg.span,
                ));
            }
        }

        Ok(ret)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze an owned program with the default configuration.
///
/// Returns the annotated program on success; nothing of it on failure.
pub fn analyze(program: Program) -> SemaResult<Program> {
    analyze_with(program, SemaConfig::default())
}

/// Analyze an owned program with an explicit configuration
pub fn analyze_with(mut program: Program, config: SemaConfig) -> SemaResult<Program> {
    SemanticAnalyzer::with_config(config).analyze(&mut program)?;
    Ok(program)
}
