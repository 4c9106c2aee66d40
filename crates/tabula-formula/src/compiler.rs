//! Formula compilation
//!
//! Compiling turns formula text into an AST whose references are indices
//! into an ordered dependency list. The owner of the formula resolves those
//! texts into ranges once, adapts them on structural edits, and renders the
//! formula back with the adapted texts.

use crate::ast::Expr;
use crate::context::{EvaluationContext, ReferenceResolver};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::function_registry;
use crate::interpreter::Interpreter;
use crate::parser::{parse, tokenize, Token, TokenKind};
use crate::value::ComputedValue;
use tabula_core::{EvaluationError, Range};

/// A parsed formula, ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    ast: Expr,
    dependencies: Vec<String>,
    tokens: Vec<Token>,
}

impl CompiledFormula {
    /// Compile formula text, which must start with `=`
    ///
    /// The same reference written twice is one dependency.
    pub fn compile(text: &str) -> FormulaResult<Self> {
        let body = text
            .strip_prefix('=')
            .ok_or_else(|| FormulaError::Parse("Formula must start with '='".to_string()))?;

        let mut tokens = tokenize(body)?;
        let mut dependencies: Vec<String> = Vec::new();
        for token in tokens.iter_mut() {
            if let TokenKind::Reference(index) = &mut token.kind {
                *index = match dependencies.iter().position(|dep| *dep == token.text) {
                    Some(existing) => existing,
                    None => {
                        dependencies.push(token.text.clone());
                        dependencies.len() - 1
                    }
                };
            }
        }

        let ast = parse(&tokens)?;
        check_arity(&ast)?;

        Ok(Self {
            ast,
            dependencies,
            tokens,
        })
    }

    /// Reference texts in order of first appearance
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Formula text with each reference replaced by the matching entry of `dependencies`
    ///
    /// Everything else, whitespace included, is written back as typed.
    pub fn render(&self, dependencies: &[String]) -> String {
        let mut out = String::from("=");
        for token in &self.tokens {
            match token.kind {
                TokenKind::Reference(index) => {
                    out.push_str(dependencies.get(index).unwrap_or(&token.text))
                }
                _ => out.push_str(&token.text),
            }
        }
        out
    }

    /// Run the formula
    ///
    /// `dependencies` are the ranges of [`Self::dependencies`], in the same
    /// order.
    pub fn execute(
        &self,
        dependencies: &[Range],
        resolver: &dyn ReferenceResolver,
        ctx: &EvaluationContext<'_>,
    ) -> Result<ComputedValue, EvaluationError> {
        Interpreter::new(dependencies, resolver, ctx).run(&self.ast)
    }
}

/// Reject calls to known functions with the wrong number of arguments
///
/// Unknown functions compile; they fail when executed.
fn check_arity(expr: &Expr) -> FormulaResult<()> {
    match expr {
        Expr::Function { name, args } => {
            if let Some(def) = function_registry().get(name) {
                if !def.accepts(args.len()) {
                    return Err(FormulaError::ArgumentCount {
                        function: def.name.to_string(),
                        expected: def.arity(),
                        actual: args.len(),
                    });
                }
            }
            args.iter().try_for_each(check_arity)
        }
        Expr::Binary { left, right, .. } => {
            check_arity(left)?;
            check_arity(right)
        }
        Expr::Unary { operand, .. } => check_arity(operand),
        Expr::Array(rows) => rows.iter().flatten().try_for_each(check_arity),
        _ => Ok(()),
    }
}
