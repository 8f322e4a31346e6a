//! AST node types for formulas.
//!
//! Every node carries a [`Span`] and exclusively owns its children, so a
//! formula is always a finite tree. Nodes are never mutated after the parser
//! builds them; the same tree can be evaluated any number of times.
//!
//! [`fmt::Display`] renders the diagnostic prefix form, e.g.
//! `(and (< a b) (not c))`. It is not meant to be parsed back.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(name, Span::synthetic())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An assignment target such as `a:b:c`.
///
/// The parser builds the chain right to left: the node for `c` is the
/// outermost and `next` points at its qualifier `b`, whose `next` is `a`.
/// [`UnresolvedName::path`] restores source order.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedName {
    pub name: Ident,
    pub next: Option<Box<UnresolvedName>>,
}

impl UnresolvedName {
    pub fn new(name: Ident) -> Self {
        Self { name, next: None }
    }

    /// `qualifier:self`
    pub fn qualified_by(name: Ident, qualifier: UnresolvedName) -> Self {
        Self {
            name,
            next: Some(Box::new(qualifier)),
        }
    }

    /// Build the parser's right-to-left chain from segments in source order.
    ///
    /// Returns `None` for an empty path.
    pub fn from_path<S: AsRef<str>>(segments: &[S]) -> Option<Self> {
        let mut iter = segments.iter();
        let first = iter.next()?;
        let mut node = UnresolvedName::new(Ident::synthetic(first.as_ref()));
        for segment in iter {
            node = UnresolvedName::qualified_by(Ident::synthetic(segment.as_ref()), node);
        }
        Some(node)
    }

    /// The qualifier chain in source (outer-to-inner) order.
    pub fn path(&self) -> Vec<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(self);
        while let Some(node) = cursor {
            segments.push(node.name.name.clone());
            cursor = node.next.as_deref();
        }
        segments.reverse();
        segments
    }

    /// Span covering the whole chain.
    pub fn span(&self) -> Span {
        match &self.next {
            Some(next) => self.name.span.merge(next.span()),
            None => self.name.span,
        }
    }
}

impl fmt::Display for UnresolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path().join(":"))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`, `3.5`
    NumberLit(f64),
    /// `"hello"` — raw source text, quote marks included.
    StringLit(String),

    // ── Operators ──
    /// `!x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `a + b`, `a == b`, `a && b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    // ── Names ──
    /// `x` — unqualified lookup through the scope chain.
    Name(Ident),
    /// `rest:name` — lookup of `name` inside the scope value `rest`.
    Resolve { rest: Box<Expr>, name: Ident },
    /// `a:b:c` as an assignment target; never looked up.
    Unresolved(UnresolvedName),

    // ── Calls & Assignment ──
    /// `(callee args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `x, y = value`
    Assign {
        targets: Vec<UnresolvedName>,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ── Builders for code-constructed trees ──

    pub fn number(value: f64) -> Self {
        Self::new(ExprKind::NumberLit(value), Span::synthetic())
    }

    /// `raw` is the literal as written, including its quote marks.
    pub fn string(raw: impl Into<String>) -> Self {
        Self::new(ExprKind::StringLit(raw.into()), Span::synthetic())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Name(Ident::synthetic(name)), Span::synthetic())
    }

    pub fn not(operand: Expr) -> Self {
        let span = operand.span;
        Self::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        let span = left.span.merge(right.span);
        Self::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn resolve(rest: Expr, name: impl Into<String>) -> Self {
        let span = rest.span;
        Self::new(
            ExprKind::Resolve {
                rest: Box::new(rest),
                name: Ident::synthetic(name),
            },
            span,
        )
    }

    pub fn unresolved(name: UnresolvedName) -> Self {
        let span = name.span();
        Self::new(ExprKind::Unresolved(name), span)
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        let span = args
            .iter()
            .fold(callee.span, |span, arg| span.merge(arg.span));
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    pub fn assign(targets: Vec<UnresolvedName>, value: Expr) -> Self {
        let span = targets
            .iter()
            .fold(value.span, |span, target| span.merge(target.span()));
        Self::new(
            ExprKind::Assign {
                targets,
                value: Box::new(value),
            },
            span,
        )
    }
}

/// The text between the quote marks of a raw string literal.
///
/// Exactly the first and last character are dropped; escapes are left as
/// written. Anything shorter than a pair of quotes yields `""`.
pub fn string_contents(raw: &str) -> &str {
    let mut chars = raw.char_indices();
    let start = match chars.next() {
        Some((_, c)) => c.len_utf8(),
        None => return "",
    };
    match chars.next_back() {
        Some((end, _)) => &raw[start..end],
        None => "",
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::NumberLit(n) => write!(f, "{n:?}"),
            ExprKind::StringLit(raw) => write!(f, "\"{}\"", string_contents(raw)),
            ExprKind::Unary { op, operand } => write!(f, "({} {operand})", op.tag()),
            ExprKind::Binary { left, op, right } => write!(f, "({} {left} {right})", op.tag()),
            ExprKind::Name(ident) => write!(f, "{ident}"),
            ExprKind::Resolve { rest, name } => write!(f, "{rest}:{name}"),
            ExprKind::Unresolved(name) => write!(f, "{name}"),
            ExprKind::Call { callee, args } => {
                write!(f, "({callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Assign { targets, value } => match targets.as_slice() {
                [single] => write!(f, "(let {single} {value})"),
                _ => {
                    let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                    write!(f, "(let ({}) {value})", names.join(", "))
                }
            },
        }
    }
}

// ── Binary Operators ──────────────────────────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Logical
    And,
    Or,
    // Equality
    Eq,
    NotEq,
    // Ordering
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
        }
    }

    /// Head of the diagnostic prefix form.
    pub fn tag(&self) -> &'static str {
        match self {
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Eq => "eq?",
            BinOp::NotEq => "ne?",
            other => other.as_str(),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!x`
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
        }
    }
}
