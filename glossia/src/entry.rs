//! Parsed localization data model
//!
//! Both parsers produce this model. An [`Entry`] is either a plain string
//! or a [`Node`] carrying a value, attributes (one level deep), and an
//! optional index expression list that selects a case from a hash value.

use std::collections::HashMap;
use std::fmt;

/// A parsed localization unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A plain string, returned by the resolver unchanged
    Simple(String),
    /// A structured node with value, attributes, and/or index
    Node(Node),
}

/// A structured entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// The entry value, absent for attribute-only entries
    pub value: Option<Value>,
    /// Attribute entries keyed by name
    pub attrs: Option<HashMap<String, Entry>>,
    /// Selector expressions picking a case from a hash value
    pub index: Option<Vec<Expr>>,
}

/// An entry or hash-case value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A literal string
    Str(String),
    /// A complex string: literal and placeable segments
    Complex(Vec<Segment>),
    /// A selector hash mapping case labels to sub-values
    Hash(HashValue),
}

/// One segment of a complex string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, concatenated verbatim
    Literal(String),
    /// An inline `{{ ... }}` interpolation site
    Placeable(Expr),
}

/// A selector hash: case labels mapped to values, with at most one label
/// marked as the default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HashValue {
    /// Case values keyed by label
    pub items: HashMap<String, Value>,
    /// Label marked with `*`, if any
    pub default: Option<String>,
}

/// A placeable or selector expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare identifier
    Id(String),
    /// A `$name` argument reference
    Var(String),
    /// An `@name` global reference
    Glob(String),
    /// Property access, `expr.prop` or `expr[computed]`
    Prop(Box<Expr>, PropKey),
    /// A call, `expr(arg, ...)`
    Call(Box<Expr>, Vec<Expr>),
}

/// The accessor of a property expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    /// `expr.name`
    Ident(String),
    /// `expr[computed]`
    Computed(Box<Expr>),
}

impl Expr {
    /// The referenced name, when this expression is a direct reference.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(name) | Self::Var(name) | Self::Glob(name) => Some(name),
            Self::Prop(..) | Self::Call(..) => None,
        }
    }
}

impl fmt::Display for Expr {
    /// Reconstructs the source form, e.g. `@cldr.plural($n)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(name) => write!(f, "{name}"),
            Self::Var(name) => write!(f, "${name}"),
            Self::Glob(name) => write!(f, "@{name}"),
            Self::Prop(expr, PropKey::Ident(name)) => write!(f, "{expr}.{name}"),
            Self::Prop(expr, PropKey::Computed(key)) => write!(f, "{expr}[{key}]"),
            Self::Call(callee, args) => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_names() {
        assert_eq!(Expr::Id("n".to_string()).name(), Some("n"));
        assert_eq!(Expr::Var("n".to_string()).name(), Some("n"));
        assert_eq!(
            Expr::Call(Box::new(Expr::Id("f".to_string())), Vec::new()).name(),
            None
        );
    }

    #[test]
    fn test_expr_display() {
        let expr = Expr::Call(
            Box::new(Expr::Prop(
                Box::new(Expr::Glob("cldr".to_string())),
                PropKey::Ident("plural".to_string()),
            )),
            vec![Expr::Var("n".to_string())],
        );
        assert_eq!(expr.to_string(), "@cldr.plural($n)");

        let expr = Expr::Prop(
            Box::new(Expr::Id("a".to_string())),
            PropKey::Computed(Box::new(Expr::Id("b".to_string()))),
        );
        assert_eq!(expr.to_string(), "a[b]");
    }
}
