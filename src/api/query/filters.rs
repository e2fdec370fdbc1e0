//! Filter expression trees and their OData `$filter` compilation

use crate::api::edm::EdmValue;

/// A filter expression tree.
///
/// Operators are carried as plain strings and are not validated here; an
/// unknown operator propagates to the wire uninterpreted. Grouping is encoded
/// by the tree itself, so compilation needs no precedence rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A raw property reference, emitted without quoting.
    PropertyName(String),
    /// A typed constant; `None` compiles to the literal `null`.
    Constant(Option<EdmValue>),
    /// Prefix operator application, e.g. `not(...)`.
    Unary { op: String, operand: Box<Filter> },
    /// Infix operator application, fully parenthesized on output.
    Binary {
        op: String,
        left: Box<Filter>,
        right: Box<Filter>,
    },
    /// A caller-supplied query fragment, emitted verbatim and unescaped.
    QueryString(String),
}

impl Filter {
    pub fn prop(name: impl Into<String>) -> Self {
        Self::PropertyName(name.into())
    }

    pub fn constant(value: impl Into<EdmValue>) -> Self {
        Self::Constant(Some(value.into()))
    }

    pub fn null_constant() -> Self {
        Self::Constant(None)
    }

    pub fn query_string(query: impl Into<String>) -> Self {
        Self::QueryString(query.into())
    }

    pub fn unary(op: impl Into<String>, operand: Filter) -> Self {
        Self::Unary {
            op: op.into(),
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: impl Into<String>, left: Filter, right: Filter) -> Self {
        Self::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Filter) -> Self {
        Self::unary("not", operand)
    }

    pub fn and(left: Filter, right: Filter) -> Self {
        Self::binary("and", left, right)
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Self::binary("or", left, right)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("eq", Self::prop(field), Self::constant(value))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("ne", Self::prop(field), Self::constant(value))
    }

    pub fn ge(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("ge", Self::prop(field), Self::constant(value))
    }

    pub fn gt(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("gt", Self::prop(field), Self::constant(value))
    }

    pub fn le(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("le", Self::prop(field), Self::constant(value))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<EdmValue>) -> Self {
        Self::binary("lt", Self::prop(field), Self::constant(value))
    }

    /// Compile an optional filter; absent filters compile to the empty string.
    pub fn compile(filter: Option<&Filter>) -> String {
        match filter {
            Some(filter) => filter.to_odata_string(),
            None => String::new(),
        }
    }

    /// Convert this tree to OData `$filter` syntax.
    pub fn to_odata_string(&self) -> String {
        let mut expression = String::new();
        self.write_expression(&mut expression);
        expression
    }

    fn write_expression(&self, e: &mut String) {
        match self {
            Filter::PropertyName(name) => e.push_str(name),
            Filter::Constant(None) => e.push_str("null"),
            Filter::Constant(Some(value)) => e.push_str(&value.serialize_query_value()),
            Filter::Unary { op, operand } => {
                e.push_str(op);
                e.push('(');
                operand.write_expression(e);
                e.push(')');
            }
            Filter::Binary { op, left, right } => {
                e.push('(');
                left.write_expression(e);
                e.push(' ');
                e.push_str(op);
                e.push(' ');
                right.write_expression(e);
                e.push(')');
            }
            Filter::QueryString(query) => e.push_str(query),
        }
    }
}
