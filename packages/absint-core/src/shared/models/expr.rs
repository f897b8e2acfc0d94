//! Expressions and places of the CFG input contract.
//!
//! The front end lowers source expressions into this closed set; anything
//! outside it arrives as `Expr::Unknown` and is treated conservatively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators the abstract transfer functions understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOpKind {
    /// Comparison operators produce a boolean-valued interval
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOpKind::Eq
                | BinOpKind::Ne
                | BinOpKind::Lt
                | BinOpKind::Le
                | BinOpKind::Gt
                | BinOpKind::Ge
        )
    }

    /// The operator testing the negated condition (false edge of a branch)
    pub fn negate(&self) -> Option<BinOpKind> {
        match self {
            BinOpKind::Eq => Some(BinOpKind::Ne),
            BinOpKind::Ne => Some(BinOpKind::Eq),
            BinOpKind::Lt => Some(BinOpKind::Ge),
            BinOpKind::Le => Some(BinOpKind::Gt),
            BinOpKind::Gt => Some(BinOpKind::Le),
            BinOpKind::Ge => Some(BinOpKind::Lt),
            _ => None,
        }
    }

    /// The operator with operands swapped (`a < b` ⇔ `b > a`)
    pub fn swap(&self) -> Option<BinOpKind> {
        match self {
            BinOpKind::Eq => Some(BinOpKind::Eq),
            BinOpKind::Ne => Some(BinOpKind::Ne),
            BinOpKind::Lt => Some(BinOpKind::Gt),
            BinOpKind::Le => Some(BinOpKind::Ge),
            BinOpKind::Gt => Some(BinOpKind::Lt),
            BinOpKind::Ge => Some(BinOpKind::Le),
            _ => None,
        }
    }
}

/// A memory place: something that can be read from or assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Place {
    /// Local variable of the current frame
    Var(String),
    /// Program-wide global variable
    Global(String),
    /// `*e`: dereference of a pointer-valued expression
    Deref(Box<Expr>),
    /// `base.field` / `base->field`: field accesses carry the struct type
    /// name so the region model can compare accesses by type
    Field {
        base: Box<Place>,
        struct_name: String,
        field: String,
    },
}

impl Place {
    pub fn var(name: impl Into<String>) -> Self {
        Place::Var(name.into())
    }

    pub fn global(name: impl Into<String>) -> Self {
        Place::Global(name.into())
    }

    pub fn deref(expr: Expr) -> Self {
        Place::Deref(Box::new(expr))
    }

    pub fn field(base: Place, struct_name: impl Into<String>, field: impl Into<String>) -> Self {
        Place::Field {
            base: Box::new(base),
            struct_name: struct_name.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(n) => write!(f, "{}", n),
            Place::Global(n) => write!(f, "{}", n),
            Place::Deref(e) => write!(f, "*{}", e),
            Place::Field { base, field, .. } => write!(f, "{}.{}", base, field),
        }
    }
}

/// An r-value expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Integer constant
    Const(i64),
    /// Read of a place
    Place(Place),
    /// `&place`
    AddrOf(Place),
    /// Arithmetic or comparison
    BinOp {
        op: BinOpKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Call to an unknown-bodied accessor returning a pointer.
    /// `ret_struct` names the pointed-to struct type when the signature is
    /// known; it drives the compatible-type aliasing rule.
    OpaqueCall {
        callee: String,
        ret_struct: Option<String>,
    },
    /// Unconstrained value (uninitialized read, external input)
    Unknown,
}

impl Expr {
    pub fn constant(v: i64) -> Self {
        Expr::Const(v)
    }

    pub fn place(p: Place) -> Self {
        Expr::Place(p)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Place(Place::var(name))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Expr::Place(Place::global(name))
    }

    pub fn addr_of(p: Place) -> Self {
        Expr::AddrOf(p)
    }

    pub fn binop(op: BinOpKind, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn opaque_call(callee: impl Into<String>, ret_struct: Option<&str>) -> Self {
        Expr::OpaqueCall {
            callee: callee.into(),
            ret_struct: ret_struct.map(|s| s.to_string()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Place(p) => write!(f, "{}", p),
            Expr::AddrOf(p) => write!(f, "&{}", p),
            Expr::BinOp { op, lhs, rhs } => write!(f, "({} {:?} {})", lhs, op, rhs),
            Expr::OpaqueCall { callee, .. } => write!(f, "{}()", callee),
            Expr::Unknown => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate() {
        assert_eq!(BinOpKind::Gt.negate(), Some(BinOpKind::Le));
        assert_eq!(BinOpKind::Eq.negate(), Some(BinOpKind::Ne));
        assert_eq!(BinOpKind::Add.negate(), None);
    }

    #[test]
    fn test_swap() {
        assert_eq!(BinOpKind::Lt.swap(), Some(BinOpKind::Gt));
        assert_eq!(BinOpKind::Eq.swap(), Some(BinOpKind::Eq));
    }

    #[test]
    fn test_place_display() {
        let p = Place::field(
            Place::deref(Expr::var("t")),
            "T",
            "s",
        );
        assert_eq!(format!("{}", p), "*t.s");
    }
}
