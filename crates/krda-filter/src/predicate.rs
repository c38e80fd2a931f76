//! Rule-tree compilation.
//!
//! The declarative rule tree is lowered once, before any row is scanned,
//! into a tagged tree of typed leaves bound to column ordinals. Every
//! name lookup, type check and operand parse happens here, so the scan
//! loop evaluates leaves with no allocation and no fallible paths.

use krda_core::error::{Error, Result};
use krda_core::rules::{RuleLeaf, RuleOp, RuleSet, RuleValue};
use krda_core::schema::ColumnClass;
use krda_table::{Row, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Ne,
    Gt,
    Lt,
}

#[derive(Debug, Clone)]
enum Leaf {
    IntCmp {
        ordinal: usize,
        cmp: Cmp,
        rhs: i64,
    },
    FloatCmp {
        ordinal: usize,
        cmp: Cmp,
        rhs: f32,
    },
    /// Case-insensitive equality; `expect` is false for notEqual.
    TextEq {
        ordinal: usize,
        needle: Vec<u8>,
        expect: bool,
    },
    TextContains {
        ordinal: usize,
        needle: Vec<u8>,
    },
}

/// A compiled filter: OR over groups, AND within a group, both levels
/// short-circuiting. Cheap to clone; one copy per worker.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    groups: Vec<Vec<Leaf>>,
}

impl Predicate {
    /// Lower `rules` against the table's schema. All rule errors surface
    /// here, before any worker starts.
    pub fn compile(rules: &RuleSet, table: &Table) -> Result<Self> {
        let groups = rules
            .iter()
            .map(|group| group.iter().map(|leaf| lower(leaf, table)).collect())
            .collect::<Result<Vec<Vec<Leaf>>>>()?;
        Ok(Self { groups })
    }

    /// Evaluate against the cursor's current row. An empty rule set matches
    /// every row; an empty group is a vacuously true branch.
    #[inline]
    pub fn matches(&self, row: &Row<'_>) -> bool {
        self.groups.is_empty()
            || self
                .groups
                .iter()
                .any(|group| group.iter().all(|leaf| leaf.holds(row)))
    }
}

impl Leaf {
    #[inline]
    fn holds(&self, row: &Row<'_>) -> bool {
        match self {
            Leaf::IntCmp { ordinal, cmp, rhs } => compare(row.int(*ordinal), *rhs, *cmp),
            Leaf::FloatCmp { ordinal, cmp, rhs } => compare(row.float(*ordinal), *rhs, *cmp),
            Leaf::TextEq {
                ordinal,
                needle,
                expect,
            } => row.text(*ordinal).eq_fold(needle) == *expect,
            Leaf::TextContains { ordinal, needle } => row.text(*ordinal).contains_fold(needle),
        }
    }
}

#[inline]
fn compare<T: PartialOrd>(lhs: T, rhs: T, cmp: Cmp) -> bool {
    match cmp {
        Cmp::Eq => lhs == rhs,
        Cmp::Ne => lhs != rhs,
        Cmp::Gt => lhs > rhs,
        Cmp::Lt => lhs < rhs,
    }
}

fn lower(leaf: &RuleLeaf, table: &Table) -> Result<Leaf> {
    let (ordinal, col) = table
        .column(&leaf.name)
        .ok_or_else(|| Error::Rule(format!("unknown column '{}'", leaf.name)))?;

    match col.ty.class() {
        ColumnClass::Int => {
            let cmp = numeric_cmp(leaf, col.ty.name())?;
            Ok(Leaf::IntCmp {
                ordinal,
                cmp,
                rhs: int_operand(&leaf.value, &leaf.name)?,
            })
        }
        ColumnClass::Float => {
            let cmp = numeric_cmp(leaf, col.ty.name())?;
            Ok(Leaf::FloatCmp {
                ordinal,
                cmp,
                rhs: float_operand(&leaf.value, &leaf.name)?,
            })
        }
        ColumnClass::Text => {
            let needle = text_operand(&leaf.value, &leaf.name)?;
            match leaf.operation {
                RuleOp::Equal => Ok(Leaf::TextEq {
                    ordinal,
                    needle,
                    expect: true,
                }),
                RuleOp::NotEqual => Ok(Leaf::TextEq {
                    ordinal,
                    needle,
                    expect: false,
                }),
                RuleOp::Contains => Ok(Leaf::TextContains { ordinal, needle }),
                RuleOp::MoreThan | RuleOp::LessThan => Err(Error::Rule(format!(
                    "ordering comparison on {} column '{}'",
                    col.ty, leaf.name
                ))),
            }
        }
        ColumnClass::Opaque => Err(Error::Rule(format!(
            "column '{}' of type {} cannot be filtered",
            leaf.name, col.ty
        ))),
    }
}

fn numeric_cmp(leaf: &RuleLeaf, ty_name: &str) -> Result<Cmp> {
    match leaf.operation {
        RuleOp::Equal => Ok(Cmp::Eq),
        RuleOp::NotEqual => Ok(Cmp::Ne),
        RuleOp::MoreThan => Ok(Cmp::Gt),
        RuleOp::LessThan => Ok(Cmp::Lt),
        RuleOp::Contains => Err(Error::Rule(format!(
            "contains on {ty_name} column '{}'",
            leaf.name
        ))),
    }
}

fn int_operand(value: &RuleValue, column: &str) -> Result<i64> {
    match value {
        RuleValue::Num(n) => float_to_int(*n, column),
        RuleValue::Str(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Ok(v);
            }
            let n = s
                .parse::<f64>()
                .map_err(|_| Error::Rule(format!("'{s}' is not a number for column '{column}'")))?;
            float_to_int(n, column)
        }
    }
}

fn float_to_int(n: f64, column: &str) -> Result<i64> {
    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(Error::Rule(format!(
            "{n} is not an integer for column '{column}'"
        )));
    }
    Ok(n as i64)
}

fn float_operand(value: &RuleValue, column: &str) -> Result<f32> {
    match value {
        RuleValue::Num(n) => Ok(*n as f32),
        RuleValue::Str(s) => s.trim().parse::<f32>().map_err(|_| {
            Error::Rule(format!("'{s}' is not a number for column '{column}'"))
        }),
    }
}

fn text_operand(value: &RuleValue, column: &str) -> Result<Vec<u8>> {
    match value {
        RuleValue::Str(s) => Ok(s.as_bytes().to_vec()),
        RuleValue::Num(_) => Err(Error::Rule(format!(
            "string operand required for column '{column}'"
        ))),
    }
}
