//! Filter executor behavior: scenarios and rule compilation.

mod test_support;

use krda_core::error::Error;
use krda_core::projection::{ResultDescription, ResultField};
use krda_core::rules::{RuleLeaf, RuleOp, RuleSet};
use krda_core::schema::ColumnType;
use krda_core::types::Scalar;
use krda_filter::FilterJob;
use krda_mem::Heap;
use krda_table::codec::Value;
use krda_table::{Table, TableBuilder};

use test_support::{pair_table, uint_table};

fn leaf(name: &str, op: RuleOp, value: impl Into<krda_core::rules::RuleValue>) -> RuleLeaf {
    RuleLeaf::new(name, op, value)
}

#[test]
fn single_equality_match_with_row_index() {
    let heap = Heap::with_capacity(4096);
    let table = uint_table(&heap, "x", &[10, 20, 30]);

    let rules: RuleSet = vec![vec![leaf("x", RuleOp::Equal, 20i64)]];
    let projection = ResultDescription::new(vec![
        ResultField::row_index(),
        ResultField::column("x", ColumnType::UInt32, 4),
    ]);

    let output = FilterJob::new(&heap, &table)
        .project(projection)
        .run(&rules)
        .unwrap();

    assert_eq!(output.count, 1);
    assert_eq!(output.row_size, 8);
    assert!(!output.truncated);
    assert_eq!(output.row_bytes(0), vec![1, 0, 0, 0, 20, 0, 0, 0]);

    output.free(&heap).unwrap();
}

#[test]
fn or_of_ands_selects_the_union() {
    let heap = Heap::with_capacity(4096);
    let table = pair_table(&heap, 8, &[(1, "foo"), (2, "bar"), (3, "foo")]);

    let rules: RuleSet = vec![
        vec![
            leaf("a", RuleOp::MoreThan, 1i64),
            leaf("b", RuleOp::Equal, "foo"),
        ],
        vec![leaf("a", RuleOp::Equal, 2i64)],
    ];
    let projection = ResultDescription::new(vec![ResultField::row_index()]);

    let output = FilterJob::new(&heap, &table)
        .project(projection)
        .run(&rules)
        .unwrap();

    let mut indices: Vec<u32> = output
        .rows()
        .map(|r| match r.value(0) {
            Value::Int(v) => v as u32,
            other => panic!("expected int, got {other:?}"),
        })
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![1, 2]);

    output.free(&heap).unwrap();
}

#[test]
fn contains_is_case_insensitive() {
    let heap = Heap::with_capacity(4096);
    let mut builder =
        TableBuilder::new().column_with_size("name", ColumnType::String, 16);
    for name in ["Alpha", "BETA", "gamma"] {
        builder.push_row(&[Scalar::Str(name.into())]).unwrap();
    }
    let table = Table::load(&heap, &builder.finish()).unwrap();

    let rules: RuleSet = vec![vec![leaf("name", RuleOp::Contains, "AL")]];
    let output = FilterJob::new(&heap, &table)
        .project(ResultDescription::new(vec![ResultField::row_index()]))
        .run(&rules)
        .unwrap();

    assert_eq!(output.count, 1);
    match output.rows().next().unwrap().value(0) {
        Value::Int(0) => {}
        other => panic!("expected row 0, got {other:?}"),
    }

    output.free(&heap).unwrap();
}

#[test]
fn empty_rules_match_everything() {
    let heap = Heap::with_capacity(4096);
    let table = uint_table(&heap, "x", &[1, 2, 3, 4, 5]);

    let output = FilterJob::new(&heap, &table).run(&vec![]).unwrap();
    assert_eq!(output.count, 5);
    output.free(&heap).unwrap();
}

#[test]
fn empty_group_is_a_true_branch() {
    let heap = Heap::with_capacity(4096);
    let table = uint_table(&heap, "x", &[1, 2, 3]);

    // First group never matches; the empty second group matches all.
    let rules: RuleSet = vec![vec![leaf("x", RuleOp::Equal, 99i64)], vec![]];
    let output = FilterJob::new(&heap, &table).run(&rules).unwrap();
    assert_eq!(output.count, 3);
    output.free(&heap).unwrap();
}

#[test]
fn default_projection_copies_every_column() {
    let heap = Heap::with_capacity(4096);
    let table = pair_table(&heap, 10, &[(5, "ok"), (6, "no")]);

    let rules: RuleSet = vec![vec![leaf("a", RuleOp::Equal, 5i64)]];
    let output = FilterJob::new(&heap, &table).run(&rules).unwrap();

    assert_eq!(output.count, 1);
    assert_eq!(output.row_size, 14); // uint32 + string(10)
    let row = output.rows().next().unwrap();
    match row.value(0) {
        Value::Int(5) => {}
        other => panic!("expected 5, got {other:?}"),
    }
    match row.value(1) {
        Value::Str(s) => assert!(s.eq_fold(b"OK")),
        other => panic!("expected string, got {other:?}"),
    }

    output.free(&heap).unwrap();
}

#[test]
fn numeric_and_float_operators() {
    let heap = Heap::with_capacity(8192);
    let mut builder = TableBuilder::new()
        .column("n", ColumnType::Int16)
        .column("f", ColumnType::Float32);
    for (n, f) in [(-5i64, 0.5f32), (0, 1.5), (5, 2.5), (10, 3.5)] {
        builder.push_row(&[Scalar::Int(n), Scalar::Float(f)]).unwrap();
    }
    let table = Table::load(&heap, &builder.finish()).unwrap();

    let cases: Vec<(RuleSet, u64)> = vec![
        (vec![vec![leaf("n", RuleOp::LessThan, 0i64)]], 1),
        (vec![vec![leaf("n", RuleOp::NotEqual, 0i64)]], 3),
        (vec![vec![leaf("f", RuleOp::MoreThan, 1.5f64)]], 2),
        // String operands parse as numbers against numeric columns.
        (vec![vec![leaf("n", RuleOp::MoreThan, "-1")]], 3),
        (vec![vec![leaf("f", RuleOp::Equal, "2.5")]], 1),
    ];
    for (rules, expected) in cases {
        let output = FilterJob::new(&heap, &table).run(&rules).unwrap();
        assert_eq!(output.count, expected, "rules {rules:?}");
        output.free(&heap).unwrap();
    }
}

#[test]
fn rule_errors_surface_before_any_scan() {
    let heap = Heap::with_capacity(8192);
    let mut builder = TableBuilder::new()
        .column("n", ColumnType::UInt32)
        .column_with_size("s", ColumnType::String, 8)
        .column_with_size("blob", ColumnType::Bytes, 4);
    builder
        .push_row(&[
            Scalar::Int(1),
            Scalar::Str("x".into()),
            Scalar::Bytes(vec![0, 1, 2, 3]),
        ])
        .unwrap();
    let table = Table::load(&heap, &builder.finish()).unwrap();

    let bad: Vec<RuleSet> = vec![
        // unknown column
        vec![vec![leaf("missing", RuleOp::Equal, 1i64)]],
        // ordering on a string column
        vec![vec![leaf("s", RuleOp::MoreThan, "a")]],
        // contains on a numeric column
        vec![vec![leaf("n", RuleOp::Contains, "1")]],
        // unparseable numeric operand
        vec![vec![leaf("n", RuleOp::Equal, "twenty")]],
        // fractional operand against an integer column
        vec![vec![leaf("n", RuleOp::Equal, 1.5f64)]],
        // bytes columns cannot be filtered
        vec![vec![leaf("blob", RuleOp::Equal, "x")]],
        // numeric operand against a string column
        vec![vec![leaf("s", RuleOp::Equal, 3i64)]],
    ];

    let before = heap.used();
    for rules in bad {
        match FilterJob::new(&heap, &table).run(&rules) {
            Err(Error::Rule(_)) => {}
            other => panic!("expected Rule error for {rules:?}, got {:?}", other.err()),
        }
    }
    // Fail-fast: nothing was allocated for any failed run.
    assert_eq!(heap.used(), before);
}

#[test]
fn projection_validation() {
    let heap = Heap::with_capacity(4096);
    let table = uint_table(&heap, "x", &[1]);

    // Unknown column.
    let bad = ResultDescription::new(vec![ResultField::column("y", ColumnType::UInt32, 4)]);
    assert!(matches!(
        FilterJob::new(&heap, &table).project(bad).run(&vec![]),
        Err(Error::Rule(_))
    ));

    // Type/size must match the source column.
    let bad = ResultDescription::new(vec![ResultField::column("x", ColumnType::UInt16, 2)]);
    assert!(matches!(
        FilterJob::new(&heap, &table).project(bad).run(&vec![]),
        Err(Error::Rule(_))
    ));

    // Empty description.
    let bad = ResultDescription::new(vec![]);
    assert!(matches!(
        FilterJob::new(&heap, &table).project(bad).run(&vec![]),
        Err(Error::Rule(_))
    ));
}

#[test]
fn date_columns_compare_as_text() {
    let heap = Heap::with_capacity(4096);
    let mut builder = TableBuilder::new().column_with_size("day", ColumnType::Date, 12);
    for day in ["2026-01-01", "2026-08-02"] {
        builder.push_row(&[Scalar::Str(day.into())]).unwrap();
    }
    let table = Table::load(&heap, &builder.finish()).unwrap();

    let rules: RuleSet = vec![vec![leaf("day", RuleOp::Equal, "2026-08-02")]];
    let output = FilterJob::new(&heap, &table).run(&rules).unwrap();
    assert_eq!(output.count, 1);
    output.free(&heap).unwrap();

    let rules: RuleSet = vec![vec![leaf("day", RuleOp::LessThan, "2026-08-02")]];
    assert!(matches!(
        FilterJob::new(&heap, &table).run(&rules),
        Err(Error::Rule(_))
    ));
}

#[test]
fn empty_table_yields_empty_result() {
    let heap = Heap::with_capacity(4096);
    let builder = TableBuilder::new().column("x", ColumnType::UInt32);
    let table = Table::load(&heap, &builder.finish()).unwrap();
    assert_eq!(table.row_count(), 0);

    let output = FilterJob::new(&heap, &table).run(&vec![]).unwrap();
    assert_eq!(output.count, 0);
    assert!(!output.truncated);
    assert_eq!(output.rows().count(), 0);
    output.free(&heap).unwrap();
}
