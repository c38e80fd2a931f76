//! Parallel scan properties: partitioning, truncation, cancellation and
//! content determinism across worker counts.

mod test_support;

use std::collections::HashSet;

use krda_core::projection::{ResultDescription, ResultField};
use krda_core::rules::{RuleLeaf, RuleOp, RuleSet};
use krda_core::schema::ColumnType;
use krda_core::types::Scalar;
use krda_core::Error;
use krda_filter::{CancelToken, FilterJob};
use krda_mem::Heap;
use krda_table::{Table, TableBuilder};

use test_support::{heap_mb, uint_table};

fn row_index_projection() -> ResultDescription {
    ResultDescription::new(vec![ResultField::row_index()])
}

#[test]
fn every_row_is_visited_exactly_once() {
    let heap = heap_mb(4);
    let values: Vec<u32> = (0..10_000).collect();
    let table = uint_table(&heap, "x", &values);

    // Small batches force many claims per worker.
    let output = FilterJob::new(&heap, &table)
        .project(row_index_projection())
        .workers(4)
        .row_batch_size(64)
        .run(&vec![])
        .unwrap();

    assert_eq!(output.count, 10_000);
    let mut seen = HashSet::new();
    for row in output.rows() {
        let bytes = row.bytes();
        let index = u32::from_le_bytes(bytes[..4].try_into().unwrap());
        assert!(seen.insert(index), "row {index} appeared twice");
    }
    assert_eq!(seen.len(), 10_000);

    output.free(&heap).unwrap();
}

#[test]
fn truncation_stops_writes_but_keeps_counting() {
    let heap = heap_mb(1);
    let table = uint_table(&heap, "x", &[7; 10]);

    // Room for exactly 3 result rows of 4 bytes.
    let output = FilterJob::new(&heap, &table)
        .project(row_index_projection())
        .workers(1)
        .max_result_bytes(12)
        .run(&vec![])
        .unwrap();

    assert_eq!(output.count, 3);
    assert!(output.truncated);

    // One worker scans in order, so the first three rows land in order.
    let indices: Vec<u32> = (0..output.count)
        .map(|s| u32::from_le_bytes(output.row_bytes(s)[..4].try_into().unwrap()))
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);

    output.free(&heap).unwrap();
}

#[test]
fn truncated_parallel_run_writes_whole_distinct_rows() {
    let heap = heap_mb(1);
    let values: Vec<u32> = (0..1000).collect();
    let table = uint_table(&heap, "x", &values);

    let output = FilterJob::new(&heap, &table)
        .project(row_index_projection())
        .workers(4)
        .row_batch_size(16)
        .max_result_bytes(40 * 4)
        .run(&vec![])
        .unwrap();

    assert_eq!(output.count, 40);
    assert!(output.truncated);

    // Whatever subset got committed, each slot holds one whole source row.
    let mut seen = HashSet::new();
    for row in output.rows() {
        let index = u32::from_le_bytes(row.bytes()[..4].try_into().unwrap());
        assert!((index as usize) < values.len());
        assert!(seen.insert(index), "slot written twice for row {index}");
    }

    output.free(&heap).unwrap();
}

#[test]
fn cancellation_is_terminal_and_leaks_nothing() {
    let heap = heap_mb(4);
    let values: Vec<u32> = (0..50_000).collect();
    let table = uint_table(&heap, "x", &values);
    let used_before = heap.used();

    let token = CancelToken::new();
    token.cancel();

    let outcome = FilterJob::new(&heap, &table)
        .workers(4)
        .run_with(&vec![], &token);
    assert!(matches!(outcome, Err(Error::Cancelled)));

    // The result region was released; only the table remains.
    assert_eq!(heap.used(), used_before);
}

#[test]
fn content_is_deterministic_across_worker_counts() {
    let heap = heap_mb(32);
    let mut builder = TableBuilder::new()
        .column("id", ColumnType::UInt32)
        .column("bucket", ColumnType::UInt16);
    for id in 0u32..100_000 {
        builder
            .push_row(&[Scalar::Int(id as i64), Scalar::Int((id % 97) as i64)])
            .unwrap();
    }
    let table = Table::load(&heap, &builder.finish()).unwrap();

    let rules: RuleSet = vec![
        vec![RuleLeaf::new("bucket", RuleOp::LessThan, 13i64)],
        vec![RuleLeaf::new("id", RuleOp::MoreThan, 99_000i64)],
    ];

    let mut digests = Vec::new();
    let mut counts = Vec::new();
    for workers in [1usize, 2, 4, 8] {
        let output = FilterJob::new(&heap, &table)
            .workers(workers)
            .row_batch_size(128)
            .run(&rules)
            .unwrap();
        counts.push(output.count);
        digests.push(output.content_digest());
        output.free(&heap).unwrap();
    }

    assert!(counts.windows(2).all(|w| w[0] == w[1]), "counts {counts:?}");
    assert!(
        digests.windows(2).all(|w| w[0] == w[1]),
        "digests differ across worker counts"
    );
}

#[test]
fn single_worker_equals_serial_reference() {
    let heap = heap_mb(4);
    let values: Vec<u32> = (0..5_000).map(|i| i * 3 % 512).collect();
    let table = uint_table(&heap, "x", &values);

    let rules: RuleSet = vec![vec![RuleLeaf::new("x", RuleOp::MoreThan, 300i64)]];
    let expected = values.iter().filter(|v| **v > 300).count() as u64;

    for workers in [1usize, 4] {
        let output = FilterJob::new(&heap, &table)
            .workers(workers)
            .run(&rules)
            .unwrap();
        assert_eq!(output.count, expected);
        output.free(&heap).unwrap();
    }
}
