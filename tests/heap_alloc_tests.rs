//! Heap allocator and block-window tests.

use std::sync::Arc;
use std::thread;

use krda_mem::{Error, Heap, MemoryBlock, ALIGN};

#[test]
fn allocations_are_aligned_and_disjoint() {
    let heap = Heap::with_capacity(1024);

    let a = heap.allocate(10).expect("alloc a");
    let b = heap.allocate(3).expect("alloc b");
    let c = heap.allocate(100).expect("alloc c");

    for block in [&a, &b, &c] {
        assert_eq!(block.offset() % ALIGN, 0);
    }
    // Rounded extents must not overlap.
    assert!(a.offset() + 16 <= b.offset());
    assert!(b.offset() + 8 <= c.offset());

    heap.free(a).unwrap();
    heap.free(b).unwrap();
    heap.free(c).unwrap();
    assert_eq!(heap.used(), 0);
}

#[test]
fn exhaustion_reports_capacity_and_used() {
    let heap = Heap::with_capacity(64);
    let _a = heap.allocate(40).expect("first alloc");

    match heap.allocate(40) {
        Err(Error::Exhausted {
            requested,
            capacity,
            used,
        }) => {
            assert_eq!(requested, 40);
            assert_eq!(capacity, 64);
            assert_eq!(used, 40);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[test]
fn freed_space_coalesces_and_is_reusable() {
    let heap = Heap::with_capacity(96);
    let a = heap.allocate(32).unwrap();
    let b = heap.allocate(32).unwrap();
    let c = heap.allocate(32).unwrap();
    assert_eq!(heap.free_extents(), 0);

    // Free the middle block, then its neighbors; extents must merge back
    // into one span covering the whole heap.
    heap.free(b).unwrap();
    assert_eq!(heap.free_extents(), 1);
    heap.free(a).unwrap();
    assert_eq!(heap.free_extents(), 1);
    heap.free(c).unwrap();
    assert_eq!(heap.free_extents(), 1);

    let big = heap.allocate(96).expect("whole heap reusable");
    heap.free(big).unwrap();
}

#[test]
fn double_free_is_rejected() {
    let heap = Heap::with_capacity(128);
    let block = heap.allocate(16).unwrap();
    let offset = block.offset();
    heap.free(block).unwrap();

    // A reconstructed alias of the reclaimed region is an invalid handle.
    let alias = heap.block_at(offset, 16).unwrap();
    match heap.free(alias) {
        Err(Error::InvalidHandle(_)) => {}
        other => panic!("expected InvalidHandle, got {other:?}"),
    }
}

#[test]
fn foreign_block_is_rejected() {
    let heap = Heap::with_capacity(128);
    let other = Heap::with_capacity(128);
    let block = other.allocate(16).unwrap();

    match heap.free(block) {
        Err(Error::InvalidHandle(_)) => {}
        outcome => panic!("expected InvalidHandle, got {outcome:?}"),
    }
}

#[test]
fn zero_size_allocation_is_rejected() {
    let heap = Heap::with_capacity(64);
    assert!(matches!(heap.allocate(0), Err(Error::InvalidHandle(_))));
}

#[test]
fn out_of_range_window_is_rejected() {
    let heap = Heap::with_capacity(64);
    assert!(matches!(heap.block_at(32, 64), Err(Error::InvalidHandle(_))));
    assert!(matches!(
        MemoryBlock::reconstruct(Arc::clone(heap.buf()), usize::MAX, 2),
        Err(Error::InvalidHandle(_))
    ));
}

#[test]
fn typed_access_round_trips() {
    let heap = Heap::with_capacity(64);
    let block = heap.allocate(32).unwrap();

    block.write_u8(0, 0xAB);
    block.write_i8(1, -5);
    block.write_u16(2, 0xBEEF);
    block.write_i16(4, -12345);
    block.write_u32(8, 0xDEAD_BEEF);
    block.write_i32(12, -7_654_321);
    block.write_f32(16, 3.25);

    assert_eq!(block.read_u8(0), 0xAB);
    assert_eq!(block.read_i8(1), -5);
    assert_eq!(block.read_u16(2), 0xBEEF);
    assert_eq!(block.read_i16(4), -12345);
    assert_eq!(block.read_u32(8), 0xDEAD_BEEF);
    assert_eq!(block.read_i32(12), -7_654_321);
    assert_eq!(block.read_f32(16), 3.25);

    heap.free(block).unwrap();
}

#[test]
fn workers_share_one_buffer_at_disjoint_offsets() {
    let heap = Heap::with_capacity(1024);
    let block = heap.allocate(8 * 64).unwrap();
    let offset = block.offset();

    thread::scope(|scope| {
        for w in 0..8usize {
            let buf = Arc::clone(heap.buf());
            scope.spawn(move || {
                let view = MemoryBlock::reconstruct(buf, offset + w * 64, 64).unwrap();
                for i in 0..16 {
                    view.write_u32(i * 4, (w * 1000 + i) as u32);
                }
            });
        }
    });

    for w in 0..8usize {
        for i in 0..16 {
            assert_eq!(block.read_u32(w * 64 + i * 4), (w * 1000 + i) as u32);
        }
    }
    heap.free(block).unwrap();
}
