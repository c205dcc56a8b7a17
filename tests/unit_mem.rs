#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use chimp_mem_burst::lib_mem::MemoryBlock;

#[test]
fn starts_empty() {
    let b = MemoryBlock::new();
    assert_eq!(b.len(), 0);
    assert!(b.is_empty());
}

#[test]
fn set_size_touches_every_byte() {
    let mut b = MemoryBlock::new();
    assert_eq!(b.set_size(64 * 1024, None), 64 * 1024);
    assert_eq!(b.len(), 64 * 1024);
    assert!(b.is_touched());
}

#[test]
fn set_size_clamps_to_cap() {
    let mut b = MemoryBlock::new();
    assert_eq!(b.set_size(8192, Some(4096)), 4096);
    assert_eq!(b.len(), 4096);
    assert_eq!(b.set_size(1024, Some(4096)), 1024);
}

#[test]
fn replace_and_release() {
    let mut b = MemoryBlock::new();
    b.set_size(4096, None);
    b.set_size(100, None);
    assert_eq!(b.len(), 100);
    b.release();
    assert!(b.is_empty());
    b.release();
    assert!(b.is_empty());
}
