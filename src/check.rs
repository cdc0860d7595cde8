//! Whole-arena invariant verifier, compiled for tests only.
//!
//! One call walks the physical chain and the free tree and asserts every
//! structural promise the allocator makes: the chain tiles the region and
//! round-trips through `prev`, no two adjacent free blocks persist, tree
//! membership matches the free flag, the LLRB shape holds, and every
//! occupied block still carries a truthful magic, owner, and alignment.

use core::ptr;

use crate::MAGIC;
use crate::align;
use crate::arena::Arena;
use crate::block::{Block, HEADER_SIZE};
use crate::tag::Color;

/// Verifies every invariant of `arena`. Panics on the first violation.
pub(crate) unsafe fn verify(arena: *mut Arena) {
  unsafe { verify_with_opaque(arena, &[]) }
}

/// [`verify`] for arenas containing blocks whose overlay is repurposed
/// beyond recognition (bumps); those are exempt from the magic check.
/// Nested arenas are recognized by their tag bit and exempted on their
/// own.
pub(crate) unsafe fn verify_with_opaque(
  arena: *mut Arena,
  opaque: &[*mut Block],
) {
  unsafe {
    let a = &*arena;
    let first = a.first_block_addr() as *mut Block;
    let tail = a.tail_block();
    let end = a.region_end();

    let root = a.free_root();
    if !root.is_null() {
      assert_eq!(Color::Black, (*root).color(), "red tree root");
    }
    check_shape(root);

    let mut tree_nodes = Vec::new();
    collect_in_order(root, &mut tree_nodes);
    for pair in tree_nodes.windows(2) {
      assert!(key_of(pair[0]) < key_of(pair[1]), "tree keys out of order");
    }
    for &node in &tree_nodes {
      assert!((*node).is_free(), "occupied block in the free tree");
      assert!(!ptr::eq(node, tail), "tail in the free tree");
      let addr = node as usize;
      assert!(addr >= a.region_base() && addr + HEADER_SIZE <= end);
    }

    // Walk the physical chain from the first block through the tail.
    let mut node = first;
    let mut prev: *mut Block = ptr::null_mut();
    let mut free_in_chain = 0usize;
    loop {
      let addr = node as usize;
      assert!(addr % crate::WORD == 0, "misaligned header");
      assert!(addr >= a.region_base() && addr + HEADER_SIZE <= end, "header out of range");
      assert_eq!(prev, (*node).prev(), "broken prev link");

      if ptr::eq(node, tail) {
        if (*node).is_free() {
          assert_eq!(0, (*node).size(), "free tail with nonzero size");
        } else {
          // Packed arena: the occupied tail must reach the region end.
          assert_eq!(end, (*node).payload_addr() + (*node).size());
        }
        break;
      }

      assert!(addr < tail as usize, "chain walked past the tail");
      if (*node).is_free() {
        free_in_chain += 1;
        assert!(tree_nodes.contains(&node), "free block missing from the tree");
        let next = (*node).next_physical();
        if !ptr::eq(next, tail) {
          assert!(!(*next).is_free(), "adjacent free blocks");
        }
      } else {
        assert!(!tree_nodes.contains(&node), "occupied block in the tree");
        if !opaque.contains(&node) && !(*node).is_nested_arena() {
          let user = (*node).user_addr();
          assert_eq!(MAGIC, (*node).magic() ^ user, "magic mismatch");
          assert_eq!(0, user % (*node).alignment(), "payload misaligned");
          assert!(user - (*node).payload_addr() < (*node).size(), "padding ate the payload");
          assert_eq!(arena, (*node).owner(), "foreign owner");
        }
      }

      prev = node;
      node = (*node).next_physical();
    }

    assert_eq!(free_in_chain, tree_nodes.len(), "tree holds blocks outside the chain");
  }
}

/// Sizes of all free blocks, ascending. Handy for exact-shape assertions.
pub(crate) unsafe fn free_sizes(arena: *mut Arena) -> Vec<usize> {
  unsafe {
    let mut nodes = Vec::new();
    collect_in_order((*arena).free_root(), &mut nodes);
    nodes.iter().map(|&b| (*b).size()).collect()
  }
}

fn key_of(node: *mut Block) -> (usize, u32, usize) {
  unsafe {
    (
      (*node).size(),
      align::quality((*node).payload_addr()),
      node as usize,
    )
  }
}

unsafe fn collect_in_order(
  node: *mut Block,
  out: &mut Vec<*mut Block>,
) {
  unsafe {
    if node.is_null() {
      return;
    }
    collect_in_order((*node).left(), out);
    out.push(node);
    collect_in_order((*node).right(), out);
  }
}

fn is_red(node: *mut Block) -> bool {
  !node.is_null() && unsafe { (*node).color() == Color::Red }
}

/// Red rules plus black-height balance; returns the black height.
unsafe fn check_shape(node: *mut Block) -> usize {
  unsafe {
    if node.is_null() {
      return 1;
    }
    assert!(
      !is_red((*node).right()) || is_red((*node).left()),
      "right-leaning red link"
    );
    if is_red(node) {
      assert!(!is_red((*node).left()), "red node with a red left child");
    }
    if is_red((*node).left()) {
      assert!(
        !is_red((*(*node).left()).left()),
        "two consecutive left red links"
      );
    }
    let left = check_shape((*node).left());
    let right = check_shape((*node).right());
    assert_eq!(left, right, "black-height mismatch");
    left + usize::from(!is_red(node))
  }
}
