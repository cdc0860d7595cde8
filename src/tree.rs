//! # Intrusive Free Tree
//!
//! Free blocks are kept in a left-leaning red-black tree rooted in the
//! arena header. The tree is intrusive: a free block's own overlay words
//! are the child links, so the tree costs no memory beyond the headers
//! that already exist.
//!
//! ```text
//!                         ┌───────────┐
//!        arena.free_root ─► size: 256 │
//!                         ├─────┬─────┤
//!                     left│     │right
//!                ┌────────▼──┐ ┌▼──────────┐
//!                │ size: 112 │ │ size: 480 │
//!                └───────────┘ └───────────┘
//! ```
//!
//! ## Ordering
//!
//! Nodes are ordered by a three-part key, compared in order:
//!
//! 1. payload size, ascending;
//! 2. alignment quality of the payload address (its trailing zero bits),
//!    ascending, so that among equally-sized blocks the better-aligned
//!    ones sit to the right and survive requests that don't need them;
//! 3. the block address, as the final tiebreaker making every key unique.
//!
//! Unique keys let detachment navigate to a node by comparison and then
//! confirm it by pointer identity.
//!
//! ## Shape invariants
//!
//! The usual LLRB rules hold after every public operation: red links lean
//! left, no red link follows another red link, every root-to-leaf path
//! crosses the same number of black links, and the root is black.

use core::cmp::Ordering;
use core::ptr;

use crate::align;
use crate::align_to;
use crate::block::Block;
use crate::tag::Color;

fn is_red(node: *mut Block) -> bool {
  !node.is_null() && unsafe { (*node).color() == Color::Red }
}

/// Three-part key comparison: size, then payload alignment quality, then
/// address.
unsafe fn key_cmp(
  a: *mut Block,
  b: *mut Block,
) -> Ordering {
  unsafe {
    (*a)
      .size()
      .cmp(&(*b).size())
      .then_with(|| align::quality((*a).payload_addr()).cmp(&align::quality((*b).payload_addr())))
      .then_with(|| (a as usize).cmp(&(b as usize)))
  }
}

unsafe fn rotate_left(node: *mut Block) -> *mut Block {
  unsafe {
    let pivot = (*node).right();
    (*node).set_right((*pivot).left());
    (*pivot).set_left(node);
    (*pivot).set_color((*node).color());
    (*node).set_color(Color::Red);
    pivot
  }
}

unsafe fn rotate_right(node: *mut Block) -> *mut Block {
  unsafe {
    let pivot = (*node).left();
    (*node).set_left((*pivot).right());
    (*pivot).set_right(node);
    (*pivot).set_color((*node).color());
    (*node).set_color(Color::Red);
    pivot
  }
}

unsafe fn flip_colors(node: *mut Block) {
  unsafe {
    let flip = |b: *mut Block| {
      let color = match (*b).color() {
        Color::Red => Color::Black,
        Color::Black => Color::Red,
      };
      (*b).set_color(color);
    };
    flip(node);
    flip((*node).left());
    flip((*node).right());
  }
}

/// Restores the left-leaning shape on the way back up.
unsafe fn fix_up(mut node: *mut Block) -> *mut Block {
  unsafe {
    if is_red((*node).right()) && !is_red((*node).left()) {
      node = rotate_left(node);
    }
    if is_red((*node).left()) && is_red((*(*node).left()).left()) {
      node = rotate_right(node);
    }
    if is_red((*node).left()) && is_red((*node).right()) {
      flip_colors(node);
    }
    node
  }
}

unsafe fn move_red_left(mut node: *mut Block) -> *mut Block {
  unsafe {
    flip_colors(node);
    if is_red((*(*node).right()).left()) {
      (*node).set_right(rotate_right((*node).right()));
      node = rotate_left(node);
      flip_colors(node);
    }
    node
  }
}

unsafe fn move_red_right(mut node: *mut Block) -> *mut Block {
  unsafe {
    flip_colors(node);
    if is_red((*(*node).left()).left()) {
      node = rotate_right(node);
      flip_colors(node);
    }
    node
  }
}

unsafe fn insert_rec(
  node: *mut Block,
  new: *mut Block,
) -> *mut Block {
  unsafe {
    if node.is_null() {
      (*new).set_left(ptr::null_mut());
      (*new).set_right(ptr::null_mut());
      (*new).set_color(Color::Red);
      return new;
    }

    if key_cmp(new, node) == Ordering::Less {
      let left = insert_rec((*node).left(), new);
      (*node).set_left(left);
    } else {
      let right = insert_rec((*node).right(), new);
      (*node).set_right(right);
    }

    fix_up(node)
  }
}

/// Inserts a free block and returns the new root.
///
/// # Safety
///
/// `node` must be a valid, free block header that is not already in the
/// tree; `root` must be a well-formed tree (possibly null).
pub(crate) unsafe fn insert(
  root: *mut Block,
  node: *mut Block,
) -> *mut Block {
  unsafe {
    let root = insert_rec(root, node);
    (*root).set_color(Color::Black);
    root
  }
}

/// Best-fit search for a block able to hold `size` bytes at `alignment`.
///
/// A node fits when its size covers the request plus whatever padding its
/// own payload address needs to reach the alignment. Walking left after a
/// fit tightens the candidate; walking right past too-small or
/// padding-starved nodes lands on same-size blocks with better-aligned
/// payloads, which the key order keeps to the right.
///
/// Returns null when nothing fits. The returned block stays in the tree;
/// the caller detaches it.
///
/// # Safety
///
/// `root` must be a well-formed tree (possibly null).
pub(crate) unsafe fn best_fit(
  root: *mut Block,
  size: usize,
  alignment: usize,
) -> *mut Block {
  unsafe {
    let mut node = root;
    let mut candidate = ptr::null_mut();

    while !node.is_null() {
      let node_size = (*node).size();
      if node_size < size {
        node = (*node).right();
        continue;
      }

      let payload = (*node).payload_addr();
      let padding = align_to!(payload, alignment) - payload;
      if node_size >= size + padding {
        candidate = node;
        node = (*node).left();
      } else {
        node = (*node).right();
      }
    }

    candidate
  }
}

unsafe fn min(mut node: *mut Block) -> *mut Block {
  unsafe {
    while !(*node).left().is_null() {
      node = (*node).left();
    }
    node
  }
}

/// Removes the minimum of the subtree, returning the new subtree root.
/// The caller has already taken note of the minimum via [`min`].
unsafe fn detach_min(mut node: *mut Block) -> *mut Block {
  unsafe {
    if (*node).left().is_null() {
      // A left-leaning tree keeps no lone right child.
      return ptr::null_mut();
    }
    if !is_red((*node).left()) && !is_red((*(*node).left()).left()) {
      node = move_red_left(node);
    }
    let left = detach_min((*node).left());
    (*node).set_left(left);
    fix_up(node)
  }
}

unsafe fn detach_rec(
  mut node: *mut Block,
  target: *mut Block,
) -> *mut Block {
  unsafe {
    if key_cmp(target, node) == Ordering::Less {
      if !is_red((*node).left()) && !is_red((*(*node).left()).left()) {
        node = move_red_left(node);
      }
      let left = detach_rec((*node).left(), target);
      (*node).set_left(left);
    } else {
      if is_red((*node).left()) {
        node = rotate_right(node);
      }
      if ptr::eq(node, target) && (*node).right().is_null() {
        return ptr::null_mut();
      }
      if !is_red((*node).right()) && !is_red((*(*node).right()).left()) {
        node = move_red_right(node);
      }
      if ptr::eq(node, target) {
        // Promote the in-order successor into the target's position.
        let successor = min((*node).right());
        let right = detach_min((*node).right());
        (*successor).set_right(right);
        (*successor).set_left((*node).left());
        (*successor).set_color((*node).color());
        node = successor;
      } else {
        let right = detach_rec((*node).right(), target);
        (*node).set_right(right);
      }
    }
    fix_up(node)
  }
}

/// Detaches the given block from the tree and returns the new root.
///
/// Navigation uses the same three-part key as insertion; the unique
/// address tiebreaker guarantees the walk arrives at `node` itself.
///
/// # Safety
///
/// `node` must currently be in the tree rooted at `root`.
pub(crate) unsafe fn detach(
  root: *mut Block,
  node: *mut Block,
) -> *mut Block {
  unsafe {
    let root = detach_rec(root, node);
    if !root.is_null() {
      (*root).set_color(Color::Black);
    }
    root
  }
}
