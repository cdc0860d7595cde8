//! # Diagnostics
//!
//! Optional introspection helpers: a textual dump of the physical chain
//! through the [`log`] crate and a proportional, ANSI-colored one-line
//! map of the region. Neither mutates the arena and correctness never
//! depends on them.
//!
//! ```text
//!   ████████░░░░░░████░░░░░░░░░░░░░░░░▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁
//!   occupied  free  occupied              tail remainder
//! ```

use core::ptr;

use crate::arena::Arena;
use crate::block::{Block, HEADER_SIZE};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_BLUE: &str = "\x1b[34m";
const ANSI_RESET: &str = "\x1b[0m";

impl Arena {
  /// Logs one `debug` record per block: address, size, alignment, state.
  ///
  /// A no-op unless debug logging is enabled.
  pub fn dump(&self) {
    if !log::log_enabled!(log::Level::Debug) {
      return;
    }

    log::debug!(
      "arena {:p}: capacity {}, baseline {}, tail slack {}",
      self,
      self.capacity(),
      self.baseline_alignment(),
      self.free_size_in_tail(),
    );

    let tail = self.tail_block();
    let mut node = self.first_block_addr() as *mut Block;
    loop {
      unsafe {
        let state = if ptr::eq(node, tail) {
          if (*node).is_free() { "tail" } else { "used (packed)" }
        } else if (*node).is_free() {
          "free"
        } else if (*node).is_nested_arena() {
          "nested arena"
        } else {
          "used"
        };
        log::debug!(
          "  block {:p}: size {:6}, align {:4}, {}",
          node,
          (*node).size(),
          (*node).alignment(),
          state,
        );

        if ptr::eq(node, tail) {
          break;
        }
        node = (*node).next_physical();
      }
    }
  }

  /// Renders the region as a `width`-cell colored bar: occupied blocks
  /// red, free blocks green, the uncarved tail blue. Every block gets at
  /// least one cell, so tiny blocks stay visible.
  pub fn render_map(
    &self,
    width: usize,
  ) -> String {
    let width = width.max(16);
    let region = self.capacity();
    let tail = self.tail_block();
    let mut out = String::new();

    let mut node = self.first_block_addr() as *mut Block;
    loop {
      unsafe {
        let (span, color, glyph) = if ptr::eq(node, tail) {
          let slack = self.free_size_in_tail();
          if (*node).is_free() {
            (HEADER_SIZE + slack, ANSI_BLUE, '▁')
          } else {
            (HEADER_SIZE + (*node).size(), ANSI_RED, '█')
          }
        } else if (*node).is_free() {
          (HEADER_SIZE + (*node).size(), ANSI_GREEN, '░')
        } else {
          (HEADER_SIZE + (*node).size(), ANSI_RED, '█')
        };

        let cells = ((span * width) / region).max(1);
        out.push_str(color);
        for _ in 0..cells {
          out.push(glyph);
        }
        out.push_str(ANSI_RESET);

        if ptr::eq(node, tail) {
          break;
        }
        node = (*node).next_physical();
      }
    }

    out
  }
}
