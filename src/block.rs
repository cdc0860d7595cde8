//! # Block Header
//!
//! Every allocation inside an arena is preceded by a fixed-size header.
//! The header is four machine words, no matter the block's state:
//!
//! ```text
//!             Free block                        Occupied block
//!   ┌───────────────────────────┐    ┌───────────────────────────────┐
//!   │ size_align  (size | exp)  │    │ size_align  (size | exp)      │
//!   │ prev        (ptr|col|free)│    │ prev        (ptr|col|free)    │
//!   │ left child  (tree)        │    │ owning arena                  │
//!   │ right child (tree)        │    │ magic  (0xDEADBEEF ^ payload) │
//!   └───────────────────────────┘    └───────────────────────────────┘
//! ```
//!
//! The last two words are an overlay: tree links while the block sits in
//! the free tree, owner and magic while the payload is handed out. The
//! `is_free` flag in `prev` is the discriminant; the typed accessors below
//! assert it so the wrong arm is never read.
//!
//! Blocks tile the arena contiguously. The successor is derived from the
//! payload size, the predecessor is stored:
//!
//! ```text
//!   ┌────────┬─────────┬────────┬──────────────┬────────┬─────┐
//!   │ header │ payload │ header │   payload    │ header │ ... │
//!   └────────┴─────────┴────────┴──────────────┴────────┴─────┘
//!    ▲                  ▲ ▲                     ▲
//!    │◄─────── prev ────┘ │◄──────── prev ──────┘
//!    └── payload + size ──► next
//! ```

use core::mem;

use crate::align_to;
use crate::arena::Arena;
use crate::tag::{Color, PrevLink, SizeAlign, TailLink};

/// Size of the per-block header: four machine words.
pub(crate) const HEADER_SIZE: usize = mem::size_of::<Block>();

/// Header placed immediately before every block's payload.
#[repr(C)]
pub(crate) struct Block {
  size_align: SizeAlign,
  prev: PrevLink,
  /// Left tree child while free, owning arena while occupied.
  link_a: usize,
  /// Right tree child while free, magic while occupied.
  link_b: usize,
}

impl Block {
  /// Writes a fresh header at `at`, marked free, colored red, with empty
  /// tree links.
  ///
  /// # Safety
  ///
  /// `at` must be word-aligned and point into writable memory with at
  /// least `HEADER_SIZE` bytes available.
  pub(crate) unsafe fn write_header(
    at: *mut Block,
    size: usize,
    alignment: usize,
    prev: *mut Block,
    free: bool,
  ) {
    let mut prev_link = PrevLink::null();
    prev_link.set_addr(prev as usize);
    prev_link.set_free(free);
    prev_link.set_color(Color::Red);

    unsafe {
      at.write(Block {
        size_align: SizeAlign::new(size, alignment),
        prev: prev_link,
        link_a: 0,
        link_b: 0,
      });
    }
  }

  /// Writes an empty tail header at `at`: size zero, free, red.
  ///
  /// # Safety
  ///
  /// Same contract as [`Block::write_header`].
  pub(crate) unsafe fn write_tail(
    at: *mut Block,
    prev: *mut Block,
  ) {
    unsafe {
      Self::write_header(at, 0, crate::WORD, prev, true);
    }
  }

  pub(crate) fn size(&self) -> usize {
    self.size_align.size()
  }

  pub(crate) fn set_size(
    &mut self,
    size: usize,
  ) {
    self.size_align.set_size(size);
  }

  pub(crate) fn alignment(&self) -> usize {
    self.size_align.alignment()
  }

  pub(crate) fn set_alignment(
    &mut self,
    alignment: usize,
  ) {
    self.size_align.set_alignment(alignment);
  }

  pub(crate) fn is_free(&self) -> bool {
    self.prev.is_free()
  }

  pub(crate) fn set_free(
    &mut self,
    free: bool,
  ) {
    self.prev.set_free(free);
  }

  pub(crate) fn color(&self) -> Color {
    self.prev.color()
  }

  pub(crate) fn set_color(
    &mut self,
    color: Color,
  ) {
    self.prev.set_color(color);
  }

  pub(crate) fn prev(&self) -> *mut Block {
    self.prev.addr() as *mut Block
  }

  /// The raw prev word, tags included. A nested arena inherits it from
  /// the block it overlays so the physical chain stays intact.
  pub(crate) fn prev_link(&self) -> PrevLink {
    self.prev
  }

  pub(crate) fn set_prev(
    &mut self,
    prev: *mut Block,
  ) {
    self.prev.set_addr(prev as usize);
  }

  pub(crate) fn left(&self) -> *mut Block {
    debug_assert!(self.is_free());
    self.link_a as *mut Block
  }

  pub(crate) fn set_left(
    &mut self,
    left: *mut Block,
  ) {
    debug_assert!(self.is_free());
    self.link_a = left as usize;
  }

  pub(crate) fn right(&self) -> *mut Block {
    debug_assert!(self.is_free());
    self.link_b as *mut Block
  }

  pub(crate) fn set_right(
    &mut self,
    right: *mut Block,
  ) {
    debug_assert!(self.is_free());
    self.link_b = right as usize;
  }

  pub(crate) fn owner(&self) -> *mut Arena {
    debug_assert!(!self.is_free());
    self.link_a as *mut Arena
  }

  pub(crate) fn magic(&self) -> usize {
    debug_assert!(!self.is_free());
    self.link_b
  }

  /// Marks the block occupied and fills the overlay with the owner and the
  /// magic word derived from the pointer handed to the caller.
  pub(crate) fn stamp_occupied(
    &mut self,
    owner: *mut Arena,
    user_addr: usize,
  ) {
    self.prev.set_free(false);
    self.link_a = owner as usize;
    self.link_b = crate::MAGIC ^ user_addr;
  }

  /// Whether an occupied block's header is really a nested arena's header.
  ///
  /// A normal occupied block stores an (aligned, hence untagged) arena
  /// pointer where a nested arena stores its tagged tail word, so the
  /// nested bit distinguishes the two.
  pub(crate) fn is_nested_arena(&self) -> bool {
    debug_assert!(!self.is_free());
    self.link_a & TailLink::NESTED_BIT != 0
  }

  pub(crate) fn header_addr(&self) -> usize {
    self as *const Block as usize
  }

  pub(crate) fn payload_addr(&self) -> usize {
    self.header_addr() + HEADER_SIZE
  }

  /// Address handed to the caller: the payload rounded up to the block's
  /// recorded alignment. Equals the payload address when no head padding
  /// was needed.
  pub(crate) fn user_addr(&self) -> usize {
    align_to!(self.payload_addr(), self.alignment())
  }

  /// Physical successor, derived from the payload size.
  ///
  /// Only meaningful while the successor lies at or before the arena's
  /// tail; the caller guards.
  pub(crate) fn next_physical(&self) -> *mut Block {
    (self.payload_addr() + self.size()) as *mut Block
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::ptr;

  #[test]
  fn header_is_exactly_four_words() {
    assert_eq!(4 * crate::WORD, HEADER_SIZE);
    #[cfg(target_pointer_width = "64")]
    assert_eq!(32, HEADER_SIZE);
    #[cfg(target_pointer_width = "32")]
    assert_eq!(16, HEADER_SIZE);
  }

  #[test]
  fn physical_chain_round_trips() {
    // Three blocks laid out by hand in a word-aligned buffer.
    let mut buf = vec![0usize; 64];
    let base = buf.as_mut_ptr() as usize;

    let first = base as *mut Block;
    let second = (base + HEADER_SIZE + 64) as *mut Block;
    let third = (base + 2 * HEADER_SIZE + 64 + 96) as *mut Block;

    unsafe {
      Block::write_header(first, 64, 16, ptr::null_mut(), false);
      Block::write_header(second, 96, 16, first, false);
      Block::write_header(third, 0, 16, second, true);

      assert_eq!(second, (*first).next_physical());
      assert_eq!(third, (*second).next_physical());
      assert_eq!(first, (*second).prev());
      assert_eq!(second, (*third).prev());
      assert!((*first).prev().is_null());

      // next(prev(B)) == B
      assert_eq!(second, (*(*second).prev().cast_const()).next_physical());
    }
  }

  #[test]
  fn overlay_switches_with_the_free_flag() {
    let mut buf = vec![0usize; 16];
    let block = buf.as_mut_ptr() as *mut Block;

    unsafe {
      Block::write_header(block, 128, 16, ptr::null_mut(), true);

      // Free arm: tree links.
      (*block).set_left(0x4000 as *mut Block);
      (*block).set_right(0x8000 as *mut Block);
      assert_eq!(0x4000, (*block).left() as usize);
      assert_eq!(0x8000, (*block).right() as usize);
      assert!((*block).is_free());

      // Flip to occupied: same words, other arm.
      let user = (*block).user_addr();
      (*block).stamp_occupied(0x1_0000 as *mut Arena, user);
      assert!(!(*block).is_free());
      assert_eq!(0x1_0000, (*block).owner() as usize);
      assert_eq!(crate::MAGIC, (*block).magic() ^ user);
      assert!(!(*block).is_nested_arena());
    }
  }

  #[test]
  fn user_addr_honors_the_recorded_alignment() {
    let mut buf = vec![0usize; 64];
    let base = buf.as_mut_ptr() as usize;
    let block = base as *mut Block;

    unsafe {
      Block::write_header(block, 256, crate::WORD, ptr::null_mut(), false);
      assert_eq!((*block).payload_addr(), (*block).user_addr());

      (*block).set_alignment(128);
      let user = (*block).user_addr();
      assert_eq!(0, user % 128);
      assert!(user >= (*block).payload_addr());
      assert!(user - (*block).payload_addr() < 128);
    }
  }

  #[test]
  fn flags_do_not_disturb_size_or_prev() {
    let mut buf = vec![0usize; 8];
    let block = buf.as_mut_ptr() as *mut Block;

    unsafe {
      Block::write_header(block, 4096, 64, 0x77_7000 as *mut Block, true);

      (*block).set_color(Color::Black);
      (*block).set_free(false);
      assert_eq!(4096, (*block).size());
      assert_eq!(64, (*block).alignment());
      assert_eq!(0x77_7000, (*block).prev() as usize);

      (*block).set_free(true);
      (*block).set_color(Color::Red);
      assert_eq!(4096, (*block).size());
      assert_eq!(0x77_7000, (*block).prev() as usize);
      assert_eq!(Color::Red, (*block).color());
      assert!((*block).is_free());
    }
  }
}
