//! # Bump Sub-Allocator
//!
//! A bump carves one block out of a parent arena and hands it out as a
//! downward-growing stack of allocations: each request just advances an
//! offset, nothing is ever freed individually, and the whole region goes
//! back to the parent in one call.
//!
//! ```text
//!   parent block
//!   ┌────────────────┬──────────────────────────────────────────┐
//!   │  Bump header   │               payload                    │
//!   │ (block overlay)│  ┌─────┬─────┬────────┬───────────────┐  │
//!   │                │  │ A1  │ A2  │   A3   │    unused     │  │
//!   └────────────────┴──┴─────┴─────┴────────┴───────────────┴──┘
//!                                            ▲
//!                                            offset (next alloc)
//! ```
//!
//! The header overlays an occupied block of the parent: size and the
//! physical chain link stay where the parent expects them, the owner word
//! keeps naming the parent, and only the magic slot is repurposed as the
//! bump offset. That keeps [`Bump::destroy`] a plain block release with
//! no owner-recovery walk.
//!
//! Allocation is O(1) and never guarantees alignment unless asked;
//! [`Bump::alloc_aligned`] rounds the offset up first. [`Bump::trim`]
//! gives the unused tail of the region back to the parent early, which
//! matters when the bump was sized pessimistically.

use core::ptr;

use crate::align_to;
use crate::arena::{Arena, header_from_user};
use crate::block::{Block, HEADER_SIZE};
use crate::tag::{PrevLink, SizeAlign};
use crate::MIN_BUFFER_SIZE;

/// Fixed-capacity stack-style allocator living inside one parent block.
///
/// Created with [`Bump::new`], torn down with [`Bump::destroy`]. The
/// parent must outlive the bump; the bump's region is exclusively its own
/// until destroyed.
#[repr(C)]
pub struct Bump {
  /// Block overlay: region size and alignment exponent.
  size_align: SizeAlign,
  /// Block overlay: physical chain link, `is_free` clear. Only the
  /// parent reads it, through the block view.
  #[allow(dead_code)]
  prev: PrevLink,
  /// Block overlay: the owning (parent) arena.
  owner: *mut Arena,
  /// Bytes from this header to the next unused byte. Starts at
  /// `HEADER_SIZE`; replaces the magic slot of a plain occupied block.
  offset: usize,
}

const _: () = assert!(core::mem::size_of::<Bump>() == HEADER_SIZE);

impl Bump {
  /// Carves a `size`-byte bump out of `parent`.
  ///
  /// Returns null when the parent cannot supply the block.
  ///
  /// # Safety
  ///
  /// `parent` must be a live arena and must outlive the bump. The bump
  /// must be torn down with [`Bump::destroy`] before the parent is reset
  /// or destroyed.
  pub unsafe fn new(
    parent: &mut Arena,
    size: usize,
  ) -> *mut Bump {
    if size == 0 {
      return ptr::null_mut();
    }

    unsafe {
      let user = parent.alloc(size);
      if user.is_null() {
        return ptr::null_mut();
      }

      let block = header_from_user(user as usize);
      debug_assert!(!block.is_null());

      let bump: *mut Bump = block.cast();
      (*bump).offset = HEADER_SIZE;
      log::trace!("bump {:p}: carved {} bytes from {:p}", bump, size, parent);
      bump
    }
  }

  /// Usable bytes in the region (the parent block's stored size, so any
  /// rounding the parent applied is included).
  pub fn capacity(&self) -> usize {
    self.size_align.size()
  }

  /// Bytes already handed out, alignment gaps included.
  pub fn used(&self) -> usize {
    self.offset - HEADER_SIZE
  }

  fn base(&self) -> usize {
    self as *const Bump as usize
  }

  /// Bumps the offset by `size` bytes and returns the previous position.
  ///
  /// No alignment is applied; consecutive allocations are contiguous.
  /// Returns null when the region cannot fit `size` more bytes.
  ///
  /// # Safety
  ///
  /// The bump must be live. The returned pointer is valid for `size`
  /// bytes until the bump is reset or destroyed.
  pub unsafe fn alloc(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }

    // The region holds capacity bytes past the header, so an allocation
    // fits exactly when the advanced offset stays within that bound.
    let end = match self.offset.checked_add(size) {
      Some(end) => end,
      None => return ptr::null_mut(),
    };
    if end > HEADER_SIZE + self.capacity() {
      return ptr::null_mut();
    }

    let payload = self.base() + self.offset;
    self.offset = end;
    payload as *mut u8
  }

  /// [`Bump::alloc`] with the offset first rounded up so the returned
  /// pointer lands on `alignment` (a power of two).
  ///
  /// # Safety
  ///
  /// Same contract as [`Bump::alloc`].
  pub unsafe fn alloc_aligned(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> *mut u8 {
    if size == 0 || !alignment.is_power_of_two() {
      return ptr::null_mut();
    }

    let aligned = align_to!(self.base() + self.offset, alignment) - self.base();
    let end = match aligned.checked_add(size) {
      Some(end) => end,
      None => return ptr::null_mut(),
    };
    if end > HEADER_SIZE + self.capacity() {
      return ptr::null_mut();
    }

    let payload = self.base() + aligned;
    self.offset = end;
    payload as *mut u8
  }

  /// Rewinds the bump to empty. Previously returned pointers become
  /// dangling; the bytes are left as-is.
  pub fn reset(&mut self) {
    self.offset = HEADER_SIZE;
  }

  /// Shrinks the region to the smallest parent-acceptable size that still
  /// covers the used bytes and donates the surplus back to the parent.
  ///
  /// The kept size is the used byte count rounded up to the parent's
  /// baseline alignment, never below [`MIN_BUFFER_SIZE`]. Nothing happens
  /// when the surplus is too small to matter.
  ///
  /// # Safety
  ///
  /// The bump and its parent must be live.
  pub unsafe fn trim(&mut self) {
    unsafe {
      let parent = &mut *self.owner;
      let mut keep = align_to!(self.used(), parent.baseline_alignment());
      if keep < MIN_BUFFER_SIZE {
        keep = MIN_BUFFER_SIZE;
      }

      let block: *mut Block = (self as *mut Bump).cast();
      if parent.shrink_block(block, keep) {
        log::trace!("bump {:p}: trimmed to {} bytes", self, self.capacity());
      }
    }
  }

  /// Releases the whole region back to the parent. Null is ignored.
  ///
  /// # Safety
  ///
  /// The bump (and every pointer it returned) must not be used
  /// afterwards.
  pub unsafe fn destroy(bump: *mut Bump) {
    if bump.is_null() {
      return;
    }

    unsafe {
      let parent = (*bump).owner;
      debug_assert!(!parent.is_null());
      (*parent).release_block(bump.cast());
    }
  }
}
