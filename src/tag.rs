//! # Tagged Words
//!
//! Every block header field in this crate is a single machine word that
//! carries a few extra bits of metadata in positions the payload value can
//! never occupy:
//!
//! ```text
//!   SizeAlign (block size / arena capacity):
//!   ┌─────────────────────────────────────────────┬───────────┐
//!   │          size  (value << 3)                 │ exponent  │
//!   └─────────────────────────────────────────────┴───────────┘
//!    63                                          3 2         0
//!    alignment = WORD << exponent
//!
//!   PrevLink (physical-predecessor pointer):
//!   ┌─────────────────────────────────────────┬───────┬───────┐
//!   │          address (4-byte aligned)       │ color │ free  │
//!   └─────────────────────────────────────────┴───────┴───────┘
//!    63                                      2    1       0
//!
//!   TailLink (arena tail pointer):
//!   ┌─────────────────────────────────────────┬───────┬───────┐
//!   │          address (4-byte aligned)       │nested │dynamic│
//!   └─────────────────────────────────────────┴───────┴───────┘
//!    63                                      2    1       0
//! ```
//!
//! Block headers are always at least word-aligned, so the low two pointer
//! bits are available. Sizes sacrifice their top three bits instead, which
//! caps a single allocation at `usize::MAX >> 3` bytes.
//!
//! Callers never see a tagged word; getters mask, setters preserve.

/// Node color of the free-tree entry stored in a [`PrevLink`] tag bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
  Red,
  Black,
}

/// Packed payload size plus 3-bit alignment exponent.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub(crate) struct SizeAlign(usize);

impl SizeAlign {
  const EXPONENT_BITS: u32 = 3;
  const EXPONENT_MASK: usize = 0b111;

  /// Largest encodable payload size.
  pub(crate) const MAX_SIZE: usize = usize::MAX >> Self::EXPONENT_BITS;

  pub(crate) fn new(
    size: usize,
    alignment: usize,
  ) -> Self {
    let mut packed = Self(0);
    packed.set_size(size);
    packed.set_alignment(alignment);
    packed
  }

  pub(crate) const fn size(self) -> usize {
    self.0 >> Self::EXPONENT_BITS
  }

  pub(crate) fn set_size(
    &mut self,
    size: usize,
  ) {
    debug_assert!(size <= Self::MAX_SIZE);
    self.0 = (size << Self::EXPONENT_BITS) | (self.0 & Self::EXPONENT_MASK);
  }

  pub(crate) const fn alignment(self) -> usize {
    crate::WORD << (self.0 & Self::EXPONENT_MASK)
  }

  pub(crate) fn set_alignment(
    &mut self,
    alignment: usize,
  ) {
    debug_assert!(crate::align::is_valid_alignment(alignment));
    let exponent = (alignment.trailing_zeros() - crate::WORD.trailing_zeros()) as usize;
    self.0 = (self.0 & !Self::EXPONENT_MASK) | (exponent & Self::EXPONENT_MASK);
  }
}

/// Physical-predecessor pointer carrying the `is_free` flag and tree color.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub(crate) struct PrevLink(usize);

impl PrevLink {
  const FREE_BIT: usize = 0b01;
  const COLOR_BIT: usize = 0b10;
  const TAG_MASK: usize = 0b11;

  pub(crate) const fn null() -> Self {
    Self(0)
  }

  pub(crate) const fn addr(self) -> usize {
    self.0 & !Self::TAG_MASK
  }

  pub(crate) fn set_addr(
    &mut self,
    addr: usize,
  ) {
    debug_assert!(addr & Self::TAG_MASK == 0);
    self.0 = addr | (self.0 & Self::TAG_MASK);
  }

  pub(crate) const fn is_free(self) -> bool {
    self.0 & Self::FREE_BIT != 0
  }

  pub(crate) fn set_free(
    &mut self,
    free: bool,
  ) {
    if free {
      self.0 |= Self::FREE_BIT;
    } else {
      self.0 &= !Self::FREE_BIT;
    }
  }

  pub(crate) const fn color(self) -> Color {
    if self.0 & Self::COLOR_BIT != 0 {
      Color::Red
    } else {
      Color::Black
    }
  }

  pub(crate) fn set_color(
    &mut self,
    color: Color,
  ) {
    match color {
      Color::Red => self.0 |= Self::COLOR_BIT,
      Color::Black => self.0 &= !Self::COLOR_BIT,
    }
  }
}

/// Arena tail pointer carrying the `is_dynamic` and `is_nested` flags.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub(crate) struct TailLink(usize);

impl TailLink {
  const DYNAMIC_BIT: usize = 0b01;
  /// Also readable through an occupied block's overlay: an arena pointer in
  /// the owner slot has both low bits clear, a nested arena's tail word has
  /// this bit set.
  pub(crate) const NESTED_BIT: usize = 0b10;
  const TAG_MASK: usize = 0b11;

  pub(crate) fn new(
    addr: usize,
    dynamic: bool,
    nested: bool,
  ) -> Self {
    debug_assert!(addr & Self::TAG_MASK == 0);
    let mut tags = 0;
    if dynamic {
      tags |= Self::DYNAMIC_BIT;
    }
    if nested {
      tags |= Self::NESTED_BIT;
    }
    Self(addr | tags)
  }

  pub(crate) const fn addr(self) -> usize {
    self.0 & !Self::TAG_MASK
  }

  pub(crate) fn set_addr(
    &mut self,
    addr: usize,
  ) {
    debug_assert!(addr & Self::TAG_MASK == 0);
    self.0 = addr | (self.0 & Self::TAG_MASK);
  }

  pub(crate) const fn is_dynamic(self) -> bool {
    self.0 & Self::DYNAMIC_BIT != 0
  }

  pub(crate) const fn is_nested(self) -> bool {
    self.0 & Self::NESTED_BIT != 0
  }
}
