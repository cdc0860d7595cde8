//! # rarena - A Header-Resident Region Allocator
//!
//! This crate provides an **arena allocator** that manages a single
//! contiguous byte span and parcels it into aligned, individually
//! freeable allocations. Every piece of bookkeeping lives inside the
//! span itself; there is no out-of-band metadata.
//!
//! ## Overview
//!
//! ```text
//!   One span, carved into blocks:
//!
//!   ┌────────────────────────────────────────────────────────────────────┐
//!   │                            ARENA SPAN                              │
//!   │                                                                    │
//!   │  ┌───────┬────┬────┬────┬────┬────┬──────────────────────────────┐ │
//!   │  │ Arena │ A1 │ A2 │free│ A3 │tail│        uncarved remainder    │ │
//!   │  │header │    │    │    │    │    │                              │ │
//!   │  └───────┴────┴────┴──▲─┴────┴────┴──────────────────────────────┘ │
//!   │                       │                                            │
//!   │            free blocks wait in an intrusive                        │
//!   │            best-fit tree, rooted in the header                     │
//!   └────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation: best-fit reuse first (O(log n)), tail bump on a miss (O(1)).
//!   Free: recover the header from the pointer, coalesce both ways, done.
//! ```
//!
//! Each block pays a fixed four-word header (32 bytes on 64-bit hosts).
//! Per-block flags and the alignment exponent hide in tag bits of words
//! the header needs anyway, and the free-tree links overlay the words
//! that hold the owner and the validation magic while a block is in use.
//!
//! ## Crate Structure
//!
//! ```text
//!   rarena
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── tag        - Tagged machine words (internal)
//!   ├── block      - Block header overlay (internal)
//!   ├── tree       - Intrusive LLRB free tree (internal)
//!   ├── arena      - Arena lifecycle, allocate, free, reset
//!   ├── bump       - Bump sub-allocator carved from one block
//!   └── diag       - Dump and colored region map
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rarena::Arena;
//!
//! fn main() {
//!     unsafe {
//!         // A 4 KiB arena on the system heap.
//!         let arena = Arena::new_dynamic(4096);
//!         assert!(!arena.is_null());
//!
//!         let p = (*arena).alloc(100);
//!         let q = (*arena).alloc_aligned(256, 64);
//!
//!         // Pointers free themselves: the owning arena is recovered
//!         // from the block header.
//!         Arena::dealloc(p);
//!         Arena::dealloc(q);
//!
//!         Arena::destroy(arena);
//!     }
//! }
//! ```
//!
//! Arenas also run inside caller-owned buffers ([`Arena::new_static`]),
//! inside other arenas ([`Arena::new_nested`]), and a [`Bump`] turns one
//! block into a stack-style scratch allocator.
//!
//! ## Failure Model
//!
//! Every operation is total. Creation and allocation report failure as a
//! null pointer; `free`-side operations validate their argument (magic
//! word, owner span, free flag) and silently ignore anything that does
//! not hold up, so a double free or a wild pointer cannot corrupt the
//! arena.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization; partition into nested
//!   arenas or lock externally.
//! - **No in-place resize**: grow by allocate-copy-free.
//! - **Word-aligned spans only**: buffers below word alignment are
//!   rejected.
//! - **Size cap**: a block's size field keeps three bits for the
//!   alignment exponent, capping payloads at `usize::MAX >> 3`.
//!
//! ## Safety
//!
//! This crate hands out raw pointers into memory it manages by hand; the
//! allocation and teardown entry points are `unsafe` and their contracts
//! are documented per function. The test suite runs randomized operation
//! sequences against a full structural verifier to keep the internal
//! invariants honest.

use core::mem;

pub mod align;
mod arena;
mod block;
mod bump;
#[cfg(test)]
mod check;
mod diag;
mod tag;
mod tree;

pub use arena::Arena;
pub use bump::Bump;

/// Machine word size; the minimum alignment anything in a span ever has.
pub(crate) const WORD: usize = mem::size_of::<usize>();

/// Magic constant validating occupied blocks, stored XOR-ed with the
/// payload address. Its set low bits mean it can never equal a
/// word-aligned header address, which is what lets the free-side header
/// recovery tell a magic word from a back-link.
pub(crate) const MAGIC: usize = 0xDEAD_BEEF;

/// Smallest payload worth splitting a block for. Trailing remainders
/// below a header plus this many bytes are absorbed into the allocation.
pub const MIN_BUFFER_SIZE: usize = 16;

/// Baseline alignment of arenas created without an explicit one.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Widest supported alignment: the 3-bit exponent encodes `WORD << 0`
/// through `WORD << 7`.
pub const MAX_ALIGNMENT: usize = WORD << 7;

/// Fill byte for freed payloads when poisoning is on (debug builds by
/// default; see the `poison-always` / `poison-never` features).
pub const POISON_BYTE: u8 = 0xDD;

const _: () = assert!(DEFAULT_ALIGNMENT.is_power_of_two());
const _: () = assert!(DEFAULT_ALIGNMENT >= WORD && DEFAULT_ALIGNMENT <= MAX_ALIGNMENT);
const _: () = assert!(MIN_BUFFER_SIZE >= WORD);
// A word-aligned value would collide with real header addresses in the
// free-side recovery.
const _: () = assert!(MAGIC % WORD != 0);
