use rarena::{Arena, Bump};

/// Walks through the allocator's moving parts on a small dynamic arena.
/// Run with `RUST_LOG=debug` (or `trace`) to watch the internal records:
///
/// ```text
/// RUST_LOG=trace cargo run --example arena
/// ```
fn main() {
  env_logger::init();

  unsafe {
    // ------------------------------------------------------------------
    // 1) A 4 KiB arena on the system heap.
    // ------------------------------------------------------------------
    let arena = Arena::new_dynamic(4096);
    assert!(!arena.is_null());
    let a = &mut *arena;
    println!(
      "[1] created arena: capacity = {}, baseline alignment = {}, tail = {} bytes",
      a.capacity(),
      a.baseline_alignment(),
      a.free_size_in_tail(),
    );
    println!("    {}", a.render_map(72));

    // ------------------------------------------------------------------
    // 2) A few allocations, one of them over-aligned.
    // ------------------------------------------------------------------
    let p = a.alloc(100);
    let q = a.alloc(300);
    let r = a.alloc_aligned(64, 128);
    assert!(!p.is_null() && !q.is_null() && !r.is_null());
    println!("\n[2] alloc(100) = {p:p}, alloc(300) = {q:p}, alloc_aligned(64, 128) = {r:p}");
    (r as *mut u64).write(0xDEAD_BEEF);
    println!("    wrote 0x{:X} through the aligned pointer", (r as *mut u64).read());
    println!("    {}", a.render_map(72));

    // ------------------------------------------------------------------
    // 3) Free the middle one: the hole lands in the free tree and the
    //    next fitting request gets it back.
    // ------------------------------------------------------------------
    Arena::dealloc(q);
    println!("\n[3] freed the 300-byte block");
    println!("    {}", a.render_map(72));

    let q2 = a.alloc(260);
    println!("    alloc(260) reuses the hole: {q2:p}");
    println!("    {}", a.render_map(72));

    // ------------------------------------------------------------------
    // 4) A nested arena with a bump inside: scratch space that trims
    //    itself down and then disappears without a trace.
    // ------------------------------------------------------------------
    let nested = Arena::new_nested(a, 1024);
    assert!(!nested.is_null());
    let bump = Bump::new(&mut *nested, 512);
    assert!(!bump.is_null());

    let s1 = (*bump).alloc(10);
    let s2 = (*bump).alloc_aligned(10, 64);
    assert!(!s1.is_null() && !s2.is_null());
    println!(
      "\n[4] nested arena {nested:p}, bump {bump:p}: scratch at {s1:p} and {s2:p} (64-aligned)",
    );

    (*bump).trim();
    println!(
      "    after trim the bump keeps {} bytes; nested tail slack = {}",
      (*bump).capacity(),
      (*nested).free_size_in_tail(),
    );

    Bump::destroy(bump);
    Arena::destroy(nested);
    println!("    nested arena destroyed, parent map:");
    println!("    {}", a.render_map(72));

    // ------------------------------------------------------------------
    // 5) Teardown.
    // ------------------------------------------------------------------
    Arena::dealloc(p);
    Arena::dealloc(q2);
    Arena::dealloc(r);
    println!("\n[5] everything freed: tail = {} bytes", a.free_size_in_tail());
    println!("    {}", a.render_map(72));

    Arena::destroy(arena);
  }
}
