#![allow(dead_code)]

//! Shared test guests implementing the guest export surface.
//!
//! The signer guest below implements the allocator and all nine exports
//! with simplified semantics: formatting pads the message to the requested
//! chunk count, recovery copies it back (rejecting anything that is not a
//! whole number of 512-byte chunks), hashing produces a 16-byte digest plus
//! its decimal literal form, and key/address/signature outputs are
//! fixed-size ASCII. The allocator reclaims frees at the top of the heap,
//! so a host that releases buffers in reverse allocation order keeps guest
//! memory flat, and leaks surface as allocator exhaustion because the
//! memory is capped at one page.

use aleo_wasm_engine::AleoRuntime;

pub const SIGNER_GUEST: &str = r#"
(module
  (import "env" "host_log_string" (func $host_log (param i32 i32)))
  (memory (export "memory") 1 1)
  (global $heap (mut i32) (i32.const 64))
  (global $key_seed (mut i32) (i32.const 7))

  (data (i32.const 0) "formatted message ready")

  (func $align8 (param $n i32) (result i32)
    (i32.and (i32.add (local.get $n) (i32.const 7)) (i32.const -8)))

  (func $allocate (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local $need i32)
    (local.set $need (call $align8 (local.get $size)))
    (if (i32.gt_u (i32.add (global.get $heap) (local.get $need))
                  (i32.mul (memory.size) (i32.const 65536)))
      (then (return (i32.const 0))))
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $need)))
    (local.get $ptr))

  (func $deallocate (export "deallocate") (param $ptr i32) (param $size i32)
    (if (i32.eq (i32.add (local.get $ptr) (call $align8 (local.get $size)))
                (global.get $heap))
      (then (global.set $heap (local.get $ptr)))))

  (func $fill_ascii (param $ptr i32) (param $len i32) (param $seed i32)
    (local $i i32)
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
        (i32.store8
          (i32.add (local.get $ptr) (local.get $i))
          (i32.add (i32.const 97)
            (i32.rem_u (i32.add (local.get $seed) (local.get $i)) (i32.const 26))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next))))

  (func $sum_bytes (param $ptr i32) (param $len i32) (result i32)
    (local $i i32)
    (local $acc i32)
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
        (local.set $acc
          (i32.add (local.get $acc)
            (i32.load8_u (i32.add (local.get $ptr) (local.get $i)))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (local.get $acc))

  (func $digest (param $ptr i32) (param $len i32) (result i64)
    (local $i i32)
    (local $h i64)
    (local.set $h (i64.const 1099511628211))
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
        (local.set $h
          (i64.mul
            (i64.xor (local.get $h)
              (i64.extend_i32_u
                (i32.load8_u (i32.add (local.get $ptr) (local.get $i)))))
            (i64.const 1099511628211)))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (local.get $h))

  (func $pack (param $len i32) (param $ptr i32) (result i64)
    (i64.or
      (i64.shl (i64.extend_i32_u (local.get $len)) (i64.const 32))
      (i64.extend_i32_u (local.get $ptr))))

  (func (export "new_private_key") (result i32)
    (local $ptr i32)
    (local.set $ptr (call $allocate (i32.const 59)))
    (if (i32.eqz (local.get $ptr)) (then (return (i32.const 0))))
    (call $fill_ascii (local.get $ptr) (i32.const 59) (global.get $key_seed))
    (global.set $key_seed (i32.add (global.get $key_seed) (i32.const 1)))
    (local.get $ptr))

  (func (export "get_address") (param $key i32) (param $len i32) (result i32)
    (local $ptr i32)
    (if (i32.ne (local.get $len) (i32.const 59)) (then (return (i32.const 0))))
    (local.set $ptr (call $allocate (i32.const 63)))
    (if (i32.eqz (local.get $ptr)) (then (return (i32.const 0))))
    (call $fill_ascii (local.get $ptr) (i32.const 63)
      (call $sum_bytes (local.get $key) (local.get $len)))
    (local.get $ptr))

  (func (export "sign") (param $key i32) (param $klen i32) (param $msg i32) (param $mlen i32) (result i32)
    (local $ptr i32)
    (if (i32.ne (local.get $klen) (i32.const 59)) (then (return (i32.const 0))))
    (local.set $ptr (call $allocate (i32.const 216)))
    (if (i32.eqz (local.get $ptr)) (then (return (i32.const 0))))
    (call $fill_ascii (local.get $ptr) (i32.const 216)
      (i32.add
        (call $sum_bytes (local.get $key) (local.get $klen))
        (call $sum_bytes (local.get $msg) (local.get $mlen))))
    (local.get $ptr))

  (func (export "format_message") (param $msg i32) (param $len i32) (param $chunks i32) (result i64)
    (local $out i32)
    (local $size i32)
    (if (i32.or (i32.lt_u (local.get $chunks) (i32.const 1))
                (i32.gt_u (local.get $chunks) (i32.const 32)))
      (then (return (i64.const 0))))
    (local.set $size (i32.mul (local.get $chunks) (i32.const 512)))
    (if (i32.gt_u (local.get $len) (local.get $size))
      (then (return (i64.const 0))))
    (local.set $out (call $allocate (local.get $size)))
    (if (i32.eqz (local.get $out)) (then (return (i64.const 0))))
    (memory.copy (local.get $out) (local.get $msg) (local.get $len))
    (memory.fill (i32.add (local.get $out) (local.get $len))
      (i32.const 0)
      (i32.sub (local.get $size) (local.get $len)))
    (call $host_log (i32.const 0) (i32.const 23))
    (call $pack (local.get $size) (local.get $out)))

  (func (export "formatted_message_to_bytes") (param $msg i32) (param $len i32) (result i64)
    (local $out i32)
    (if (i32.eqz (local.get $len)) (then (return (i64.const 0))))
    (if (i32.ne (i32.rem_u (local.get $len) (i32.const 512)) (i32.const 0))
      (then (return (i64.const 0))))
    (if (i32.gt_u (local.get $len) (i32.const 16384))
      (then (return (i64.const 0))))
    (local.set $out (call $allocate (local.get $len)))
    (if (i32.eqz (local.get $out)) (then (return (i64.const 0))))
    (memory.copy (local.get $out) (local.get $msg) (local.get $len))
    (call $pack (local.get $len) (local.get $out)))

  (func (export "hash_message_bytes") (param $msg i32) (param $len i32) (result i64)
    (local $out i32)
    (local $h i64)
    (local.set $h (call $digest (local.get $msg) (local.get $len)))
    (local.set $out (call $allocate (i32.const 16)))
    (if (i32.eqz (local.get $out)) (then (return (i64.const 0))))
    (i64.store (local.get $out) (local.get $h))
    (i64.store (i32.add (local.get $out) (i32.const 8)) (i64.const 0))
    (call $pack (i32.const 16) (local.get $out)))

  (func (export "hash_message") (param $msg i32) (param $len i32) (result i64)
    (local $h i64)
    (local $n i32)
    (local $out i32)
    (local.set $h (call $digest (local.get $msg) (local.get $len)))
    (block $done
      (loop $next
        (i32.store8
          (i32.add (i32.const 32) (i32.sub (i32.const 19) (local.get $n)))
          (i32.add (i32.const 48)
            (i32.wrap_i64 (i64.rem_u (local.get $h) (i64.const 10)))))
        (local.set $n (i32.add (local.get $n) (i32.const 1)))
        (local.set $h (i64.div_u (local.get $h) (i64.const 10)))
        (br_if $done (i64.eqz (local.get $h)))
        (br_if $done (i32.ge_u (local.get $n) (i32.const 20)))
        (br $next)))
    (local.set $out (call $allocate (i32.add (local.get $n) (i32.const 4))))
    (if (i32.eqz (local.get $out)) (then (return (i64.const 0))))
    (memory.copy (local.get $out)
      (i32.add (i32.const 32) (i32.sub (i32.const 20) (local.get $n)))
      (local.get $n))
    (i32.store8 (i32.add (local.get $out) (local.get $n)) (i32.const 117))
    (i32.store8 (i32.add (local.get $out) (i32.add (local.get $n) (i32.const 1))) (i32.const 49))
    (i32.store8 (i32.add (local.get $out) (i32.add (local.get $n) (i32.const 2))) (i32.const 50))
    (i32.store8 (i32.add (local.get $out) (i32.add (local.get $n) (i32.const 3))) (i32.const 56))
    (call $pack (i32.add (local.get $n) (i32.const 4)) (local.get $out)))
)
"#;

/// Guest whose operation exports all trap after a successful allocation.
pub const TRAPPING_GUEST: &str = r#"
(module
  (memory (export "memory") 1 1)
  (global $heap (mut i32) (i32.const 8))

  (func (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $size)))
    (local.get $ptr))

  (func (export "deallocate") (param i32 i32))

  (func (export "new_private_key") (result i32) unreachable)
  (func (export "get_address") (param i32 i32) (result i32) unreachable)
  (func (export "sign") (param i32 i32 i32 i32) (result i32) unreachable)
  (func (export "hash_message") (param i32 i32) (result i64) unreachable)
  (func (export "hash_message_bytes") (param i32 i32) (result i64) unreachable)
  (func (export "format_message") (param i32 i32 i32) (result i64) unreachable)
  (func (export "formatted_message_to_bytes") (param i32 i32) (result i64) unreachable)
)
"#;

/// Guest that rejects every operation: key generation succeeds but address
/// derivation returns zero, every packed export returns the rejection
/// marker, and the byte-hash export returns a pointer past the end of its
/// one-page memory.
pub const REJECTING_GUEST: &str = r#"
(module
  (memory (export "memory") 1 1)
  (global $heap (mut i32) (i32.const 8))

  (func $allocate (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $size)))
    (local.get $ptr))

  (func (export "deallocate") (param i32 i32))

  (func (export "new_private_key") (result i32)
    (local $ptr i32)
    (local.set $ptr (call $allocate (i32.const 59)))
    (memory.fill (local.get $ptr) (i32.const 107) (i32.const 59))
    (local.get $ptr))

  (func (export "get_address") (param i32 i32) (result i32) (i32.const 0))
  (func (export "sign") (param i32 i32 i32 i32) (result i32) (i32.const 0))
  (func (export "hash_message") (param i32 i32) (result i64) (i64.const 0))
  (func (export "hash_message_bytes") (param i32 i32) (result i64)
    (i64.or (i64.shl (i64.const 16) (i64.const 32)) (i64.const 131072)))
  (func (export "format_message") (param i32 i32 i32) (result i64) (i64.const 0))
  (func (export "formatted_message_to_bytes") (param i32 i32) (result i64) (i64.const 0))
)
"#;

/// Guest whose allocator always reports exhaustion.
pub const NO_ALLOC_GUEST: &str = r#"
(module
  (memory (export "memory") 1 1)
  (func (export "allocate") (param i32) (result i32) (i32.const 0))
  (func (export "deallocate") (param i32 i32))
  (func (export "new_private_key") (result i32) (i32.const 0))
  (func (export "get_address") (param i32 i32) (result i32) (i32.const 0))
  (func (export "sign") (param i32 i32 i32 i32) (result i32) (i32.const 0))
  (func (export "hash_message") (param i32 i32) (result i64) (i64.const 0))
  (func (export "hash_message_bytes") (param i32 i32) (result i64) (i64.const 0))
  (func (export "format_message") (param i32 i32 i32) (result i64) (i64.const 0))
  (func (export "formatted_message_to_bytes") (param i32 i32) (result i64) (i64.const 0))
)
"#;

/// A runtime over the well-behaved signer guest.
pub fn signer_runtime() -> AleoRuntime {
    AleoRuntime::from_binary(SIGNER_GUEST).expect("signer test guest must compile")
}

/// Test message bytes that avoid the newline byte, which the formatting
/// operation strips from the guest's literal output.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| 32 + (i % 90) as u8).collect()
}
