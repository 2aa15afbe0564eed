//! Object layer: typed, validating accessors over the heap objects defined
//! in `core::gc`. Every operation here corresponds to one row of
//! `SPEC_FULL.md` §4.3.
//!
//! Accessors that can fail on a caller's mistake (wrong kind, out-of-range
//! index) return `Result<_, ObjectError>` rather than panicking, so the VM
//! layer can route them through its error-handler policy (`SPEC_FULL.md`
//! §7). Only genuine implementation bugs — a corrupted header, an
//! out-of-bounds word index — panic.

use crate::core::gc::ObjectKind;
use crate::core::heap::Heap;
use crate::core::value::Handle;

/// A type-check or bounds failure at the object-layer boundary. The VM's
/// opcode handlers translate these into `VmError` and route them through
/// the installed error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectError {
    WrongKind { expected: &'static str },
    IndexOutOfRange { index: i64, len: usize },
}

fn kind_of(heap: &Heap, h: Handle) -> Option<ObjectKind> {
    let idx = h.as_pointer()?;
    Some(ObjectKind::from_header(heap.to_space_word(idx)))
}

fn expect_kind(heap: &Heap, h: Handle, kind: ObjectKind, name: &'static str) -> Result<usize, ObjectError> {
    match (h.as_pointer(), kind_of(heap, h)) {
        (Some(idx), Some(k)) if k == kind => Ok(idx),
        _ => Err(ObjectError::WrongKind { expected: name }),
    }
}

// -- Pairs -------------------------------------------------------------

pub fn cons(heap: &mut Heap, car: Handle, cdr: Handle) -> Handle {
    let h = heap.alloc(ObjectKind::Pair, 3);
    let idx = h.as_pointer().unwrap();
    heap.write_handle(idx + 1, car);
    heap.write_handle(idx + 2, cdr);
    h
}

pub fn car(heap: &Heap, h: Handle) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Pair, "pair")?;
    Ok(heap.read_handle(idx + 1))
}

pub fn cdr(heap: &Heap, h: Handle) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Pair, "pair")?;
    Ok(heap.read_handle(idx + 2))
}

pub fn set_car(heap: &mut Heap, h: Handle, v: Handle) -> Result<(), ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Pair, "pair")?;
    heap.write_handle(idx + 1, v);
    Ok(())
}

pub fn set_cdr(heap: &mut Heap, h: Handle, v: Handle) -> Result<(), ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Pair, "pair")?;
    heap.write_handle(idx + 2, v);
    Ok(())
}

pub fn is_pair(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Pair)
}

// -- Strings & symbols ---------------------------------------------------

fn alloc_bytes(heap: &mut Heap, kind: ObjectKind, bytes: &[u8]) -> Handle {
    let words = crate::core::gc::words_for_bytes(bytes.len());
    let h = heap.alloc(kind, 2 + words);
    let idx = h.as_pointer().unwrap();
    heap.write_word(idx + 1, bytes.len() as u64);
    for (i, chunk) in bytes.chunks(8).enumerate() {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        heap.write_word(idx + 2 + i, u64::from_le_bytes(buf));
    }
    h
}

fn read_bytes(heap: &Heap, idx: usize) -> Vec<u8> {
    let len = heap.to_space_word(idx + 1) as usize;
    let words = crate::core::gc::words_for_bytes(len);
    let mut out = Vec::with_capacity(len);
    for i in 0..words {
        let word = heap.to_space_word(idx + 2 + i);
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.truncate(len);
    out
}

pub fn make_string(heap: &mut Heap, bytes: &[u8]) -> Handle {
    alloc_bytes(heap, ObjectKind::String, bytes)
}

/// Allocates an uninitialized string of `n` bytes (zero-filled).
pub fn alloc_string(heap: &mut Heap, n: usize) -> Handle {
    alloc_bytes(heap, ObjectKind::String, &vec![0u8; n])
}

pub fn string_bytes(heap: &Heap, h: Handle) -> Result<Vec<u8>, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::String, "string")?;
    Ok(read_bytes(heap, idx))
}

pub fn string_len(heap: &Heap, h: Handle) -> Result<usize, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::String, "string")?;
    Ok(heap.to_space_word(idx + 1) as usize)
}

pub fn is_string(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::String)
}

pub fn alloc_symbol(heap: &mut Heap, name: &[u8]) -> Handle {
    alloc_bytes(heap, ObjectKind::Symbol, name)
}

pub fn symbol_name(heap: &Heap, h: Handle) -> Result<Vec<u8>, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Symbol, "symbol")?;
    Ok(read_bytes(heap, idx))
}

pub fn is_symbol(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Symbol)
}

// -- Vectors -------------------------------------------------------------

pub fn alloc_vector(heap: &mut Heap, n: usize) -> Handle {
    let h = heap.alloc(ObjectKind::Vector, 2 + n);
    let idx = h.as_pointer().unwrap();
    heap.write_word(idx + 1, n as u64);
    for i in 0..n {
        heap.write_handle(idx + 2 + i, Handle::NIL);
    }
    h
}

pub fn vector_len(heap: &Heap, h: Handle) -> Result<usize, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Vector, "vector")?;
    Ok(heap.to_space_word(idx + 1) as usize)
}

pub fn vector_ref(heap: &Heap, h: Handle, i: i64) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Vector, "vector")?;
    let len = heap.to_space_word(idx + 1) as usize;
    if i < 0 || i as usize >= len {
        return Err(ObjectError::IndexOutOfRange { index: i, len });
    }
    Ok(heap.read_handle(idx + 2 + i as usize))
}

pub fn vector_set(heap: &mut Heap, h: Handle, i: i64, v: Handle) -> Result<(), ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Vector, "vector")?;
    let len = heap.to_space_word(idx + 1) as usize;
    if i < 0 || i as usize >= len {
        return Err(ObjectError::IndexOutOfRange { index: i, len });
    }
    heap.write_handle(idx + 2 + i as usize, v);
    Ok(())
}

pub fn is_vector(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Vector)
}

// -- Booleans --------------------------------------------------------------

pub fn is_boolean(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Boolean)
}

// -- Numbers -----------------------------------------------------------

pub fn make_number(i: i64) -> Handle {
    Handle::int(i)
}

pub fn number(h: Handle) -> Result<i64, ObjectError> {
    h.as_int().ok_or(ObjectError::WrongKind { expected: "number" })
}

pub fn is_number(h: Handle) -> bool {
    h.is_int()
}

// -- Environments --------------------------------------------------------

/// Allocates an environment frame with `parent` and `names` (NIL if
/// anonymous) with `slots.len()` value slots, initialized from `slots`.
pub fn alloc_environment(heap: &mut Heap, parent: Handle, names: Handle, slots: &[Handle]) -> Handle {
    let n = slots.len();
    let h = heap.alloc(ObjectKind::Environment, 4 + n);
    let idx = h.as_pointer().unwrap();
    heap.write_handle(idx + 1, parent);
    heap.write_handle(idx + 2, names);
    heap.write_word(idx + 3, n as u64);
    for (i, s) in slots.iter().enumerate() {
        heap.write_handle(idx + 4 + i, *s);
    }
    h
}

pub fn environment_parent(heap: &Heap, h: Handle) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Environment, "environment")?;
    Ok(heap.read_handle(idx + 1))
}

pub fn environment_names(heap: &Heap, h: Handle) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Environment, "environment")?;
    Ok(heap.read_handle(idx + 2))
}

pub fn environment_slot_count(heap: &Heap, h: Handle) -> Result<usize, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Environment, "environment")?;
    Ok(heap.to_space_word(idx + 3) as usize)
}

pub fn environment_ref(heap: &Heap, h: Handle, i: i64) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Environment, "environment")?;
    let len = heap.to_space_word(idx + 3) as usize;
    if i < 0 || i as usize >= len {
        return Err(ObjectError::IndexOutOfRange { index: i, len });
    }
    Ok(heap.read_handle(idx + 4 + i as usize))
}

pub fn environment_set(heap: &mut Heap, h: Handle, i: i64, v: Handle) -> Result<(), ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Environment, "environment")?;
    let len = heap.to_space_word(idx + 3) as usize;
    if i < 0 || i as usize >= len {
        return Err(ObjectError::IndexOutOfRange { index: i, len });
    }
    heap.write_handle(idx + 4 + i as usize, v);
    Ok(())
}

pub fn is_environment(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Environment)
}

// -- Closures & built-ins -------------------------------------------------

pub fn alloc_closure(heap: &mut Heap, env: Handle, entry: usize, arity: u32) -> Handle {
    let h = heap.alloc(ObjectKind::Closure, 4);
    let idx = h.as_pointer().unwrap();
    heap.write_handle(idx + 1, env);
    heap.write_word(idx + 2, entry as u64);
    heap.write_word(idx + 3, arity as u64);
    h
}

pub fn closure_env(heap: &Heap, h: Handle) -> Result<Handle, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Closure, "closure")?;
    Ok(heap.read_handle(idx + 1))
}

pub fn closure_entry(heap: &Heap, h: Handle) -> Result<usize, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Closure, "closure")?;
    Ok(heap.to_space_word(idx + 2) as usize)
}

pub fn closure_arity(heap: &Heap, h: Handle) -> Result<u32, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::Closure, "closure")?;
    Ok(heap.to_space_word(idx + 3) as u32)
}

pub fn is_closure(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::Closure)
}

pub fn alloc_builtin(heap: &mut Heap, native_id: u32, arity: u32) -> Handle {
    let h = heap.alloc(ObjectKind::BuiltIn, 3);
    let idx = h.as_pointer().unwrap();
    heap.write_word(idx + 1, native_id as u64);
    heap.write_word(idx + 2, arity as u64);
    h
}

pub fn builtin_native_id(heap: &Heap, h: Handle) -> Result<u32, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::BuiltIn, "built-in")?;
    Ok(heap.to_space_word(idx + 1) as u32)
}

pub fn builtin_arity(heap: &Heap, h: Handle) -> Result<u32, ObjectError> {
    let idx = expect_kind(heap, h, ObjectKind::BuiltIn, "built-in")?;
    Ok(heap.to_space_word(idx + 2) as u32)
}

pub fn is_builtin(heap: &Heap, h: Handle) -> bool {
    kind_of(heap, h) == Some(ObjectKind::BuiltIn)
}

/// `procedure?`: true for closures and built-ins alike.
pub fn is_procedure(heap: &Heap, h: Handle) -> bool {
    matches!(kind_of(heap, h), Some(ObjectKind::Closure) | Some(ObjectKind::BuiltIn))
}

pub fn is_null(h: Handle) -> bool {
    h.is_nil()
}
