//! `EXTEND_ENV`, `ENV_PARENT`, `ENV_REF`, `ENV_SET`, `ENV_LOOKUP`
//! (`SPEC_FULL.md` §4.5 "Environment").
//!
//! Lexical addressing (`ENV_REF`/`ENV_SET`) walks a *distance* — how many
//! parent links to follow from the current environment — then a slot index;
//! overrunning the chain (hitting `NIL` before `distance` reaches zero) is a
//! type-check failure like any other wrong-kind operand, since the distance
//! is meant to be a compiler-computed constant and a chain that's shorter
//! than expected indicates a real mismatch. `ENV_LOOKUP`, in contrast, walks
//! to `NIL` as its normal "not found" termination (`SPEC_FULL.md` §4.5:
//! "returns NIL if none").
//!
//! `EXTEND_ENV`'s allocation follows the same alloc-before-pop discipline as
//! `vm::opcodes::pairs::cons`: the new frame's words are reserved while its
//! `n` argument values are still rooted on the operand stack (and its
//! parent is still the rooted `Vm::env`), and only then popped/read.
//!
//! Calling convention for `ENV_REF`/`ENV_SET`: the caller pushes distance,
//! then slot index, then (for `ENV_SET`) the value — the same left-to-right
//! push order `vm::opcodes::pairs::set_car` uses for its own two operands —
//! so the handler pops them in reverse: value first (if present), then
//! index, then distance last.

use crate::core::objects;
use crate::core::value::Handle;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

fn walk_parents(vm: &Vm, mut frame: Handle, distance: usize) -> Result<Handle, objects::ObjectError> {
    for _ in 0..distance {
        frame = objects::environment_parent(vm.heap(), frame)?;
    }
    Ok(frame)
}

pub(crate) fn extend_env(vm: &mut Vm, n: i32) -> Result<StepOutcome, VmError> {
    let n = n.max(0) as usize;
    vm.require_depth("EXTEND_ENV", n)?;
    let idx = vm.alloc_environment_shell(n);
    let parent = vm.env();
    vm.heap_mut().write_handle(idx + 1, parent);
    vm.heap_mut().write_handle(idx + 2, Handle::NIL);
    vm.heap_mut().write_word(idx + 3, n as u64);
    for i in (0..n).rev() {
        let v = vm.pop().unwrap();
        vm.heap_mut().write_handle(idx + 4 + i, v);
    }
    vm.set_env(Handle::pointer(idx));
    Ok(StepOutcome::Next)
}

pub(crate) fn env_parent(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let h = vm.pop_checked("ENV_PARENT")?;
    match objects::environment_parent(vm.heap(), h) {
        Ok(p) => {
            vm.push(p);
            Ok(StepOutcome::Next)
        }
        Err(e) => Err(vm.object_err("ENV_PARENT", e)),
    }
}

pub(crate) fn env_ref(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let idx = vm.pop_int("ENV_REF")?;
    let distance = vm.pop_int("ENV_REF")?.max(0) as usize;
    let frame = match walk_parents(vm, vm.env(), distance) {
        Ok(f) => f,
        Err(e) => return Err(vm.object_err("ENV_REF", e)),
    };
    match objects::environment_ref(vm.heap(), frame, idx) {
        Ok(v) => {
            vm.push(v);
            Ok(StepOutcome::Next)
        }
        Err(e) => Err(vm.object_err("ENV_REF", e)),
    }
}

pub(crate) fn env_set(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let value = vm.pop_checked("ENV_SET")?;
    let idx = vm.pop_int("ENV_SET")?;
    let distance = vm.pop_int("ENV_SET")?.max(0) as usize;
    let frame = match walk_parents(vm, vm.env(), distance) {
        Ok(f) => f,
        Err(e) => return Err(vm.object_err("ENV_SET", e)),
    };
    match objects::environment_set(vm.heap_mut(), frame, idx, value) {
        Ok(()) => Ok(StepOutcome::Next),
        Err(e) => Err(vm.object_err("ENV_SET", e)),
    }
}

pub(crate) fn env_lookup(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let sym = vm.pop_checked("ENV_LOOKUP")?;
    let mut frame = vm.env();
    loop {
        if frame.is_nil() {
            vm.push(Handle::NIL);
            return Ok(StepOutcome::Next);
        }
        let names = match objects::environment_names(vm.heap(), frame) {
            Ok(n) => n,
            Err(e) => return Err(vm.object_err("ENV_LOOKUP", e)),
        };
        if !names.is_nil() {
            let len = objects::vector_len(vm.heap(), names).unwrap_or(0);
            for i in 0..len {
                let name_i = objects::vector_ref(vm.heap(), names, i as i64).unwrap();
                if name_i == sym {
                    let v = objects::environment_ref(vm.heap(), frame, i as i64).unwrap();
                    vm.push(v);
                    return Ok(StepOutcome::Next);
                }
            }
        }
        frame = match objects::environment_parent(vm.heap(), frame) {
            Ok(p) => p,
            Err(e) => return Err(vm.object_err("ENV_LOOKUP", e)),
        };
    }
}
