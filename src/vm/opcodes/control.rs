//! `BRANCH`, `JT`, `JMP`, `PUSH_ADDR`, `MAKE_CLOSURE`, `INVOKE_PROCEDURE`,
//! `QUIT`, `NOP` (`SPEC_FULL.md` §4.5 "Control").
//!
//! Every relative-offset operand (`BRANCH`, `JT`, `PUSH_ADDR`,
//! `MAKE_CLOSURE`) is resolved against the *start* of the instruction that
//! carries it, matching the spec prose's "entry is ip+off" for
//! `MAKE_CLOSURE`: `Vm::step_one` doesn't advance `vm.ip()` until after the
//! opcode handler returns, so reading it here still gives the address the
//! instruction began at.
//!
//! Truthiness for `JT`: everything but the interned `#f` handle is truthy,
//! including `NIL` — only `Heap::false_handle()` is false
//! (`SPEC_FULL.md` §4.5, Open Question resolved in `DESIGN.md`).
//!
//! `INVOKE_PROCEDURE`'s calling convention has no explicit argument-count
//! operand: the callee's own declared arity (`closure_arity`/
//! `builtin_arity`) says how many operands below it to pop. A caller that
//! doesn't actually have that many values rooted below the callee reports
//! `StackUnderflow`, not `VmError::Arity` — this ISA has no second source
//! of truth to disagree with the callee's arity (see `DESIGN.md`).

use crate::core::objects;
use crate::core::value::Handle;
use crate::vm::error::VmError;
use crate::vm::machine::{NativeArgs, StepOutcome, Vm};

pub(crate) fn branch(vm: &mut Vm, off: i32) -> Result<StepOutcome, VmError> {
    let target = (vm.ip() as i64 + off as i64) as usize;
    Ok(StepOutcome::Jump(target))
}

pub(crate) fn jt(vm: &mut Vm, off: i32, next_ip: usize) -> Result<StepOutcome, VmError> {
    let cond = vm.pop_checked("JT")?;
    if cond == vm.heap().false_handle() {
        Ok(StepOutcome::Jump(next_ip))
    } else {
        let target = (vm.ip() as i64 + off as i64) as usize;
        Ok(StepOutcome::Jump(target))
    }
}

pub(crate) fn jmp(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let addr = vm.pop_checked("JMP")?;
    match addr.as_external() {
        Some(target) => Ok(StepOutcome::Jump(target)),
        None => Err(vm.fail(VmError::TypeCheck { op: "JMP", expected: "code address" })),
    }
}

pub(crate) fn push_addr(vm: &mut Vm, off: i32) -> Result<StepOutcome, VmError> {
    let target = (vm.ip() as i64 + off as i64) as usize;
    vm.push(Handle::external(target));
    Ok(StepOutcome::Next)
}

pub(crate) fn make_closure(vm: &mut Vm, off: i32) -> Result<StepOutcome, VmError> {
    let arity = vm.pop_int("MAKE_CLOSURE")?;
    if arity < 0 {
        return Err(vm.fail(VmError::TypeCheck { op: "MAKE_CLOSURE", expected: "non-negative arity" }));
    }
    let entry = (vm.ip() as i64 + off as i64) as usize;
    // Reserve the closure's words before reading `vm.env()`, the same
    // ordering `vm::opcodes::environment::extend_env` uses: nothing about
    // `env` is rooted in a local once it's copied out, so it must be read
    // fresh after any allocation that could relocate it.
    let idx = {
        let h = vm.heap_mut().alloc(crate::core::gc::ObjectKind::Closure, 4);
        h.as_pointer().unwrap()
    };
    let env = vm.env();
    vm.heap_mut().write_handle(idx + 1, env);
    vm.heap_mut().write_word(idx + 2, entry as u64);
    vm.heap_mut().write_word(idx + 3, arity as u64);
    vm.push(Handle::pointer(idx));
    Ok(StepOutcome::Next)
}

pub(crate) fn invoke_procedure(vm: &mut Vm, next_ip: usize) -> Result<StepOutcome, VmError> {
    let callee = vm.pop_checked("INVOKE_PROCEDURE")?;
    if objects::is_closure(vm.heap(), callee) {
        invoke_closure(vm, callee, next_ip)
    } else if objects::is_builtin(vm.heap(), callee) {
        invoke_builtin(vm, callee)
    } else {
        Err(vm.fail(VmError::TypeCheck { op: "INVOKE_PROCEDURE", expected: "procedure" }))
    }
}

fn invoke_closure(vm: &mut Vm, callee: Handle, next_ip: usize) -> Result<StepOutcome, VmError> {
    let arity = objects::closure_arity(vm.heap(), callee).map_err(|e| vm.object_err("INVOKE_PROCEDURE", e))? as usize;
    vm.require_depth("INVOKE_PROCEDURE", arity)?;

    // `callee` is a bare local now, unrooted; the new environment's
    // allocation below must not be allowed to leave it stale.
    let scope = vm.root(&[callee]);
    let idx = vm.alloc_environment_shell(arity);
    let callee = scope.get(vm.heap(), 0);
    scope.close(vm.heap_mut());

    let parent = objects::closure_env(vm.heap(), callee).unwrap();
    let entry = objects::closure_entry(vm.heap(), callee).unwrap();
    vm.heap_mut().write_handle(idx + 1, parent);
    vm.heap_mut().write_handle(idx + 2, Handle::NIL);
    vm.heap_mut().write_word(idx + 3, arity as u64);
    for i in (0..arity).rev() {
        let v = vm.pop().unwrap();
        vm.heap_mut().write_handle(idx + 4 + i, v);
    }

    let return_addr = Handle::external(next_ip);
    vm.push(return_addr);
    vm.set_env(Handle::pointer(idx));
    Ok(StepOutcome::Jump(entry))
}

fn invoke_builtin(vm: &mut Vm, callee: Handle) -> Result<StepOutcome, VmError> {
    let arity = objects::builtin_arity(vm.heap(), callee).map_err(|e| vm.object_err("INVOKE_PROCEDURE", e))? as usize;
    vm.require_depth("INVOKE_PROCEDURE", arity)?;
    let native_id = objects::builtin_native_id(vm.heap(), callee).unwrap();

    let mut args: NativeArgs = NativeArgs::with_capacity(arity);
    args.resize(arity, Handle::NIL);
    for i in (0..arity).rev() {
        args[i] = vm.pop().unwrap();
    }

    let f = vm.native(native_id);
    let result = f(vm.heap_mut(), &args).map_err(|e| vm.fail(e))?;
    vm.push(result);
    Ok(StepOutcome::Next)
}

pub(crate) fn quit(_vm: &mut Vm) -> Result<StepOutcome, VmError> {
    Ok(StepOutcome::Halt)
}

pub(crate) fn nop(_vm: &mut Vm) -> Result<StepOutcome, VmError> {
    Ok(StepOutcome::Next)
}
