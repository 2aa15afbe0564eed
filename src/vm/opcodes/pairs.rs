//! `CONS`, `CAR`, `CDR`, `SET_CAR`, `SET_CDR` (`SPEC_FULL.md` §4.5 "Pairs").
//!
//! `CAR`/`CDR`/`SET_CAR`/`SET_CDR` never allocate, so they simply delegate
//! to `core::objects`. `CONS` does allocate, and its two operands may
//! themselves be heap pointers — popping them into plain local variables
//! *before* the allocation would leave those locals unrooted across a
//! collection the allocation might trigger (`SPEC_FULL.md` §9, "hold
//! handles only through registered roots"). So `cons` reserves the pair's
//! words first, while `car`/`cdr` are still safely rooted on the operand
//! stack via the hook `Vm::new` installs, and only pops them (now
//! guaranteed up to date) once the allocation that could move them has
//! already happened.

use crate::core::gc::ObjectKind;
use crate::core::objects;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

pub(crate) fn cons(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    vm.require_depth("CONS", 2)?;
    let handle = vm.heap_mut().alloc(ObjectKind::Pair, 3);
    let idx = handle.as_pointer().unwrap();
    let cdr = vm.pop().unwrap();
    let car = vm.pop().unwrap();
    vm.heap_mut().write_handle(idx + 1, car);
    vm.heap_mut().write_handle(idx + 2, cdr);
    vm.push(handle);
    Ok(StepOutcome::Next)
}

pub(crate) fn car(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let p = vm.pop_checked("CAR")?;
    match objects::car(vm.heap(), p) {
        Ok(v) => {
            vm.push(v);
            Ok(StepOutcome::Next)
        }
        Err(e) => Err(vm.object_err("CAR", e)),
    }
}

pub(crate) fn cdr(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let p = vm.pop_checked("CDR")?;
    match objects::cdr(vm.heap(), p) {
        Ok(v) => {
            vm.push(v);
            Ok(StepOutcome::Next)
        }
        Err(e) => Err(vm.object_err("CDR", e)),
    }
}

pub(crate) fn set_car(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let v = vm.pop_checked("SET_CAR")?;
    let p = vm.pop_checked("SET_CAR")?;
    match objects::set_car(vm.heap_mut(), p, v) {
        Ok(()) => Ok(StepOutcome::Next),
        Err(e) => Err(vm.object_err("SET_CAR", e)),
    }
}

pub(crate) fn set_cdr(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let v = vm.pop_checked("SET_CDR")?;
    let p = vm.pop_checked("SET_CDR")?;
    match objects::set_cdr(vm.heap_mut(), p, v) {
        Ok(()) => Ok(StepOutcome::Next),
        Err(e) => Err(vm.object_err("SET_CDR", e)),
    }
}
