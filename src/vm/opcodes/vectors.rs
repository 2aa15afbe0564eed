//! `MAKE_VECTOR`, `VECTOR_REF`, `VECTOR_SET` (`SPEC_FULL.md` §4.5 "Vectors").
//!
//! `MAKE_VECTOR`'s only operand is an element count — a plain integer,
//! never relocated — so `core::objects::alloc_vector` (which zero-fills the
//! new vector to NIL rather than taking element handles up front) can be
//! called directly with no rooting hazard. `VECTOR_REF`/`VECTOR_SET` never
//! allocate.

use crate::core::objects;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

pub(crate) fn make_vector(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let n = vm.pop_int("MAKE_VECTOR")?;
    if n < 0 {
        return Err(vm.fail(VmError::TypeCheck { op: "MAKE_VECTOR", expected: "non-negative count" }));
    }
    let v = objects::alloc_vector(vm.heap_mut(), n as usize);
    vm.push(v);
    Ok(StepOutcome::Next)
}

pub(crate) fn vector_ref(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let i = vm.pop_int("VECTOR_REF")?;
    let v = vm.pop_checked("VECTOR_REF")?;
    match objects::vector_ref(vm.heap(), v, i) {
        Ok(val) => {
            vm.push(val);
            Ok(StepOutcome::Next)
        }
        Err(e) => Err(vm.object_err("VECTOR_REF", e)),
    }
}

pub(crate) fn vector_set(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let val = vm.pop_checked("VECTOR_SET")?;
    let i = vm.pop_int("VECTOR_SET")?;
    let v = vm.pop_checked("VECTOR_SET")?;
    match objects::vector_set(vm.heap_mut(), v, i, val) {
        Ok(()) => Ok(StepOutcome::Next),
        Err(e) => Err(vm.object_err("VECTOR_SET", e)),
    }
}
