//! `CONS_P`, `NUMBER_P`, `VECTOR_P`, `BOOLEAN_P`, `NULL_P`, `PROCEDURE_P`
//! (`SPEC_FULL.md` §4.5 "Predicates").
//!
//! Each pops one operand, asks the matching `core::objects::is_*` query, and
//! pushes the interned boolean singleton for the answer. None of these
//! allocate — `Heap::bool_handle` just returns one of the two singletons
//! `Heap::new` creates up front.

use crate::core::objects;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

fn predicate(vm: &mut Vm, op: &'static str, f: impl FnOnce(&crate::core::Heap, crate::core::Handle) -> bool) -> Result<StepOutcome, VmError> {
    let h = vm.pop_checked(op)?;
    let b = f(vm.heap(), h);
    let handle = vm.heap().bool_handle(b);
    vm.push(handle);
    Ok(StepOutcome::Next)
}

pub(crate) fn cons_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "CONS_P", objects::is_pair)
}

pub(crate) fn number_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "NUMBER_P", |_heap, h| objects::is_number(h))
}

pub(crate) fn vector_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "VECTOR_P", objects::is_vector)
}

pub(crate) fn boolean_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "BOOLEAN_P", objects::is_boolean)
}

pub(crate) fn null_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "NULL_P", |_heap, h| objects::is_null(h))
}

pub(crate) fn procedure_p(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    predicate(vm, "PROCEDURE_P", objects::is_procedure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Handle;

    #[test]
    fn number_p_is_true_only_for_numbers() {
        let mut vm = Vm::new(256);
        vm.push(Handle::int(5));
        number_p(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(vm.heap().true_handle()));

        vm.push(Handle::NIL);
        number_p(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(vm.heap().false_handle()));
    }

    #[test]
    fn null_p_is_true_for_nil_only() {
        let mut vm = Vm::new(256);
        vm.push(Handle::NIL);
        null_p(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(vm.heap().true_handle()));

        vm.push(Handle::int(0));
        null_p(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(vm.heap().false_handle()));
    }

    #[test]
    fn cons_p_recognizes_pairs() {
        let mut vm = Vm::new(256);
        vm.push(Handle::int(1));
        vm.push(Handle::int(2));
        crate::vm::opcodes::pairs::cons(&mut vm).unwrap();
        let p = vm.top().unwrap();
        vm.push(p);
        cons_p(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(vm.heap().true_handle()));
    }
}
