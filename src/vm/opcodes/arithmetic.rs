//! `ADD`, `SUB`, `MUL`, `DIV` (`SPEC_FULL.md` §4.5 "Arithmetic").
//!
//! Pops rhs then lhs — both must be numbers — and pushes the result.
//! Integers wrap silently on overflow, per `SPEC_FULL.md` §4.3's note on
//! `number`; `DIV` reports `VmError::DivisionByZero` on a zero divisor
//! rather than panicking, since a zero divisor is a program error, not an
//! implementation bug.

use crate::core::objects::make_number;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

fn binary(vm: &mut Vm, op: &'static str, f: impl FnOnce(i64, i64) -> i64) -> Result<StepOutcome, VmError> {
    let rhs = vm.pop_int(op)?;
    let lhs = vm.pop_int(op)?;
    vm.push(make_number(f(lhs, rhs)));
    Ok(StepOutcome::Next)
}

pub(crate) fn add(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    binary(vm, "ADD", i64::wrapping_add)
}

pub(crate) fn sub(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    binary(vm, "SUB", i64::wrapping_sub)
}

pub(crate) fn mul(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    binary(vm, "MUL", i64::wrapping_mul)
}

pub(crate) fn div(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let rhs = vm.pop_int("DIV")?;
    let lhs = vm.pop_int("DIV")?;
    if rhs == 0 {
        return Err(vm.fail(VmError::DivisionByZero));
    }
    vm.push(make_number(lhs.wrapping_div(rhs)));
    Ok(StepOutcome::Next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Handle;

    #[test]
    fn arithmetic_scenario_matches_the_bytecode_walkthrough() {
        // PUSH_INT 1024; PUSH_INT 72; ADD; PUSH_INT 7777; SUB; PUSH_INT 1234; MUL
        let mut vm = Vm::new(256);
        vm.push(Handle::int(1024));
        vm.push(Handle::int(72));
        add(&mut vm).unwrap();
        vm.push(Handle::int(7777));
        sub(&mut vm).unwrap();
        vm.push(Handle::int(1234));
        mul(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(Handle::int(((1024 + 72) - 7777) * 1234)));
    }

    #[test]
    fn div_by_zero_reports_and_does_not_push() {
        let mut vm = Vm::new(256);
        vm.push(Handle::int(10));
        vm.push(Handle::int(0));
        let err = div(&mut vm).unwrap_err();
        assert_eq!(err, VmError::DivisionByZero);
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn non_number_operand_reports_type_check() {
        let mut vm = Vm::new(256);
        vm.push(Handle::NIL);
        vm.push(Handle::int(1));
        let err = add(&mut vm).unwrap_err();
        assert_eq!(err, VmError::TypeCheck { op: "ADD", expected: "number" });
    }
}
