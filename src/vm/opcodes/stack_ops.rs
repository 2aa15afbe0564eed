//! `PUSH_INT`, `POP`, `DUP`, `SWAP` (`SPEC_FULL.md` §4.5 "Stack").

use crate::core::value::Handle;
use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};

pub(crate) fn push_int(vm: &mut Vm, i: i32) -> Result<StepOutcome, VmError> {
    vm.push(Handle::int(i as i64));
    Ok(StepOutcome::Next)
}

pub(crate) fn pop(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    vm.pop_checked("POP")?;
    Ok(StepOutcome::Next)
}

pub(crate) fn dup(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let top = vm.pop_checked("DUP")?;
    vm.push(top);
    vm.push(top);
    Ok(StepOutcome::Next)
}

pub(crate) fn swap(vm: &mut Vm) -> Result<StepOutcome, VmError> {
    let a = vm.pop_checked("SWAP")?;
    let b = vm.pop_checked("SWAP")?;
    vm.push(a);
    vm.push(b);
    Ok(StepOutcome::Next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dup_duplicates_the_top_value() {
        let mut vm = Vm::new(256);
        vm.push(Handle::int(5));
        dup(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(Handle::int(5)));
        assert_eq!(vm.pop(), Some(Handle::int(5)));
    }

    #[test]
    fn swap_exchanges_the_top_two() {
        let mut vm = Vm::new(256);
        vm.push(Handle::int(1));
        vm.push(Handle::int(2));
        swap(&mut vm).unwrap();
        assert_eq!(vm.pop(), Some(Handle::int(1)));
        assert_eq!(vm.pop(), Some(Handle::int(2)));
    }

    #[test]
    fn pop_on_empty_stack_reports_underflow() {
        let mut vm = Vm::new(256);
        let err = pop(&mut vm).unwrap_err();
        assert_eq!(err, VmError::StackUnderflow { op: "POP", needed: 1, have: 0 });
    }
}
