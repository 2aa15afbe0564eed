//! Dispatches one decoded `Op` to its handler in `vm::opcodes`.
//!
//! Kept as a flat match rather than a trait-object table: there are few
//! enough opcodes, and a fixed dispatch keeps `Vm::step_one` free of any
//! indirection the collector would need to know about (every opcode handler
//! already reaches `Vm` through a plain `&mut Vm`, never a boxed closure).

use crate::vm::error::VmError;
use crate::vm::machine::{StepOutcome, Vm};
use crate::vm::opcode::Op;
use crate::vm::opcodes::{arithmetic, control, environment, pairs, predicates, stack_ops, vectors};

pub(crate) fn execute(vm: &mut Vm, op: Op, next_ip: usize) -> Result<StepOutcome, VmError> {
    match op {
        Op::PushInt(i) => stack_ops::push_int(vm, i),
        Op::Pop => stack_ops::pop(vm),
        Op::Dup => stack_ops::dup(vm),
        Op::Swap => stack_ops::swap(vm),

        Op::Add => arithmetic::add(vm),
        Op::Sub => arithmetic::sub(vm),
        Op::Mul => arithmetic::mul(vm),
        Op::Div => arithmetic::div(vm),

        Op::Cons => pairs::cons(vm),
        Op::Car => pairs::car(vm),
        Op::Cdr => pairs::cdr(vm),
        Op::SetCar => pairs::set_car(vm),
        Op::SetCdr => pairs::set_cdr(vm),

        Op::MakeVector => vectors::make_vector(vm),
        Op::VectorRef => vectors::vector_ref(vm),
        Op::VectorSet => vectors::vector_set(vm),

        Op::ExtendEnv(n) => environment::extend_env(vm, n),
        Op::EnvParent => environment::env_parent(vm),
        Op::EnvRef => environment::env_ref(vm),
        Op::EnvSet => environment::env_set(vm),
        Op::EnvLookup => environment::env_lookup(vm),

        Op::ConsP => predicates::cons_p(vm),
        Op::NumberP => predicates::number_p(vm),
        Op::VectorP => predicates::vector_p(vm),
        Op::BooleanP => predicates::boolean_p(vm),
        Op::NullP => predicates::null_p(vm),
        Op::ProcedureP => predicates::procedure_p(vm),

        Op::Branch(off) => control::branch(vm, off),
        Op::Jt(off) => control::jt(vm, off, next_ip),
        Op::Jmp => control::jmp(vm),
        Op::PushAddr(off) => control::push_addr(vm, off),
        Op::MakeClosure(off) => control::make_closure(vm, off),
        Op::InvokeProcedure => control::invoke_procedure(vm, next_ip),
        Op::Quit => control::quit(vm),
        Op::Nop => control::nop(vm),
    }
}
