//! End-to-end scenarios against the semispace heap and object layer,
//! exercising survival across collection, cycle preservation, symbol
//! identity across obarray growth, growth under sustained allocation, and
//! root-hook relocation.

use lispvm_rs::core::interner::Interner;
use lispvm_rs::core::objects;
use lispvm_rs::core::roots::RootScope;
use lispvm_rs::core::value::Handle;
use lispvm_rs::core::Heap;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn survives_a_collection() {
    let mut heap = Heap::new(64);
    let s = objects::make_string(&mut heap, b"Hello, World\n");
    let inner = objects::cons(&mut heap, Handle::int(32), s);
    let outer = objects::cons(&mut heap, inner, Handle::NIL);
    let scope = RootScope::new(&mut heap, &[outer]);

    heap.collect();

    let outer = scope.get(&heap, 0);
    let inner = objects::car(&heap, outer).unwrap();
    assert_eq!(objects::car(&heap, inner).unwrap(), Handle::int(32));
    let s = objects::cdr(&heap, inner).unwrap();
    assert_eq!(objects::string_bytes(&heap, s).unwrap(), b"Hello, World\n");
    assert_eq!(objects::cdr(&heap, outer).unwrap(), Handle::NIL);
    scope.close(&mut heap);
}

#[test]
fn a_self_referential_pair_survives_two_collections() {
    let mut heap = Heap::new(64);
    let p = objects::cons(&mut heap, Handle::NIL, Handle::NIL);
    let scope = RootScope::new(&mut heap, &[p]);
    let p = scope.get(&heap, 0);
    objects::set_car(&mut heap, p, p).unwrap();
    objects::set_cdr(&mut heap, p, p).unwrap();

    heap.collect();
    heap.collect();

    let p = scope.get(&heap, 0);
    assert_eq!(objects::car(&heap, p).unwrap(), p);
    assert_eq!(objects::cdr(&heap, p).unwrap(), p);
    scope.close(&mut heap);
}

#[test]
fn interned_symbols_keep_their_identity_across_obarray_growth() {
    let mut heap = Heap::new(4096);
    let interner = Interner::new(&mut heap);

    let s1 = interner.intern(&mut heap, b"hello");
    for c in b'a'..=b'z' {
        interner.intern(&mut heap, &[c]);
    }
    for c in b'A'..=b'Z' {
        interner.intern(&mut heap, &[c]);
    }
    let s2 = interner.intern(&mut heap, b"hello");

    assert_eq!(s1, s2);
    assert_eq!(objects::symbol_name(&heap, s2).unwrap(), b"hello");
}

#[test]
fn sustained_allocation_followed_by_a_large_vector_does_not_crash() {
    let mut heap = Heap::new(512);
    for _ in 0..2000 {
        let _ = objects::cons(&mut heap, Handle::int(1), Handle::NIL);
    }
    let v = objects::alloc_vector(&mut heap, 8192);
    assert_eq!(objects::vector_len(&heap, v).unwrap(), 8192);
    assert!(heap.collections() > 0);
}

#[test]
fn a_root_hook_keeps_a_host_side_handle_valid_across_collection() {
    let mut heap = Heap::new(64);
    let p = objects::cons(&mut heap, Handle::int(7), Handle::int(8));
    let stored: Rc<RefCell<Handle>> = Rc::new(RefCell::new(p));
    let hook_state = Rc::clone(&stored);
    heap.register_gc_root_hook(move |relocate| {
        let mut h = hook_state.borrow_mut();
        *h = relocate(*h);
    });

    heap.collect();

    let p = *stored.borrow();
    assert!(objects::is_pair(&heap, p));
    assert_eq!(objects::car(&heap, p).unwrap(), Handle::int(7));
    assert_eq!(objects::cdr(&heap, p).unwrap(), Handle::int(8));
}
