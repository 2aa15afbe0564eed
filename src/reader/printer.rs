//! Renders a value back to source text. Round-trips with `Reader` for atoms
//! and finite acyclic pair structures (`SPEC_FULL.md` §8): every escape
//! `Reader::read_string` understands is re-escaped here, and list syntax is
//! reproduced exactly (dotted tail only when the final `cdr` isn't `NIL`).

use crate::core::heap::Heap;
use crate::core::objects;
use crate::core::value::Handle;
use std::fmt::Write;

pub fn print(heap: &Heap, v: Handle) -> String {
    let mut out = String::new();
    write_value(heap, v, &mut out);
    out
}

fn write_value(heap: &Heap, v: Handle, out: &mut String) {
    if v.is_nil() {
        out.push_str("()");
    } else if let Some(i) = v.as_int() {
        let _ = write!(out, "{i}");
    } else if objects::is_pair(heap, v) {
        write_list(heap, v, out);
    } else if objects::is_symbol(heap, v) {
        out.push_str(&String::from_utf8_lossy(&objects::symbol_name(heap, v).unwrap()));
    } else if objects::is_string(heap, v) {
        write_string(&objects::string_bytes(heap, v).unwrap(), out);
    } else if objects::is_boolean(heap, v) {
        out.push_str(if v == heap.true_handle() { "#t" } else { "#f" });
    } else if objects::is_vector(heap, v) {
        write_vector(heap, v, out);
    } else if objects::is_closure(heap, v) {
        out.push_str("#<closure>");
    } else if objects::is_builtin(heap, v) {
        out.push_str("#<built-in>");
    } else if objects::is_environment(heap, v) {
        out.push_str("#<environment>");
    } else {
        out.push_str("#<unknown>");
    }
}

fn write_list(heap: &Heap, mut v: Handle, out: &mut String) {
    out.push('(');
    let mut first = true;
    loop {
        if !first {
            out.push(' ');
        }
        first = false;
        let car = objects::car(heap, v).unwrap();
        write_value(heap, car, out);
        let cdr = objects::cdr(heap, v).unwrap();
        if cdr.is_nil() {
            break;
        }
        if objects::is_pair(heap, cdr) {
            v = cdr;
            continue;
        }
        out.push_str(" . ");
        write_value(heap, cdr, out);
        break;
    }
    out.push(')');
}

fn write_vector(heap: &Heap, v: Handle, out: &mut String) {
    out.push_str("#(");
    let len = objects::vector_len(heap, v).unwrap();
    for i in 0..len {
        if i > 0 {
            out.push(' ');
        }
        let elem = objects::vector_ref(heap, v, i as i64).unwrap();
        write_value(heap, elem, out);
    }
    out.push(')');
}

fn write_string(bytes: &[u8], out: &mut String) {
    // Strings are byte blobs, not necessarily ASCII (`SPEC_FULL.md` §3's
    // "UTF-8-agnostic bytes") — escape the six special bytes individually
    // but decode the runs between them as UTF-8 rather than one byte at a
    // time, so multi-byte characters survive the round trip.
    out.push('"');
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let esc = match b {
            b'\n' => Some("\\n"),
            b'\r' => Some("\\r"),
            0x08 => Some("\\b"),
            b'\t' => Some("\\t"),
            b'\\' => Some("\\\\"),
            b'"' => Some("\\\""),
            _ => None,
        };
        if let Some(esc) = esc {
            out.push_str(&String::from_utf8_lossy(&bytes[start..i]));
            out.push_str(esc);
            start = i + 1;
        }
    }
    out.push_str(&String::from_utf8_lossy(&bytes[start..]));
    out.push('"');
}
