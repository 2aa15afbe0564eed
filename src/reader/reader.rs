//! The reader proper: a byte-slice scanner that recognizes one form at a
//! time and allocates it through `core::objects`/`core::interner`.

use crate::core::gc::ObjectKind;
use crate::core::heap::Heap;
use crate::core::interner::Interner;
use crate::core::objects;
use crate::core::roots::RootScope;
use crate::core::value::Handle;
use std::fmt;

const SYMBOL_SPECIAL: &[u8] = b"+-/*:.!?<>";

fn is_symbol_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL.contains(&c)
}

fn is_symbol_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || SYMBOL_SPECIAL.contains(&c)
}

/// A malformed-input condition. Distinct from any `core`/`vm` error type:
/// the reader is a thin external collaborator, not part of the tested core
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    UnexpectedEof,
    UnterminatedString,
    InvalidSyntax { context: &'static str },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnexpectedEof => write!(f, "unexpected end of input"),
            ReadError::UnterminatedString => write!(f, "unterminated string literal"),
            ReadError::InvalidSyntax { context } => write!(f, "invalid syntax: {context}"),
        }
    }
}

impl std::error::Error for ReadError {}

/// Scans one form at a time out of a borrowed byte buffer.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips whitespace (anything `<= b' '`, matching `read.c`'s `isws`) and
    /// `#`-to-end-of-line comments.
    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b'#') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(c) if c <= b' ' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Reads exactly one top-level form. Returns `None` at end of input
    /// rather than the original's "EOF reads as NIL": this reader is used to
    /// read a sequence of forms out of one buffer, and NIL is also the
    /// valid result of reading `()`, so the two must stay distinguishable.
    pub fn read_one(&mut self, heap: &mut Heap, interner: &Interner) -> Result<Option<Handle>, ReadError> {
        self.skip_ws_and_comments();
        match self.peek() {
            None => Ok(None),
            Some(c) if c.is_ascii_digit() => Ok(Some(self.read_number())),
            Some(c) if is_symbol_start(c) => Ok(Some(self.read_symbol(heap, interner))),
            Some(b'"') => {
                self.pos += 1;
                Ok(Some(self.read_string(heap)?))
            }
            Some(b'(') => {
                self.pos += 1;
                Ok(Some(self.read_list(heap, interner)?))
            }
            Some(_) => Err(ReadError::InvalidSyntax { context: "unexpected character" }),
        }
    }

    fn read_required(&mut self, heap: &mut Heap, interner: &Interner) -> Result<Handle, ReadError> {
        self.read_one(heap, interner)?.ok_or(ReadError::UnexpectedEof)
    }

    fn read_number(&mut self) -> Handle {
        let mut n: i64 = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            n = n.wrapping_mul(10).wrapping_add((c - b'0') as i64);
            self.pos += 1;
        }
        objects::make_number(n)
    }

    fn read_symbol(&mut self, heap: &mut Heap, interner: &Interner) -> Handle {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_symbol_byte(c)) {
            self.pos += 1;
        }
        interner.intern(heap, &self.bytes[start..self.pos])
    }

    fn read_string(&mut self, heap: &mut Heap) -> Result<Handle, ReadError> {
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(ReadError::UnterminatedString),
                Some(b'"') => break,
                Some(b'\\') => {
                    let c = self.bump().ok_or(ReadError::UnterminatedString)?;
                    out.push(match c {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b'b' => 0x08,
                        b't' => b'\t',
                        b'\\' => b'\\',
                        b'"' => b'"',
                        other => other,
                    });
                }
                Some(c) => out.push(c),
            }
        }
        Ok(objects::make_string(heap, &out))
    }

    /// Reads the contents of a list after its opening `(` has already been
    /// consumed. `car`/`cdr` are kept alive through a `RootScope` spanning
    /// the pair's own allocation — the same alloc-before-pop discipline
    /// `vm::opcodes::pairs::cons` uses, since recursively reading the tail
    /// may itself allocate arbitrarily many objects before this pair does.
    fn read_list(&mut self, heap: &mut Heap, interner: &Interner) -> Result<Handle, ReadError> {
        self.skip_ws_and_comments();
        if self.eat(b')') {
            return Ok(Handle::NIL);
        }
        let car = self.read_required(heap, interner)?;
        let scope = RootScope::new(heap, &[car, Handle::NIL]);

        self.skip_ws_and_comments();
        let result = if self.eat(b'.') {
            let cdr = self.read_required(heap, interner);
            match cdr {
                Ok(cdr) => {
                    scope.set(heap, 1, cdr);
                    self.skip_ws_and_comments();
                    if self.eat(b')') {
                        Ok(())
                    } else {
                        Err(ReadError::InvalidSyntax { context: "expected ')' after dotted tail" })
                    }
                }
                Err(e) => Err(e),
            }
        } else {
            match self.read_list(heap, interner) {
                Ok(cdr) => {
                    scope.set(heap, 1, cdr);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        if let Err(e) = result {
            scope.close(heap);
            return Err(e);
        }

        let pair = heap.alloc(ObjectKind::Pair, 3);
        let idx = pair.as_pointer().unwrap();
        let car = scope.get(heap, 0);
        let cdr = scope.get(heap, 1);
        heap.write_handle(idx + 1, car);
        heap.write_handle(idx + 2, cdr);
        scope.close(heap);
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Handle;

    fn fresh() -> (Heap, Interner) {
        let mut heap = Heap::new(4096);
        let interner = Interner::new(&mut heap);
        (heap, interner)
    }

    #[test]
    fn reads_a_decimal_number() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"1234");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        assert_eq!(objects::number(v), Ok(1234));
    }

    #[test]
    fn reads_symbols_including_a_bare_slash() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"a-painfully-long-symbol:foo*bar*baz");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        assert_eq!(objects::symbol_name(&heap, v).unwrap(), b"a-painfully-long-symbol:foo*bar*baz");

        let mut r2 = Reader::new(b"/");
        let v2 = r2.read_one(&mut heap, &interner).unwrap().unwrap();
        assert_eq!(objects::symbol_name(&heap, v2).unwrap(), b"/");
    }

    #[test]
    fn reads_a_string_with_escapes() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"\"Hello, World\\n\"");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        assert_eq!(objects::string_bytes(&heap, v).unwrap(), b"Hello, World\n");
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"# This is a comment \n foo # More comments");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        assert_eq!(objects::symbol_name(&heap, v).unwrap(), b"foo");
    }

    #[test]
    fn reads_a_dotted_pair() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"(a . b)");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        assert!(objects::is_pair(&heap, v));
        let car = objects::car(&heap, v).unwrap();
        let cdr = objects::cdr(&heap, v).unwrap();
        assert_eq!(objects::symbol_name(&heap, car).unwrap(), b"a");
        assert_eq!(objects::symbol_name(&heap, cdr).unwrap(), b"b");
    }

    #[test]
    fn reads_a_proper_list() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"(a b c)");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        let a = objects::car(&heap, v).unwrap();
        let rest = objects::cdr(&heap, v).unwrap();
        let b = objects::car(&heap, rest).unwrap();
        let rest2 = objects::cdr(&heap, rest).unwrap();
        let c = objects::car(&heap, rest2).unwrap();
        let tail = objects::cdr(&heap, rest2).unwrap();
        assert_eq!(objects::symbol_name(&heap, a).unwrap(), b"a");
        assert_eq!(objects::symbol_name(&heap, b).unwrap(), b"b");
        assert_eq!(objects::symbol_name(&heap, c).unwrap(), b"c");
        assert_eq!(tail, Handle::NIL);
    }

    #[test]
    fn nested_lists_survive_a_collection_forced_mid_read() {
        // A tiny heap forces the recursive descent through several nested
        // lists to collect while car/cdr pairs are only reachable through
        // the reader's own root scopes.
        let mut heap = Heap::new(48);
        let interner = Interner::new(&mut heap);
        let mut r = Reader::new(b"((a b) c)");
        let v = r.read_one(&mut heap, &interner).unwrap().unwrap();
        let inner = objects::car(&heap, v).unwrap();
        assert!(objects::is_pair(&heap, inner));
        let a = objects::car(&heap, inner).unwrap();
        assert_eq!(objects::symbol_name(&heap, a).unwrap(), b"a");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"\"no closing quote");
        assert_eq!(r.read_one(&mut heap, &interner), Err(ReadError::UnterminatedString));
    }

    #[test]
    fn reading_past_the_end_returns_none() {
        let (mut heap, interner) = fresh();
        let mut r = Reader::new(b"   ");
        assert_eq!(r.read_one(&mut heap, &interner), Ok(None));
    }
}
