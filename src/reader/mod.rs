//! A hand-written reader producing `core` objects from source bytes, and a
//! matching printer (`SPEC_FULL.md` §6 "Reader input", an external
//! collaborator: "their internal algorithms are not part of the core
//! contract"). Grounded in `examples/original_source/read.c`'s grammar —
//! decimal integers, symbols over `[A-Za-z0-9+-/*:.!?<>]`, `"…"` strings
//! with `\n \r \b \t \\ \"` escapes, `#`-to-end-of-line comments, and
//! (optionally dotted) parenthesized lists — reworked as a byte-slice
//! scanner instead of a `getc`/`ungetc` stream, since a Rust reader can just
//! hold a position into an owned buffer.

mod printer;
mod reader;

pub use printer::print;
pub use reader::{ReadError, Reader};
