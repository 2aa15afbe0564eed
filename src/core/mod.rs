//! The object model: tagged handles, the semispace heap and collector, the
//! typed object layer built on top of it, root-frame bookkeeping, and the
//! symbol interner. Everything in `vm` is built against this module's public
//! surface only — it never reaches into `Heap`'s private arenas directly.

pub mod gc;
pub mod heap;
pub mod interner;
pub mod objects;
pub mod roots;
pub mod value;

pub use heap::Heap;
pub use value::{Handle, Symbol};
