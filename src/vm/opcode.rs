//! Bytecode instruction format: a byte-addressable code buffer, one opcode
//! byte optionally followed by a 4-byte little-endian immediate.
//!
//! Endianness is pinned to little-endian, resolving the "host-native"
//! ambiguity a non-pinned format would carry — this implementation and any
//! producer of its bytecode must agree on that choice, since code is not
//! self-describing.

/// One instruction, decoded from the code buffer. Variants that carry a
/// payload hold the already-decoded 4-byte immediate as `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Stack
    PushInt(i32),
    Pop,
    Dup,
    Swap,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Pairs
    Cons,
    Car,
    Cdr,
    SetCar,
    SetCdr,

    // Vectors
    MakeVector,
    VectorRef,
    VectorSet,

    // Environment
    ExtendEnv(i32),
    EnvParent,
    EnvRef,
    EnvSet,
    EnvLookup,

    // Predicates
    ConsP,
    NumberP,
    VectorP,
    BooleanP,
    NullP,
    ProcedureP,

    // Control
    Branch(i32),
    Jt(i32),
    Jmp,
    PushAddr(i32),
    MakeClosure(i32),
    InvokeProcedure,
    Quit,
    Nop,
}

macro_rules! tags {
    ($($name:ident = $val:expr),* $(,)?) => {
        $(const $name: u8 = $val;)*
    };
}

tags! {
    TAG_PUSH_INT = 0x01, TAG_POP = 0x02, TAG_DUP = 0x03, TAG_SWAP = 0x04,
    TAG_ADD = 0x10, TAG_SUB = 0x11, TAG_MUL = 0x12, TAG_DIV = 0x13,
    TAG_CONS = 0x20, TAG_CAR = 0x21, TAG_CDR = 0x22, TAG_SET_CAR = 0x23, TAG_SET_CDR = 0x24,
    TAG_MAKE_VECTOR = 0x30, TAG_VECTOR_REF = 0x31, TAG_VECTOR_SET = 0x32,
    TAG_EXTEND_ENV = 0x40, TAG_ENV_PARENT = 0x41, TAG_ENV_REF = 0x42, TAG_ENV_SET = 0x43,
    TAG_ENV_LOOKUP = 0x44,
    TAG_CONS_P = 0x50, TAG_NUMBER_P = 0x51, TAG_VECTOR_P = 0x52, TAG_BOOLEAN_P = 0x53,
    TAG_NULL_P = 0x54, TAG_PROCEDURE_P = 0x55,
    TAG_BRANCH = 0x60, TAG_JT = 0x61, TAG_JMP = 0x62, TAG_PUSH_ADDR = 0x63,
    TAG_MAKE_CLOSURE = 0x64, TAG_INVOKE_PROCEDURE = 0x65, TAG_QUIT = 0x66, TAG_NOP = 0x67,
}

impl Op {
    /// The opcode byte this instruction encodes to. Immediates, if any,
    /// follow in the 4 bytes after.
    pub fn tag(self) -> u8 {
        match self {
            Op::PushInt(_) => TAG_PUSH_INT,
            Op::Pop => TAG_POP,
            Op::Dup => TAG_DUP,
            Op::Swap => TAG_SWAP,
            Op::Add => TAG_ADD,
            Op::Sub => TAG_SUB,
            Op::Mul => TAG_MUL,
            Op::Div => TAG_DIV,
            Op::Cons => TAG_CONS,
            Op::Car => TAG_CAR,
            Op::Cdr => TAG_CDR,
            Op::SetCar => TAG_SET_CAR,
            Op::SetCdr => TAG_SET_CDR,
            Op::MakeVector => TAG_MAKE_VECTOR,
            Op::VectorRef => TAG_VECTOR_REF,
            Op::VectorSet => TAG_VECTOR_SET,
            Op::ExtendEnv(_) => TAG_EXTEND_ENV,
            Op::EnvParent => TAG_ENV_PARENT,
            Op::EnvRef => TAG_ENV_REF,
            Op::EnvSet => TAG_ENV_SET,
            Op::EnvLookup => TAG_ENV_LOOKUP,
            Op::ConsP => TAG_CONS_P,
            Op::NumberP => TAG_NUMBER_P,
            Op::VectorP => TAG_VECTOR_P,
            Op::BooleanP => TAG_BOOLEAN_P,
            Op::NullP => TAG_NULL_P,
            Op::ProcedureP => TAG_PROCEDURE_P,
            Op::Branch(_) => TAG_BRANCH,
            Op::Jt(_) => TAG_JT,
            Op::Jmp => TAG_JMP,
            Op::PushAddr(_) => TAG_PUSH_ADDR,
            Op::MakeClosure(_) => TAG_MAKE_CLOSURE,
            Op::InvokeProcedure => TAG_INVOKE_PROCEDURE,
            Op::Quit => TAG_QUIT,
            Op::Nop => TAG_NOP,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::PushInt(_) => "PUSH_INT",
            Op::Pop => "POP",
            Op::Dup => "DUP",
            Op::Swap => "SWAP",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Cons => "CONS",
            Op::Car => "CAR",
            Op::Cdr => "CDR",
            Op::SetCar => "SET_CAR",
            Op::SetCdr => "SET_CDR",
            Op::MakeVector => "MAKE_VECTOR",
            Op::VectorRef => "VECTOR_REF",
            Op::VectorSet => "VECTOR_SET",
            Op::ExtendEnv(_) => "EXTEND_ENV",
            Op::EnvParent => "ENV_PARENT",
            Op::EnvRef => "ENV_REF",
            Op::EnvSet => "ENV_SET",
            Op::EnvLookup => "ENV_LOOKUP",
            Op::ConsP => "CONS_P",
            Op::NumberP => "NUMBER_P",
            Op::VectorP => "VECTOR_P",
            Op::BooleanP => "BOOLEAN_P",
            Op::NullP => "NULL_P",
            Op::ProcedureP => "PROCEDURE_P",
            Op::Branch(_) => "BRANCH",
            Op::Jt(_) => "JT",
            Op::Jmp => "JMP",
            Op::PushAddr(_) => "PUSH_ADDR",
            Op::MakeClosure(_) => "MAKE_CLOSURE",
            Op::InvokeProcedure => "INVOKE_PROCEDURE",
            Op::Quit => "QUIT",
            Op::Nop => "NOP",
        }
    }

    /// Total encoded length in bytes: 1, or 5 for opcodes with an immediate.
    pub fn encoded_len(self) -> usize {
        match self {
            Op::PushInt(_)
            | Op::ExtendEnv(_)
            | Op::Branch(_)
            | Op::Jt(_)
            | Op::PushAddr(_)
            | Op::MakeClosure(_) => 5,
            _ => 1,
        }
    }

    pub fn encode_to(self, out: &mut Vec<u8>) {
        out.push(self.tag());
        match self {
            Op::PushInt(v) | Op::ExtendEnv(v) | Op::Branch(v) | Op::Jt(v) | Op::PushAddr(v) | Op::MakeClosure(v) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            _ => {}
        }
    }

    /// Decodes the instruction at `code[ip]`. Returns the instruction and
    /// the byte offset of the following instruction.
    pub fn decode(code: &[u8], ip: usize) -> (Op, usize) {
        let tag = code[ip];
        let imm = |ip: usize| -> i32 {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&code[ip + 1..ip + 5]);
            i32::from_le_bytes(buf)
        };
        let op = match tag {
            TAG_PUSH_INT => Op::PushInt(imm(ip)),
            TAG_POP => Op::Pop,
            TAG_DUP => Op::Dup,
            TAG_SWAP => Op::Swap,
            TAG_ADD => Op::Add,
            TAG_SUB => Op::Sub,
            TAG_MUL => Op::Mul,
            TAG_DIV => Op::Div,
            TAG_CONS => Op::Cons,
            TAG_CAR => Op::Car,
            TAG_CDR => Op::Cdr,
            TAG_SET_CAR => Op::SetCar,
            TAG_SET_CDR => Op::SetCdr,
            TAG_MAKE_VECTOR => Op::MakeVector,
            TAG_VECTOR_REF => Op::VectorRef,
            TAG_VECTOR_SET => Op::VectorSet,
            TAG_EXTEND_ENV => Op::ExtendEnv(imm(ip)),
            TAG_ENV_PARENT => Op::EnvParent,
            TAG_ENV_REF => Op::EnvRef,
            TAG_ENV_SET => Op::EnvSet,
            TAG_ENV_LOOKUP => Op::EnvLookup,
            TAG_CONS_P => Op::ConsP,
            TAG_NUMBER_P => Op::NumberP,
            TAG_VECTOR_P => Op::VectorP,
            TAG_BOOLEAN_P => Op::BooleanP,
            TAG_NULL_P => Op::NullP,
            TAG_PROCEDURE_P => Op::ProcedureP,
            TAG_BRANCH => Op::Branch(imm(ip)),
            TAG_JT => Op::Jt(imm(ip)),
            TAG_JMP => Op::Jmp,
            TAG_PUSH_ADDR => Op::PushAddr(imm(ip)),
            TAG_MAKE_CLOSURE => Op::MakeClosure(imm(ip)),
            TAG_INVOKE_PROCEDURE => Op::InvokeProcedure,
            TAG_QUIT => Op::Quit,
            TAG_NOP => Op::Nop,
            other => panic!("malformed bytecode: unknown opcode byte {other:#04x} at ip {ip}"),
        };
        let next = ip + op.encoded_len();
        (op, next)
    }
}

/// A symbolic bytecode builder. This is not a surface-syntax compiler — it
/// has no notion of expressions or scope — just a convenience for writing
/// flat instruction sequences (used by tests and `dump-bytecode`) instead of
/// poking raw bytes by hand, the same role `Assemble …` plays in the test
/// scenarios this runtime is built against.
#[derive(Debug, Default, Clone)]
pub struct Assembler {
    code: Vec<u8>,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler::default()
    }

    /// Byte offset the next emitted instruction will land at — useful for
    /// computing relative offsets for `BRANCH`/`JT`/`PUSH_ADDR`/`MAKE_CLOSURE`
    /// before the jump target is known.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn emit(&mut self, op: Op) -> &mut Assembler {
        op.encode_to(&mut self.code);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.code
    }
}
