//! Disassembles a raw bytecode file, one decoded instruction per line, and
//! optionally runs it to completion and reports the final stack top and
//! heap stats (`SPEC_FULL.md` §10.2).

use clap::Parser;
use lispvm_rs::reader::print;
use lispvm_rs::vm::opcode::Op;
use lispvm_rs::vm::Vm;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dump-bytecode")]
#[command(about = "Disassembles (and optionally runs) a lispvm bytecode file", long_about = None)]
struct Cli {
    /// Path to a raw bytecode file (as produced by `vm::opcode::Assembler::finish`).
    file: PathBuf,

    /// Execute the program after disassembling it.
    #[arg(long)]
    run: bool,

    /// Heap words per arena for `--run`.
    #[arg(long, default_value_t = 1 << 16)]
    heap_words: usize,

    /// Use a minimal heap so nearly every allocation forces a collection.
    #[arg(long)]
    stress_gc: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let code = fs::read(&cli.file)?;

    println!("=== Bytecode ({} bytes) ===", code.len());
    let mut ip = 0;
    while ip < code.len() {
        let (op, next) = Op::decode(&code, ip);
        print_instruction(ip, op);
        ip = next;
        if op == Op::Quit {
            break;
        }
    }

    if cli.run {
        let heap_words = if cli.stress_gc { 64 } else { cli.heap_words };
        let mut vm = Vm::new(heap_words);
        vm.set_code(code);
        vm.run()?;
        println!("\n=== Result ===");
        match vm.top() {
            Some(v) => println!("top of stack: {}", print(vm.heap(), v)),
            None => println!("stack empty"),
        }
        println!("free words: {}", vm.heap().free_words());
        println!("collections: {}", vm.heap().collections());
    }

    Ok(())
}

fn print_instruction(ip: usize, op: Op) {
    match op {
        Op::PushInt(v) | Op::ExtendEnv(v) | Op::Branch(v) | Op::Jt(v) | Op::PushAddr(v) | Op::MakeClosure(v) => {
            println!("{ip:6}: {:<16} {v}", op.mnemonic());
        }
        _ => println!("{ip:6}: {}", op.mnemonic()),
    }
}
