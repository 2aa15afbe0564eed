//! Interactive read-print loop exercising the reader, printer, and heap end
//! to end (`SPEC_FULL.md` §10.2). There is no surface-syntax compiler (an
//! explicit non-goal) to turn a typed expression into bytecode, so this
//! loop reads each line into a `core` object and prints it straight back —
//! a REPL over the reader/printer round trip, the same way `dump-bytecode
//! --run` exercises the VM side of the runtime.

use clap::Parser;
use lispvm_rs::core::interner::Interner;
use lispvm_rs::core::Heap;
use lispvm_rs::reader::{print, Reader};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lispvm")]
#[command(about = "Reader/printer REPL over the lispvm-rs heap", long_about = None)]
struct Cli {
    /// Heap words per arena.
    #[arg(long, default_value_t = 1 << 16)]
    heap_words: usize,

    /// Use a minimal heap so nearly every allocation forces a collection.
    #[arg(long)]
    stress_gc: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let heap_words = if cli.stress_gc { 64 } else { cli.heap_words };

    let mut heap = Heap::new(heap_words);
    let interner = Interner::new(&mut heap);

    let mut rl = DefaultEditor::new()?;
    let history_path = std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".lispvm_history"))
        .unwrap_or_else(|_| PathBuf::from(".lispvm_history"));
    let _ = rl.load_history(&history_path);

    println!("lispvm-rs reader/printer REPL — type ':quit' to exit, ':stats' for heap stats");

    loop {
        match rl.readline("lispvm> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                match trimmed {
                    ":quit" | ":exit" => break,
                    ":stats" => {
                        println!(
                            "free words: {}  collections: {}  symbols: {}",
                            heap.free_words(),
                            heap.collections(),
                            interner.len()
                        );
                        continue;
                    }
                    _ => {}
                }

                let mut reader = Reader::new(trimmed.as_bytes());
                match reader.read_one(&mut heap, &interner) {
                    Ok(Some(value)) => println!("{}", print(&heap, value)),
                    Ok(None) => {}
                    Err(e) => println!("read error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}
