//! mpplc CLI
//!
//! Command-line interface for compiling .mpl programs to CASL2 assembly or
//! LLVM IR, with auxiliary syntax-tree, pretty-print, and cross-reference
//! dumps.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;

use mpplc::ast::{AstNode, Program};
use mpplc::config::ColorMode;
use mpplc::cst::SyntaxTree;
use mpplc::{render, xref};

#[derive(Parser)]
#[command(name = "mpplc", version, about = "MPPL compiler")]
struct Cli {
    /// Input .mpl source file
    file: PathBuf,

    /// Print the concrete syntax tree as an indented listing
    #[arg(long)]
    dump_syntax: bool,

    /// Reformat the source in the compiler's house style
    #[arg(long)]
    pretty_print: bool,

    /// Stop after parsing; report only lex/parse diagnostics
    #[arg(long)]
    syntax_only: bool,

    /// Emit LLVM IR to FILE.ll
    #[arg(long)]
    emit_llvm: bool,

    /// Emit CASL2 assembly to FILE.cas (default when no emit flag is given)
    #[arg(long)]
    emit_casl2: bool,

    /// Print a cross-reference of every declared identifier
    #[arg(long)]
    xref: bool,

    /// Disable ANSI color in diagnostics regardless of terminal detection
    #[arg(long)]
    no_color: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let text = match fs::read_to_string(&cli.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: could not open {}: {}", cli.file.display(), e);
            return 1;
        }
    };

    let color = if cli.no_color { ColorMode::Never } else { ColorMode::Auto }.resolve_stdout();
    let source = mpplc::Source::new(cli.file.clone(), text.clone());

    if cli.dump_syntax {
        let (tree, diagnostics) = mpplc::parser::parse(&text);
        print!("{}", dump_tree(&tree, &text, 0));
        let failed = print_diagnostics(&diagnostics, &source, color);
        return if failed { 1 } else { 0 };
    }

    if cli.pretty_print {
        let (tree, diagnostics) = mpplc::parser::parse(&text);
        let failed = print_diagnostics(&diagnostics, &source, color);
        if failed {
            return 1;
        }
        return match Program::cast(tree) {
            Some(program) => {
                print!("{}", mpplc::pretty::render_normalized(&program, &text, color));
                0
            }
            None => 1,
        };
    }

    if cli.syntax_only {
        let (_tree, diagnostics) = mpplc::parser::parse(&text);
        let failed = print_diagnostics(&diagnostics, &source, color);
        return if failed { 1 } else { 0 };
    }

    let result = mpplc::run_front_end(&text);
    let failed = print_diagnostics(&result.diagnostics, &source, color);
    let Some(lowered) = result.lowered else {
        return 1;
    };
    if failed {
        return 1;
    }

    if cli.xref {
        let report = xref::generate(&lowered.arena, lowered.program_item, &result.types, &result.intern, &source);
        print!("{report}");
        return 0;
    }

    let emit_llvm = cli.emit_llvm;
    let emit_casl2 = cli.emit_casl2 || !emit_llvm;

    if emit_llvm {
        let ir = mpplc::llvm::generate(&lowered.arena, lowered.program_item, &result.types, &result.intern);
        let out_path = cli.file.with_extension("ll");
        if let Err(e) = fs::write(&out_path, ir) {
            eprintln!("error: could not write {}: {}", out_path.display(), e);
            return 1;
        }
    }

    if emit_casl2 {
        match mpplc::codegen::generate(&lowered.arena, lowered.program_item, &result.types, &result.intern) {
            Ok(asm) => {
                let out_path = cli.file.with_extension("cas");
                if let Err(e) = fs::write(&out_path, asm) {
                    eprintln!("error: could not write {}: {}", out_path.display(), e);
                    return 1;
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        }
    }

    0
}

/// Renders every diagnostic to stderr, returning whether any were errors.
fn print_diagnostics(diagnostics: &[mpplc::Diagnostic], source: &mpplc::Source, color: bool) -> bool {
    if !diagnostics.is_empty() {
        eprint!("{}", render::render_all(diagnostics, source, color));
    }
    diagnostics.iter().any(|d| d.severity == mpplc::Severity::Error)
}

/// Renders `tree` as an indented listing, one node or token per line.
fn dump_tree(tree: &Rc<SyntaxTree>, full_text: &str, depth: usize) -> String {
    let mut out = String::new();
    let indent = "  ".repeat(depth);
    match tree.token_span() {
        Some((start, end)) => {
            out.push_str(&format!("{indent}{:?} {:?}\n", tree.kind(), &full_text[start..end]));
        }
        None => {
            out.push_str(&format!("{indent}{:?}\n", tree.kind()));
            for child in tree.children() {
                out.push_str(&dump_tree(&child, full_text, depth + 1));
            }
        }
    }
    out
}
