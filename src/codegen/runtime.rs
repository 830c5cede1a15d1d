//! On-demand builtin I/O routines and runtime error traps.
//!
//! Ported from `casl2_codegen.c`'s `codegen_builtin`: every helper below is
//! only emitted if something earlier in the program actually needed it,
//! tracked through the usage flags on [`super::state::BuiltinUsage`].

use super::state::CodeGen;

pub(super) fn emit_builtins(cg: &mut CodeGen) {
    emit_char_constants(cg);

    let mut builtin_write = false;

    if cg.builtins.w_int {
        builtin_write = true;
        emit_write_int(cg);
    }
    if cg.builtins.w_bool {
        builtin_write = true;
        emit_write_bool(cg);
    }
    if cg.builtins.w_char {
        builtin_write = true;
        emit_write_char(cg);
    }
    if cg.builtins.w_str {
        builtin_write = true;
    }
    if builtin_write {
        emit_write_shared(cg);
    }

    let mut builtin_read = false;
    if cg.builtins.r_int {
        builtin_read = true;
        emit_read_int(cg);
    }
    if cg.builtins.r_char {
        builtin_read = true;
        emit_read_char(cg);
    }
    if cg.builtins.r_ln {
        builtin_read = true;
        emit_read_ln(cg);
    }
    if builtin_read {
        emit_read_shared(cg);
    }

    if cg.builtins.e_ov {
        emit_trap(cg, "runtime error: overflow", "EMOV", "EMLOV", "EOV", "1");
    }
    if cg.builtins.e_div0 {
        emit_trap(cg, "runtime error: division by 0", "EMDIV0", "EMLDIV0", "EDIV0", "2");
    }
    if cg.builtins.e_rng {
        emit_trap(cg, "runtime error: index out of range", "EMRNG", "EMLRNG", "ERNG", "3");
    }
}

fn emit_char_constants(cg: &mut CodeGen) {
    cg.set_label("BCSP");
    cg.emit("DC", Some("#0020"));
    cg.set_label("BCLF");
    cg.emit("DC", Some("#000A"));
    cg.set_label("BCTAB");
    cg.emit("DC", Some("#0009"));
    cg.set_label("BC1");
    cg.emit("DC", Some("1"));
    cg.set_label("BC10");
    cg.emit("DC", Some("10"));
    cg.set_label("BCH30");
    cg.emit("DC", Some("#0030"));
}

fn emit_write_int(cg: &mut CodeGen) {
    cg.set_label("BSINT");
    cg.emit("LAD", Some("GR4, 6"));
    cg.emit("XOR", Some("GR5, GR5"));
    cg.emit("CPA", Some("GR1, GR5"));
    cg.emit("JPL", Some("BSINT0"));
    cg.emit("SUBA", Some("GR5, GR1"));
    cg.emit("LD", Some("GR1, GR5"));

    cg.set_label("BSINT0");
    cg.emit("LD", Some("GR2, GR1"));
    cg.emit("LD", Some("GR3, GR1"));
    cg.emit("DIVA", Some("GR3, BC10"));
    cg.emit("MULA", Some("GR3, BC10"));
    cg.emit("SUBA", Some("GR2, GR3"));
    cg.emit("ADDA", Some("GR2, BCH30"));
    cg.emit("SUBA", Some("GR4, BC1"));
    cg.emit("ST", Some("GR2, BSBUF, GR4"));
    cg.emit("DIVA", Some("GR1, BC10"));
    cg.emit("JNZ", Some("BSINT0"));
    cg.emit("LD", Some("GR5, GR5"));
    cg.emit("JZE", Some("BSINT1"));
    cg.emit("LAD", Some("GR2, #002D"));
    cg.emit("SUBA", Some("GR4, BC1"));
    cg.emit("ST", Some("GR2, BSBUF, GR4"));

    cg.set_label("BSINT1");
    cg.emit("LAD", Some("GR2, 6"));
    cg.emit("SUBA", Some("GR2, GR4"));
    cg.emit("LAD", Some("GR3, BSBUF, GR4"));
    cg.emit("RET", None);
}

fn emit_write_bool(cg: &mut CodeGen) {
    cg.set_label("BCTRUE");
    cg.emit("DC", Some("'TRUE'"));
    cg.set_label("BCFALSE");
    cg.emit("DC", Some("'FALSE'"));

    cg.set_label("BSBOOL");
    cg.emit("LD", Some("GR1, GR1"));
    cg.emit("JNZ", Some("BSBOOL0"));
    cg.emit("LAD", Some("GR3, BCFALSE"));
    cg.emit("LAD", Some("GR2, 5"));
    cg.emit("RET", None);
    cg.set_label("BSBOOL0");
    cg.emit("LAD", Some("GR3, BCTRUE"));
    cg.emit("LAD", Some("GR2, 4"));
    cg.emit("RET", None);
}

fn emit_write_char(cg: &mut CodeGen) {
    cg.set_label("BSCHAR");
    cg.emit("ST", Some("GR1, BSBUF"));
    cg.emit("LAD", Some("GR3, BSBUF"));
    cg.emit("LAD", Some("GR2, 1"));
    cg.emit("RET", None);
}

fn emit_write_shared(cg: &mut CodeGen) {
    cg.set_label("BSBUF");
    cg.emit("DS", Some("6"));
    cg.set_label("BOBUF");
    cg.emit("DS", Some("256"));
    cg.set_label("BOCUR");
    cg.emit("DC", Some("0"));

    cg.set_label("BFLUSH");
    cg.emit("OUT", Some("BOBUF, BOCUR"));
    cg.emit("XOR", Some("GR0, GR0"));
    cg.emit("ST", Some("GR0, BOCUR"));
    cg.emit("RET", None);

    cg.set_label("BWSTR");
    cg.emit("LD", Some("GR1, GR1"));
    cg.emit("JPL", Some("BWSTR0"));
    cg.emit("RET", None);

    cg.set_label("BWSTR0");
    cg.emit("CPA", Some("GR2, GR1"));
    cg.emit("JMI", Some("BWSTR1"));
    cg.emit("LD", Some("GR4, 0, GR3"));
    cg.emit("ADDA", Some("GR3, BC1"));
    cg.emit("JUMP", Some("BWSTR2"));

    cg.set_label("BWSTR1");
    cg.emit("LD", Some("GR4, BCSP"));

    cg.set_label("BWSTR2");
    cg.emit("SUBA", Some("GR1, BC1"));
    cg.emit("LD", Some("GR5, BOCUR"));
    cg.emit("ST", Some("GR4, BOBUF, GR5"));
    cg.emit("ADDA", Some("GR5, BC1"));
    cg.emit("ST", Some("GR5, BOCUR"));
    cg.emit("CPA", Some("GR4, BCLF"));
    cg.emit("JNZ", Some("BWSTR3"));
    cg.emit("CALL", Some("BFLUSH"));
    cg.emit("JUMP", Some("BWSTR4"));

    cg.set_label("BWSTR3");
    cg.emit("LAD", Some("GR4, 256"));
    cg.emit("CPA", Some("GR5, GR4"));
    cg.emit("JNZ", Some("BWSTR4"));
    cg.emit("CALL", Some("BFLUSH"));

    cg.set_label("BWSTR4");
    cg.emit("JUMP", Some("BWSTR"));
}

fn emit_read_int(cg: &mut CodeGen) {
    cg.set_label("BRINT");
    cg.emit("XOR", Some("GR0, GR0"));
    cg.emit("CALL", Some("BRREAD"));

    cg.set_label("BRINT0");
    cg.emit("CALL", Some("BRTOP"));
    cg.emit("CPA", Some("GR1, BCSP"));
    cg.emit("JZE", Some("BRINT1"));
    cg.emit("CPA", Some("GR1, BCLF"));
    cg.emit("JZE", Some("BRINT1"));
    cg.emit("CPA", Some("GR1, BCTAB"));
    cg.emit("JZE", Some("BRINT1"));
    cg.emit("SUBA", Some("GR1, BCH30"));
    cg.emit("JMI", Some("BRINT2"));
    cg.emit("CPA", Some("GR1, BC10"));
    cg.emit("JPL", Some("BRINT2"));
    cg.emit("MULA", Some("GR0, BC10"));
    cg.emit("JOV", Some("EOV"));
    cg.emit("ADDA", Some("GR0, GR1"));

    cg.set_label("BRINT1");
    cg.emit("ADDA", Some("GR2, BC1"));
    cg.emit("ST", Some("GR2, BICUR"));
    cg.emit("CPA", Some("GR2, BILEN"));
    cg.emit("JMI", Some("BRINT0"));

    cg.set_label("BRINT2");
    cg.emit("ST", Some("GR0, 0, GR7"));
    cg.emit("RET", None);
}

fn emit_read_char(cg: &mut CodeGen) {
    cg.set_label("BRCHAR");
    cg.emit("CALL", Some("BRREAD"));
    cg.emit("CALL", Some("BRTOP"));
    cg.emit("ADDA", Some("GR2, BC1"));
    cg.emit("ST", Some("GR2, BICUR"));
    cg.emit("ST", Some("GR1, 0, GR7"));
    cg.emit("RET", None);
}

fn emit_read_ln(cg: &mut CodeGen) {
    cg.set_label("BRLN");
    cg.emit("XOR", Some("GR0, GR0"));
    cg.emit("ST", Some("GR0, BILEN"));
    cg.emit("ST", Some("GR0, BICUR"));
    cg.emit("RET", None);
}

fn emit_read_shared(cg: &mut CodeGen) {
    cg.set_label("BIBUF");
    cg.emit("DS", Some("256"));
    cg.set_label("BILEN");
    cg.emit("DC", Some("0"));
    cg.set_label("BICUR");
    cg.emit("DC", Some("0"));

    cg.set_label("BRREAD");
    cg.emit("LD", Some("GR1, BICUR"));
    cg.emit("LD", Some("GR2, BICUR"));
    cg.emit("CPA", Some("GR1, BILEN"));
    cg.emit("JMI", Some("BRREAD0"));
    cg.emit("IN", Some("BIBUF, BILEN"));
    cg.emit("XOR", Some("GR0, GR0"));
    cg.emit("ST", Some("GR0, BICUR"));

    cg.set_label("BRREAD0");
    cg.emit("RET", None);

    cg.set_label("BRTOP");
    cg.emit("LD", Some("GR1, BICUR"));
    cg.emit("LD", Some("GR2, BICUR"));
    cg.emit("CPA", Some("GR1, BILEN"));
    cg.emit("JMI", Some("BRTOP0"));
    cg.emit("XOR", Some("GR1, GR1"));
    cg.emit("RET", None);

    cg.set_label("BRTOP0");
    cg.emit("LD", Some("GR1, BIBUF, GR2"));
    cg.emit("RET", None);
}

fn emit_trap(cg: &mut CodeGen, message: &str, msg_label: &str, len_label: &str, trap_label: &str, svc_code: &str) {
    cg.set_label(msg_label);
    cg.emit("DC", Some(&format!("'{message}'")));
    cg.set_label(len_label);
    cg.emit("DC", Some(&message.len().to_string()));
    cg.set_label(trap_label);
    cg.emit("CALL", Some("BFLUSH"));
    cg.emit("OUT", Some(&format!("{msg_label}, {len_label}")));
    cg.emit("OUT", Some("BCLF, BC1"));
    cg.emit("SVC", Some(svc_code));
}
