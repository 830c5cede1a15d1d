//! Lowers one [`Stmt`]/[`RValue`] at a time into CASL2: loads, stores, the
//! binary/unary/cast operators, and the `read`/`write` builtin call
//! sequences.
//!
//! Ported from `casl2_codegen.c`'s `codegen_load*`/`codegen_store`/
//! `codegen_stmt_*` family. One deliberate deviation from that source: its
//! `codegen_stmt_read` loads a raw index value into `GR7` for an indexed
//! read target instead of the element's address, which would make the
//! builtin read routine overwrite whatever happens to sit at that raw
//! index rather than the intended array slot. This port computes the real
//! element address (index bound-checked, then added to the array's base
//! label) the same way the indexed load/store paths already do.

use crate::ir::{BinOp, Constant, IrArena, Local, Operand, Place, RValue, Stmt};
use crate::types::{TypeId, TypeTable};

use super::state::CodeGen;

enum Kind {
    Integer,
    Boolean,
    Char,
    Str,
}

fn operand_kind(arena: &IrArena, types: &TypeTable, operand: &Operand) -> Kind {
    match operand {
        Operand::Constant(id) => match arena.constant(*id) {
            Constant::Number(_) => Kind::Integer,
            Constant::Boolean(_) => Kind::Boolean,
            Constant::Char(_) => Kind::Char,
            Constant::String(..) => Kind::Str,
        },
        Operand::Place(place) => {
            let ty = place_type(arena, types, place);
            if types.is_integer(ty) {
                Kind::Integer
            } else if types.is_boolean(ty) {
                Kind::Boolean
            } else if types.is_char(ty) {
                Kind::Char
            } else if types.is_string(ty) {
                Kind::Str
            } else {
                unreachable!("non-standard place type reached codegen")
            }
        }
    }
}

fn place_type(arena: &IrArena, types: &TypeTable, place: &Place) -> TypeId {
    match place {
        Place::Plain(local) => local_type(arena, *local),
        Place::Indexed(local, _) => {
            let whole = local_type(arena, *local);
            types.array_parts(whole).map(|(base, _)| base).unwrap_or(whole)
        }
    }
}

fn local_type(arena: &IrArena, local: Local) -> TypeId {
    match local {
        Local::Var(id) | Local::Arg(id) => arena.item(id).ty,
        Local::Temp(std_ty) => std_ty.type_id(),
    }
}

fn check_range(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, reg: &str, local: Local) {
    cg.builtins.e_rng = true;
    let id = match local {
        Local::Var(id) => id,
        _ => unreachable!("only a plain array variable can be indexed"),
    };
    let item = arena.item(id);
    let (_, length) = types
        .array_parts(item.ty)
        .unwrap_or_else(|| unreachable!("indexed local is not an array"));
    cg.emit("LD", Some(&format!("GR0, {reg}")));
    cg.emit("JMI", Some("ERNG"));
    cg.emit("LAD", Some(&format!("GR0, {}", length - 1)));
    cg.emit("CPA", Some(&format!("{reg}, GR0")));
    cg.emit("JPL", Some("ERNG"));
}

pub(super) fn load(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, reg: &str, operand: &Operand) {
    match operand {
        Operand::Constant(id) => load_constant(cg, reg, arena.constant(*id)),
        Operand::Place(place) => load_place(cg, arena, types, reg, place),
    }
}

fn load_constant(cg: &mut CodeGen, reg: &str, constant: &Constant) {
    match constant {
        Constant::Number(n) => cg.emit("LAD", Some(&format!("{reg}, {n}"))),
        Constant::Char(c) => cg.emit("LAD", Some(&format!("{reg}, #{c:04X}"))),
        Constant::Boolean(b) => cg.emit("LAD", Some(&format!("{reg}, {}", *b as u8))),
        Constant::String(..) => unreachable!("string constants are never loaded into a register"),
    }
}

fn load_place(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, reg: &str, place: &Place) {
    match place {
        Place::Indexed(local, index) => {
            load(cg, arena, types, "GR7", index);
            check_range(cg, arena, types, "GR7", *local);
            match local {
                Local::Var(id) => {
                    let label = cg.item_label(*id, false);
                    cg.emit("LD", Some(&format!("{reg}, {label}, GR7")));
                }
                _ => unreachable!("only a plain array variable can be indexed"),
            }
        }
        Place::Plain(local) => match local {
            Local::Var(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("LD", Some(&format!("{reg}, {label}")));
            }
            Local::Arg(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("LD", Some(&format!("GR7, {label}")));
                cg.emit("LD", Some(&format!("{reg}, 0, GR7")));
            }
            Local::Temp(_) => cg.emit("POP", Some(reg)),
        },
    }
}

pub(super) fn store(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, reg: &str, place: &Place) {
    match place {
        Place::Indexed(local, index) => {
            load(cg, arena, types, "GR7", index);
            check_range(cg, arena, types, "GR7", *local);
            match local {
                Local::Var(id) => {
                    let label = cg.item_label(*id, false);
                    cg.emit("ST", Some(&format!("{reg}, {label}, GR7")));
                }
                _ => unreachable!("only a plain array variable can be indexed"),
            }
        }
        Place::Plain(local) => match local {
            Local::Var(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("ST", Some(&format!("{reg}, {label}")));
            }
            Local::Arg(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("LD", Some(&format!("GR7, {label}")));
                cg.emit("ST", Some(&format!("{reg}, 0, GR7")));
            }
            Local::Temp(_) => cg.emit("PUSH", Some(&format!("0, {reg}"))),
        },
    }
}

pub(super) fn push_operand_address(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, operand: &Operand) {
    match operand {
        Operand::Constant(id) => push_constant_address(cg, arena.constant(*id)),
        Operand::Place(place) => push_place_address(cg, arena, types, place),
    }
}

fn box_into_temp(cg: &mut CodeGen) -> String {
    let tmp = cg.fresh_label();
    let after = cg.fresh_label();
    cg.emit("JUMP", Some(&after));
    cg.set_label(&tmp);
    cg.emit("DS", Some("1"));
    cg.set_label(&after);
    tmp
}

fn push_constant_address(cg: &mut CodeGen, constant: &Constant) {
    let tmp = box_into_temp(cg);
    load_constant(cg, "GR0", constant);
    cg.emit("ST", Some(&format!("GR0, {tmp}")));
    cg.emit("PUSH", Some(&tmp));
}

fn push_place_address(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, place: &Place) {
    match place {
        Place::Indexed(local, index) => {
            load(cg, arena, types, "GR7", index);
            check_range(cg, arena, types, "GR7", *local);
            match local {
                Local::Var(id) => {
                    let label = cg.item_label(*id, false);
                    cg.emit("PUSH", Some(&format!("{label}, GR7")));
                }
                _ => unreachable!("only a plain array variable can be indexed"),
            }
        }
        Place::Plain(local) => match local {
            Local::Var(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("PUSH", Some(&label));
            }
            Local::Arg(id) => {
                let label = cg.item_label(*id, false);
                cg.emit("LD", Some(&format!("GR7, {label}")));
                cg.emit("PUSH", Some("0, GR7"));
            }
            Local::Temp(_) => {
                let tmp = box_into_temp(cg);
                cg.emit("POP", Some("GR1"));
                cg.emit("ST", Some(&format!("GR1, {tmp}")));
                cg.emit("PUSH", Some(&tmp));
            }
        },
    }
}

fn codegen_binary(cg: &mut CodeGen, op: BinOp) {
    match op {
        BinOp::Add => {
            cg.builtins.e_ov = true;
            cg.emit("ADDA", Some("GR1, GR2"));
            cg.emit("JOV", Some("EOV"));
        }
        BinOp::Sub => {
            cg.builtins.e_ov = true;
            cg.emit("SUBA", Some("GR1, GR2"));
            cg.emit("JOV", Some("EOV"));
        }
        BinOp::Mul => {
            cg.builtins.e_ov = true;
            cg.emit("MULA", Some("GR1, GR2"));
            cg.emit("JOV", Some("EOV"));
        }
        BinOp::Div => {
            cg.builtins.e_div0 = true;
            cg.emit("LD", Some("GR2, GR2"));
            cg.emit("JZE", Some("EDIV0"));
            cg.emit("DIVA", Some("GR1, GR2"));
        }
        BinOp::And => cg.emit("AND", Some("GR1, GR2")),
        BinOp::Or => cg.emit("OR", Some("GR1, GR2")),
        BinOp::Eq => {
            let jmp = cg.fresh_label();
            cg.emit("CPA", Some("GR1, GR2"));
            cg.emit("LAD", Some("GR1, 1"));
            cg.emit("JZE", Some(&jmp));
            cg.emit("XOR", Some("GR1, GR1"));
            cg.set_label(&jmp);
        }
        BinOp::NotEq => {
            let jmp = cg.fresh_label();
            cg.emit("SUBA", Some("GR1, GR2"));
            cg.emit("JZE", Some(&jmp));
            cg.emit("LAD", Some("GR1, 1"));
            cg.set_label(&jmp);
        }
        BinOp::Less => {
            let jmp = cg.fresh_label();
            cg.emit("CPA", Some("GR1, GR2"));
            cg.emit("LAD", Some("GR1, 1"));
            cg.emit("JMI", Some(&jmp));
            cg.emit("XOR", Some("GR1, GR1"));
            cg.set_label(&jmp);
        }
        BinOp::LessEq => {
            let jmp = cg.fresh_label();
            cg.emit("CPA", Some("GR2, GR1"));
            cg.emit("XOR", Some("GR1, GR1"));
            cg.emit("JMI", Some(&jmp));
            cg.emit("LAD", Some("GR1, 1"));
            cg.set_label(&jmp);
        }
        BinOp::Greater => {
            let jmp = cg.fresh_label();
            cg.emit("CPA", Some("GR2, GR1"));
            cg.emit("LAD", Some("GR1, 1"));
            cg.emit("JMI", Some(&jmp));
            cg.emit("XOR", Some("GR1, GR1"));
            cg.set_label(&jmp);
        }
        BinOp::GreaterEq => {
            let jmp = cg.fresh_label();
            cg.emit("CPA", Some("GR1, GR2"));
            cg.emit("XOR", Some("GR1, GR1"));
            cg.emit("JMI", Some(&jmp));
            cg.emit("LAD", Some("GR1, 1"));
            cg.set_label(&jmp);
        }
    }
}

fn codegen_cast(cg: &mut CodeGen, types: &TypeTable, target: TypeId, src: Kind) {
    match src {
        Kind::Integer | Kind::Char => {
            if types.is_boolean(target) {
                let jmp = cg.fresh_label();
                cg.emit("LD", Some("GR1, GR1"));
                cg.emit("JZE", Some(&jmp));
                cg.emit("LAD", Some("GR1, 1"));
                cg.set_label(&jmp);
            } else if matches!(src, Kind::Integer) && (types.is_integer(target) || types.is_char(target)) {
                cg.emit("LAD", Some("GR2, #007F"));
                cg.emit("AND", Some("GR1, GR2"));
            } else if matches!(src, Kind::Char) && (types.is_integer(target) || types.is_char(target)) {
                // char -> integer/char is value-preserving, nothing to do.
            } else {
                unreachable!("checker should have rejected this cast");
            }
        }
        Kind::Boolean => {
            // boolean -> boolean is the only cast the checker allows from here.
        }
        Kind::Str => unreachable!("strings are never cast"),
    }
}

pub(super) fn codegen_stmt(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, stmt: &Stmt) {
    match stmt {
        Stmt::Assign(place, rvalue) => {
            match rvalue {
                RValue::Use(op) => load(cg, arena, types, "GR1", op),
                RValue::Binary(op, lhs, rhs) => {
                    load(cg, arena, types, "GR2", rhs);
                    load(cg, arena, types, "GR1", lhs);
                    codegen_binary(cg, *op);
                }
                RValue::Not(op) => {
                    load(cg, arena, types, "GR1", op);
                    cg.emit("XOR", Some("GR1, BC1"));
                }
                RValue::Cast(target, op) => {
                    load(cg, arena, types, "GR1", op);
                    let src = operand_kind(arena, types, op);
                    codegen_cast(cg, types, *target, src);
                }
            }
            store(cg, arena, types, "GR1", place);
        }
        Stmt::Call(callee, args) => {
            for arg in args.iter().rev() {
                push_operand_address(cg, arena, types, arg);
            }
            let label = cg.item_label(*callee, false);
            cg.emit("CALL", Some(&label));
        }
        Stmt::Read(place) => {
            match place {
                Place::Indexed(local, index) => {
                    load(cg, arena, types, "GR7", index);
                    check_range(cg, arena, types, "GR7", *local);
                    match local {
                        Local::Var(id) => {
                            let label = cg.item_label(*id, false);
                            cg.emit("LAD", Some(&format!("GR7, {label}, GR7")));
                        }
                        _ => unreachable!("only a plain array variable can be indexed"),
                    }
                }
                Place::Plain(local) => match local {
                    Local::Var(id) => {
                        let label = cg.item_label(*id, false);
                        cg.emit("LAD", Some(&format!("GR7, {label}")));
                    }
                    Local::Arg(id) => {
                        let label = cg.item_label(*id, false);
                        cg.emit("LD", Some(&format!("GR7, {label}")));
                    }
                    Local::Temp(_) => unreachable!("read's target is never a temporary"),
                },
            }
            match place_type(arena, types, place) {
                ty if types.is_integer(ty) => {
                    cg.builtins.r_int = true;
                    cg.emit("CALL", Some("BRINT"));
                }
                ty if types.is_char(ty) => {
                    cg.builtins.r_char = true;
                    cg.emit("CALL", Some("BRCHAR"));
                }
                _ => unreachable!("only integer and char can be read"),
            }
        }
        Stmt::ReadLn => {
            cg.builtins.r_ln = true;
            cg.emit("CALL", Some("BRLN"));
        }
        Stmt::Write(value, width) => codegen_write(cg, arena, types, value, width),
        Stmt::WriteLn => {
            cg.builtins.w_char = true;
            cg.emit("LD", Some("GR1, BCLF"));
            cg.emit("CALL", Some("BSCHAR"));
            cg.emit("LAD", Some("GR1, 1"));
            cg.emit("CALL", Some("BWSTR"));
        }
    }
}

fn codegen_write(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, value: &Operand, width: &Option<Operand>) {
    match operand_kind(arena, types, value) {
        Kind::Integer => {
            cg.builtins.w_int = true;
            load(cg, arena, types, "GR1", value);
            cg.emit("CALL", Some("BSINT"));
            match width {
                Some(w) => load(cg, arena, types, "GR1", w),
                None => cg.emit("LD", Some("GR1, GR2")),
            }
            cg.emit("CALL", Some("BWSTR"));
        }
        Kind::Boolean => {
            cg.builtins.w_bool = true;
            load(cg, arena, types, "GR1", value);
            cg.emit("CALL", Some("BSBOOL"));
            match width {
                Some(w) => load(cg, arena, types, "GR1", w),
                None => cg.emit("LD", Some("GR1, GR2")),
            }
            cg.emit("CALL", Some("BWSTR"));
        }
        Kind::Char => {
            cg.builtins.w_char = true;
            load(cg, arena, types, "GR1", value);
            cg.emit("CALL", Some("BSCHAR"));
            match width {
                Some(w) => load(cg, arena, types, "GR1", w),
                None => cg.emit("LAD", Some("GR1, 1")),
            }
            cg.emit("CALL", Some("BWSTR"));
        }
        Kind::Str => {
            cg.builtins.w_str = true;
            let id = match value {
                Operand::Constant(id) => *id,
                Operand::Place(_) => unreachable!("MPPL has no string-typed variables"),
            };
            let len = match arena.constant(id) {
                Constant::String(_, len) => *len,
                _ => unreachable!(),
            };
            let label = cg.constant_label(id);
            cg.emit("LAD", Some(&format!("GR2, {len}")));
            cg.emit("LAD", Some(&format!("GR3, {label}")));
            cg.emit("LD", Some("GR1, GR2"));
            cg.emit("CALL", Some("BWSTR"));
        }
    }
}
