//! Textual LLVM IR backend.
//!
//! Ported in spirit from the original compiler's `codegen_llvm.c`, which
//! widths types the same way this module does (Integer -> 16 bits, Char ->
//! 8 bits, Boolean -> 1 bit) and keeps a generator-local temp/label counter
//! instead of minting names lazily from identity, the way `codegen/state.rs`
//! does for CASL2. Two structural differences from that source, both forced
//! by there being no register file to spill into here:
//!
//! - Every `Var`/`LocalVar`/`Param` item becomes a module-level global,
//!   never a stack `alloca`, mirroring the CASL2 backend's own choice to
//!   give every local static storage (`codegen/globals.rs`) rather than a
//!   frame slot. A `Param` global holds the caller's address, exactly like
//!   its CASL2 counterpart.
//! - `Local::Temp` has no identity of its own (`ir.rs`'s doc comment on
//!   `Local`): the lowerer produces and consumes it in strict last-in
//!   first-out order, the same discipline the CASL2 backend rides with
//!   `PUSH`/`POP`. This backend rides the same discipline with a
//!   generation-time value stack (`Gen::push_temp`/`pop_temp`) of SSA names
//!   instead of registers; nothing about it reaches the emitted text.
//!
//! This backend never links against an LLVM crate and never shells out to
//! `clang`: `generate` only ever builds a `String` of `.ll` text.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::interner::StringInterner;
use crate::ir::{BinOp, Block, Body, Constant, IrArena, Item, ItemId, ItemKind, Local, Operand, Place, RValue, Stmt, Terminator};
use crate::types::{TypeId, TypeTable};

/// Emits one LLVM IR module for the program rooted at `program`.
pub fn generate(arena: &IrArena, program: ItemId, types: &TypeTable, intern: &StringInterner) -> String {
    let mut gen = Gen::new();
    gen.declare_externs();
    gen.declare_overflow_intrinsics();
    gen.emit_string_constants(arena, intern);
    gen.emit_storage(arena, program, types);
    gen.emit_items(arena, program, types, intern);
    gen.emit_main(arena, program, types);
    gen.out.push_str(&std::mem::take(&mut gen.pending_globals));
    gen.emit_runtime_helpers();
    gen.out
}

/// The three runtime traps, keyed the same way `codegen/runtime.rs`'s
/// `emit_trap` keys them: a message, the global that holds it, and the
/// process exit status that reports which trap fired.
const TRAPS: &[(&str, &str, &str, i32)] = &[
    ("overflow", "runtime error: overflow\n", "@.msg_overflow", 1),
    ("division by 0", "runtime error: division by 0\n", "@.msg_div0", 2),
    ("index out of range", "runtime error: index out of range\n", "@.msg_range", 3),
];

fn llvm_type(types: &TypeTable, ty: TypeId) -> String {
    if types.is_integer(ty) {
        "i16".to_string()
    } else if types.is_boolean(ty) {
        "i1".to_string()
    } else if types.is_char(ty) {
        "i8".to_string()
    } else if let Some((base, len)) = types.array_parts(ty) {
        format!("[{len} x {}]", llvm_type(types, base))
    } else {
        unreachable!("non-standard, non-array type reached the LLVM backend")
    }
}

fn zero_value(types: &TypeTable, ty: TypeId) -> String {
    if types.array_parts(ty).is_some() {
        "zeroinitializer".to_string()
    } else if types.is_boolean(ty) {
        "false".to_string()
    } else {
        "0".to_string()
    }
}

/// A value materialized while generating one statement: its SSA name (or an
/// immediate literal for constants) and its LLVM type.
#[derive(Clone)]
struct Val {
    text: String,
    ty: String,
}

struct Gen {
    out: String,
    /// Module-scope globals discovered while writing a function body (the
    /// one-word cells `address_of_operand` boxes a constant/temporary
    /// argument into). They can't be appended to `out` at the point
    /// they're discovered, since that point sits inside a `define ... { }`
    /// block; `generate` splices this in between functions and the
    /// runtime helpers instead.
    pending_globals: String,
    next_temp: u32,
    /// `Local::Temp`'s generation-time stand-in for the CASL2 backend's
    /// register stack: values are pushed in the order the lowerer assigns
    /// them and popped in the order it reads them back.
    temp_stack: Vec<Val>,
    string_globals: HashMap<u32, (String, u32)>,
    used: Runtime,
}

#[derive(Default)]
struct Runtime {
    write_int: bool,
    write_bool: bool,
    write_char: bool,
    write_str: bool,
    read_int: bool,
    read_char: bool,
    read_ln: bool,
    overflow_trap: bool,
    div0_trap: bool,
    range_trap: bool,
}

impl Gen {
    fn new() -> Self {
        Gen {
            out: String::new(),
            pending_globals: String::new(),
            next_temp: 0,
            temp_stack: Vec::new(),
            string_globals: HashMap::new(),
            used: Runtime::default(),
        }
    }

    fn fresh(&mut self) -> String {
        let name = format!("%.t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    fn push_temp(&mut self, val: Val) {
        self.temp_stack.push(val);
    }

    fn pop_temp(&mut self) -> Val {
        self.temp_stack.pop().expect("temp stack underflow: lowerer always pairs a Temp's write with a read")
    }

    fn declare_externs(&mut self) {
        self.line("declare i32 @printf(i8*, ...)");
        self.line("declare i32 @scanf(i8*, ...)");
        self.line("declare i32 @getchar()");
        self.line("declare i32 @putchar(i32)");
        self.line("declare void @exit(i32)");
        self.line("");
    }

    fn declare_overflow_intrinsics(&mut self) {
        self.line("declare { i16, i1 } @llvm.sadd.with.overflow.i16(i16, i16)");
        self.line("declare { i16, i1 } @llvm.ssub.with.overflow.i16(i16, i16)");
        self.line("declare { i16, i1 } @llvm.smul.with.overflow.i16(i16, i16)");
        self.line("");
    }

    fn emit_string_constants(&mut self, arena: &IrArena, intern: &StringInterner) {
        for (id, constant) in arena.constants() {
            if let Constant::String(sym, _len) = constant {
                let text = intern.resolve(*sym);
                let name = format!("@.str{}", id.index());
                let (escaped, byte_len) = escape_c_string(text);
                let _ = writeln!(self.out, "{name} = private unnamed_addr constant [{byte_len} x i8] c\"{escaped}\"");
                self.string_globals.insert(id.index(), (name, byte_len - 1));
            }
        }
        self.line("");
    }

    fn global_name(id: ItemId) -> String {
        format!("@v{}", id.index())
    }

    fn proc_name(id: ItemId) -> String {
        format!("@p{}", id.index())
    }

    /// Declares module-level storage for every `Var`/`LocalVar`/`Param`
    /// reachable from `program`, recursing into nested procedure bodies,
    /// the same walk `codegen/program.rs`'s `codegen_items` performs for
    /// CASL2's `DS` declarations.
    fn emit_storage(&mut self, arena: &IrArena, id: ItemId, types: &TypeTable) {
        let Some(body) = arena.item(id).body.as_ref() else {
            return;
        };
        for &inner_id in &body.items {
            let inner: &Item = arena.item(inner_id);
            match inner.kind {
                ItemKind::Param => {
                    let elem_ty = llvm_type(types, inner.ty);
                    let _ = writeln!(self.out, "{} = global {elem_ty}* null", Self::global_name(inner_id));
                }
                ItemKind::Var | ItemKind::LocalVar => {
                    let ty = llvm_type(types, inner.ty);
                    let zero = zero_value(types, inner.ty);
                    let _ = writeln!(self.out, "{} = global {ty} {zero}", Self::global_name(inner_id));
                }
                ItemKind::Proc => self.emit_storage(arena, inner_id, types),
                ItemKind::Program => unreachable!("a program never nests another program"),
            }
        }
    }

    fn emit_items(&mut self, arena: &IrArena, id: ItemId, types: &TypeTable, intern: &StringInterner) {
        let Some(body) = arena.item(id).body.as_ref() else {
            return;
        };
        for &inner_id in &body.items {
            if arena.item(inner_id).kind == ItemKind::Proc {
                self.emit_proc(arena, inner_id, types, intern);
            }
        }
    }

    fn emit_proc(&mut self, arena: &IrArena, id: ItemId, types: &TypeTable, intern: &StringInterner) {
        self.emit_items(arena, id, types, intern);

        let body = arena.item(id).body.as_ref().expect("procedure item has no body");
        let params: Vec<ItemId> = body
            .items
            .iter()
            .copied()
            .filter(|&i| arena.item(i).kind == ItemKind::Param)
            .collect();

        let arg_list: Vec<String> = params
            .iter()
            .enumerate()
            .map(|(i, &p)| format!("{}* %a{i}", llvm_type(types, arena.item(p).ty)))
            .collect();
        let _ = writeln!(self.out, "define void {}({}) {{", Self::proc_name(id), arg_list.join(", "));
        self.line("entry:");
        for (i, &p) in params.iter().enumerate() {
            let ty = llvm_type(types, arena.item(p).ty);
            let _ = writeln!(self.out, "  store {ty}* %a{i}, {ty}** {}", Self::global_name(p));
        }
        let _ = writeln!(self.out, "  br label %l{}", body.entry_block.index());
        self.emit_function_body(arena, types, body, "ret void");
        self.line("}");
        self.line("");
    }

    fn emit_main(&mut self, arena: &IrArena, program: ItemId, types: &TypeTable) {
        let body = arena.item(program).body.as_ref().expect("program item has no body");
        self.line("define i32 @main() {");
        self.line("entry:");
        let _ = writeln!(self.out, "  br label %l{}", body.entry_block.index());
        self.emit_function_body(arena, types, body, "ret i32 0");
        self.line("}");
        self.line("");
    }

    /// Walks every block reachable from `body.entry_block`, each one
    /// becoming its own `lN:` label with an explicit terminator; unlike the
    /// CASL2 backend's `codegen_block`, nothing is inlined, since LLVM text
    /// blocks are cheap and every block needs its own terminator anyway.
    /// `return_text` is the function's own return instruction, `ret void`
    /// for a procedure or `ret i32 0` for `main`.
    fn emit_function_body(&mut self, arena: &IrArena, types: &TypeTable, body: &Body, return_text: &str) {
        let mut visited = std::collections::HashSet::new();
        let mut worklist = vec![body.entry_block];
        let mut order = Vec::new();
        while let Some(id) = worklist.pop() {
            if !visited.insert(id.index()) {
                continue;
            }
            order.push(id);
            match arena.block(id).terminator {
                Some(Terminator::Goto(next)) => worklist.push(next),
                Some(Terminator::If(_, then_blk, else_blk)) => {
                    worklist.push(else_blk);
                    worklist.push(then_blk);
                }
                Some(Terminator::Return) | None => {}
            }
        }

        for id in order {
            let _ = writeln!(self.out, "l{}:", id.index());
            let block: &Block = arena.block(id);
            for stmt in &block.stmts {
                self.emit_stmt(arena, types, stmt);
            }
            match block.terminator.expect("every block has a terminator once lowering finishes") {
                Terminator::Goto(next) => {
                    let _ = writeln!(self.out, "  br label %l{}", next.index());
                }
                Terminator::If(cond, then_blk, else_blk) => {
                    let cond_val = self.load_operand(arena, types, &cond);
                    let _ = writeln!(self.out, "  br i1 {}, label %l{}, label %l{}", cond_val.text, then_blk.index(), else_blk.index());
                }
                Terminator::Return => {
                    let line = format!("  {return_text}");
                    self.line(&line);
                }
            }
        }
    }

    // -- operands / places --------------------------------------------

    fn local_type(arena: &IrArena, local: Local) -> TypeId {
        match local {
            Local::Var(id) | Local::Arg(id) => arena.item(id).ty,
            Local::Temp(std_ty) => std_ty.type_id(),
        }
    }

    fn place_type(arena: &IrArena, types: &TypeTable, place: &Place) -> TypeId {
        match place {
            Place::Plain(local) => Self::local_type(arena, *local),
            Place::Indexed(local, _) => {
                let whole = Self::local_type(arena, *local);
                types.array_parts(whole).map(|(base, _)| base).unwrap_or(whole)
            }
        }
    }

    /// Computes the address of `local` (a pointer into its global, or for a
    /// reference parameter, the address the caller passed in).
    fn address_of_local(&mut self, arena: &IrArena, types: &TypeTable, local: Local) -> Val {
        match local {
            Local::Var(id) => {
                let ty = llvm_type(types, arena.item(id).ty);
                Val { text: Self::global_name(id), ty: format!("{ty}*") }
            }
            Local::Arg(id) => {
                let ty = llvm_type(types, arena.item(id).ty);
                let dst = self.fresh();
                let _ = writeln!(self.out, "  {dst} = load {ty}*, {ty}** {}", Self::global_name(id));
                Val { text: dst, ty: format!("{ty}*") }
            }
            Local::Temp(_) => unreachable!("a temporary is never addressed, only pushed/popped"),
        }
    }

    fn address_of_place(&mut self, arena: &IrArena, types: &TypeTable, place: &Place) -> Val {
        match place {
            Place::Plain(local) => self.address_of_local(arena, types, *local),
            Place::Indexed(local, index) => {
                let base = self.address_of_local(arena, types, *local);
                let idx = self.load_operand(arena, types, index);
                self.check_range(arena, types, *local, &idx);
                let elem_ty = llvm_type(types, Self::place_type(arena, types, place));
                let dst = self.fresh();
                let array_ty = {
                    let whole = Self::local_type(arena, *local);
                    llvm_type(types, whole)
                };
                let _ = writeln!(
                    self.out,
                    "  {dst} = getelementptr {array_ty}, {array_ty}* {}, i16 0, i16 {}",
                    base.text, idx.text
                );
                Val { text: dst, ty: format!("{elem_ty}*") }
            }
        }
    }

    fn load_operand(&mut self, arena: &IrArena, types: &TypeTable, operand: &Operand) -> Val {
        match operand {
            Operand::Constant(id) => self.load_constant(arena, *id),
            Operand::Place(place) => self.load_place(arena, types, place),
        }
    }

    fn load_constant(&mut self, arena: &IrArena, id: crate::ir::ConstantId) -> Val {
        match arena.constant(id) {
            Constant::Number(n) => Val { text: n.to_string(), ty: "i16".to_string() },
            Constant::Boolean(b) => Val { text: b.to_string(), ty: "i1".to_string() },
            Constant::Char(c) => Val { text: c.to_string(), ty: "i8".to_string() },
            Constant::String(..) => unreachable!("string constants are only ever written, never loaded as a value"),
        }
    }

    fn load_place(&mut self, arena: &IrArena, types: &TypeTable, place: &Place) -> Val {
        if let Place::Plain(Local::Temp(_)) = place {
            return self.pop_temp();
        }
        let addr = self.address_of_place(arena, types, place);
        let elem_ty = addr.ty.trim_end_matches('*').to_string();
        let dst = self.fresh();
        let _ = writeln!(self.out, "  {dst} = load {elem_ty}, {elem_ty}* {}", addr.text);
        Val { text: dst, ty: elem_ty }
    }

    fn store_place(&mut self, arena: &IrArena, types: &TypeTable, place: &Place, val: Val) {
        if let Place::Plain(Local::Temp(_)) = place {
            self.push_temp(val);
            return;
        }
        let addr = self.address_of_place(arena, types, place);
        let elem_ty = addr.ty.trim_end_matches('*').to_string();
        let _ = writeln!(self.out, "  store {elem_ty} {}, {elem_ty}* {}", val.text, addr.text);
    }

    fn check_range(&mut self, arena: &IrArena, types: &TypeTable, local: Local, idx: &Val) {
        self.used.range_trap = true;
        let id = match local {
            Local::Var(id) => id,
            _ => unreachable!("only a plain array variable can be indexed"),
        };
        let (_, length) = types
            .array_parts(arena.item(id).ty)
            .unwrap_or_else(|| unreachable!("indexed local is not an array"));

        let neg = self.fresh();
        let _ = writeln!(self.out, "  {neg} = icmp slt i16 {}, 0", idx.text);
        let hi = self.fresh();
        let _ = writeln!(self.out, "  {hi} = icmp sge i16 {}, {length}", idx.text);
        let bad = self.fresh();
        let _ = writeln!(self.out, "  {bad} = or i1 {neg}, {hi}");
        let trap_block = self.fresh_label();
        let ok_block = self.fresh_label();
        let _ = writeln!(self.out, "  br i1 {bad}, label %{trap_block}, label %{ok_block}");
        let _ = writeln!(self.out, "{trap_block}:");
        self.emit_trap_call("index out of range");
        let _ = writeln!(self.out, "{ok_block}:");
    }

    fn fresh_label(&mut self) -> String {
        let name = format!("b.{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    /// Prints `runtime error: {message}` and exits with the trap's fixed
    /// status code, mirroring `codegen/runtime.rs`'s `emit_trap` (overflow
    /// -> 1, division by zero -> 2, range -> 3).
    fn emit_trap_call(&mut self, kind: &str) {
        let (_, text, global, code) = TRAPS.iter().find(|(k, ..)| *k == kind).expect("unknown trap kind");
        let len = text.len() as u32 + 1;
        match kind {
            "overflow" => self.used.overflow_trap = true,
            "division by 0" => self.used.div0_trap = true,
            "index out of range" => self.used.range_trap = true,
            _ => unreachable!(),
        }
        let _ = writeln!(
            self.out,
            "  call i32 (i8*, ...) @printf(i8* getelementptr ([{len} x i8], [{len} x i8]* {global}, i16 0, i16 0))"
        );
        let _ = writeln!(self.out, "  call void @exit(i32 {code})");
        self.line("  unreachable");
    }

    // -- statements ------------------------------------------------------

    fn emit_stmt(&mut self, arena: &IrArena, types: &TypeTable, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(place, rvalue) => {
                let val = self.emit_rvalue(arena, types, rvalue);
                self.store_place(arena, types, place, val);
            }
            Stmt::Call(callee, args) => {
                let arg_vals: Vec<Val> = args.iter().map(|a| self.address_of_operand(arena, types, a)).collect();
                let arg_text: Vec<String> = arg_vals.iter().map(|v| format!("{} {}", v.ty, v.text)).collect();
                let _ = writeln!(self.out, "  call void {}({})", Self::proc_name(*callee), arg_text.join(", "));
            }
            Stmt::Read(place) => self.emit_read(arena, types, place),
            Stmt::ReadLn => {
                self.used.read_ln = true;
                self.line("  call void @__read_ln()");
            }
            Stmt::Write(value, width) => self.emit_write(arena, types, value, width),
            Stmt::WriteLn => {
                self.line("  call i32 @putchar(i32 10)");
            }
        }
    }

    /// Computes the address to hand a callee for an argument: a plain
    /// variable/param is passed by its own address (matching MPPL's
    /// reference-parameter semantics and CASL2's `push_operand_address`);
    /// a constant or computed temporary is materialized into a fresh
    /// one-word global first, since LLVM has no equivalent of pushing an
    /// anonymous stack cell mid-expression the way CASL2 does.
    fn address_of_operand(&mut self, arena: &IrArena, types: &TypeTable, operand: &Operand) -> Val {
        match operand {
            Operand::Place(place) if !matches!(place, Place::Plain(Local::Temp(_))) => self.address_of_place(arena, types, place),
            _ => {
                let val = self.load_operand(arena, types, operand);
                let slot = format!("@.arg{}", self.next_temp);
                self.next_temp += 1;
                let _ = writeln!(self.pending_globals, "{slot} = global {} {}", val.ty, zero_default(&val.ty));
                let _ = writeln!(self.out, "  store {} {}, {}* {slot}", val.ty, val.text, val.ty);
                Val { text: slot, ty: format!("{}*", val.ty) }
            }
        }
    }

    fn emit_rvalue(&mut self, arena: &IrArena, types: &TypeTable, rvalue: &RValue) -> Val {
        match rvalue {
            RValue::Use(op) => self.load_operand(arena, types, op),
            RValue::Binary(op, lhs, rhs) => {
                let rhs_val = self.load_operand(arena, types, rhs);
                let lhs_val = self.load_operand(arena, types, lhs);
                self.emit_binary(*op, lhs_val, rhs_val)
            }
            RValue::Not(op) => {
                let val = self.load_operand(arena, types, op);
                let dst = self.fresh();
                let _ = writeln!(self.out, "  {dst} = xor i1 {}, true", val.text);
                Val { text: dst, ty: "i1".to_string() }
            }
            RValue::Cast(target, op) => {
                let val = self.load_operand(arena, types, op);
                self.emit_cast(types, *target, val)
            }
        }
    }

    fn emit_binary(&mut self, op: BinOp, lhs: Val, rhs: Val) -> Val {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                self.used.overflow_trap = true;
                let intrinsic = match op {
                    BinOp::Add => "sadd",
                    BinOp::Sub => "ssub",
                    _ => "smul",
                };
                let pair = self.fresh();
                let _ = writeln!(self.out, "  {pair} = call {{ i16, i1 }} @llvm.{intrinsic}.with.overflow.i16(i16 {}, i16 {})", lhs.text, rhs.text);
                let overflowed = self.fresh();
                let _ = writeln!(self.out, "  {overflowed} = extractvalue {{ i16, i1 }} {pair}, 1");
                let trap_block = self.fresh_label();
                let ok_block = self.fresh_label();
                let _ = writeln!(self.out, "  br i1 {overflowed}, label %{trap_block}, label %{ok_block}");
                let _ = writeln!(self.out, "{trap_block}:");
                self.emit_trap_call("overflow");
                let _ = writeln!(self.out, "{ok_block}:");
                let result = self.fresh();
                let _ = writeln!(self.out, "  {result} = extractvalue {{ i16, i1 }} {pair}, 0");
                Val { text: result, ty: "i16".to_string() }
            }
            BinOp::Div => {
                self.used.div0_trap = true;
                let iszero = self.fresh();
                let _ = writeln!(self.out, "  {iszero} = icmp eq i16 {}, 0", rhs.text);
                let trap_block = self.fresh_label();
                let ok_block = self.fresh_label();
                let _ = writeln!(self.out, "  br i1 {iszero}, label %{trap_block}, label %{ok_block}");
                let _ = writeln!(self.out, "{trap_block}:");
                self.emit_trap_call("division by 0");
                let _ = writeln!(self.out, "{ok_block}:");
                let result = self.fresh();
                let _ = writeln!(self.out, "  {result} = sdiv i16 {}, {}", lhs.text, rhs.text);
                Val { text: result, ty: "i16".to_string() }
            }
            BinOp::And => self.bin_i1("and", lhs, rhs),
            BinOp::Or => self.bin_i1("or", lhs, rhs),
            BinOp::Eq => self.cmp("eq", lhs, rhs),
            BinOp::NotEq => self.cmp("ne", lhs, rhs),
            BinOp::Less => self.cmp("slt", lhs, rhs),
            BinOp::LessEq => self.cmp("sle", lhs, rhs),
            BinOp::Greater => self.cmp("sgt", lhs, rhs),
            BinOp::GreaterEq => self.cmp("sge", lhs, rhs),
        }
    }

    fn bin_i1(&mut self, op: &str, lhs: Val, rhs: Val) -> Val {
        let dst = self.fresh();
        let _ = writeln!(self.out, "  {dst} = {op} i1 {}, {}", lhs.text, rhs.text);
        Val { text: dst, ty: "i1".to_string() }
    }

    fn cmp(&mut self, pred: &str, lhs: Val, rhs: Val) -> Val {
        let dst = self.fresh();
        let _ = writeln!(self.out, "  {dst} = icmp {pred} {} {}, {}", lhs.ty, lhs.text, rhs.text);
        Val { text: dst, ty: "i1".to_string() }
    }

    fn emit_cast(&mut self, types: &TypeTable, target: TypeId, val: Val) -> Val {
        if types.is_boolean(target) {
            let dst = self.fresh();
            let zero = if val.ty == "i1" { "false" } else { "0" };
            let _ = writeln!(self.out, "  {dst} = icmp ne {} {}, {zero}", val.ty, val.text);
            return Val { text: dst, ty: "i1".to_string() };
        }
        if val.ty == "i1" {
            // boolean -> boolean is the only cast the checker allows from here.
            return val;
        }
        let target_ty = llvm_type(types, target);
        if val.ty == target_ty {
            return val;
        }
        if val.ty == "i8" && target_ty == "i16" {
            let dst = self.fresh();
            let _ = writeln!(self.out, "  {dst} = zext i8 {} to i16", val.text);
            return Val { text: dst, ty: "i16".to_string() };
        }
        if val.ty == "i16" && target_ty == "i8" {
            let masked = self.fresh();
            let _ = writeln!(self.out, "  {masked} = and i16 {}, 127", val.text);
            let dst = self.fresh();
            let _ = writeln!(self.out, "  {dst} = trunc i16 {masked} to i8");
            return Val { text: dst, ty: "i8".to_string() };
        }
        val
    }

    // -- read/write --------------------------------------------------

    fn emit_read(&mut self, arena: &IrArena, types: &TypeTable, place: &Place) {
        let addr = self.address_of_place(arena, types, place);
        let ty = Self::place_type(arena, types, place);
        if types.is_integer(ty) {
            self.used.read_int = true;
            let _ = writeln!(self.out, "  call void @__read_int(i16* {})", addr.text);
        } else if types.is_char(ty) {
            self.used.read_char = true;
            let _ = writeln!(self.out, "  call void @__read_char(i8* {})", addr.text);
        } else {
            unreachable!("only integer and char can be read");
        }
    }

    fn emit_write(&mut self, arena: &IrArena, types: &TypeTable, value: &Operand, width: &Option<Operand>) {
        let width_val = width.as_ref().map(|w| self.load_operand(arena, types, w));
        match value {
            Operand::Constant(id) if matches!(arena.constant(*id), Constant::String(..)) => {
                self.used.write_str = true;
                let (name, len) = self.string_globals.get(&id.index()).cloned().unwrap_or_else(|| unreachable!());
                let width_text = width_val.map(|v| v.text).unwrap_or_else(|| len.to_string());
                let _ = writeln!(self.out, "  call void @__write_str(i8* getelementptr ([{} x i8], [{} x i8]* {name}, i16 0, i16 0), i16 {len}, i16 {width_text})", len + 1, len + 1);
            }
            _ => {
                let val = self.load_operand(arena, types, value);
                let width_text = width_val.map(|v| v.text).unwrap_or_else(|| "0".to_string());
                match val.ty.as_str() {
                    "i16" => {
                        self.used.write_int = true;
                        let _ = writeln!(self.out, "  call void @__write_int(i16 {}, i16 {width_text})", val.text);
                    }
                    "i1" => {
                        self.used.write_bool = true;
                        let _ = writeln!(self.out, "  call void @__write_bool(i1 {}, i16 {width_text})", val.text);
                    }
                    "i8" => {
                        self.used.write_char = true;
                        let _ = writeln!(self.out, "  call void @__write_char(i8 {}, i16 {width_text})", val.text);
                    }
                    other => unreachable!("unexpected write operand type {other}"),
                }
            }
        }
    }

    /// Appends the on-demand runtime helpers used by this compilation,
    /// mirroring `codegen/runtime.rs`'s `emit_builtins`: only what the
    /// program actually touched is emitted.
    fn emit_runtime_helpers(&mut self) {
        for (kind, text, global, _) in TRAPS {
            let used = match *kind {
                "overflow" => self.used.overflow_trap,
                "division by 0" => self.used.div0_trap,
                "index out of range" => self.used.range_trap,
                _ => unreachable!(),
            };
            if used {
                let (escaped, len) = escape_c_string(text);
                let _ = writeln!(self.out, "{global} = private unnamed_addr constant [{len} x i8] c\"{escaped}\"");
            }
        }
        if self.used.write_int || self.used.write_bool || self.used.write_char || self.used.write_str {
            self.line("@.fmt_d = private unnamed_addr constant [4 x i8] c\"%*d\\00\"");
            self.line("@.fmt_c = private unnamed_addr constant [4 x i8] c\"%*c\\00\"");
            self.line("@.fmt_s = private unnamed_addr constant [4 x i8] c\"%*s\\00\"");
            self.line("@.str_true = private unnamed_addr constant [5 x i8] c\"TRUE\\00\"");
            self.line("@.str_false = private unnamed_addr constant [6 x i8] c\"FALSE\\00\"");
        }
        if self.used.write_int {
            self.line("define void @__write_int(i16 %v, i16 %w) {");
            self.line("  %f = getelementptr [4 x i8], [4 x i8]* @.fmt_d, i16 0, i16 0");
            self.line("  %wi = sext i16 %w to i32");
            self.line("  %vi = sext i16 %v to i32");
            self.line("  call i32 (i8*, ...) @printf(i8* %f, i32 %wi, i32 %vi)");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.write_bool {
            self.line("define void @__write_bool(i1 %v, i16 %w) {");
            self.line("  %s = select i1 %v, i8* getelementptr ([5 x i8], [5 x i8]* @.str_true, i16 0, i16 0), i8* getelementptr ([6 x i8], [6 x i8]* @.str_false, i16 0, i16 0)");
            self.line("  %f = getelementptr [4 x i8], [4 x i8]* @.fmt_s, i16 0, i16 0");
            self.line("  %wi = sext i16 %w to i32");
            self.line("  call i32 (i8*, ...) @printf(i8* %f, i32 %wi, i8* %s)");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.write_char {
            self.line("define void @__write_char(i8 %v, i16 %w) {");
            self.line("  %f = getelementptr [4 x i8], [4 x i8]* @.fmt_c, i16 0, i16 0");
            self.line("  %wi = sext i16 %w to i32");
            self.line("  %vi = sext i8 %v to i32");
            self.line("  call i32 (i8*, ...) @printf(i8* %f, i32 %wi, i32 %vi)");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.write_str {
            self.line("define void @__write_str(i8* %p, i16 %len, i16 %w) {");
            self.line("  %f = getelementptr [4 x i8], [4 x i8]* @.fmt_s, i16 0, i16 0");
            self.line("  %wi = sext i16 %w to i32");
            self.line("  call i32 (i8*, ...) @printf(i8* %f, i32 %wi, i8* %p)");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.read_int {
            self.line("@.fmt_scan_d = private unnamed_addr constant [4 x i8] c\" %hd\\00\"");
            self.line("define void @__read_int(i16* %dst) {");
            self.line("  %f = getelementptr [4 x i8], [4 x i8]* @.fmt_scan_d, i16 0, i16 0");
            self.line("  call i32 (i8*, ...) @scanf(i8* %f, i16* %dst)");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.read_char {
            self.line("define void @__read_char(i8* %dst) {");
            self.line("  %c = call i32 @getchar()");
            self.line("  %c8 = trunc i32 %c to i8");
            self.line("  store i8 %c8, i8* %dst");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
        if self.used.read_ln {
            self.line("define void @__read_ln() {");
            self.line("entry:");
            self.line("  br label %loop");
            self.line("loop:");
            self.line("  %c = call i32 @getchar()");
            self.line("  %is_nl = icmp eq i32 %c, 10");
            self.line("  %is_eof = icmp eq i32 %c, -1");
            self.line("  %done = or i1 %is_nl, %is_eof");
            self.line("  br i1 %done, label %exit, label %loop");
            self.line("exit:");
            self.line("  ret void");
            self.line("}");
            self.line("");
        }
    }
}

fn zero_default(ty: &str) -> &'static str {
    match ty {
        "i1" => "false",
        _ => "0",
    }
}

/// Escapes `text` as an LLVM `c"..."` string constant body, returning the
/// escaped text and the byte length including the trailing NUL.
fn escape_c_string(text: &str) -> (String, u32) {
    let mut out = String::new();
    for byte in text.bytes() {
        match byte {
            b'"' | b'\\' => {
                let _ = write!(out, "\\{byte:02X}");
            }
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{byte:02X}");
            }
        }
    }
    out.push_str("\\00");
    (out, text.len() as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::checker::check;
    use crate::lower::lower;
    use crate::parser::parse;
    use crate::resolver::resolve;

    fn compile(src: &str) -> String {
        let (tree, parse_diags) = parse(src);
        assert!(parse_diags.is_empty(), "{parse_diags:?}");
        let mut intern = StringInterner::new();
        let resolved = resolve(&tree, src, &mut |s| intern.intern(s));
        assert!(resolved.diagnostics.is_empty(), "{:?}", resolved.diagnostics);
        let program = crate::ast::Program::cast(tree).expect("top-level node is a Program");
        let mut types = TypeTable::new();
        let checked = check(&program, src, &resolved.events, &mut types);
        assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
        let lowered = lower(&program, src, &resolved.events, &mut types, &checked, &mut |s| intern.intern(s));
        generate(&lowered.arena, lowered.program_item, &types, &intern)
    }

    #[test]
    fn minimal_program_defines_main_and_returns() {
        let out = compile("program p; begin writeln end.");
        assert!(out.contains("define i32 @main()"));
        assert!(out.contains("call i32 @putchar(i32 10)"));
        assert!(out.contains("ret i32") || out.contains("ret void"));
    }

    #[test]
    fn arithmetic_assignment_uses_overflow_intrinsic() {
        let out = compile("program p; var x: integer; begin x := 1 + 2 * 3 end.");
        assert!(out.contains("llvm.smul.with.overflow.i16"));
        assert!(out.contains("llvm.sadd.with.overflow.i16"));
    }

    #[test]
    fn array_access_emits_range_check() {
        let out = compile("program p; var a: array[4] of integer; begin a[1] := 0 end.");
        assert!(out.contains("icmp slt i16"));
        assert!(out.contains("icmp sge i16"));
    }

    #[test]
    fn division_emits_zero_check_and_sdiv() {
        let out = compile("program p; var x: integer; begin x := 4 div 2 end.");
        assert!(out.contains("icmp eq i16"));
        assert!(out.contains("sdiv i16"));
    }

    #[test]
    fn unused_builtins_are_never_emitted() {
        let out = compile("program p; var x: integer; begin x := 1 end.");
        assert!(!out.contains("@__read_int"));
        assert!(!out.contains("@__write_bool"));
    }
}
