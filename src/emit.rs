//! `Emitter`: pure serialization of the IR to source text (`spec.md`
//! §4.10).
//!
//! Grounded on `examples/original_source/src/sym_table.cpp` and
//! `src/expr.cpp`'s `emit_*` methods. The emitter never evaluates
//! anything — every value it prints was already computed (and checked
//! UB-free) by [`crate::expr`]'s constructors.

use crate::expr::Expr;
use crate::options::LangStd;
use crate::stmt::{IfStmt, Scope, Stmt};
use crate::types::{ArrayKind, MemberType, ScalarKind, StructType, TypeRegistry};
use crate::value::{BinOp, TypedValue, UnOp};

/// Serializes IR nodes to C/C++ source text for a fixed [`TypeRegistry`]
/// and [`LangStd`].
pub struct Emitter<'a> {
    pub reg: &'a TypeRegistry,
    pub lang: LangStd,
}

impl<'a> Emitter<'a> {
    pub fn new(reg: &'a TypeRegistry, lang: LangStd) -> Self {
        Self { reg, lang }
    }

    /// The source-level type name of `kind` under this emitter's
    /// standard.
    pub fn type_name(&self, kind: ScalarKind) -> &'static str {
        if kind == ScalarKind::Bool && !self.lang.is_cpp() {
            "int"
        } else {
            self.reg.describe(kind).source_name
        }
    }

    /// Emit a standalone typed constant (`spec.md` §4.10: a signed
    /// minimum value is emitted as `(MIN+1 − 1)` to avoid a literal the
    /// target language can't parse directly as a single token).
    pub fn emit_const(&self, value: TypedValue) -> String {
        let desc = value.descriptor(self.reg);
        if desc.kind.is_float() {
            return format!("{}{}", value.as_f64(), desc.literal_suffix);
        }
        let v = value.as_i128(self.reg);
        if desc.is_signed && v == desc.min_i128() {
            format!("({}{} - 1)", v + 1, desc.literal_suffix)
        } else {
            format!("{v}{}", desc.literal_suffix)
        }
    }

    fn binop_symbol(op: BinOp) -> &'static str {
        match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::LogAnd => "&&",
            BinOp::LogOr => "||",
        }
    }

    /// Emit one expression node (`spec.md` §4.10: binary/unary nodes are
    /// always fully parenthesized; casts are spelled `(T)(expr)`).
    pub fn emit_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Const(v) => self.emit_const(*v),
            Expr::VarUse(var) => var.name().to_string(),
            Expr::MemberAccess(_, path) => path.to_string(),
            Expr::Unary(u) => {
                let child = self.emit_expr(&u.child);
                match u.op {
                    UnOp::Plus => format!("(+{child})"),
                    UnOp::Minus => format!("(-{child})"),
                    UnOp::BitNot => format!("(~{child})"),
                    UnOp::LogNot => format!("(!{child})"),
                    UnOp::PreInc => format!("(++{child})"),
                    UnOp::PreDec => format!("(--{child})"),
                    UnOp::PostInc => format!("({child}++)"),
                    UnOp::PostDec => format!("({child}--)"),
                }
            }
            Expr::Binary(b) => {
                let lhs = self.emit_expr(&b.lhs);
                let rhs = self.emit_expr(&b.rhs);
                format!("({lhs} {} {rhs})", Self::binop_symbol(b.op))
            }
            Expr::Ternary(t) => {
                let cond = self.emit_expr(&t.cond);
                let then_e = self.emit_expr(&t.then_branch);
                let else_e = self.emit_expr(&t.else_branch);
                format!("({cond} ? {then_e} : {else_e})")
            }
            Expr::Cast(c) => {
                let child = self.emit_expr(&c.child);
                format!("(({})({child}))", self.type_name(c.target))
            }
            Expr::Assign(a) => {
                let place = self.emit_expr(&a.place);
                let value = self.emit_expr(&a.value);
                format!("({place} = {value})")
            }
            Expr::Cse(inner) => self.emit_expr(inner),
        }
    }

    /// The source-level spelling of a struct member or array element
    /// type: a scalar's type name, or a nested struct's type name.
    pub fn member_type_name(&self, member: &MemberType) -> String {
        match member {
            MemberType::Scalar(kind) => self.type_name(*kind).to_string(),
            MemberType::Struct(ty) => ty.name.clone(),
        }
    }

    /// Emit a struct type's definition (`spec.md` §4.3: instance members
    /// in declaration order, bit-field members carry a `: width`
    /// suffix, static members carry a `static` qualifier — emitted
    /// `inline static` under C++ since in-class initializers need it,
    /// plain `static` under C since the out-of-line definition lives in
    /// the init source). Nested struct members assume their own type was
    /// already emitted earlier (`src/harness.rs` emits struct types in
    /// dependency order, shallowest first).
    pub fn emit_struct_def(&self, ty: &StructType) -> String {
        let mut out = format!("struct {} {{\n", ty.name);
        for member in &ty.members {
            let field_type = self.member_type_name(&member.ty);
            let storage = if member.is_static {
                if self.lang.is_cpp() { "inline static " } else { "static " }
            } else {
                ""
            };
            match member.bitfield_width {
                Some(width) => out.push_str(&format!("    {storage}{field_type} {} : {width};\n", member.name)),
                None => out.push_str(&format!("    {storage}{field_type} {};\n", member.name)),
            }
        }
        out.push_str("};\n");
        out
    }

    /// Emit the element-access spelling for `kind`, used by array
    /// declarations; semantics-neutral (`spec.md` §4.3 edge case).
    pub fn array_declarator(&self, kind: ArrayKind, element_type: &str, name: &str, count: usize) -> String {
        match kind {
            ArrayKind::CArray => format!("{element_type} {name}[{count}]"),
            ArrayKind::DynamicVector => format!("std::vector<{element_type}> {name}({count})"),
            ArrayKind::FixedArray => format!("std::array<{element_type}, {count}> {name}"),
            ArrayKind::Valarray => format!("std::valarray<{element_type}> {name}({count})"),
        }
    }

    fn emit_stmt(&self, stmt: &Stmt, indent: usize, out: &mut String) {
        let pad = "    ".repeat(indent);
        match stmt {
            Stmt::Decl(decl) => {
                let ty = self.type_name(decl.var.kind());
                match &decl.initializer {
                    Some(init) => out.push_str(&format!("{pad}{ty} {} = {};\n", decl.var.name(), self.emit_expr(init))),
                    None => out.push_str(&format!("{pad}{ty} {};\n", decl.var.name())),
                }
            }
            Stmt::ExprStmt(e) => out.push_str(&format!("{pad}{};\n", self.emit_expr(e))),
            Stmt::If(if_stmt) => self.emit_if(if_stmt, indent, out),
        }
    }

    fn emit_if(&self, if_stmt: &IfStmt, indent: usize, out: &mut String) {
        let pad = "    ".repeat(indent);
        out.push_str(&format!("{pad}if ({}) {{\n", self.emit_expr(&if_stmt.cond)));
        self.emit_scope_body(&if_stmt.then_scope, indent + 1, out);
        out.push_str(&format!("{pad}}}\n"));
        if let Some(else_scope) = &if_stmt.else_scope {
            out.push_str(&format!("{pad}else {{\n"));
            self.emit_scope_body(else_scope, indent + 1, out);
            out.push_str(&format!("{pad}}}\n"));
        }
    }

    fn emit_scope_body(&self, scope: &Scope, indent: usize, out: &mut String) {
        for stmt in &scope.stmts {
            self.emit_stmt(stmt, indent, out);
        }
    }

    /// Emit a whole function body scope as a brace-delimited block at the
    /// given indentation.
    pub fn emit_scope(&self, scope: &Scope, indent: usize) -> String {
        let mut out = String::new();
        self.emit_scope_body(scope, indent, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BitMode;

    fn reg() -> TypeRegistry {
        TypeRegistry::new(BitMode::Mode64)
    }

    #[test]
    fn signed_minimum_constant_avoids_bare_min_literal() {
        let reg = reg();
        let emitter = Emitter::new(&reg, LangStd::Cxx17);
        let min = TypedValue::from_i128(&reg, ScalarKind::SInt, i32::MIN as i128);
        assert_eq!(emitter.emit_const(min), "(-2147483647 - 1)");
    }

    #[test]
    fn binary_and_unary_nodes_are_always_parenthesized() {
        let reg = reg();
        let emitter = Emitter::new(&reg, LangStd::Cxx17);
        let one = Expr::new_const(TypedValue::from_i128(&reg, ScalarKind::SInt, 1));
        let two = Expr::new_const(TypedValue::from_i128(&reg, ScalarKind::SInt, 2));
        let sum = Expr::new_binary(&reg, BinOp::Add, one, two);
        assert_eq!(emitter.emit_expr(&sum), "(1 + 2)");

        let neg = Expr::new_unary(&reg, UnOp::Minus, Expr::new_const(TypedValue::from_i128(&reg, ScalarKind::SInt, 5)));
        assert_eq!(emitter.emit_expr(&neg), "(-5)");
    }

    #[test]
    fn cast_emits_c_style_parenthesized_form() {
        let reg = reg();
        let emitter = Emitter::new(&reg, LangStd::Cxx17);
        let child = Expr::new_const(TypedValue::from_i128(&reg, ScalarKind::SInt, 300));
        let cast = Expr::new_cast(&reg, ScalarKind::UChar, child);
        assert_eq!(emitter.emit_expr(&cast), "((unsigned char)(300))");
    }
}
