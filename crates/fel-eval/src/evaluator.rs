use std::rc::Rc;

use fel_common::{Diagnostic, Span, Token, TokenKind};
use fel_parser::ast::{
    ArrayAppendStatement, Block, Call, DeclareStatement, ElseBranch, Expression, ForStatement, HtmlAttribute,
    HtmlComponentDefinition, HtmlNode, IfStatement, Operand, OpKind, OpStatement, PostfixItem, ProcedureDefinition,
    ReturnStatement, Stmt, StructField, StructLiteral, TokenList,
};
use rustc_hash::FxHashMap;

use crate::scope::Scope;
use crate::value::{HtmlValue, StructValue, Value};

/// Signals a `return` propagating up out of a block (source:
/// `evaluator/evaluator.go`'s early-return handling for procedure bodies --
/// modeled here as a short-circuiting enum instead of a sentinel/exception
/// since Rust has no unchecked-exception equivalent to reach for).
enum Flow {
    Normal,
    Return(Option<Value>),
}

/// Holds the whole project's definitions so any component or procedure can
/// invoke any other regardless of which file declared it, plus the running
/// diagnostics list for runtime errors (an unresolved identifier slipping
/// past type-checking, division by zero, etc.).
pub struct Evaluator<'a> {
    components: FxHashMap<Rc<str>, &'a HtmlComponentDefinition>,
    component_fields: FxHashMap<Rc<str>, &'a [StructField]>,
    procedures: FxHashMap<Rc<str>, &'a ProcedureDefinition>,
    diagnostics: Vec<Diagnostic>,
    current_file: Rc<str>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        components: FxHashMap<Rc<str>, &'a HtmlComponentDefinition>,
        component_fields: FxHashMap<Rc<str>, &'a [StructField]>,
        procedures: FxHashMap<Rc<str>, &'a ProcedureDefinition>,
    ) -> Self {
        Self {
            components,
            component_fields,
            procedures,
            diagnostics: Vec::new(),
            current_file: Rc::from(""),
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Called by the caller before evaluating each file's top level so any
    /// runtime diagnostic raised along the way is stamped with its origin
    /// (the same file/line/column requirement spec.md §7 places on the
    /// parser and checker; the evaluator is the last stage that can still
    /// fail, e.g. division by zero).
    pub fn set_file(&mut self, path: &str) {
        self.current_file = Rc::from(path);
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(span, message).with_file(self.current_file.clone()));
    }

    /// Evaluates a file's (or a component's) top-level statement list,
    /// collecting any HTML nodes constructed at that level into one
    /// fragment (spec.md §6: a template file's root is implicitly a
    /// fragment of its top-level html statements).
    pub fn eval_top_level(&mut self, block: &Block, scope: &mut Scope) -> Vec<HtmlValue> {
        let mut nodes = Vec::new();
        for stmt in &block.statements {
            let (flow, stmt_nodes) = self.eval_stmt(stmt, scope);
            nodes.extend(stmt_nodes);
            if let Flow::Return(_) = flow {
                self.error(stmt.span(), "`return` is not valid outside a procedure");
            }
        }
        nodes
    }

    /// Runs every statement in `block` in order, threading control flow and
    /// accumulating whatever HTML nodes each statement contributes --
    /// whether that's a direct `Stmt::Html` construction, a bare expression
    /// statement used as a child node (spec.md's `button { "Hi " + Name }`
    /// example), or nodes built inside a nested `if`/`for` (spec.md §4.5:
    /// both are ordinary body-executing constructs, not special forms that
    /// swallow their output).
    fn eval_block(&mut self, block: &Block, scope: &mut Scope) -> (Flow, Vec<HtmlValue>) {
        let mut nodes = Vec::new();
        for stmt in &block.statements {
            let (flow, stmt_nodes) = self.eval_stmt(stmt, scope);
            nodes.extend(stmt_nodes);
            if let Flow::Return(_) = flow {
                return (flow, nodes);
            }
        }
        (Flow::Normal, nodes)
    }

    /// Evaluates one statement, returning both its control-flow effect and
    /// any HTML nodes it produced. A string (or other scalar) result from a
    /// bare expression statement becomes text; an `html`-typed value --
    /// most notably the injected `children` identifier -- splices in
    /// whatever tree it already holds instead of being stringified.
    fn eval_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) -> (Flow, Vec<HtmlValue>) {
        match stmt {
            Stmt::Declare(decl) => {
                self.eval_declare(decl, scope);
                (Flow::Normal, Vec::new())
            }
            Stmt::Op(op) => {
                self.eval_op(op, scope);
                (Flow::Normal, Vec::new())
            }
            Stmt::ArrayAppend(app) => {
                self.eval_array_append(app, scope);
                (Flow::Normal, Vec::new())
            }
            Stmt::If(stmt) => self.eval_if(stmt, scope),
            Stmt::For(stmt) => self.eval_for(stmt, scope),
            Stmt::Return(stmt) => (Flow::Return(stmt.value.as_ref().and_then(|v| self.eval_expr(v, scope))), Vec::new()),
            Stmt::Html(node) => (Flow::Normal, vec![self.eval_html_node(node, scope)]),
            Stmt::Expr(expr) => {
                let nodes = self.eval_expr(expr, scope).map(value_to_child).into_iter().collect();
                (Flow::Normal, nodes)
            }
        }
    }

    fn eval_declare(&mut self, decl: &DeclareStatement, scope: &mut Scope) {
        let value = decl.value.as_ref().and_then(|v| self.eval_expr(v, scope)).unwrap_or(Value::Bool(false));
        scope.declare(decl.name.lexeme.clone(), value);
    }

    fn eval_op(&mut self, op: &OpStatement, scope: &mut Scope) {
        let Some(rhs) = self.eval_expr(&op.value, scope) else { return };
        let name = &op.target.tokens[0].lexeme;
        let new_value = match op.op {
            OpKind::Assign => rhs,
            _ => {
                let Some(current) = self.read_path(&op.target, scope) else { return };
                match self.apply_numeric_op(op.op, &current, &rhs) {
                    Some(v) => v,
                    None => {
                        self.error(op.span, "compound assignment requires numeric operands");
                        return;
                    }
                }
            }
        };
        if op.target.tokens.len() == 1 {
            if !scope.assign(name, new_value) {
                self.error(op.span, format!("assignment to undeclared identifier `{name}`"));
            }
        } else {
            self.error(op.span, "assigning through a field path is not supported");
        }
    }

    fn apply_numeric_op(&self, op: OpKind, lhs: &Value, rhs: &Value) -> Option<Value> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Some(Value::Int(match op {
                OpKind::AddAssign => a + b,
                OpKind::SubAssign => a - b,
                OpKind::MulAssign => a * b,
                OpKind::DivAssign => a.checked_div(*b)?,
                OpKind::Assign => unreachable!(),
            })),
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(match op {
                OpKind::AddAssign => a + b,
                OpKind::SubAssign => a - b,
                OpKind::MulAssign => a * b,
                OpKind::DivAssign => a / b,
                OpKind::Assign => unreachable!(),
            })),
            _ => None,
        }
    }

    fn eval_array_append(&mut self, app: &ArrayAppendStatement, scope: &mut Scope) {
        let Some(value) = self.eval_expr(&app.value, scope) else { return };
        let name = &app.target.tokens[0].lexeme;
        let Some(Value::Array(items)) = scope.lookup(name).cloned() else {
            self.error(app.span, format!("`{name}` is not an array"));
            return;
        };
        let mut items = (*items).clone();
        items.push(value);
        scope.assign(name, Value::Array(Rc::new(items)));
    }

    fn eval_if(&mut self, stmt: &IfStatement, scope: &mut Scope) -> (Flow, Vec<HtmlValue>) {
        let cond = self.eval_expr(&stmt.condition, scope).and_then(|v| v.as_bool()).unwrap_or(false);
        if cond {
            let mut inner = std::mem::take(scope).child();
            let result = self.eval_block(&stmt.then_block, &mut inner);
            *scope = inner.pop();
            result
        } else {
            match stmt.else_branch.as_deref() {
                Some(ElseBranch::If(else_if)) => self.eval_if(else_if, scope),
                Some(ElseBranch::Block(block)) => {
                    let mut inner = std::mem::take(scope).child();
                    let result = self.eval_block(block, &mut inner);
                    *scope = inner.pop();
                    result
                }
                None => (Flow::Normal, Vec::new()),
            }
        }
    }

    fn eval_for(&mut self, stmt: &ForStatement, scope: &mut Scope) -> (Flow, Vec<HtmlValue>) {
        let Some(Value::Array(items)) = self.eval_expr(&stmt.array, scope) else {
            return (Flow::Normal, Vec::new());
        };
        let mut nodes = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let mut inner = std::mem::take(scope).child();
            if let Some(index_name) = &stmt.index_name {
                inner.declare(index_name.lexeme.clone(), Value::Int(index as i64));
            }
            inner.declare(stmt.item_name.lexeme.clone(), item.clone());
            let (flow, stmt_nodes) = self.eval_block(&stmt.body, &mut inner);
            *scope = inner.pop();
            nodes.extend(stmt_nodes);
            if let Flow::Return(_) = flow {
                return (flow, nodes);
            }
        }
        (Flow::Normal, nodes)
    }

    /// Constructs an [`HtmlValue`]: either a primitive element (lowercase
    /// tag) with its body's nodes as children, or a component invocation
    /// (capitalized tag) whose body is bound to the callee's implicit
    /// `children` and whose attributes bind the callee's declared fields
    /// (spec.md §4.4/§6).
    fn eval_html_node(&mut self, node: &HtmlNode, scope: &mut Scope) -> HtmlValue {
        let is_component = node.tag.lexeme.chars().next().is_some_and(|c| c.is_uppercase());
        if is_component {
            self.eval_component_invocation(node, scope)
        } else {
            let attributes = node
                .attributes
                .iter()
                .map(|attr| self.eval_attribute(attr, scope))
                .collect();
            let (_, children) = self.eval_block(
                &Block {
                    statements: node.body.clone(),
                    span: node.span,
                },
                scope,
            );
            HtmlValue::Element {
                tag: Rc::from(node.tag.lexeme.as_str()),
                attributes,
                children,
            }
        }
    }

    fn eval_attribute(&mut self, attr: &HtmlAttribute, scope: &mut Scope) -> (Rc<str>, String) {
        let value = self.eval_expr(&attr.value, scope).map(|v| v.render()).unwrap_or_default();
        (Rc::from(attr.name.lexeme.as_str()), value)
    }

    fn eval_component_invocation(&mut self, node: &HtmlNode, scope: &mut Scope) -> HtmlValue {
        let name: Rc<str> = Rc::from(node.tag.lexeme.as_str());
        let Some(def) = self.components.get(&name).copied() else {
            self.error(node.tag.span, format!("unknown component `{}`", node.tag.lexeme));
            return HtmlValue::Fragment(Vec::new());
        };

        let mut component_scope = Scope::root();
        let fields: &[StructField] = self.component_fields.get(&name).copied().unwrap_or(&[]);
        for field in fields {
            let default = field.default.as_ref().and_then(|d| self.eval_expr(d, scope));
            if let Some(value) = default {
                component_scope.declare(field.name.lexeme.clone(), value);
            }
        }
        for attr in &node.attributes {
            if let Some(value) = self.eval_expr(&attr.value, scope) {
                component_scope.declare(attr.name.lexeme.clone(), value);
            }
        }

        let (_, children) = self.eval_block(
            &Block {
                statements: node.body.clone(),
                span: node.span,
            },
            scope,
        );
        component_scope.declare("children", Value::Html(Rc::new(HtmlValue::Fragment(children))));

        let (_, nodes) = self.eval_block(&def.body, &mut component_scope);
        HtmlValue::Fragment(nodes)
    }

    fn eval_call(&mut self, call: &Call, scope: &mut Scope) -> Option<Value> {
        let name: Rc<str> = Rc::from(call.name.lexeme.as_str());
        let def = *self.procedures.get(&name)?;
        let args: Vec<Value> = call.args.iter().filter_map(|a| self.eval_expr(a, scope)).collect();
        let mut call_scope = Scope::root();
        for (param, value) in def.params.iter().zip(args.into_iter()) {
            call_scope.declare(param.name.lexeme.clone(), value);
        }
        let (flow, _) = self.eval_block(&def.body, &mut call_scope);
        match flow {
            Flow::Return(value) => value,
            Flow::Normal => None,
        }
    }

    fn read_path(&mut self, path: &TokenList, scope: &Scope) -> Option<Value> {
        let mut value = scope.lookup(&path.tokens[0].lexeme).cloned()?;
        for field_tok in &path.tokens[1..] {
            value = match value {
                Value::Struct(s) => s.fields.get(field_tok.lexeme.as_str())?.clone(),
                _ => return None,
            };
        }
        Some(value)
    }

    /// Walks the postfix sequence with a value stack, mirroring the type
    /// checker's type-stack walk over the same representation (spec.md §9).
    pub(crate) fn eval_expr(&mut self, expr: &Expression, scope: &mut Scope) -> Option<Value> {
        let mut stack: Vec<Value> = Vec::new();
        for item in &expr.postfix {
            match item {
                PostfixItem::Operand(operand) => stack.push(self.eval_operand(operand, scope)?),
                PostfixItem::UnaryOperator(tok) => {
                    let operand = stack.pop()?;
                    stack.push(self.eval_unary(tok, operand, expr.span)?);
                }
                PostfixItem::Operator(tok) => {
                    let rhs = stack.pop()?;
                    let lhs = stack.pop()?;
                    stack.push(self.eval_binary(tok, lhs, rhs, expr.span)?);
                }
            }
        }
        stack.pop()
    }

    fn eval_unary(&mut self, tok: &Token, operand: Value, span: Span) -> Option<Value> {
        match (tok.kind, &operand) {
            (TokenKind::Bang, Value::Bool(b)) => Some(Value::Bool(!b)),
            (TokenKind::Minus, Value::Int(n)) => Some(Value::Int(-n)),
            (TokenKind::Minus, Value::Float(f)) => Some(Value::Float(-f)),
            _ => {
                self.error(span, format!("cannot apply unary `{}` to a `{}`", tok.lexeme, operand.type_name()));
                None
            }
        }
    }

    fn eval_binary(&mut self, tok: &Token, lhs: Value, rhs: Value, span: Span) -> Option<Value> {
        use Value::*;
        Some(match (tok.kind, lhs, rhs) {
            (TokenKind::Plus, Int(a), Int(b)) => Int(a + b),
            (TokenKind::Plus, Float(a), Float(b)) => Float(a + b),
            (TokenKind::Plus, String(a), String(b)) => Value::String(Rc::from(format!("{a}{b}"))),
            (TokenKind::Minus, Int(a), Int(b)) => Int(a - b),
            (TokenKind::Minus, Float(a), Float(b)) => Float(a - b),
            (TokenKind::Star, Int(a), Int(b)) => Int(a * b),
            (TokenKind::Star, Float(a), Float(b)) => Float(a * b),
            (TokenKind::Slash, Int(a), Int(b)) => {
                if b == 0 {
                    self.error(span, "division by zero");
                    return None;
                }
                Int(a / b)
            }
            (TokenKind::Slash, Float(a), Float(b)) => Float(a / b),
            (TokenKind::Percent, Int(a), Int(b)) => Int(a % b),
            (TokenKind::EqEq, a, b) => Bool(a == b),
            (TokenKind::NotEq, a, b) => Bool(a != b),
            (TokenKind::Lt, Int(a), Int(b)) => Bool(a < b),
            (TokenKind::Lt, Float(a), Float(b)) => Bool(a < b),
            (TokenKind::Gt, Int(a), Int(b)) => Bool(a > b),
            (TokenKind::Gt, Float(a), Float(b)) => Bool(a > b),
            (TokenKind::LtEq, Int(a), Int(b)) => Bool(a <= b),
            (TokenKind::LtEq, Float(a), Float(b)) => Bool(a <= b),
            (TokenKind::GtEq, Int(a), Int(b)) => Bool(a >= b),
            (TokenKind::GtEq, Float(a), Float(b)) => Bool(a >= b),
            (TokenKind::AmpAmp, Bool(a), Bool(b)) => Bool(a && b),
            (TokenKind::PipePipe, Bool(a), Bool(b)) => Bool(a || b),
            (_, lhs, rhs) => {
                self.error(span, format!("cannot apply `{}` to `{}` and `{}`", tok.lexeme, lhs.type_name(), rhs.type_name()));
                return None;
            }
        })
    }

    fn eval_operand(&mut self, operand: &Operand, scope: &mut Scope) -> Option<Value> {
        match operand {
            Operand::Literal(tok) => Some(self.eval_literal(tok)),
            Operand::Identifier(tok) => {
                let value = scope.lookup(&tok.lexeme).cloned();
                if value.is_none() {
                    self.error(tok.span, format!("undeclared identifier `{}`", tok.lexeme));
                }
                value
            }
            Operand::Path(path) => {
                let value = self.read_path(path, scope);
                if value.is_none() {
                    self.error(path.span, format!("cannot resolve `{}`", path.tokens.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>().join(".")));
                }
                value
            }
            Operand::Call(call) => {
                let value = self.eval_call(call, scope);
                if value.is_none() {
                    self.error(call.span, format!("`{}` did not return a value", call.name.lexeme));
                }
                value
            }
            Operand::Struct(lit) => Some(self.eval_struct_literal(lit, scope)),
            Operand::Array(lit) => {
                let items: Vec<Value> = lit.elements.iter().filter_map(|e| self.eval_expr(e, scope)).collect();
                Some(Value::Array(Rc::new(items)))
            }
        }
    }

    fn eval_literal(&self, tok: &Token) -> Value {
        match tok.kind {
            TokenKind::String => Value::String(Rc::from(crate::unquote(&tok.lexeme))),
            TokenKind::Number => {
                if tok.lexeme.contains('.') {
                    Value::Float(tok.lexeme.parse().unwrap_or(0.0))
                } else {
                    Value::Int(tok.lexeme.parse().unwrap_or(0))
                }
            }
            TokenKind::KwTrue => Value::Bool(true),
            TokenKind::KwFalse => Value::Bool(false),
            _ => Value::String(Rc::from(tok.lexeme.as_str())),
        }
    }

    fn eval_struct_literal(&mut self, lit: &StructLiteral, scope: &mut Scope) -> Value {
        let type_name: Rc<str> = lit.type_name.as_ref().map(|t| Rc::from(t.lexeme.as_str())).unwrap_or_else(|| Rc::from(""));
        let mut fields = FxHashMap::default();
        for field in &lit.fields {
            if let Some(value) = self.eval_expr(&field.value, scope) {
                fields.insert(Rc::from(field.name.lexeme.as_str()), value);
            }
        }
        Value::Struct(Rc::new(StructValue { type_name, fields }))
    }
}

/// Turns a bare expression statement's result into the child node it
/// contributes: an already-built tree (the `children` binding, or any other
/// html-typed value) splices in unchanged, everything else renders to text.
fn value_to_child(value: Value) -> HtmlValue {
    match value {
        Value::Html(html) => (*html).clone(),
        other => HtmlValue::Text(other.render()),
    }
}
