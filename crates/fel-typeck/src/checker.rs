use std::rc::Rc;

use fel_common::{Diagnostic, Span, Token, TokenKind};
use fel_parser::ast::{
    ArrayAppendStatement, Block, Call, CssConfigDefinition, CssDefinition, DeclareStatement, ElseBranch, Expression,
    File, ForStatement, HtmlAttribute, HtmlComponentDefinition, HtmlNode, IfStatement, NodeId, Operand, OpKind,
    OpStatement, PostfixItem, ProcedureDefinition, ReturnStatement, Stmt, StructDefinition, StructLiteral, TokenList,
    TopLevelItem, TypeRef,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::scope::Scope;
use crate::type_info::{ProcedureShape, StructFieldShape, StructShape, TypeInfo, TypeRegistry};

/// One HTML component's resolved shape: its field list (from its leading
/// declarations or an associated top-level `:: struct`) and the set of
/// other component names its body invokes, used for the dependency
/// closure / cycle check (spec.md §4.4 stage 4).
///
/// `properties` holds the raw, unresolved leading declarations collected
/// in stage 1; `fields` is filled in during stage 2, once every top-level
/// struct has also been collected, so a component defined before its
/// sibling struct (or vice versa) still resolves correctly.
struct ComponentInfo {
    properties: Option<Vec<fel_parser::ast::StructField>>,
    fields: Vec<StructFieldShape>,
    dependencies: FxHashSet<Rc<str>>,
    span: Span,
    file: Rc<str>,
}

/// Runs the six-stage global type check described in spec.md §4.4 over every
/// parsed file in a project and produces the annotated side tables the
/// evaluator consumes.
pub struct TypeChecker {
    registry: TypeRegistry,
    diagnostics: Vec<Diagnostic>,
    node_types: FxHashMap<NodeId, TypeInfo>,
    /// Resolved callee for each `HtmlNode` whose tag names an `:: html`
    /// component rather than a primitive HTML5 element.
    node_html_defs: FxHashMap<NodeId, Rc<str>>,
    components: FxHashMap<Rc<str>, ComponentInfo>,
    css_definitions: FxHashMap<Rc<str>, CssDefinition>,
    css_configs: FxHashMap<Rc<str>, (CssConfigDefinition, Rc<str>)>,
    /// Where each top-level `:: struct` / `:: procedure` / named `:: css` /
    /// `:: css_config` was first declared, so a same-named redeclaration can
    /// be reported with exactly two diagnostics (spec.md §8) instead of
    /// silently overwriting the registry entry.
    struct_spans: FxHashMap<Rc<str>, (Span, Rc<str>)>,
    procedure_spans: FxHashMap<Rc<str>, (Span, Rc<str>)>,
    css_spans: FxHashMap<Rc<str>, (Span, Rc<str>)>,
    css_config_spans: FxHashMap<Rc<str>, (Span, Rc<str>)>,
    /// The file currently being visited, stamped onto every diagnostic
    /// `error()` emits so a multi-file check still reports file/line/column
    /// (spec.md §7) even though it walks every file's AST in one pass.
    current_file: Rc<str>,
}

/// Emits the spec's "two diagnostics, one per occurrence" pair the first
/// time `name` collides with an entry already in `tracker`; returns `false`
/// in that case so the caller can skip registering the duplicate. Takes its
/// fields as separate borrows (rather than `&mut self`) so it can be called
/// from a method that also needs `&mut self.registry`/`&mut self.diagnostics`
/// disjointly.
fn record_first_or_duplicate(
    diagnostics: &mut Vec<Diagnostic>,
    tracker: &mut FxHashMap<Rc<str>, (Span, Rc<str>)>,
    current_file: &Rc<str>,
    name: &Rc<str>,
    span: Span,
) -> bool {
    if let Some((prev_span, prev_file)) = tracker.get(name).cloned() {
        diagnostics.push(Diagnostic::error(prev_span, format!("`{name}` is already defined")).with_file(prev_file));
        diagnostics.push(Diagnostic::error(span, format!("`{name}` is already defined")).with_file(current_file.clone()));
        false
    } else {
        tracker.insert(name.clone(), (span, current_file.clone()));
        true
    }
}

/// The result of a completed check: diagnostics plus the annotations the
/// evaluator needs to walk the same AST the parser produced.
pub struct CheckedProgram {
    pub diagnostics: Vec<Diagnostic>,
    pub node_types: FxHashMap<NodeId, TypeInfo>,
    pub node_html_defs: FxHashMap<NodeId, Rc<str>>,
    pub registry: TypeRegistry,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            diagnostics: Vec::new(),
            node_types: FxHashMap::default(),
            node_html_defs: FxHashMap::default(),
            components: FxHashMap::default(),
            css_definitions: FxHashMap::default(),
            css_configs: FxHashMap::default(),
            struct_spans: FxHashMap::default(),
            procedure_spans: FxHashMap::default(),
            css_spans: FxHashMap::default(),
            css_config_spans: FxHashMap::default(),
            current_file: Rc::from(""),
        }
    }

    pub fn check_project(mut self, files: &[File]) -> CheckedProgram {
        self.collect_definitions(files);
        self.associate_sibling_definitions();
        self.check_component_bodies(files);
        self.check_dependency_cycles();
        self.check_css_config_orphans();
        self.check_file_bodies(files);

        CheckedProgram {
            diagnostics: self.diagnostics,
            node_types: self.node_types,
            node_html_defs: self.node_html_defs,
            registry: self.registry,
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(span, message).with_file(self.current_file.clone()));
    }

    // ---- stage 1: collect top-level definitions -------------------------

    fn collect_definitions(&mut self, files: &[File]) {
        for file in files {
            self.current_file = Rc::from(file.path.as_str());
            for item in &file.items {
                match item {
                    TopLevelItem::Struct(def) => self.collect_struct(def),
                    TopLevelItem::Procedure(def) => self.collect_procedure(def),
                    TopLevelItem::Html(def) => self.collect_html_shell(def),
                    TopLevelItem::Css(def) => {
                        // Anonymous `:: css` is allowed any number of times
                        // (spec.md §4.4 stage 1) -- only a named one can
                        // collide with another of the same name.
                        if let Some(name) = &def.name {
                            let key: Rc<str> = Rc::from(name.lexeme.as_str());
                            if record_first_or_duplicate(&mut self.diagnostics, &mut self.css_spans, &self.current_file, &key, name.span) {
                                self.css_definitions.insert(key, def.clone());
                            }
                        }
                    }
                    TopLevelItem::CssConfig(def) => {
                        if let Some(name) = &def.name {
                            let key: Rc<str> = Rc::from(name.lexeme.as_str());
                            if record_first_or_duplicate(&mut self.diagnostics, &mut self.css_config_spans, &self.current_file, &key, name.span) {
                                self.css_configs.insert(key, (def.clone(), self.current_file.clone()));
                            }
                        }
                    }
                    TopLevelItem::Statement(_) => {}
                }
            }
        }
    }

    fn collect_struct(&mut self, def: &StructDefinition) {
        let Some(name) = &def.name else {
            self.error(def.span, "a top-level struct definition must be named");
            return;
        };
        let key: Rc<str> = Rc::from(name.lexeme.as_str());
        if !record_first_or_duplicate(&mut self.diagnostics, &mut self.struct_spans, &self.current_file, &key, name.span) {
            return;
        }
        let shape = self.struct_shape_from_fields(&def.fields);
        self.registry.register_struct(key, shape);
    }

    /// Builds a `StructShape` from a parsed field list, used both for a
    /// top-level `:: struct` and for a component's leading declarations.
    /// Two fields sharing a name within the same list are reported with the
    /// same two-diagnostics pattern as any other duplicate declaration
    /// (spec.md §4.4 stage 3).
    fn struct_shape_from_fields(&mut self, fields: &[fel_parser::ast::StructField]) -> StructShape {
        let mut shape_fields = Vec::with_capacity(fields.len());
        let mut seen: FxHashMap<&str, Span> = FxHashMap::default();
        for field in fields {
            let ty = self.resolve_type_ref(&field.type_ref);
            if let Some(prev_span) = seen.get(field.name.lexeme.as_str()).copied() {
                self.error(prev_span, format!("field `{}` is already declared", field.name.lexeme));
                self.error(field.name.span, format!("field `{}` is already declared", field.name.lexeme));
            } else {
                seen.insert(field.name.lexeme.as_str(), field.name.span);
            }
            shape_fields.push(StructFieldShape {
                name: Rc::from(field.name.lexeme.as_str()),
                ty,
                has_default: field.default.is_some(),
                span: field.name.span,
            });
        }
        StructShape { fields: shape_fields }
    }

    fn collect_procedure(&mut self, def: &ProcedureDefinition) {
        let key: Rc<str> = Rc::from(def.name.lexeme.as_str());
        if !record_first_or_duplicate(&mut self.diagnostics, &mut self.procedure_spans, &self.current_file, &key, def.name.span) {
            return;
        }
        let params = def
            .params
            .iter()
            .map(|p| (Rc::from(p.name.lexeme.as_str()), self.resolve_type_ref(&p.type_ref)))
            .collect();
        let return_type = def.return_type.as_ref().map(|t| self.resolve_type_ref(t));
        self.registry.register_procedure(key, ProcedureShape { params, return_type });
    }

    /// Registers the component's raw field declarations before bodies are
    /// checked, so forward references between components (A renders B which
    /// renders A's sibling) resolve regardless of declaration order. The
    /// resolved `fields` are filled in later by `associate_sibling_definitions`,
    /// once every top-level struct in the project has also been collected.
    fn collect_html_shell(&mut self, def: &HtmlComponentDefinition) {
        let Some(name) = &def.name else {
            self.error(def.span, "a top-level html definition must be named");
            return;
        };
        let key: Rc<str> = Rc::from(name.lexeme.as_str());
        if let Some(existing) = self.components.get(&key) {
            let prev_span = existing.span;
            let prev_file = existing.file.clone();
            self.diagnostics
                .push(Diagnostic::error(prev_span, format!("`{key}` is already defined")).with_file(prev_file));
            self.error(name.span, format!("`{key}` is already defined"));
            return;
        }
        self.components.insert(
            key,
            ComponentInfo {
                properties: def.properties.as_ref().map(|p| p.fields.clone()),
                fields: Vec::new(),
                dependencies: FxHashSet::default(),
                span: def.span,
                file: self.current_file.clone(),
            },
        );
    }

    // ---- stage 2: associate each component with its field shape ---------

    /// Resolves every component's field list now that stage 1 has finished
    /// collecting every top-level struct and component in the project
    /// (spec.md §4.4 stage 2, "Associate sibling definitions"). Also rejects
    /// a component that declares both an inline field block and a same-named
    /// top-level `:: struct`, and rejects `children` as a field name.
    fn associate_sibling_definitions(&mut self) {
        let names: Vec<Rc<str>> = self.components.keys().cloned().collect();
        for name in names {
            let (properties, span, file) = {
                let info = self.components.get(&name).expect("name came from components.keys()");
                (info.properties.clone(), info.span, info.file.clone())
            };
            self.current_file = file;
            let has_top_level_struct = self.registry.has_struct(&name);
            if properties.is_some() && has_top_level_struct {
                self.error(
                    span,
                    format!("`{name}` has both a top-level `:: struct` and an inline field declaration; use only one"),
                );
            }
            let fields = if let Some(props) = &properties {
                self.struct_shape_from_fields(props).fields
            } else if let Some(shape) = self.registry.struct_shape(&name) {
                shape.fields.clone()
            } else {
                Vec::new()
            };
            for field in &fields {
                if field.name.as_ref() == "children" {
                    self.error(field.span, "`children` is a reserved name and cannot be used as a component field");
                }
            }
            if let Some(info) = self.components.get_mut(&name) {
                info.fields = fields;
            }
        }
    }

    fn resolve_type_ref(&mut self, type_ref: &TypeRef) -> TypeInfo {
        match self.registry.resolve(&type_ref.name.lexeme, type_ref.array_depth) {
            Some(ty) => ty,
            None => {
                self.error(type_ref.span, format!("unknown type `{}`", type_ref.name.lexeme));
                TypeInfo::Struct(Rc::from(type_ref.name.lexeme.as_str()))
            }
        }
    }

    // ---- stage 2/3: check each component body, recording dependencies ---

    fn check_component_bodies(&mut self, files: &[File]) {
        for file in files {
            self.current_file = Rc::from(file.path.as_str());
            for item in &file.items {
                if let TopLevelItem::Html(def) = item {
                    self.check_component_body(def);
                }
            }
        }
    }

    fn check_component_body(&mut self, def: &HtmlComponentDefinition) {
        let Some(name) = &def.name else { return };
        let name: Rc<str> = Rc::from(name.lexeme.as_str());
        let mut scope = Scope::root();
        if let Some(info) = self.components.get(&name) {
            for field in info.fields.clone() {
                scope.declare(field.name.to_string(), field.ty.clone(), field.span);
            }
        }
        // `children` is implicitly bound to a fragment value inside every
        // component body (spec.md §4.4). A field actually named `children`
        // is rejected in `associate_sibling_definitions`, so this never
        // shadows a user declaration silently.
        scope.declare("children", TypeInfo::Struct(Rc::from("Fragment")), def.span);

        let mut dependencies = FxHashSet::default();
        self.check_block(&def.body, &mut scope, &mut dependencies, None);

        if let Some(info) = self.components.get_mut(&name) {
            info.dependencies = dependencies;
        }
    }

    // ---- stage 4: dependency closure + cycle detection -------------------

    fn check_dependency_cycles(&mut self) {
        let names: Vec<Rc<str>> = self.components.keys().cloned().collect();
        for name in names {
            let mut visiting = FxHashSet::default();
            let mut stack = Vec::new();
            self.walk_dependency(&name, &mut visiting, &mut stack);
        }
    }

    fn walk_dependency(&mut self, name: &Rc<str>, visiting: &mut FxHashSet<Rc<str>>, stack: &mut Vec<Rc<str>>) {
        if stack.iter().any(|n| n == name) {
            let (span, file) = self
                .components
                .get(name)
                .map(|c| (c.span, c.file.clone()))
                .unwrap_or((Span::point(0), Rc::from("")));
            self.current_file = file;
            self.error(
                span,
                format!(
                    "component dependency cycle: {} -> {}",
                    stack.iter().map(|n| n.as_ref()).collect::<Vec<_>>().join(" -> "),
                    name
                ),
            );
            return;
        }
        if !visiting.insert(name.clone()) {
            return;
        }
        stack.push(name.clone());
        let deps: Vec<Rc<str>> = self
            .components
            .get(name)
            .map(|c| c.dependencies.iter().cloned().collect())
            .unwrap_or_default();
        for dep in deps {
            self.walk_dependency(&dep, visiting, stack);
        }
        stack.pop();
    }

    // ---- stage 5: css_config orphan check --------------------------------

    fn check_css_config_orphans(&mut self) {
        let orphans: Vec<(Rc<str>, Span, Rc<str>)> = self
            .css_configs
            .iter()
            .filter(|(name, _)| !self.css_definitions.contains_key(name.as_ref()) && !self.components.contains_key(name.as_ref()))
            .map(|(name, (def, file))| (name.clone(), def.span, file.clone()))
            .collect();
        for (name, span, file) in orphans {
            self.current_file = file;
            self.error(
                span,
                format!("`{name} :: css_config` has no matching `:: css` or `:: html` definition named `{name}`"),
            );
        }
    }

    // ---- stage 6: re-check every file's top-level statement body --------

    fn check_file_bodies(&mut self, files: &[File]) {
        for file in files {
            self.current_file = Rc::from(file.path.as_str());
            let mut scope = Scope::root();
            let mut deps = FxHashSet::default();
            for item in &file.items {
                if let TopLevelItem::Statement(stmt) = item {
                    self.check_stmt(stmt, &mut scope, &mut deps, None);
                }
            }
        }
    }

    // ---- statement/expression checking -----------------------------------

    fn check_block(
        &mut self,
        block: &Block,
        scope: &mut Scope,
        deps: &mut FxHashSet<Rc<str>>,
        return_type: Option<&TypeInfo>,
    ) {
        for stmt in &block.statements {
            self.check_stmt(stmt, scope, deps, return_type);
        }
    }

    fn check_stmt(
        &mut self,
        stmt: &Stmt,
        scope: &mut Scope,
        deps: &mut FxHashSet<Rc<str>>,
        return_type: Option<&TypeInfo>,
    ) {
        match stmt {
            Stmt::Declare(decl) => self.check_declare(decl, scope, deps),
            Stmt::Op(op) => self.check_op(op, scope, deps),
            Stmt::ArrayAppend(app) => self.check_array_append(app, scope, deps),
            Stmt::If(stmt) => self.check_if(stmt, scope, deps, return_type),
            Stmt::For(stmt) => self.check_for(stmt, scope, deps, return_type),
            Stmt::Return(stmt) => self.check_return(stmt, scope, deps, return_type),
            Stmt::Html(node) => self.check_html_node(node, scope, deps),
            Stmt::Expr(expr) => {
                self.check_expression(expr, scope, deps);
            }
        }
    }

    fn check_declare(&mut self, decl: &DeclareStatement, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        let value_ty = decl.value.as_ref().and_then(|v| self.check_expression(v, scope, deps));
        let declared_ty = decl.declared_type.as_ref().map(|t| self.resolve_type_ref(t));

        if let Some(prev_span) = scope.local_span(&decl.name.lexeme) {
            self.error(prev_span, format!("`{}` is already declared in this scope", decl.name.lexeme));
            self.error(decl.name.span, format!("`{}` is already declared in this scope", decl.name.lexeme));
        }

        let final_ty = match (&declared_ty, &value_ty) {
            (Some(d), Some(v)) => {
                if d != v {
                    self.error(
                        decl.span,
                        format!("cannot assign value of type `{}` to `{}` declared as `{}`", v.display(), decl.name.lexeme, d.display()),
                    );
                }
                d.clone()
            }
            (Some(d), None) => d.clone(),
            (None, Some(v)) => v.clone(),
            (None, None) => {
                self.error(decl.span, format!("cannot infer type of `{}`", decl.name.lexeme));
                TypeInfo::Int
            }
        };
        scope.declare(decl.name.lexeme.clone(), final_ty, decl.name.span);
    }

    fn check_op(&mut self, op: &OpStatement, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        let target_ty = self.check_path(&op.target, scope);
        let value_ty = self.check_expression(&op.value, scope, deps);
        let (Some(target_ty), Some(value_ty)) = (target_ty, value_ty) else {
            return;
        };
        let numeric_only = matches!(op.op, OpKind::SubAssign | OpKind::MulAssign | OpKind::DivAssign);
        if numeric_only && !matches!(target_ty, TypeInfo::Int | TypeInfo::Float) {
            self.error(op.span, format!("operator requires a numeric target, found `{}`", target_ty.display()));
            return;
        }
        if target_ty != value_ty {
            self.error(
                op.span,
                format!("cannot assign `{}` to target of type `{}`", value_ty.display(), target_ty.display()),
            );
        }
    }

    fn check_array_append(&mut self, app: &ArrayAppendStatement, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        let target_ty = self.check_path(&app.target, scope);
        let value_ty = self.check_expression(&app.value, scope, deps);
        let (Some(TypeInfo::Array(elem)), Some(value_ty)) = (target_ty, value_ty) else {
            self.error(app.span, "`[]=` target must be an array");
            return;
        };
        if *elem != value_ty {
            self.error(
                app.span,
                format!("cannot append `{}` to an array of `{}`", value_ty.display(), elem.display()),
            );
        }
    }

    fn check_if(
        &mut self,
        stmt: &IfStatement,
        scope: &mut Scope,
        deps: &mut FxHashSet<Rc<str>>,
        return_type: Option<&TypeInfo>,
    ) {
        if let Some(cond_ty) = self.check_expression(&stmt.condition, scope, deps) {
            if cond_ty != TypeInfo::Bool {
                self.error(stmt.condition.span, format!("if-condition must be `bool`, found `{}`", cond_ty.display()));
            }
        }
        let mut inner = std::mem::take(scope).child();
        self.check_block(&stmt.then_block, &mut inner, deps, return_type);
        *scope = inner.pop();

        match stmt.else_branch.as_deref() {
            Some(ElseBranch::If(else_if)) => self.check_if(else_if, scope, deps, return_type),
            Some(ElseBranch::Block(block)) => {
                let mut inner = std::mem::take(scope).child();
                self.check_block(block, &mut inner, deps, return_type);
                *scope = inner.pop();
            }
            None => {}
        }
    }

    fn check_for(
        &mut self,
        stmt: &ForStatement,
        scope: &mut Scope,
        deps: &mut FxHashSet<Rc<str>>,
        return_type: Option<&TypeInfo>,
    ) {
        let array_ty = self.check_expression(&stmt.array, scope, deps);
        let mut inner = std::mem::take(scope).child();
        if let Some(index_name) = &stmt.index_name {
            inner.declare(index_name.lexeme.clone(), TypeInfo::Int, index_name.span);
        }
        match array_ty {
            Some(TypeInfo::Array(elem)) => inner.declare(stmt.item_name.lexeme.clone(), *elem, stmt.item_name.span),
            Some(other) => self.error(stmt.array.span, format!("`for` expects an array, found `{}`", other.display())),
            None => {}
        }
        self.check_block(&stmt.body, &mut inner, deps, return_type);
        *scope = inner.pop();
    }

    fn check_return(
        &mut self,
        stmt: &ReturnStatement,
        scope: &mut Scope,
        deps: &mut FxHashSet<Rc<str>>,
        return_type: Option<&TypeInfo>,
    ) {
        let value_ty = stmt.value.as_ref().and_then(|v| self.check_expression(v, scope, deps));
        match (return_type, &value_ty) {
            (Some(expected), Some(actual)) if expected != actual => {
                self.error(
                    stmt.span,
                    format!("expected return type `{}`, found `{}`", expected.display(), actual.display()),
                );
            }
            (Some(_), None) => self.error(stmt.span, "missing return value"),
            (None, Some(_)) => self.error(stmt.span, "unexpected return value outside a procedure"),
            _ => {}
        }
    }

    fn check_html_node(&mut self, node: &HtmlNode, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        let is_component = node.tag.lexeme.chars().next().is_some_and(|c| c.is_uppercase());
        if is_component {
            let name: Rc<str> = Rc::from(node.tag.lexeme.as_str());
            if self.components.contains_key(&name) {
                self.node_html_defs.insert(node.id, name.clone());
                deps.insert(name.clone());
                self.check_component_invocation(node, &name, scope, deps);
            } else {
                self.error(node.tag.span, format!("unknown html component `{}`", node.tag.lexeme));
            }
        } else {
            for attr in &node.attributes {
                self.check_attribute(attr, scope, deps);
            }
        }
        for stmt in &node.body {
            self.check_stmt(stmt, scope, deps, None);
        }
    }

    /// Matches each attribute passed at a component invocation site against
    /// that component's declared field shape (spec.md §4.4: attributes on a
    /// capitalized tag bind to the target component's `properties`).
    fn check_component_invocation(&mut self, node: &HtmlNode, name: &Rc<str>, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        let fields = self.components.get(name).map(|c| c.fields.clone()).unwrap_or_default();
        for attr in &node.attributes {
            let expected = fields.iter().find(|f| f.name.as_ref() == attr.name.lexeme);
            let Some(actual) = self.check_expression(&attr.value, scope, deps) else {
                continue;
            };
            match expected {
                Some(field) if field.ty != actual => {
                    self.error(
                        attr.value.span,
                        format!("property `{}` expects `{}`, found `{}`", attr.name.lexeme, field.ty.display(), actual.display()),
                    );
                }
                None => self.error(attr.name.span, format!("`{name}` has no property `{}`", attr.name.lexeme)),
                _ => {}
            }
        }
    }

    fn check_attribute(&mut self, attr: &HtmlAttribute, scope: &mut Scope, deps: &mut FxHashSet<Rc<str>>) {
        self.check_expression(&attr.value, scope, deps);
    }

    fn check_path(&mut self, path: &TokenList, scope: &Scope) -> Option<TypeInfo> {
        let first = path.tokens.first()?;
        let mut ty = scope.lookup(&first.lexeme).cloned();
        if ty.is_none() {
            self.error(first.span, format!("undeclared identifier `{}`", first.lexeme));
            return None;
        }
        for field_tok in &path.tokens[1..] {
            ty = match ty {
                Some(TypeInfo::Struct(struct_name)) => {
                    let field_ty = self
                        .registry
                        .struct_shape(&struct_name)
                        .and_then(|shape| shape.fields.iter().find(|f| f.name.as_ref() == field_tok.lexeme))
                        .map(|f| f.ty.clone());
                    if field_ty.is_none() {
                        self.error(field_tok.span, format!("`{struct_name}` has no field `{}`", field_tok.lexeme));
                    }
                    field_ty
                }
                Some(other) => {
                    self.error(field_tok.span, format!("cannot access field `{}` on `{}`", field_tok.lexeme, other.display()));
                    None
                }
                None => None,
            };
        }
        ty
    }

    /// Walks the flat postfix sequence with a small type stack, mirroring
    /// how the evaluator will later walk the same sequence with a value
    /// stack (spec.md §9, "Stack-based expression interpretation").
    fn check_expression(&mut self, expr: &Expression, scope: &Scope, deps: &mut FxHashSet<Rc<str>>) -> Option<TypeInfo> {
        let mut stack: Vec<TypeInfo> = Vec::new();
        for item in &expr.postfix {
            match item {
                PostfixItem::Operand(operand) => {
                    let ty = self.check_operand(operand, scope, deps)?;
                    stack.push(ty);
                }
                PostfixItem::UnaryOperator(tok) => {
                    let operand = stack.pop()?;
                    let ty = self.check_unary(tok, operand, expr.span);
                    stack.push(ty);
                }
                PostfixItem::Operator(tok) => {
                    let rhs = stack.pop()?;
                    let lhs = stack.pop()?;
                    let ty = self.check_binary(tok, lhs, rhs, expr.span);
                    stack.push(ty);
                }
            }
        }
        let result = stack.pop();
        if let Some(ty) = &result {
            self.node_types.insert(expr.id, ty.clone());
        }
        result
    }

    fn check_unary(&mut self, tok: &Token, operand: TypeInfo, span: Span) -> TypeInfo {
        match tok.kind {
            TokenKind::Bang => {
                if operand != TypeInfo::Bool {
                    self.error(span, format!("`!` requires `bool`, found `{}`", operand.display()));
                }
                TypeInfo::Bool
            }
            TokenKind::Minus => {
                if !matches!(operand, TypeInfo::Int | TypeInfo::Float) {
                    self.error(span, format!("unary `-` requires a numeric operand, found `{}`", operand.display()));
                }
                operand
            }
            _ => operand,
        }
    }

    fn check_binary(&mut self, tok: &Token, lhs: TypeInfo, rhs: TypeInfo, span: Span) -> TypeInfo {
        match tok.kind {
            TokenKind::PipePipe | TokenKind::AmpAmp => {
                if lhs != TypeInfo::Bool || rhs != TypeInfo::Bool {
                    self.error(span, "logical operators require `bool` operands");
                }
                TypeInfo::Bool
            }
            TokenKind::EqEq | TokenKind::NotEq => {
                if lhs != rhs {
                    self.error(
                        span,
                        format!("cannot compare `{}` with `{}`", lhs.display(), rhs.display()),
                    );
                }
                TypeInfo::Bool
            }
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
                if !matches!(lhs, TypeInfo::Int | TypeInfo::Float) || lhs != rhs {
                    self.error(span, "comparison operators require matching numeric operands");
                }
                TypeInfo::Bool
            }
            TokenKind::Plus => {
                if lhs != rhs || !matches!(lhs, TypeInfo::Int | TypeInfo::Float | TypeInfo::String) {
                    self.error(span, format!("cannot add `{}` and `{}`", lhs.display(), rhs.display()));
                }
                lhs
            }
            TokenKind::Minus | TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
                if lhs != rhs || !matches!(lhs, TypeInfo::Int | TypeInfo::Float) {
                    self.error(span, format!("arithmetic requires matching numeric operands, found `{}` and `{}`", lhs.display(), rhs.display()));
                }
                lhs
            }
            _ => lhs,
        }
    }

    fn check_operand(&mut self, operand: &Operand, scope: &Scope, deps: &mut FxHashSet<Rc<str>>) -> Option<TypeInfo> {
        match operand {
            Operand::Literal(tok) => Some(match tok.kind {
                TokenKind::String => TypeInfo::String,
                TokenKind::Number => {
                    if tok.lexeme.contains('.') {
                        TypeInfo::Float
                    } else {
                        TypeInfo::Int
                    }
                }
                TokenKind::KwTrue | TokenKind::KwFalse => TypeInfo::Bool,
                _ => TypeInfo::String,
            }),
            Operand::Identifier(tok) => {
                let ty = scope.lookup(&tok.lexeme).cloned();
                if ty.is_none() {
                    self.error(tok.span, format!("undeclared identifier `{}`", tok.lexeme));
                }
                ty
            }
            Operand::Path(path) => self.check_path(path, scope),
            Operand::Call(call) => self.check_call(call, scope, deps),
            Operand::Struct(lit) => self.check_struct_literal(lit, scope, deps),
            Operand::Array(lit) => self.check_array_literal(lit, scope, deps),
        }
    }

    fn check_call(&mut self, call: &Call, scope: &Scope, deps: &mut FxHashSet<Rc<str>>) -> Option<TypeInfo> {
        let name: Rc<str> = Rc::from(call.name.lexeme.as_str());
        let shape = self.registry.procedure_shape(&name).cloned();
        let Some(shape) = shape else {
            self.error(call.name.span, format!("unknown procedure `{}`", call.name.lexeme));
            for arg in &call.args {
                self.check_expression(arg, scope, deps);
            }
            return None;
        };
        if shape.params.len() != call.args.len() {
            self.error(
                call.span,
                format!("`{}` expects {} argument(s), have {}", call.name.lexeme, shape.params.len(), call.args.len()),
            );
        }
        for (arg, (_, expected)) in call.args.iter().zip(shape.params.iter()) {
            if let Some(actual) = self.check_expression(arg, scope, deps) {
                if &actual != expected {
                    self.error(
                        arg.span,
                        format!("argument type mismatch: expected `{}`, found `{}`", expected.display(), actual.display()),
                    );
                }
            }
        }
        for arg in call.args.iter().skip(shape.params.len()) {
            self.check_expression(arg, scope, deps);
        }
        self.node_types.insert(call.id, shape.return_type.clone().unwrap_or(TypeInfo::Bool));
        shape.return_type
    }

    fn check_struct_literal(&mut self, lit: &StructLiteral, scope: &Scope, deps: &mut FxHashSet<Rc<str>>) -> Option<TypeInfo> {
        let type_name = lit.type_name.as_ref()?;
        let name: Rc<str> = Rc::from(type_name.lexeme.as_str());
        let shape = self.registry.struct_shape(&name).cloned();
        let Some(shape) = shape else {
            self.error(type_name.span, format!("unknown struct `{}`", type_name.lexeme));
            for field in &lit.fields {
                self.check_expression(&field.value, scope, deps);
            }
            return None;
        };
        for field in &lit.fields {
            let expected = shape.fields.iter().find(|f| f.name.as_ref() == field.name.lexeme);
            let actual = self.check_expression(&field.value, scope, deps);
            match (expected, actual) {
                (Some(expected), Some(actual)) if expected.ty != actual => {
                    self.error(
                        field.value.span,
                        format!("field `{}` expects `{}`, found `{}`", field.name.lexeme, expected.ty.display(), actual.display()),
                    );
                }
                (None, _) => self.error(field.name.span, format!("`{name}` has no field `{}`", field.name.lexeme)),
                _ => {}
            }
        }
        self.node_types.insert(lit.id, TypeInfo::Struct(name.clone()));
        Some(TypeInfo::Struct(name))
    }

    fn check_array_literal(&mut self, lit: &fel_parser::ast::ArrayLiteral, scope: &Scope, deps: &mut FxHashSet<Rc<str>>) -> Option<TypeInfo> {
        let mut elem_ty: Option<TypeInfo> = None;
        for element in &lit.elements {
            let ty = self.check_expression(element, scope, deps);
            match (&elem_ty, ty) {
                (None, Some(ty)) => elem_ty = Some(ty),
                (Some(expected), Some(actual)) if *expected != actual => {
                    self.error(
                        element.span,
                        format!("array elements must share a type: expected `{}`, found `{}`", expected.display(), actual.display()),
                    );
                }
                _ => {}
            }
        }
        let result = TypeInfo::array_of(elem_ty.unwrap_or(TypeInfo::Int));
        self.node_types.insert(lit.id, result.clone());
        Some(result)
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
