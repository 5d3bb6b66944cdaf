//! Module-level bindings and fresh-name generation.
//!
//! SWC has no scope tracker of its own, so the registration pass builds the
//! top-level scope itself: one [`Binding`] per name, in declaration order.
//! `var` declarations nested in top-level blocks hoist to the module scope and
//! are included; block-scoped `let`/`const` and anything inside functions or
//! classes are not.

use std::collections::HashSet;

use serde::Serialize;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// What kind of declaration introduced a top-level binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum BindingKind {
    /// `function f() {}`
    Function,
    /// `class C {}`
    Class,
    /// A whole declaration without per-declarator initialiser, e.g. `using`.
    Variable,
    /// One declarator of a `var`/`let`/`const` declaration.
    VariableDeclarator {
        /// The initialiser is a direct `require(...)` call.
        init_is_require_call: bool,
    },
    /// Import specifier or `import x = require(...)`.
    Import,
    /// `var` declared in the head of a top-level loop.
    LoopVariable,
    /// Enums, namespaces and other declarations we never register.
    Other,
}

/// A named declaration in the module scope.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    /// The declaring identifier, including its syntax context.
    pub ident: Ident,
    pub kind: BindingKind,
}

/// Top-level bindings of one module, in declaration order.
#[derive(Debug, Default)]
pub struct TopLevelScope {
    bindings: Vec<Binding>,
    names: HashSet<String>,
}

impl TopLevelScope {
    pub fn collect(module: &Module) -> Self {
        let mut scope = TopLevelScope::default();

        for item in &module.body {
            match item {
                ModuleItem::ModuleDecl(decl) => scope.collect_module_decl(decl),
                ModuleItem::Stmt(Stmt::Decl(decl)) => scope.collect_decl(decl),
                ModuleItem::Stmt(stmt) => stmt.visit_with(&mut HoistedVars { scope: &mut scope }),
            }
        }

        scope
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn push(&mut self, ident: &Ident, kind: BindingKind) {
        let name = ident.sym.to_string();
        // Redeclarations (`var a; var a;`) keep the first binding.
        if self.names.insert(name.clone()) {
            self.bindings.push(Binding {
                name,
                ident: ident.clone(),
                kind,
            });
        }
    }

    fn collect_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::Import(import) => {
                for specifier in &import.specifiers {
                    let local = match specifier {
                        ImportSpecifier::Named(named) => &named.local,
                        ImportSpecifier::Default(default) => &default.local,
                        ImportSpecifier::Namespace(namespace) => &namespace.local,
                    };
                    self.push(local, BindingKind::Import);
                }
            }
            ModuleDecl::ExportDecl(export) => self.collect_decl(&export.decl),
            ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::Fn(FnExpr {
                    ident: Some(ident), ..
                }) => self.push(ident, BindingKind::Function),
                DefaultDecl::Class(ClassExpr {
                    ident: Some(ident), ..
                }) => self.push(ident, BindingKind::Class),
                _ => {}
            },
            ModuleDecl::TsImportEquals(import) => self.push(&import.id, BindingKind::Import),
            _ => {}
        }
    }

    fn collect_decl(&mut self, decl: &Decl) {
        // `declare ...` only describes something defined elsewhere.
        if is_ambient(decl) {
            return;
        }
        match decl {
            Decl::Fn(f) => self.push(&f.ident, BindingKind::Function),
            Decl::Class(c) => self.push(&c.ident, BindingKind::Class),
            Decl::Var(var) => {
                for declarator in &var.decls {
                    self.push_declarator(declarator);
                }
            }
            Decl::Using(using) => {
                for declarator in &using.decls {
                    for ident in pat_idents(&declarator.name) {
                        self.push(ident, BindingKind::Variable);
                    }
                }
            }
            Decl::TsEnum(e) => self.push(&e.id, BindingKind::Other),
            Decl::TsModule(m) => {
                if let TsModuleName::Ident(ident) = &m.id {
                    self.push(ident, BindingKind::Other);
                }
            }
            // Types only; nothing exists at runtime.
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => {}
        }
    }

    fn push_declarator(&mut self, declarator: &VarDeclarator) {
        let init_is_require_call = declarator
            .init
            .as_deref()
            .map_or(false, is_direct_require_call);

        for ident in pat_idents(&declarator.name) {
            self.push(
                ident,
                BindingKind::VariableDeclarator {
                    init_is_require_call,
                },
            );
        }
    }
}

/// `require(...)` with `require` as the callee itself. `require('x')()` and
/// `require('x').y` are not direct calls.
pub fn is_direct_require_call(expr: &Expr) -> bool {
    let Expr::Call(CallExpr {
        callee: Callee::Expr(callee),
        ..
    }) = expr
    else {
        return false;
    };

    let mut callee = callee.as_ref();
    while let Expr::Paren(paren) = callee {
        callee = &paren.expr;
    }
    matches!(callee, Expr::Ident(id) if &*id.sym == "require")
}

/// Binding identifiers introduced by a declaration pattern.
pub fn pat_idents(pat: &Pat) -> Vec<&Ident> {
    fn walk<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
        match pat {
            Pat::Ident(binding) => out.push(&binding.id),
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    walk(elem, out);
                }
            }
            Pat::Rest(rest) => walk(&rest.arg, out),
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => walk(&kv.value, out),
                        ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                        ObjectPatProp::Rest(rest) => walk(&rest.arg, out),
                    }
                }
            }
            Pat::Assign(assign) => walk(&assign.left, out),
            Pat::Expr(_) | Pat::Invalid(_) => {}
        }
    }

    let mut out = Vec::new();
    walk(pat, &mut out);
    out
}

/// Collects `var` declarations that hoist out of top-level statements.
fn is_ambient(decl: &Decl) -> bool {
    match decl {
        Decl::Fn(f) => f.declare,
        Decl::Class(c) => c.declare,
        Decl::Var(var) => var.declare,
        Decl::TsEnum(e) => e.declare,
        Decl::TsModule(m) => m.declare,
        Decl::Using(_) | Decl::TsInterface(_) | Decl::TsTypeAlias(_) => false,
    }
}

struct HoistedVars<'a> {
    scope: &'a mut TopLevelScope,
}

impl HoistedVars<'_> {
    fn loop_head(&mut self, decl: &VarDecl) {
        if decl.kind == VarDeclKind::Var {
            for declarator in &decl.decls {
                for ident in pat_idents(&declarator.name) {
                    self.scope.push(ident, BindingKind::LoopVariable);
                }
            }
        }
    }
}

impl Visit for HoistedVars<'_> {
    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        if let Some(VarDeclOrExpr::VarDecl(decl)) = &n.init {
            self.loop_head(decl);
        }
        n.body.visit_with(self);
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        if let ForHead::VarDecl(decl) = &n.left {
            self.loop_head(decl);
        }
        n.body.visit_with(self);
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        if let ForHead::VarDecl(decl) = &n.left {
            self.loop_head(decl);
        }
        n.body.visit_with(self);
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        if n.kind == VarDeclKind::Var && !n.declare {
            for declarator in &n.decls {
                self.scope.push_declarator(declarator);
            }
        }
    }
}

/// Generates identifiers that do not clash with any name in the module.
///
/// Names follow the `_<base>`, `_<base>2`, `_<base>3`, ... sequence.
#[derive(Debug, Default)]
pub struct UidGenerator {
    used: HashSet<String>,
}

impl UidGenerator {
    pub fn for_module(module: &Module) -> Self {
        let mut collector = UsedNames::default();
        module.visit_with(&mut collector);
        Self {
            used: collector.names,
        }
    }

    pub fn fresh(&mut self, base: &str) -> Ident {
        let mut i = 1;
        loop {
            let candidate = if i > 1 {
                format!("_{}{}", base, i)
            } else {
                format!("_{}", base)
            };
            if self.used.insert(candidate.clone()) {
                return crate::builders::ident(&candidate);
            }
            i += 1;
        }
    }
}

#[derive(Default)]
struct UsedNames {
    names: HashSet<String>,
}

impl Visit for UsedNames {
    fn visit_ident(&mut self, n: &Ident) {
        self.names.insert(n.sym.to_string());
    }
}
