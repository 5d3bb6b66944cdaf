//! Declaration registration pass
//!
//! Registers every reasonable top-level binding of a module with the runtime
//! by appending one guarded bootstrap block at the very end of the module:
//!
//! ```text
//! ;
//! var _temp = (function () {
//!   if (typeof __RLYEH__ === 'undefined') {
//!     return;
//!   }
//!   __RLYEH__.register(App, "App", "/src/App.js");
//! })();
//! ;
//! ```
//!
//! An unnamed default export is hoisted into a fresh constant first so that
//! it can be registered as `"default"`.

use rlyeh_diagnostics::Result;
use serde::Serialize;
use serde_json::Value;
use swc_common::Spanned;
use swc_ecma_ast::*;

use crate::builders::{bootstrap_block, const_decl, empty_item, registration_call};
use crate::config::{BuildMode, RegistrationConfig};
use crate::host::probe_plugin_host;
use crate::scope::{BindingKind, TopLevelScope, UidGenerator};

/// Name under which a hoisted default export is registered.
pub const DEFAULT_EXPORT_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredBinding {
    /// Declared name passed to the runtime.
    pub name: String,
    /// Identifier the value is read from (differs from `name` for `default`).
    pub local: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBinding {
    pub name: String,
    #[serde(flatten)]
    pub kind: BindingKind,
}

/// What one run of the pass registered, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    pub entries: Vec<RegisteredBinding>,
    pub skipped: Vec<SkippedBinding>,
}

impl RegistrationReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.skipped.is_empty()
    }
}

/// Whether a binding of this kind is worth registering. Imports, loop
/// variables and direct `require(...)` aliases are somebody else's values.
pub fn should_register(kind: BindingKind) -> bool {
    match kind {
        BindingKind::Function | BindingKind::Class | BindingKind::Variable => true,
        BindingKind::VariableDeclarator {
            init_is_require_call,
        } => !init_is_require_call,
        BindingKind::Import | BindingKind::LoopVariable | BindingKind::Other => false,
    }
}

pub struct RegistrationPass {
    config: RegistrationConfig,
    mode: BuildMode,
}

impl RegistrationPass {
    pub fn new(config: RegistrationConfig, mode: BuildMode) -> Self {
        Self { config, mode }
    }

    /// Build the pass for a compiler host, rejecting loader contexts.
    pub fn from_host(host: &Value, config: RegistrationConfig, mode: BuildMode) -> Result<Self> {
        probe_plugin_host(host).into_result()?;
        Ok(Self::new(config, mode))
    }

    pub fn is_enabled(&self) -> bool {
        !self.mode.is_production()
    }

    pub fn run(&self, module: &mut Module, filename: &str) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        if !self.is_enabled() {
            log::debug!("production build, not registering bindings in {}", filename);
            return report;
        }

        let scope = TopLevelScope::collect(module);
        let mut uids = UidGenerator::for_module(module);
        let mut registrations = Vec::with_capacity(scope.len() + 1);

        for binding in scope.bindings() {
            if !should_register(binding.kind) {
                log::debug!("skipping {} ({:?})", binding.name, binding.kind);
                report.skipped.push(SkippedBinding {
                    name: binding.name.clone(),
                    kind: binding.kind,
                });
                continue;
            }

            registrations.push(self.registration(binding.ident.clone(), &binding.name, filename));
            report.entries.push(RegisteredBinding {
                name: binding.name.clone(),
                local: binding.name.clone(),
                file: filename.to_string(),
            });
        }

        if let Some(id) = hoist_default_export(module, &mut uids) {
            log::debug!("hoisted default export of {} into {}", filename, id.sym);
            report.entries.push(RegisteredBinding {
                name: DEFAULT_EXPORT_NAME.to_string(),
                local: id.sym.to_string(),
                file: filename.to_string(),
            });
            registrations.push(self.registration(id, DEFAULT_EXPORT_NAME, filename));
        }

        module.body.push(empty_item());
        module.body.push(bootstrap_block(
            &self.config.global,
            uids.fresh("temp"),
            registrations,
        ));
        module.body.push(empty_item());

        report
    }

    fn registration(&self, id: Ident, name: &str, filename: &str) -> Stmt {
        registration_call(&self.config.global, &self.config.method, id, name, filename)
    }
}

/// Rewrite `export default <unnamed>` into
///
/// ```text
/// const _default = <unnamed>;
/// export default _default;
/// ```
///
/// and return the new identifier. Named default functions and classes are
/// already top-level bindings and are left alone.
fn hoist_default_export(module: &mut Module, uids: &mut UidGenerator) -> Option<Ident> {
    let index = module.body.iter().position(|item| {
        matches!(
            item,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(_))
                | ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                    decl: DefaultDecl::Fn(FnExpr { ident: None, .. })
                        | DefaultDecl::Class(ClassExpr { ident: None, .. }),
                    ..
                }))
        )
    })?;

    let span = module.body[index].span();
    let id = uids.fresh("default");
    let placeholder = ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(ExportDefaultExpr {
        span,
        expr: Box::new(Expr::Ident(id.clone())),
    }));

    let expr = match std::mem::replace(&mut module.body[index], placeholder) {
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => export.expr,
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => match export.decl {
            DefaultDecl::Fn(f) => Box::new(Expr::Fn(f)),
            DefaultDecl::Class(c) => Box::new(Expr::Class(c)),
            DefaultDecl::TsInterfaceDecl(_) => return None,
        },
        _ => return None,
    };

    module.body.insert(index, const_decl(id.clone(), expr));
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        rlyeh_parser::parse_file(source, "register.js").unwrap()
    }

    fn run(source: &str) -> (Module, RegistrationReport) {
        let mut module = parse(source);
        let pass = RegistrationPass::new(RegistrationConfig::default(), BuildMode::Development);
        let report = pass.run(&mut module, "/src/register.js");
        (module, report)
    }

    fn registered(report: &RegistrationReport) -> Vec<&str> {
        report.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Registration statements inside the appended bootstrap block.
    fn registration_stmts(module: &Module) -> &[Stmt] {
        let [.., ModuleItem::Stmt(Stmt::Empty(_)), ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))), ModuleItem::Stmt(Stmt::Empty(_))] =
            &module.body[..]
        else {
            panic!("module does not end with the bootstrap block");
        };
        let Some(Expr::Call(call)) = var.decls[0].init.as_deref() else {
            panic!("bootstrap block is not an IIFE");
        };
        let Callee::Expr(callee) = &call.callee else {
            panic!("unexpected callee");
        };
        let Expr::Paren(ParenExpr { expr, .. }) = callee.as_ref() else {
            panic!("unexpected callee");
        };
        let Expr::Fn(f) = expr.as_ref() else {
            panic!("unexpected callee");
        };
        &f.function.body.as_ref().unwrap().stmts[1..]
    }

    #[test]
    fn test_should_register() {
        assert!(should_register(BindingKind::Function));
        assert!(should_register(BindingKind::Class));
        assert!(should_register(BindingKind::Variable));
        assert!(should_register(BindingKind::VariableDeclarator {
            init_is_require_call: false
        }));
        assert!(!should_register(BindingKind::VariableDeclarator {
            init_is_require_call: true
        }));
        assert!(!should_register(BindingKind::Import));
        assert!(!should_register(BindingKind::LoopVariable));
    }

    #[test]
    fn test_registers_top_level_bindings() {
        let (module, report) = run(
            r#"
            import React from 'react';
            const lib = require('lib');
            const made = require('factory')();
            function App() {}
            class Store {}
            for (var i = 0; i < 2; i++) {}
            "#,
        );

        assert_eq!(registered(&report), ["made", "App", "Store"]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, ["React", "lib", "i"]);
        assert_eq!(registration_stmts(&module).len(), 3);
        assert!(report.entries.iter().all(|e| e.file == "/src/register.js"));
    }

    #[test]
    fn test_block_is_appended_without_bindings() {
        let (module, report) = run("console.log('side effect');");
        assert!(report.is_empty());
        assert_eq!(module.body.len(), 4);
        assert!(registration_stmts(&module).is_empty());
    }

    #[test]
    fn test_anonymous_default_export_is_hoisted() {
        let (module, report) = run("export default () => {};");
        assert_eq!(registered(&report), ["default"]);
        assert_eq!(report.entries[0].local, "_default");

        let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = &module.body[0] else {
            panic!("expected hoisted constant first");
        };
        assert_eq!(var.kind, VarDeclKind::Const);
        assert!(matches!(var.decls[0].init.as_deref(), Some(Expr::Arrow(_))));

        let ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) = &module.body[1] else {
            panic!("expected the export to follow");
        };
        assert!(matches!(export.expr.as_ref(), Expr::Ident(id) if &*id.sym == "_default"));
    }

    #[test]
    fn test_default_name_avoids_collisions() {
        let (module, report) = run("const _default = 1; export default class {}");
        assert_eq!(registered(&report), ["_default", "default"]);
        assert_eq!(report.entries[1].local, "_default2");
        assert!(matches!(
            &module.body[1],
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var)))
                if matches!(var.decls[0].init.as_deref(), Some(Expr::Class(_)))
        ));
    }

    #[test]
    fn test_named_default_export_is_a_plain_binding() {
        let (module, report) = run("export default function Page() {}");
        assert_eq!(registered(&report), ["Page"]);
        assert!(matches!(
            &module.body[0],
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(_))
        ));
    }

    #[test]
    fn test_temp_name_is_fresh() {
        let (module, _) = run("var _temp = 1;");
        let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = &module.body[module.body.len() - 2]
        else {
            panic!("expected bootstrap block");
        };
        let Pat::Ident(name) = &var.decls[0].name else {
            panic!("expected identifier binding");
        };
        assert_eq!(&*name.id.sym, "_temp2");
    }

    #[test]
    fn test_production_is_a_no_op() {
        let mut module = parse("function App() {} export default () => {};");
        let before = module.clone();
        let pass = RegistrationPass::new(RegistrationConfig::default(), BuildMode::Production);
        assert!(!pass.is_enabled());
        assert!(pass.run(&mut module, "/src/a.js").is_empty());
        assert_eq!(module, before);
    }

    #[test]
    fn test_from_host_rejects_loader_context() {
        let host = serde_json::json!({ "callback": true });
        let err =
            RegistrationPass::from_host(&host, RegistrationConfig::default(), BuildMode::Development)
                .err()
                .unwrap();
        assert!(err.is_misconfiguration());
        assert!(err.to_string().contains("as a Webpack loader"));
    }
}
