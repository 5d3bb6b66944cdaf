//! Method lifting pass
//!
//! Hot-swap tooling can replace class *methods*, but not field initialisers or
//! closures created in a constructor. This pass turns
//!
//! ```text
//! class A {
//!   onClick = (e) => { this.clicked(e); };
//!   constructor() { this.onHover = async () => this.load(); }
//! }
//! ```
//!
//! into
//!
//! ```text
//! class A {
//!   onClick = (...params) => this.__onClick__RLYEH__(...params);
//!   __onClick__RLYEH__(e) { this.clicked(e); }
//!   constructor() { this.onHover = async (...params) => await this.__onHover__RLYEH__(...params); }
//!   async __onHover__RLYEH__() { return this.load(); }
//! }
//! ```
//!
//! Each class body is scanned once; rewrites are collected per member and the
//! body is rebuilt in a single batch.

use serde::Serialize;
use swc_ecma_ast::*;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::builders::{forwarding_shim, lifted_method};
use crate::config::LiftConfig;
use crate::optout::{self, OptOutReason};
use crate::origin::{is_forwarding_shim, Origin, Tagged};

/// How a class member takes part in lifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberClass {
    /// A field that does not hold an arrow function, or has a non-identifier key.
    PlainField,
    /// An instance field holding a synchronous arrow function.
    LiftableField,
    /// An arrow-valued field using `arguments` or `new.target`.
    OptedOutField(OptOutReason),
    /// An arrow-valued field whose arrow is async (not lifted, see below).
    AsyncField,
    StaticField,
    /// A constructor; its body is scanned for `this.x = arrow`.
    Constructor,
    /// Produced by this pass, in this run or an earlier one.
    Synthesized,
    OtherMember,
}

impl MemberClass {
    pub fn of(member: &Tagged<ClassMember>) -> Self {
        if member.origin == Origin::Synthesized {
            return MemberClass::Synthesized;
        }

        match &member.node {
            ClassMember::ClassProp(prop) => classify_field(prop),
            ClassMember::Constructor(_) => MemberClass::Constructor,
            _ => MemberClass::OtherMember,
        }
    }
}

fn classify_field(prop: &ClassProp) -> MemberClass {
    if prop.is_static {
        return MemberClass::StaticField;
    }
    let (PropName::Ident(_), Some(value)) = (&prop.key, &prop.value) else {
        return MemberClass::PlainField;
    };
    let Expr::Arrow(arrow) = value.as_ref() else {
        return MemberClass::PlainField;
    };

    if let Some(reason) = optout::detect(arrow) {
        return MemberClass::OptedOutField(reason);
    }

    // Async arrow fields stay as they are: rewriting them interacts badly
    // with how the async transform binds `this` inside async arrows
    // (babel/babel#5078), so such fields are not reloadable.
    if arrow.is_async {
        return MemberClass::AsyncField;
    }

    MemberClass::LiftableField
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiftForm {
    /// `field = () => ...`
    Field,
    /// `this.field = () => ...` inside the constructor
    ConstructorAssignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiftedMember {
    pub class: Option<String>,
    pub member: String,
    pub method: String,
    pub form: LiftForm,
    pub is_async: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "reason", content = "construct")]
pub enum SkipReason {
    OptOut(OptOutReason),
    AsyncField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMember {
    pub class: Option<String>,
    pub member: String,
    pub reason: SkipReason,
}

/// What one run of the pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiftReport {
    pub lifted: Vec<LiftedMember>,
    pub skipped: Vec<SkippedMember>,
}

impl LiftReport {
    pub fn is_empty(&self) -> bool {
        self.lifted.is_empty() && self.skipped.is_empty()
    }
}

pub struct LiftPass {
    config: LiftConfig,
}

impl LiftPass {
    pub fn new(config: LiftConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, module: &mut Module) -> LiftReport {
        let mut lifter = ClassLifter {
            config: &self.config,
            class_name: None,
            report: LiftReport::default(),
        };
        module.visit_mut_with(&mut lifter);
        lifter.report
    }
}

impl Default for LiftPass {
    fn default() -> Self {
        Self::new(LiftConfig::default())
    }
}

struct ClassLifter<'a> {
    config: &'a LiftConfig,
    class_name: Option<String>,
    report: LiftReport,
}

impl ClassLifter<'_> {
    fn lift_class_body(&mut self, body: &mut Vec<ClassMember>) {
        let worklist: Vec<Tagged<ClassMember>> = std::mem::take(body)
            .into_iter()
            .map(|member| Tagged::classify(member, self.config))
            .collect();

        let mut rebuilt: Vec<Tagged<ClassMember>> = Vec::with_capacity(worklist.len());
        for member in worklist {
            let class = MemberClass::of(&member);
            match (class, member.node) {
                (MemberClass::LiftableField, ClassMember::ClassProp(prop)) => {
                    self.lift_field(prop, &mut rebuilt)
                }
                (MemberClass::Constructor, ClassMember::Constructor(ctor)) => {
                    self.lift_constructor(ctor, &mut rebuilt)
                }
                (class, node) => {
                    match class {
                        MemberClass::OptedOutField(reason) => {
                            self.skip(&node, SkipReason::OptOut(reason))
                        }
                        MemberClass::AsyncField => self.skip(&node, SkipReason::AsyncField),
                        _ => {}
                    }
                    rebuilt.push(Tagged {
                        origin: member.origin,
                        node,
                    });
                }
            }
        }

        *body = rebuilt.into_iter().map(Tagged::into_inner).collect();
    }

    fn lift_field(&mut self, mut prop: ClassProp, out: &mut Vec<Tagged<ClassMember>>) {
        let (PropName::Ident(key), Some(value)) = (&prop.key, prop.value.as_deref_mut()) else {
            out.push(Tagged::original(ClassMember::ClassProp(prop)));
            return;
        };
        let Expr::Arrow(arrow) = value else {
            out.push(Tagged::original(ClassMember::ClassProp(prop)));
            return;
        };

        let field = key.sym.to_string();
        let method_name = self.config.method_name(&field);
        let arrow = std::mem::replace(arrow, forwarding_shim(&method_name, false));

        log::debug!(
            "lifting field {}.{} into {}",
            self.class_name.as_deref().unwrap_or("<anonymous>"),
            field,
            method_name
        );

        let method = lifted_method(&method_name, arrow);

        self.report.lifted.push(LiftedMember {
            class: self.class_name.clone(),
            member: field,
            method: method_name,
            form: LiftForm::Field,
            is_async: false,
        });

        out.push(Tagged::synthesized(ClassMember::ClassProp(prop)));
        out.push(Tagged::synthesized(ClassMember::Method(method)));
    }

    fn lift_constructor(&mut self, mut ctor: Constructor, out: &mut Vec<Tagged<ClassMember>>) {
        let mut scanner = ConstructorScanner {
            config: self.config,
            lifted: Vec::new(),
            skipped: Vec::new(),
        };
        if let Some(body) = &mut ctor.body {
            body.visit_mut_with(&mut scanner);
        }

        for (field, reason) in scanner.skipped {
            log::debug!("constructor assignment to this.{} opted out ({})", field, reason);
            self.report.skipped.push(SkippedMember {
                class: self.class_name.clone(),
                member: field,
                reason: SkipReason::OptOut(reason),
            });
        }

        out.push(Tagged::original(ClassMember::Constructor(ctor)));

        // Every method lands directly after the constructor, so the last one
        // discovered ends up first.
        for (field, method) in scanner.lifted.into_iter().rev() {
            let method_name = self.config.method_name(&field);
            log::debug!(
                "lifting constructor assignment {}.{} into {}",
                self.class_name.as_deref().unwrap_or("<anonymous>"),
                field,
                method_name
            );
            self.report.lifted.push(LiftedMember {
                class: self.class_name.clone(),
                member: field,
                method: method_name,
                form: LiftForm::ConstructorAssignment,
                is_async: method.function.is_async,
            });
            out.push(Tagged::synthesized(ClassMember::Method(method)));
        }
    }

    fn skip(&mut self, member: &ClassMember, reason: SkipReason) {
        let member = match member {
            ClassMember::ClassProp(ClassProp {
                key: PropName::Ident(key),
                ..
            }) => key.sym.to_string(),
            _ => return,
        };
        log::debug!("not lifting field {}: {:?}", member, reason);
        self.report.skipped.push(SkippedMember {
            class: self.class_name.clone(),
            member,
            reason,
        });
    }
}

impl VisitMut for ClassLifter<'_> {
    fn visit_mut_class_decl(&mut self, n: &mut ClassDecl) {
        let outer = self.class_name.replace(n.ident.sym.to_string());
        n.class.visit_mut_with(self);
        self.class_name = outer;
    }

    fn visit_mut_class_expr(&mut self, n: &mut ClassExpr) {
        let name = n.ident.as_ref().map(|ident| ident.sym.to_string());
        let outer = std::mem::replace(&mut self.class_name, name);
        n.class.visit_mut_with(self);
        self.class_name = outer;
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        // Nested classes first, so their bodies are done before this body's
        // arrows move into methods.
        n.visit_mut_children_with(self);
        self.lift_class_body(&mut n.body);
    }
}

/// Finds `this.<name> = <arrow>` anywhere in a constructor body where `this`
/// still refers to the instance: arrow functions are entered, ordinary
/// functions, accessors and nested classes are not.
struct ConstructorScanner<'a> {
    config: &'a LiftConfig,
    /// `(field, method)` in discovery order.
    lifted: Vec<(String, ClassMethod)>,
    skipped: Vec<(String, OptOutReason)>,
}

impl ConstructorScanner<'_> {
    /// The field name if `n` is a plain assignment to `this.<ident>`.
    fn this_member_target(n: &AssignExpr) -> Option<String> {
        if n.op != AssignOp::Assign {
            return None;
        }
        match &n.left {
            AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
                obj,
                prop: MemberProp::Ident(prop),
                ..
            })) if matches!(obj.as_ref(), Expr::This(_)) => Some(prop.sym.to_string()),
            _ => None,
        }
    }
}

impl VisitMut for ConstructorScanner<'_> {
    fn visit_mut_function(&mut self, _: &mut Function) {}

    fn visit_mut_getter_prop(&mut self, _: &mut GetterProp) {}

    fn visit_mut_setter_prop(&mut self, _: &mut SetterProp) {}

    fn visit_mut_class(&mut self, _: &mut Class) {}

    fn visit_mut_assign_expr(&mut self, n: &mut AssignExpr) {
        let Some(field) = Self::this_member_target(n) else {
            n.visit_mut_children_with(self);
            return;
        };
        let Expr::Arrow(arrow) = n.right.as_mut() else {
            n.visit_mut_children_with(self);
            return;
        };

        let method_name = self.config.method_name(&field);
        if is_forwarding_shim(arrow, &method_name) {
            return;
        }
        if let Some(reason) = optout::detect(&*arrow) {
            self.skipped.push((field, reason));
            n.visit_mut_children_with(self);
            return;
        }

        let shim = forwarding_shim(&method_name, arrow.is_async);
        let arrow = std::mem::replace(arrow, shim);

        // The arrow body now lives in the method; assignments inside it are
        // not constructor assignments any more and are left alone.
        self.lifted.push((field, lifted_method(&method_name, arrow)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_visit::{Visit, VisitWith};

    fn lift(source: &str) -> (Module, LiftReport) {
        let mut module = rlyeh_parser::parse_file(source, "lift.js").unwrap();
        let report = LiftPass::default().run(&mut module);
        (module, report)
    }

    fn class_body(module: &Module) -> &[ClassMember] {
        for item in &module.body {
            if let ModuleItem::Stmt(Stmt::Decl(Decl::Class(class))) = item {
                return &class.class.body;
            }
        }
        panic!("no class declaration");
    }

    fn member_name(member: &ClassMember) -> String {
        match member {
            ClassMember::ClassProp(ClassProp {
                key: PropName::Ident(key),
                ..
            })
            | ClassMember::Method(ClassMethod {
                key: PropName::Ident(key),
                ..
            }) => key.sym.to_string(),
            ClassMember::Constructor(_) => "constructor".to_string(),
            other => format!("{:?}", other),
        }
    }

    fn names(module: &Module) -> Vec<String> {
        class_body(module).iter().map(member_name).collect()
    }

    #[test]
    fn test_classify_fields() {
        let module = rlyeh_parser::parse_file(
            r#"
            class A {
                plain = 1;
                liftable = () => 1;
                load = async () => 1;
                static make = () => new A();
                ['computed'] = () => 1;
                render() {}
            }
            "#,
            "classify.js",
        )
        .unwrap();

        let config = LiftConfig::default();
        let classes: Vec<MemberClass> = class_body(&module)
            .iter()
            .cloned()
            .map(|m| MemberClass::of(&Tagged::classify(m, &config)))
            .collect();

        assert_eq!(
            classes,
            [
                MemberClass::PlainField,
                MemberClass::LiftableField,
                MemberClass::AsyncField,
                MemberClass::StaticField,
                MemberClass::PlainField,
                MemberClass::OtherMember,
            ]
        );
    }

    #[test]
    fn test_field_is_lifted_after_itself() {
        let (module, report) = lift("class A { a = 1; onClick = (e) => this.handle(e); render() {} }");

        assert_eq!(names(&module), ["a", "onClick", "__onClick__RLYEH__", "render"]);
        assert_eq!(report.lifted.len(), 1);
        assert_eq!(report.lifted[0].class.as_deref(), Some("A"));
        assert_eq!(report.lifted[0].form, LiftForm::Field);

        let body = class_body(&module);
        let ClassMember::ClassProp(prop) = &body[1] else {
            panic!("expected field");
        };
        let Some(Expr::Arrow(shim)) = prop.value.as_deref() else {
            panic!("expected shim arrow");
        };
        assert!(is_forwarding_shim(shim, "__onClick__RLYEH__"));
        assert!(!shim.is_async);

        let ClassMember::Method(method) = &body[2] else {
            panic!("expected lifted method");
        };
        assert!(!method.function.is_async);
        assert_eq!(method.function.params.len(), 1);
        let stmts = &method.function.body.as_ref().unwrap().stmts;
        assert!(matches!(&stmts[..], [Stmt::Return(_)]));
    }

    #[test]
    fn test_block_body_is_kept() {
        let (module, _) = lift("class A { f = () => { const x = 1; return x; }; }");
        let ClassMember::Method(method) = &class_body(&module)[1] else {
            panic!("expected lifted method");
        };
        assert_eq!(method.function.body.as_ref().unwrap().stmts.len(), 2);
    }

    #[test]
    fn test_static_and_async_fields_are_not_lifted() {
        let (module, report) =
            lift("class A { static s = () => 1; load = async () => { await x(); }; }");
        assert_eq!(names(&module), ["s", "load"]);
        assert!(report.lifted.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::AsyncField);
    }

    #[test]
    fn test_opt_out_field_is_untouched() {
        let source = "class A { f = () => { function g() { return arguments; } return g; }; }";
        let original = rlyeh_parser::parse_file(source, "lift.js").unwrap();
        let (module, report) = lift(source);
        assert_eq!(class_body(&module), class_body(&original));
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::OptOut(OptOutReason::Arguments)
        );
    }

    #[test]
    fn test_constructor_assignments_are_lifted() {
        let (module, report) = lift(
            r#"
            class A {
                constructor(props) {
                    this.first = () => 1;
                    if (props.ready) {
                        this.second = async (x) => await load(x);
                    }
                    this.value = 3;
                }
                render() {}
            }
            "#,
        );

        assert_eq!(
            names(&module),
            ["constructor", "__second__RLYEH__", "__first__RLYEH__", "render"]
        );
        assert_eq!(report.lifted.len(), 2);

        let body = class_body(&module);
        let ClassMember::Method(second) = &body[1] else {
            panic!("expected lifted method");
        };
        assert!(second.function.is_async);
        let ClassMember::Method(first) = &body[2] else {
            panic!("expected lifted method");
        };
        assert!(!first.function.is_async);

        // The assignments now forward to the lifted methods, keeping asynchrony.
        let ClassMember::Constructor(ctor) = &body[0] else {
            panic!("expected constructor");
        };
        let mut assignments = ThisAssignments::default();
        ctor.visit_with(&mut assignments);
        let first_shim = assignments.arrow("first");
        assert!(is_forwarding_shim(first_shim, "__first__RLYEH__"));
        assert!(!first_shim.is_async);

        let second_shim = assignments.arrow("second");
        assert!(is_forwarding_shim(second_shim, "__second__RLYEH__"));
        assert!(second_shim.is_async);
        assert!(matches!(
            second_shim.body.as_ref(),
            BlockStmtOrExpr::Expr(expr) if matches!(expr.as_ref(), Expr::Await(_))
        ));

        let value = assignments.0.iter().find(|(name, _)| name == "value");
        assert!(matches!(value, Some((_, Expr::Lit(Lit::Num(_))))));
    }

    /// `this.<name> = <value>` assignments, in source order.
    #[derive(Default)]
    struct ThisAssignments(Vec<(String, Expr)>);

    impl ThisAssignments {
        fn arrow(&self, field: &str) -> &ArrowExpr {
            match self.0.iter().find(|(name, _)| name == field) {
                Some((_, Expr::Arrow(arrow))) => arrow,
                _ => panic!("no arrow assigned to this.{}", field),
            }
        }
    }

    impl Visit for ThisAssignments {
        fn visit_assign_expr(&mut self, n: &AssignExpr) {
            if let AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
                obj,
                prop: MemberProp::Ident(prop),
                ..
            })) = &n.left
            {
                if matches!(obj.as_ref(), Expr::This(_)) {
                    self.0.push((prop.sym.to_string(), (*n.right).clone()));
                }
            }
            n.visit_children_with(self);
        }
    }

    #[test]
    fn test_constructor_scan_respects_this_boundaries() {
        let (module, report) = lift(
            r#"
            class A {
                constructor() {
                    setTimeout(() => { this.later = () => 1; });
                    const self = { get x() { this.nope = () => 1; return 1; } };
                    function helper() { this.nope = () => 2; }
                }
            }
            "#,
        );
        assert_eq!(names(&module), ["constructor", "__later__RLYEH__"]);
        assert_eq!(report.lifted[0].member, "later");
    }

    #[test]
    fn test_constructor_opt_out() {
        let (module, report) =
            lift("class A { constructor() { this.f = () => arguments[0]; } }");
        assert_eq!(names(&module), ["constructor"]);
        assert!(report.lifted.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::OptOut(OptOutReason::Arguments)
        );
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let (mut module, first) = lift(
            r#"
            class A {
                onClick = () => this.click();
                constructor() { this.onHover = async () => this.hover(); }
            }
            "#,
        );
        assert_eq!(first.lifted.len(), 2);
        let after_first = module.clone();

        let second = LiftPass::default().run(&mut module);
        assert!(second.lifted.is_empty());
        assert_eq!(module, after_first);
    }

    #[test]
    fn test_nested_classes_are_lifted_once() {
        let (module, report) = lift(
            r#"
            class Outer {
                make = () => class Inner { go = () => 1; };
            }
            "#,
        );
        assert_eq!(report.lifted.len(), 2);
        assert_eq!(report.lifted[0].class.as_deref(), Some("Inner"));
        assert_eq!(report.lifted[1].class.as_deref(), Some("Outer"));
        assert_eq!(names(&module), ["make", "__make__RLYEH__"]);
    }
}
