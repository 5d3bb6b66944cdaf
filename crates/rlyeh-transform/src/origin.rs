//! Origin tags for class members seen by the lifting pass.
//!
//! Members the pass generates are tagged [`Origin::Synthesized`] as they are
//! built. Members coming in with the tree are classified structurally: a
//! method carrying the lift tag, or a field/assignment whose arrow is a
//! forwarding shim to its own lifted method, was produced by an earlier run
//! and is tagged `Synthesized` too. Synthesized members are never lifted.

use swc_ecma_ast::*;

use crate::config::LiftConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Original,
    Synthesized,
}

/// A node together with its origin.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    pub origin: Origin,
    pub node: T,
}

impl<T> Tagged<T> {
    pub fn original(node: T) -> Self {
        Self {
            origin: Origin::Original,
            node,
        }
    }

    pub fn synthesized(node: T) -> Self {
        Self {
            origin: Origin::Synthesized,
            node,
        }
    }

    pub fn into_inner(self) -> T {
        self.node
    }
}

impl Tagged<ClassMember> {
    /// Tag a member found in the input tree.
    pub fn classify(member: ClassMember, config: &LiftConfig) -> Self {
        let origin = member_origin(&member, config);
        Self { origin, node: member }
    }
}

fn member_origin(member: &ClassMember, config: &LiftConfig) -> Origin {
    match member {
        ClassMember::Method(ClassMethod {
            key: PropName::Ident(key),
            ..
        }) if config.lifted_field(&key.sym).is_some() => Origin::Synthesized,
        ClassMember::ClassProp(ClassProp {
            key: PropName::Ident(key),
            value: Some(value),
            ..
        }) => match value.as_ref() {
            Expr::Arrow(arrow) if is_forwarding_shim(arrow, &config.method_name(&key.sym)) => {
                Origin::Synthesized
            }
            _ => Origin::Original,
        },
        _ => Origin::Original,
    }
}

/// Whether `arrow` is exactly `(...p) => this.<method>(...p)` or its async
/// `await` form.
pub fn is_forwarding_shim(arrow: &ArrowExpr, method: &str) -> bool {
    let [Pat::Rest(RestPat { arg, .. })] = &arrow.params[..] else {
        return false;
    };
    let Pat::Ident(param) = arg.as_ref() else {
        return false;
    };
    let BlockStmtOrExpr::Expr(body) = arrow.body.as_ref() else {
        return false;
    };

    let call = match body.as_ref() {
        Expr::Await(AwaitExpr { arg, .. }) if arrow.is_async => arg.as_ref(),
        other => other,
    };
    let Expr::Call(CallExpr {
        callee: Callee::Expr(callee),
        args,
        ..
    }) = call
    else {
        return false;
    };

    let targets_method = matches!(
        callee.as_ref(),
        Expr::Member(MemberExpr {
            obj,
            prop: MemberProp::Ident(prop),
            ..
        }) if matches!(obj.as_ref(), Expr::This(_)) && &*prop.sym == method
    );
    let forwards_params = matches!(
        &args[..],
        [ExprOrSpread { spread: Some(_), expr }]
            if matches!(expr.as_ref(), Expr::Ident(id) if id.sym == param.id.sym)
    );

    targets_method && forwards_params
}
