//! AST node construction for the code the passes inject.
//!
//! Everything built here carries `DUMMY_SP` and an empty syntax context: the
//! generated code has no original position.

use swc_common::{SyntaxContext, DUMMY_SP};
use swc_ecma_ast::*;

/// Rest parameter name used by forwarding shims.
pub const SHIM_PARAM: &str = "params";

pub fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

pub fn str_lit(value: &str) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }))
}

fn member(obj: Expr, prop: &str) -> MemberExpr {
    MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(obj),
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    }
}

/// `this.<prop>`
pub fn this_member(prop: &str) -> MemberExpr {
    member(Expr::This(ThisExpr { span: DUMMY_SP }), prop)
}

fn call(callee: Expr, args: Vec<ExprOrSpread>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(callee)),
        args,
        type_args: None,
    })
}

fn arg(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: None,
        expr: Box::new(expr),
    }
}

fn block(stmts: Vec<Stmt>) -> BlockStmt {
    BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    }
}

/// Forwarding shim for a lifted method:
///
/// ```text
/// (...params) => this.<method>(...params)
/// async (...params) => await this.<method>(...params)
/// ```
pub fn forwarding_shim(method: &str, is_async: bool) -> ArrowExpr {
    let mut body = call(
        Expr::Member(this_member(method)),
        vec![ExprOrSpread {
            spread: Some(DUMMY_SP),
            expr: Box::new(Expr::Ident(ident(SHIM_PARAM))),
        }],
    );

    if is_async {
        body = Expr::Await(AwaitExpr {
            span: DUMMY_SP,
            arg: Box::new(body),
        });
    }

    ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params: vec![Pat::Rest(RestPat {
            span: DUMMY_SP,
            dot3_token: DUMMY_SP,
            arg: Box::new(Pat::Ident(ident(SHIM_PARAM).into())),
            type_ann: None,
        })],
        body: Box::new(BlockStmtOrExpr::Expr(Box::new(body))),
        is_async,
        is_generator: false,
        type_params: None,
        return_type: None,
    }
}

/// Turn an arrow function into a class method named `name`.
///
/// Parameters, type parameters, return type and asynchrony move over
/// unchanged; an expression body becomes `{ return <expr>; }`.
pub fn lifted_method(name: &str, arrow: ArrowExpr) -> ClassMethod {
    let ArrowExpr {
        span,
        ctxt,
        params,
        body,
        is_async,
        type_params,
        return_type,
        ..
    } = arrow;

    let body = match *body {
        BlockStmtOrExpr::BlockStmt(body) => body,
        BlockStmtOrExpr::Expr(expr) => block(vec![Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: Some(expr),
        })]),
    };

    ClassMethod {
        span,
        key: PropName::Ident(IdentName::new(name.into(), DUMMY_SP)),
        function: Box::new(Function {
            params: params
                .into_iter()
                .map(|pat| Param {
                    span: DUMMY_SP,
                    decorators: vec![],
                    pat,
                })
                .collect(),
            decorators: vec![],
            span,
            ctxt,
            body: Some(body),
            is_generator: false,
            is_async,
            type_params,
            return_type,
        }),
        kind: MethodKind::Method,
        is_static: false,
        accessibility: None,
        is_abstract: false,
        is_optional: false,
        is_override: false,
    }
}

/// `<global>.<method>(<id>, "<name>", "<filename>");`
pub fn registration_call(
    global: &str,
    method: &str,
    id: Ident,
    name: &str,
    filename: &str,
) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(call(
            Expr::Member(member(Expr::Ident(ident(global)), method)),
            vec![
                arg(Expr::Ident(id)),
                arg(str_lit(name)),
                arg(str_lit(filename)),
            ],
        )),
    })
}

fn var_decl(kind: VarDeclKind, id: Ident, init: Box<Expr>) -> ModuleItem {
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(id.into()),
            init: Some(init),
            definite: false,
        }],
    }))))
}

/// `const <id> = <init>;`
pub fn const_decl(id: Ident, init: Box<Expr>) -> ModuleItem {
    var_decl(VarDeclKind::Const, id, init)
}

pub fn empty_item() -> ModuleItem {
    ModuleItem::Stmt(Stmt::Empty(EmptyStmt { span: DUMMY_SP }))
}

/// The guarded bootstrap block appended to every instrumented module:
///
/// ```text
/// var <unused> = (function () {
///   if (typeof <global> === 'undefined') {
///     return;
///   }
///   <registrations>
/// })();
/// ```
///
/// The IIFE is bound to an unused variable because a bare top-level
/// expression statement breaks interactive consumers such as REPLs.
pub fn bootstrap_block(global: &str, unused: Ident, registrations: Vec<Stmt>) -> ModuleItem {
    let guard = Stmt::If(IfStmt {
        span: DUMMY_SP,
        test: Box::new(Expr::Bin(BinExpr {
            span: DUMMY_SP,
            op: BinaryOp::EqEqEq,
            left: Box::new(Expr::Unary(UnaryExpr {
                span: DUMMY_SP,
                op: UnaryOp::TypeOf,
                arg: Box::new(Expr::Ident(ident(global))),
            })),
            right: Box::new(str_lit("undefined")),
        })),
        cons: Box::new(Stmt::Block(block(vec![Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: None,
        })]))),
        alt: None,
    });

    let mut stmts = Vec::with_capacity(registrations.len() + 1);
    stmts.push(guard);
    stmts.extend(registrations);

    let function = Expr::Fn(FnExpr {
        ident: None,
        function: Box::new(Function {
            params: vec![],
            decorators: vec![],
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            body: Some(block(stmts)),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        }),
    });

    let iife = call(
        Expr::Paren(ParenExpr {
            span: DUMMY_SP,
            expr: Box::new(function),
        }),
        vec![],
    );

    var_decl(VarDeclKind::Var, unused, Box::new(iife))
}
