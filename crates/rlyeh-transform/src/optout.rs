//! Detection of constructs that forbid lifting.
//!
//! Inside an arrow function `arguments` and `new.target` resolve to the
//! enclosing function's values; inside a method they resolve to the method's
//! own. Lifting an arrow that mentions either would change what it observes,
//! so such members are left as they are. The whole subtree is searched,
//! nested non-arrow functions included.

use serde::Serialize;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptOutReason {
    NewTarget,
    Arguments,
}

impl OptOutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptOutReason::NewTarget => "new.target",
            OptOutReason::Arguments => "arguments",
        }
    }
}

impl std::fmt::Display for OptOutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First opt-out construct found in `node`, if any.
pub fn detect<N>(node: &N) -> Option<OptOutReason>
where
    N: VisitWith<OptOutFinder>,
{
    let mut finder = OptOutFinder::default();
    node.visit_with(&mut finder);
    finder.found
}

#[derive(Debug, Default)]
pub struct OptOutFinder {
    found: Option<OptOutReason>,
}

impl Visit for OptOutFinder {
    fn visit_meta_prop_expr(&mut self, n: &MetaPropExpr) {
        if n.kind == MetaPropKind::NewTarget {
            self.found.get_or_insert(OptOutReason::NewTarget);
        }
    }

    // Property names are `IdentName`s, so `obj.arguments` never lands here.
    fn visit_ident(&mut self, n: &Ident) {
        if &*n.sym == "arguments" {
            self.found.get_or_insert(OptOutReason::Arguments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FirstArrow(Option<ArrowExpr>);

    impl Visit for FirstArrow {
        fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
            if self.0.is_none() {
                self.0 = Some(n.clone());
            }
        }
    }

    fn first_arrow(source: &str) -> ArrowExpr {
        let module = rlyeh_parser::parse_file(source, "optout.js").unwrap();
        let mut finder = FirstArrow::default();
        module.visit_with(&mut finder);
        finder.0.expect("no arrow function in source")
    }

    #[test]
    fn test_arguments_reference() {
        let arrow = first_arrow("class A { constructor() { this.f = () => arguments[0]; } }");
        assert_eq!(detect(&arrow), Some(OptOutReason::Arguments));
    }

    #[test]
    fn test_new_target_reference() {
        let arrow = first_arrow("class A { constructor() { this.f = () => new.target; } }");
        assert_eq!(detect(&arrow), Some(OptOutReason::NewTarget));
    }

    #[test]
    fn test_nested_function_still_counts() {
        let arrow =
            first_arrow("class A { f = () => { function g() { return arguments.length; } }; }");
        assert_eq!(detect(&arrow), Some(OptOutReason::Arguments));
    }

    #[test]
    fn test_property_named_arguments_is_fine() {
        let arrow = first_arrow("class A { f = () => this.props.arguments; }");
        assert_eq!(detect(&arrow), None);
    }

    #[test]
    fn test_plain_arrow() {
        let arrow = first_arrow("class A { f = (x) => x + 1; }");
        assert_eq!(detect(&arrow), None);
    }
}
