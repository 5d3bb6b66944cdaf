//! JavaScript/TypeScript parser wrapper using SWC
//!
//! The rlyeh passes consume an already-parsed `swc_ecma_ast::Module`. This
//! crate is the thin layer that produces one from source text for the CLI and
//! the tests; bundler hosts normally hand over their own tree instead.

use rlyeh_diagnostics::{Error, Result};
use swc_common::{input::StringInput, sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, Syntax, TsSyntax};

// Re-export AST types for consumers that need to inspect the AST
pub use swc_ecma_ast;

/// Source dialect, usually derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Pick a dialect from a file name. Unknown extensions parse as JSX,
    /// which is a superset of plain JavaScript.
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename.rsplit('.').next().unwrap_or("");
        match ext {
            "ts" | "mts" | "cts" => Dialect::TypeScript,
            "tsx" => Dialect::Tsx,
            "js" | "mjs" | "cjs" => Dialect::JavaScript,
            _ => Dialect::Jsx,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Dialect::JavaScript | Dialect::Jsx => Syntax::Es(EsSyntax {
                jsx: matches!(self, Dialect::Jsx),
                decorators: true,
                ..Default::default()
            }),
            Dialect::TypeScript | Dialect::Tsx => Syntax::Typescript(TsSyntax {
                tsx: matches!(self, Dialect::Tsx),
                decorators: true,
                ..Default::default()
            }),
        }
    }
}

/// Result of parsing one file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed AST module
    pub module: Module,
    /// Recoverable parser errors, already logged
    pub warnings: Vec<String>,
}

/// Parse `source` into a module.
///
/// A fatal parse error is returned as [`Error::MalformedInput`] carrying the
/// byte range of the offending token. Recoverable errors are logged and
/// collected in [`ParseResult::warnings`].
pub fn parse_module(source: &str, filename: &str, dialect: Dialect) -> Result<ParseResult> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let lexer = Lexer::new(
        dialect.syntax(),
        EsVersion::Es2022,
        StringInput::from(&*source_file),
        None,
    );

    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        Error::malformed(format!(
            "{}: parse error at {}..{}: {}",
            filename,
            e.span().lo.0,
            e.span().hi.0,
            e.kind().msg()
        ))
    })?;

    let mut warnings = Vec::new();
    for error in parser.take_errors() {
        let message = format!("{}: {}", filename, error.kind().msg());
        log::warn!("recoverable parse error in {}", message);
        warnings.push(message);
    }

    Ok(ParseResult { module, warnings })
}

/// Parse with the dialect picked from `filename`.
pub fn parse_file(source: &str, filename: &str) -> Result<Module> {
    parse_module(source, filename, Dialect::from_filename(filename)).map(|result| result.module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_function() {
        let source = r#"
            function factorial(n) {
                if (n <= 1) return 1;
                return n * factorial(n - 1);
            }
        "#;

        let module = parse_file(source, "test.js").unwrap();
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_parse_class_fields() {
        let source = r#"
            class Counter {
                count = 0;
                increment = () => { this.count += 1; };
                static create = () => new Counter();
            }
        "#;

        let module = parse_file(source, "counter.js").unwrap();
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_parse_typescript() {
        let source = "export const add = (a: number, b: number): number => a + b;";
        let module = parse_file(source, "add.ts").unwrap();
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_parse_jsx() {
        let source = "export default () => <div className=\"x\" />;";
        let result = parse_module(source, "view.jsx", Dialect::Jsx).unwrap();
        assert_eq!(result.module.body.len(), 1);
    }

    #[test]
    fn test_parse_error_is_malformed_input() {
        let err = parse_file("let x = ;", "broken.js").unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("broken.js"));
    }

    #[test]
    fn test_dialect_from_filename() {
        assert_eq!(Dialect::from_filename("a/b.ts"), Dialect::TypeScript);
        assert_eq!(Dialect::from_filename("a/b.tsx"), Dialect::Tsx);
        assert_eq!(Dialect::from_filename("a/b.mjs"), Dialect::JavaScript);
        assert_eq!(Dialect::from_filename("a/b.jsx"), Dialect::Jsx);
        assert_eq!(Dialect::from_filename("README"), Dialect::Jsx);
    }
}
