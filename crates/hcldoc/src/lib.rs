//! # hcldoc - HCL documents without evaluation
//!
//! Reads HashiCorp Configuration Language (HCL) source and turns it into an ordered document.
//! Variables, function calls and other expressions are not evaluated; they are kept as
//! placeholders for a later phase.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `hcldoc` works internally.
//!
//! ### HCL Terms
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `structures`
//! - ...where there are two kinds:
//!   - `attribute`: a "key = value" pair
//!   - or `block`:
//!     - 1 `identifier`
//!     - followed by 0 or more `labels`
//!     - and a `body` enclosed in `{` and `}`
//!
//! This is a valid hcl file:
//! ```hcl
//! # single line comments work like this
//! // ...or like this
//!
//! /* multi-line
//! comments
//! also work */
//!
//! an_attribute_key = "and its value"
//!
//! this_is_a_block_identifier this_is_a_label "another label, but in quotes" {
//!   attribute_inside_the_blocks_body = 42
//!
//!   an_empty_block_with_no_labels {}
//! }
//! ```
//!
//! ### Scanning
//!
//! [lexer::Lexer] turns the source into [lexer::Token]s. It keeps a stack of lexical modes
//! ([lexer::Mode]) so that strings, heredocs and comments are scanned as a whole, including any
//! `${ ... }` interpolation inside of them.
//!
//! ### Building the tree
//!
//! [parser::Parser] reads the tokens and builds a [symbol::SymbolTree]. Instead of recursing it
//! keeps an explicit stack of open scopes (block body, attribute, array, map). Errors do not
//! throw away what was read: the result is a [parser::ParseOutcome] holding the tree and the
//! error, if any. The caller decides with a [Recovery] policy whether the partial tree is good
//! enough.
//!
//! ### Reducing
//!
//! [reduce::reduce] folds the tree into a [value::Map]:
//!
//! ```hcl
//! service "web" { port = 80 }
//! service "web" { port = 81 }
//! service "db" { port = 5432 }
//! ```
//!
//! becomes
//!
//! ```json
//! {"service": {"web": [{"port": 80.0}, {"port": 81.0}], "db": {"port": 5432.0}}}
//! ```
//!
//! Alternatively [configuration::Configuration] keeps the root blocks and attributes apart
//! without merging anything.
//!
//! ### Output
//!
//! [value::Value] gets serialized via [serde]. Unevaluated expressions are written as
//! `"${...}"` strings.
//!
//! ```
//! let document = hcldoc::parse(r#"
//! region = "eu-west-1"
//! instance "web" {
//!   ami = var.ami
//! }
//! "#).unwrap();
//!
//! assert_eq!(
//!     serde_json::to_string(&document).unwrap(),
//!     r#"{"region":"eu-west-1","instance":{"web":{"ami":"${var.ami}"}}}"#
//! );
//! ```
pub mod configuration;
pub mod error;
pub mod lexer;
pub mod load;
pub mod parser;
pub mod reduce;
pub mod span;
pub mod symbol;
pub mod value;
pub mod visit;

pub use configuration::Configuration;
pub use error::{Error, Result};
pub use load::{load_configuration, load_file, load_reader};
pub use parser::Recovery;
pub use value::{Map, Value};

use symbol::SymbolTree;

/// Parses and reduces `source`, failing on any error
pub fn parse(source: &str) -> Result<Map> {
    parse_with(source, Recovery::Strict)
}

/// Parses and reduces `source`
///
/// With [Recovery::BestEffort] lexical and structural errors are logged and whatever was read
/// before the error gets reduced. Errors while reducing always fail.
pub fn parse_with(source: &str, recovery: impl Into<Recovery>) -> Result<Map> {
    let tree = parse_symbols(source, recovery)?;
    reduce::reduce(&tree)
}

/// Parses `source` into its symbol tree
pub fn parse_symbols(source: &str, recovery: impl Into<Recovery>) -> Result<SymbolTree> {
    parser::parse_tree(source).recover(recovery.into())
}

/// Parses `source` into root blocks and root attributes
pub fn parse_configuration(source: &str, recovery: impl Into<Recovery>) -> Result<Configuration> {
    parse_symbols(source, recovery)?.try_into()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn best_effort_reduces_the_partial_tree() {
        let source = "a = 1\nb = [1, 2\n";

        assert!(parse(source).is_err());
        let map = parse_with(source, true).expect("errors are ignored");
        assert_eq!(map["a"].as_f64(), Some(1.0));
        assert_eq!(
            map["b"].as_array(),
            Some(&[Value::Number(1.0), Value::Number(2.0)][..])
        );

        let map = parse_with("flag = true\nb = [", Recovery::BestEffort).expect("errors are ignored");
        assert_eq!(map["flag"].as_bool(), Some(true));
        assert_eq!(map["b"].as_array(), Some(&[][..]));
    }

    #[test]
    fn reduction_errors_are_not_recovered() {
        let source = "a = 1\na { b = 2 }\n";
        assert!(matches!(
            parse_with(source, Recovery::BestEffort),
            Err(Error::ScopeConflict { .. })
        ));
    }

    #[test]
    fn deep_nesting_fails_before_reduction() {
        let too_deep = format!("a = {}{}\n", "[".repeat(20_000), "]".repeat(20_000));
        assert!(matches!(
            parse(&too_deep),
            Err(Error::Syntax {
                kind: error::SyntaxErrorKind::NestingTooDeep(parser::MAX_DEPTH),
                ..
            })
        ));

        // body and attribute take two of the scopes
        let levels = parser::MAX_DEPTH - 2;
        let deepest = format!("a = {}{}\n", "[".repeat(levels), "]".repeat(levels));
        let map = parse(&deepest).expect("within the limit");
        let json = serde_json::to_string(&map).expect("serializable");
        assert_eq!(json.len(), r#"{"a":}"#.len() + 2 * levels);

        let mut value = &map["a"];
        let mut depth = 0;
        while let Some([inner]) = value.as_array() {
            value = inner;
            depth += 1;
        }
        assert_eq!(depth, levels - 1);
        assert_eq!(value.as_array(), Some(&[][..]));
    }

    #[test]
    fn configuration_entry_point() {
        let configuration = parse_configuration("x = 1\ny {}\n", Recovery::Strict).expect("parses");
        assert_eq!(configuration.attributes().count(), 1);
        assert_eq!(configuration.blocks().count(), 1);

        assert!(parse_configuration("[1]\n", Recovery::Strict).is_err());
    }
}
