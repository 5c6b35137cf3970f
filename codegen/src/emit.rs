//! Kernel-text IR and renderer.
//!
//! Kernels are assembled as a tree of [`Fragment`]s and rendered by
//! [`KernelFile`] only at the end. Preprocessor lines always start in column
//! 0; everything else is indented two spaces per enclosing brace.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Condition of a preprocessor conditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// `#ifdef NAME`
    Defined(String),
    /// `#ifndef NAME`
    NotDefined(String),
    /// `#if EXPR`
    Expr(String),
}

impl Guard {
    fn open(&self) -> String {
        match self {
            Guard::Defined(name) => format!("#ifdef {name}"),
            Guard::NotDefined(name) => format!("#ifndef {name}"),
            Guard::Expr(expr) => format!("#if {expr}"),
        }
    }

    fn close(&self) -> String {
        match self {
            Guard::Defined(name) | Guard::NotDefined(name) => format!("#endif // {name}"),
            Guard::Expr(_) => "#endif".to_string(),
        }
    }
}

/// One node of the kernel-text tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A statement or comment line.
    Line(String),
    /// An empty line.
    Blank,
    /// A verbatim preprocessor line such as `#include "x.h"`.
    Directive(String),
    /// `#define name value`
    Define {
        /// Macro name.
        name: String,
        /// Replacement text (may be empty).
        value: String,
    },
    /// `#undef name`
    Undef(String),
    /// `#if… / #else / #endif`
    Conditional {
        /// Opening condition.
        guard: Guard,
        /// Fragments active when the guard holds.
        then: Vec<Fragment>,
        /// Fragments of the `#else` branch, if any.
        otherwise: Option<Vec<Fragment>>,
    },
    /// A braced scope.
    Scope(Vec<Fragment>),
    /// A runtime `if (cond) { … } else { … }`.
    If {
        /// C condition, without parentheses.
        cond: String,
        /// Taken branch.
        then: Vec<Fragment>,
        /// `else` branch, if any.
        otherwise: Option<Vec<Fragment>>,
    },
    /// A runtime branch whose `if`/`else` braces only exist when `guard` is
    /// defined. Without the guard, `then` runs unconditionally in the
    /// enclosing scope and `otherwise` is compiled out.
    GuardedBranch {
        /// Macro enabling the branch.
        guard: String,
        /// C condition, without parentheses.
        cond: String,
        /// Always-compiled branch.
        then: Vec<Fragment>,
        /// Branch compiled only under `guard`.
        otherwise: Vec<Fragment>,
    },
}

impl Fragment {
    /// A statement or comment line.
    pub fn line(text: impl Into<String>) -> Self {
        Fragment::Line(text.into())
    }

    /// A `// text` comment line.
    pub fn comment(text: impl AsRef<str>) -> Self {
        Fragment::Line(format!("// {}", text.as_ref()))
    }

    /// `#define name value`
    pub fn define(name: impl Into<String>, value: impl Into<String>) -> Self {
        Fragment::Define {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `#ifdef name` without an `#else`.
    pub fn ifdef(name: impl Into<String>, then: Vec<Fragment>) -> Self {
        Fragment::Conditional {
            guard: Guard::Defined(name.into()),
            then,
            otherwise: None,
        }
    }

    /// `#ifdef name … #else … #endif`.
    pub fn ifdef_else(name: impl Into<String>, then: Vec<Fragment>, otherwise: Vec<Fragment>) -> Self {
        Fragment::Conditional {
            guard: Guard::Defined(name.into()),
            then,
            otherwise: Some(otherwise),
        }
    }

    /// `#ifndef name` without an `#else`.
    pub fn ifndef(name: impl Into<String>, then: Vec<Fragment>) -> Self {
        Fragment::Conditional {
            guard: Guard::NotDefined(name.into()),
            then,
            otherwise: None,
        }
    }

    /// `#ifndef name … #else … #endif`.
    pub fn ifndef_else(
        name: impl Into<String>,
        then: Vec<Fragment>,
        otherwise: Vec<Fragment>,
    ) -> Self {
        Fragment::Conditional {
            guard: Guard::NotDefined(name.into()),
            then,
            otherwise: Some(otherwise),
        }
    }

    /// `#if expr` without an `#else`.
    pub fn if_expr(expr: impl Into<String>, then: Vec<Fragment>) -> Self {
        Fragment::Conditional {
            guard: Guard::Expr(expr.into()),
            then,
            otherwise: None,
        }
    }

    /// `#if expr … #else … #endif`.
    pub fn if_expr_else(expr: impl Into<String>, then: Vec<Fragment>, otherwise: Vec<Fragment>) -> Self {
        Fragment::Conditional {
            guard: Guard::Expr(expr.into()),
            then,
            otherwise: Some(otherwise),
        }
    }

    fn children(&self) -> Vec<&[Fragment]> {
        match self {
            Fragment::Conditional {
                then, otherwise, ..
            }
            | Fragment::If {
                then, otherwise, ..
            } => {
                let mut out = vec![then.as_slice()];
                if let Some(otherwise) = otherwise {
                    out.push(otherwise.as_slice());
                }
                out
            }
            Fragment::GuardedBranch {
                then, otherwise, ..
            } => vec![then.as_slice(), otherwise.as_slice()],
            Fragment::Scope(body) => vec![body.as_slice()],
            _ => Vec::new(),
        }
    }
}

/// Visits every fragment of a tree in document order.
pub fn visit<'a>(fragments: &'a [Fragment], f: &mut impl FnMut(&'a Fragment)) {
    for fragment in fragments {
        f(fragment);
        for child in fragment.children() {
            visit(child, f);
        }
    }
}

/// Macro names defined anywhere in the tree, unique, in first-definition
/// order.
#[must_use]
pub fn defined_macros(fragments: &[Fragment]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    visit(fragments, &mut |f| {
        if let Fragment::Define { name, .. } = f {
            if seen.insert(name.as_str()) {
                names.push(name.clone());
            }
        }
    });
    names
}

/// Comparison of the `#define`s and `#undef`s of one kernel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MacroBalance {
    /// Defined but never undefined.
    pub missing: Vec<String>,
    /// Undefined but never defined.
    pub stray: Vec<String>,
    /// Undefined more than once.
    pub repeated: Vec<String>,
}

impl MacroBalance {
    /// Computes the balance of a kernel tree.
    #[must_use]
    pub fn of(fragments: &[Fragment]) -> Self {
        let defined: BTreeSet<String> = defined_macros(fragments).into_iter().collect();
        let mut undefs: BTreeMap<&str, usize> = BTreeMap::new();
        visit(fragments, &mut |f| {
            if let Fragment::Undef(name) = f {
                *undefs.entry(name.as_str()).or_default() += 1;
            }
        });

        Self {
            missing: defined
                .iter()
                .filter(|name| !undefs.contains_key(name.as_str()))
                .cloned()
                .collect(),
            stray: undefs
                .keys()
                .filter(|name| !defined.contains(**name))
                .map(|name| (*name).to_string())
                .collect(),
            repeated: undefs
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(name, _)| (*name).to_string())
                .collect(),
        }
    }

    /// Every defined macro is undefined exactly once and nothing else is.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.missing.is_empty() && self.stray.is_empty() && self.repeated.is_empty()
    }
}

/// Renders fragments to kernel text.
pub struct KernelFile {
    /// The rendered text so far.
    pub buf: String,
    depth: usize,
}

impl KernelFile {
    /// Starts a file with a one-line provenance comment.
    #[must_use]
    pub fn new(origin: &str) -> Self {
        let mut f = Self {
            buf: String::new(),
            depth: 0,
        };
        f.line(&format!("// {origin}"));
        f.blank();
        f
    }

    /// Appends an indented line.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Appends a preprocessor line in column 0.
    pub fn directive(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn nested(&mut self, fragments: &[Fragment]) {
        self.depth += 1;
        self.render_all(fragments);
        self.depth -= 1;
    }

    /// Renders a sequence of fragments.
    pub fn render_all(&mut self, fragments: &[Fragment]) {
        for fragment in fragments {
            self.render(fragment);
        }
    }

    /// Renders one fragment.
    pub fn render(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Line(text) => self.line(text),
            Fragment::Blank => self.blank(),
            Fragment::Directive(text) => self.directive(text),
            Fragment::Define { name, value } if value.is_empty() => {
                self.directive(&format!("#define {name}"));
            }
            Fragment::Define { name, value } => {
                self.directive(&format!("#define {name} {value}"));
            }
            Fragment::Undef(name) => self.directive(&format!("#undef {name}")),
            Fragment::Conditional {
                guard,
                then,
                otherwise,
            } => {
                self.directive(&guard.open());
                self.render_all(then);
                if let Some(otherwise) = otherwise {
                    self.directive("#else");
                    self.render_all(otherwise);
                }
                self.directive(&guard.close());
            }
            Fragment::Scope(body) => {
                self.line("{");
                self.nested(body);
                self.line("}");
            }
            Fragment::If {
                cond,
                then,
                otherwise,
            } => {
                self.line(&format!("if ({cond}) {{"));
                self.nested(then);
                if let Some(otherwise) = otherwise {
                    self.line("} else {");
                    self.nested(otherwise);
                }
                self.line("}");
            }
            Fragment::GuardedBranch {
                guard,
                cond,
                then,
                otherwise,
            } => {
                self.directive(&format!("#ifdef {guard}"));
                self.line(&format!("if ({cond}) {{"));
                self.directive("#endif");
                self.nested(then);
                self.directive(&format!("#ifdef {guard}"));
                self.line("} else {");
                self.nested(otherwise);
                self.line("}");
                self.directive(&format!("#endif // {guard}"));
            }
        }
    }

    /// Returns the rendered text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Writes a generated file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(fragments: &[Fragment]) -> String {
        let mut f = KernelFile {
            buf: String::new(),
            depth: 0,
        };
        f.render_all(fragments);
        f.finish()
    }

    #[test]
    fn directives_stay_in_column_zero() {
        let text = render(&[Fragment::Scope(vec![Fragment::ifdef(
            "MULTI_GPU",
            vec![Fragment::line("x = 1;")],
        )])]);
        assert_eq!(text, "{\n#ifdef MULTI_GPU\n  x = 1;\n#endif // MULTI_GPU\n}\n");
    }

    #[test]
    fn guarded_branch_layout() {
        let text = render(&[Fragment::GuardedBranch {
            guard: "MULTI_GPU".into(),
            cond: "k == 0".into(),
            then: vec![Fragment::line("a();")],
            otherwise: vec![Fragment::line("b();")],
        }]);
        assert_eq!(
            text,
            "#ifdef MULTI_GPU\nif (k == 0) {\n#endif\n  a();\n#ifdef MULTI_GPU\n} else {\n  b();\n}\n#endif // MULTI_GPU\n"
        );
    }

    #[test]
    fn empty_define_has_no_trailing_space() {
        assert_eq!(render(&[Fragment::define("VOLATILE", "")]), "#define VOLATILE\n");
    }

    #[test]
    fn balance_detects_every_mismatch() {
        let tree = vec![
            Fragment::ifdef_else(
                "D",
                vec![Fragment::define("A", "1"), Fragment::define("B", "2")],
                vec![Fragment::define("A", "3")],
            ),
            Fragment::Undef("A".into()),
            Fragment::Undef("C".into()),
            Fragment::Undef("C".into()),
        ];
        let balance = MacroBalance::of(&tree);
        assert_eq!(balance.missing, vec!["B".to_string()]);
        assert_eq!(balance.stray, vec!["C".to_string()]);
        assert_eq!(balance.repeated, vec!["C".to_string()]);
        assert!(!balance.is_balanced());
    }

    #[test]
    fn defined_macros_are_unique_in_order() {
        let tree = vec![
            Fragment::define("Z", ""),
            Fragment::ifdef_else(
                "D",
                vec![Fragment::define("A", "1")],
                vec![Fragment::define("A", "2"), Fragment::define("Z", "")],
            ),
        ];
        assert_eq!(defined_macros(&tree), vec!["Z".to_string(), "A".to_string()]);
    }
}
