//! Line classifier
//!
//! Maps one line of HDL source to at most one component record. Patterns
//! are whole-line anchored and tried in order; the first match wins:
//!
//! 1. `module <id> ;`
//! 2. `wire <id> ;`
//! 3. `input <id> ;`
//! 4. `output <id> ;`
//! 5. `assign <id> = <expr> ;`
//! 6. `endmodule`
//!
//! Anything else is blank (skipped) or unrecognized (reported). Lines that
//! merely contain a keyword, such as `wire a, b;` or a declaration with a
//! trailing comment, are unrecognized rather than partially parsed.

use crate::model::{ComponentKind, NewComponent};
use once_cell::sync::Lazy;
use regex::Regex;

/// Declaration patterns, in match order. Capture 1 is the identifier.
static DECLARATIONS: Lazy<[(ComponentKind, Regex); 4]> = Lazy::new(|| {
    [
        (ComponentKind::Module, declaration("module")),
        (ComponentKind::Wire, declaration("wire")),
        (ComponentKind::Input, declaration("input")),
        (ComponentKind::Output, declaration("output")),
    ]
});

/// Continuous assignment. The expression is captured lazily so whitespace
/// before the terminating `;` is not part of it.
static ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*assign\s+(\w+)\s*=\s*(.+?)\s*;\s*$").expect("assign pattern is valid")
});

static END_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*endmodule\s*$").expect("endmodule pattern is valid"));

fn declaration(keyword: &str) -> Regex {
    Regex::new(&format!(r"^\s*{keyword}\s+(\w+)\s*;\s*$")).expect("declaration pattern is valid")
}

/// Outcome of classifying a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// A recognized construct to be stored
    Component(NewComponent),
    /// `endmodule` - informational, never stored
    EndModule,
    /// Empty or whitespace-only line
    Blank,
    /// Non-blank line matching no pattern; carries the original text
    Unrecognized(String),
}

/// Classify one line of source text.
pub fn classify_line(line: &str) -> LineClass {
    for (kind, pattern) in DECLARATIONS.iter() {
        if let Some(caps) = pattern.captures(line) {
            return component(*kind, &caps[1], None, line);
        }
    }

    if let Some(caps) = ASSIGN.captures(line) {
        let expression = caps[2].trim();
        if expression.is_empty() {
            return LineClass::Unrecognized(line.to_string());
        }
        return component(
            ComponentKind::Assign,
            &caps[1],
            Some(expression.to_string()),
            line,
        );
    }

    if END_MODULE.is_match(line) {
        return LineClass::EndModule;
    }

    if line.trim().is_empty() {
        LineClass::Blank
    } else {
        LineClass::Unrecognized(line.to_string())
    }
}

fn component(kind: ComponentKind, name: &str, detail: Option<String>, line: &str) -> LineClass {
    // Captures are always non-empty `\w+`, so construction cannot fail in
    // practice; fall back to reporting the line rather than dropping it.
    match NewComponent::new(kind, name, detail) {
        Ok(record) => LineClass::Component(record),
        Err(_) => LineClass::Unrecognized(line.to_string()),
    }
}

/// A classification tagged with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub line_no: usize,
    pub class: LineClass,
}

/// Per-file classification counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTally {
    pub components: usize,
    pub unrecognized: usize,
    pub blank: usize,
    pub module_ends: usize,
}

impl LineTally {
    pub fn lines(&self) -> usize {
        self.components + self.unrecognized + self.blank + self.module_ends
    }
}

/// Stateful classifier for one input file
///
/// Numbers lines as they are fed in and keeps running counts.
#[derive(Debug, Default)]
pub struct LineClassifier {
    line_no: usize,
    tally: LineTally,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, line: &str) -> ClassifiedLine {
        self.line_no += 1;
        let class = classify_line(line);
        match &class {
            LineClass::Component(_) => self.tally.components += 1,
            LineClass::EndModule => self.tally.module_ends += 1,
            LineClass::Blank => self.tally.blank += 1,
            LineClass::Unrecognized(_) => self.tally.unrecognized += 1,
        }
        ClassifiedLine {
            line_no: self.line_no,
            class,
        }
    }

    pub fn tally(&self) -> LineTally {
        self.tally
    }
}
