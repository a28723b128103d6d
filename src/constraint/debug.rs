//! Debug metadata carried by a compiled system: deferred log statements,
//! per-constraint debug traces and the symbol table they point into.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::term::LinearExpression;

/// Placeholder printed for a value the solver has not computed.
pub const UNSOLVED_VARIABLE: &str = "<unsolved>";

/// A format string whose `{}` placeholders are filled by evaluating
/// `to_resolve` against the solver state.
#[derive(Debug, Clone, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct LogEntry {
    /// `file:line` of the statement that produced the entry
    pub caller: String,
    pub format: String,
    pub to_resolve: Vec<LinearExpression>,
    /// Indices into [`SymbolTable::locations`], innermost first
    pub stack: Vec<u32>,
}

/// Debug trace attached to a constraint, resolved when the constraint fails.
pub type DebugInfo = LogEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Function {
    pub name: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Location {
    pub function_id: u32,
    pub line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SymbolTable {
    pub functions: Vec<Function>,
    pub locations: Vec<Location>,
}

impl SymbolTable {
    /// Registers `name` at `filename:line`, reusing the function entry if known.
    pub fn add_location(&mut self, name: &str, filename: &str, line: u32) -> u32 {
        let function_id = match self
            .functions
            .iter()
            .position(|f| f.name == name && f.filename == filename)
        {
            Some(id) => id as u32,
            None => {
                self.functions.push(Function {
                    name: name.to_string(),
                    filename: filename.to_string(),
                });
                (self.functions.len() - 1) as u32
            }
        };
        self.locations.push(Location { function_id, line });
        (self.locations.len() - 1) as u32
    }

    /// One `name\n\tfile:line\n` block per stack frame.
    pub fn format_stack(&self, stack: &[u32]) -> String {
        let mut out = String::new();
        for &id in stack {
            let location = self.locations[id as usize];
            let function = &self.functions[location.function_id as usize];
            out.push_str(&function.name);
            out.push_str("\n\t");
            out.push_str(&function.filename);
            out.push(':');
            out.push_str(&location.line.to_string());
            out.push('\n');
        }
        out
    }
}

/// Substitutes each `{}` in `format` with the next argument.
///
/// Arguments left over once the placeholders are exhausted are appended on
/// their own line.
pub fn format_entry(format: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut rest = format;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    for arg in args {
        out.push('\n');
        out.push_str(arg);
    }
    out
}
