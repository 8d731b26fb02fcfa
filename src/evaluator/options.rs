/// Names every program may read without declaring them.
pub const DEFAULT_GLOBALS: &[&str] = &[
    "undefined",
    "NaN",
    "Infinity",
    "console",
    "Math",
    "JSON",
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Error",
    "parseInt",
    "parseFloat",
    "isNaN",
    "require",
    "module",
    "exports",
];

/// Knobs for a single check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    /// Prelude names seeded into the global scope.
    pub globals: Vec<String>,
    /// Sharpen initialisers and assigned values with the constant folder.
    pub fold_constants: bool,
    /// Merge consecutive diagnostics reported at the same location.
    pub merge_diagnostics: bool,
    /// Report `x = undefined`-style assignments.
    pub report_undefined_assignment: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            globals: DEFAULT_GLOBALS.iter().map(|name| name.to_string()).collect(),
            fold_constants: true,
            merge_diagnostics: true,
            report_undefined_assignment: false,
        }
    }
}

impl CheckOptions {
    pub fn with_globals<I, S>(mut self, globals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globals = globals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.push(name.into());
        self
    }

    pub fn with_fold_constants(mut self, fold_constants: bool) -> Self {
        self.fold_constants = fold_constants;
        self
    }

    pub fn with_merge_diagnostics(mut self, merge_diagnostics: bool) -> Self {
        self.merge_diagnostics = merge_diagnostics;
        self
    }

    pub fn with_report_undefined_assignment(mut self, report: bool) -> Self {
        self.report_undefined_assignment = report;
        self
    }
}
