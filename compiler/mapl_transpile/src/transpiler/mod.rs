//! Syntax tree to Pipeline IR.
//!
//! The transpiler walks a [`Program`] depth-first, keeping an
//! [`Environment`] in step with the lexical nesting it visits. Every block,
//! branch and callback becomes its own [`FunctionDefinition`] (lambda
//! lifting); the variables each one reads from enclosing scopes become extra
//! trailing parameters, passed explicitly at the call site.
//!
//! # Error strategy
//!
//! In [`CompileMode::Tolerant`] issues are collected and building continues
//! (undeclared names are auto-declared at the root), so one pass reports as
//! many issues as possible. [`CompileMode::Strict`] stops at the first one.

mod expr;
mod lift;

use rustc_hash::FxHashMap;

use mapl_diagnostic::{blank_variable_name, Diagnostic, DiagnosticConfig, DiagnosticQueue};
use mapl_ir::{
    DefinitionKind, FieldMapping, FunctionDefinition, PipelineConfig, Span, Target,
    DEFAULT_PACKAGE, ROOT_VAR,
};

use crate::conflicts::check_var_field_conflicts;
use crate::environment::{Environment, ScopeId};
use crate::errors::{TranspileError, TranspileResult};
use crate::names::{NameGenerator, SequentialNames};
use crate::signature::SignatureTable;
use crate::syntax::{ExprKind, FunctionDef, Program, Statement, TargetExpr};

/// Name of the scope above every function body.
pub const GLOBAL_SCOPE: &str = "<global>";

/// How transpilation reacts to issues.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CompileMode {
    /// Collect every issue and keep going.
    #[default]
    Tolerant,
    /// Fail on the first issue (tests, CI).
    Strict,
}

/// Settings a host passes when it does not build the transpiler by hand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranspileConfig {
    pub mode: CompileMode,
    /// Package for programs that do not declare one.
    pub package: Option<String>,
}

/// Everything a transpilation produced.
#[derive(Clone, Debug)]
pub struct TranspileOutput {
    pub pipeline: PipelineConfig,
    /// Issues sorted by source position.
    pub diagnostics: Vec<Diagnostic>,
    /// Final captured names of every generated definition, by name.
    pub captures: FxHashMap<String, Vec<String>>,
}

/// Builds Pipeline IR from a syntax tree. One instance per source unit.
pub struct Transpiler {
    env: Environment,
    signatures: SignatureTable,
    names: Box<dyn NameGenerator>,
    mode: CompileMode,
    diagnostics: DiagnosticQueue,
    definitions: Vec<FunctionDefinition>,
    captures: FxHashMap<String, Vec<String>>,
    package: String,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transpiler {
    /// Tolerant transpiler with the builtin signatures and sequential names.
    pub fn new() -> Self {
        Transpiler {
            env: Environment::new(GLOBAL_SCOPE),
            signatures: SignatureTable::builtins(),
            names: Box::new(SequentialNames::new()),
            mode: CompileMode::default(),
            diagnostics: DiagnosticQueue::new(),
            definitions: Vec::new(),
            captures: FxHashMap::default(),
            package: DEFAULT_PACKAGE.to_string(),
        }
    }

    /// Transpiler configured from `config`.
    pub fn with_config(config: TranspileConfig) -> Self {
        let mut transpiler = Self::new().with_mode(config.mode);
        if let Some(package) = config.package {
            transpiler.package = package;
        }
        transpiler
    }

    #[must_use]
    pub fn with_mode(mut self, mode: CompileMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_names(mut self, names: impl NameGenerator + 'static) -> Self {
        self.names = Box::new(names);
        self
    }

    #[must_use]
    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    #[must_use]
    pub fn with_diagnostic_config(mut self, config: DiagnosticConfig) -> Self {
        self.diagnostics = DiagnosticQueue::with_config(config);
        self
    }

    /// Transpile, failing if any error was found.
    pub fn transpile(self, program: &Program) -> TranspileResult<PipelineConfig> {
        let output = self.transpile_with_diagnostics(program)?;
        if output.diagnostics.iter().any(Diagnostic::is_error) {
            return Err(TranspileError::Issues(output.diagnostics));
        }
        Ok(output.pipeline)
    }

    /// Transpile, returning the IR together with every collected issue.
    ///
    /// Only strict mode (or misuse of the scope resolver) returns `Err`.
    #[tracing::instrument(level = "debug", skip_all, fields(
        package = program.package.as_deref().unwrap_or(&self.package),
        functions = program.functions.len(),
    ))]
    pub fn transpile_with_diagnostics(mut self, program: &Program) -> TranspileResult<TranspileOutput> {
        if let Some(package) = &program.package {
            self.package.clone_from(package);
        }

        let root = self.root_definition(&program.statements, program.span)?;
        for function in &program.functions {
            let definition = self.function_definition(function)?;
            self.definitions.push(definition);
        }

        let pipeline = PipelineConfig {
            package: self.package.clone(),
            root,
            functions: std::mem::take(&mut self.definitions),
        };
        for diagnostic in check_var_field_conflicts(&pipeline) {
            self.report(diagnostic)?;
        }

        let diagnostics = self.diagnostics.flush();
        tracing::debug!(
            definitions = pipeline.functions.len() + 1,
            issues = diagnostics.len(),
            "transpiled program"
        );
        Ok(TranspileOutput {
            pipeline,
            diagnostics,
            captures: self.captures,
        })
    }

    /// Record an issue, or fail right away in strict mode.
    fn report(&mut self, diagnostic: Diagnostic) -> TranspileResult<()> {
        match self.mode {
            CompileMode::Strict => Err(TranspileError::Strict(Box::new(diagnostic))),
            CompileMode::Tolerant => {
                self.diagnostics.add(diagnostic);
                Ok(())
            }
        }
    }

    fn root_definition(
        &mut self,
        statements: &[Statement],
        span: Span,
    ) -> TranspileResult<FunctionDefinition> {
        let name = format!("{}_root_function", self.package);
        self.env.push_child(name, &[ROOT_VAR.to_string()])?;
        let mappings = self.statements(statements)?;
        let scope = self.env.pop()?;
        Ok(self.definition(scope, mappings, false, DefinitionKind::Root, span))
    }

    fn function_definition(&mut self, function: &FunctionDef) -> TranspileResult<FunctionDefinition> {
        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            if param.name.trim().is_empty() {
                self.report(blank_variable_name(param.span))?;
            } else {
                params.push(param.name.clone());
            }
        }

        self.env.push_child(function.name.clone(), &params)?;
        let mappings = match &function.body.kind {
            ExprKind::Block(block) => self.statements(&block.statements)?,
            _ => vec![FieldMapping::output(self.expr(&function.body)?)],
        };
        let scope = self.env.pop()?;
        Ok(self.definition(scope, mappings, false, DefinitionKind::Declared, function.span))
    }

    /// Emit the definition for a finished scope and remember its captures.
    fn definition(
        &mut self,
        scope: ScopeId,
        mappings: Vec<FieldMapping>,
        inherit_parent_vars: bool,
        kind: DefinitionKind,
        span: Span,
    ) -> FunctionDefinition {
        let finished = self.env.scope(scope);
        let name = finished.name().to_string();
        self.captures
            .insert(name.clone(), finished.captured().as_slice().to_vec());
        FunctionDefinition {
            name,
            params: self.env.parameters(scope),
            inherit_parent_vars,
            mappings,
            kind,
            span,
        }
    }

    fn statements(&mut self, statements: &[Statement]) -> TranspileResult<Vec<FieldMapping>> {
        statements.iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&mut self, statement: &Statement) -> TranspileResult<FieldMapping> {
        let mut value = self.expr(&statement.value)?;
        let iterate_source = std::mem::take(&mut value.iterate);

        let target = match &statement.target {
            None => Target::Output,
            Some(TargetExpr::Field { path }) => Target::Field { path: path.clone() },
            Some(TargetExpr::Var { name, path }) => {
                if name.trim().is_empty() {
                    self.report(blank_variable_name(statement.span))?;
                } else {
                    self.env.declare_or_inherit(name)?;
                }
                Target::Var {
                    name: name.clone(),
                    path: path.clone(),
                }
            }
        };

        Ok(FieldMapping {
            value,
            target,
            iterate_source,
            span: statement.span,
        })
    }
}

#[cfg(test)]
mod tests;
