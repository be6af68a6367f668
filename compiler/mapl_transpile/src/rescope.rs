//! Recompute captured names from finished IR.
//!
//! Debuggers and IR rewriters only have the [`PipelineConfig`], not the
//! syntax tree. Replaying the IR through a fresh [`Environment`] yields the
//! same captured names the transpiler threaded through each lifted
//! definition, as long as the program had no undeclared-variable issues
//! (auto-declared names are indistinguishable from declared parameters once
//! lowered).

use rustc_hash::FxHashMap;

use mapl_ir::{
    DefinitionKind, FunctionCall, FunctionDefinition, PipelineConfig, SourceKind, Target,
    ValueSource, ROOT_VAR,
};
use mapl_stack::ensure_sufficient_stack;

use crate::environment::Environment;
use crate::errors::ScopeError;
use crate::transpiler::GLOBAL_SCOPE;

/// Captured names of every definition in `pipeline`, keyed by definition name.
pub fn captures_from_ir(
    pipeline: &PipelineConfig,
) -> Result<FxHashMap<String, Vec<String>>, ScopeError> {
    let lifted = pipeline
        .functions
        .iter()
        .filter(|def| matches!(def.kind, DefinitionKind::Block | DefinitionKind::Lambda))
        .map(|def| (def.name.as_str(), def))
        .collect();
    let mut replay = Replay {
        env: Environment::new(GLOBAL_SCOPE),
        lifted,
        captures: FxHashMap::default(),
    };

    for def in pipeline.definitions() {
        match def.kind {
            DefinitionKind::Root => {
                let declared: Vec<String> = def
                    .params
                    .iter()
                    .take_while(|name| name.as_str() == ROOT_VAR)
                    .cloned()
                    .collect();
                replay.definition(def, &declared)?;
            }
            DefinitionKind::Declared => replay.definition(def, &def.params)?,
            DefinitionKind::Block | DefinitionKind::Lambda => {}
        }
    }
    Ok(replay.captures)
}

struct Replay<'p> {
    env: Environment,
    lifted: FxHashMap<&'p str, &'p FunctionDefinition>,
    captures: FxHashMap<String, Vec<String>>,
}

impl<'p> Replay<'p> {
    fn definition(&mut self, def: &'p FunctionDefinition, declared: &[String]) -> Result<(), ScopeError> {
        self.env.push_child(def.name.clone(), declared)?;
        for mapping in &def.mappings {
            self.source(&mapping.value)?;
            if let Target::Var { name, .. } = &mapping.target {
                self.env.declare_or_inherit(name)?;
            }
        }
        let scope = self.env.pop()?;
        self.captures.insert(
            def.name.clone(),
            self.env.scope(scope).captured().as_slice().to_vec(),
        );
        Ok(())
    }

    fn source(&mut self, source: &'p ValueSource) -> Result<(), ScopeError> {
        match &source.kind {
            SourceKind::FromLocal(name) => {
                self.env.resolve(name);
                Ok(())
            }
            SourceKind::FunctionCall(call) => ensure_sufficient_stack(|| self.call(call)),
            _ => Ok(()),
        }
    }

    /// A call to a lifted definition is where its scope was entered: the
    /// leading placeholders are its declared parameters, the trailing local
    /// reads its captures as seen from the caller.
    fn call(&mut self, call: &'p FunctionCall) -> Result<(), ScopeError> {
        let Some(&def) = self.lifted.get(call.reference.name.as_str()) else {
            for arg in &call.args {
                self.source(arg)?;
            }
            return Ok(());
        };
        if self.captures.contains_key(&def.name) {
            return Ok(());
        }

        let declared: Vec<String> = call
            .args
            .iter()
            .map_while(|arg| match &arg.kind {
                SourceKind::FreeParameter(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        self.definition(def, &declared)?;
        for arg in &call.args[declared.len()..] {
            self.source(arg)?;
        }
        Ok(())
    }
}
