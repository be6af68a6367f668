//! Lexical scope resolver.
//!
//! Scopes live in an arena owned by [`Environment`] and refer to their parent
//! by [`ScopeId`]. Resolving a name in a nested scope writes the capture into
//! every intermediate scope directly through its index: each of those scopes
//! becomes a generated function that must receive the variable as a
//! parameter, so a read three blocks deep threads the name through all three
//! generated signatures.
//!
//! Popped scopes stay in the arena; their final captured sets are what the
//! transpiler bakes into IR parameter lists.

use std::fmt;

use rustc_hash::FxHashSet;

use mapl_ir::THIS_VAR;

use crate::errors::ScopeError;

/// Index of a scope in the [`Environment`] arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The global scope every environment starts with.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Insertion-ordered set of names.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    order: Vec<String>,
    members: FxHashSet<String>,
}

impl NameSet {
    /// Insert a name; returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.members.contains(name) {
            return false;
        }
        self.members.insert(name.to_string());
        self.order.push(name.to_string());
        true
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl fmt::Debug for NameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.order).finish()
    }
}

/// One lexical scope: a function body, block or lambda.
#[derive(Clone, Debug)]
pub struct Scope {
    name: String,
    is_root: bool,
    parent: Option<ScopeId>,
    params: Vec<String>,
    locals: NameSet,
    captured: NameSet,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Declared parameters, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Names declared here (parameters included).
    pub fn locals(&self) -> &NameSet {
        &self.locals
    }

    /// Names inherited from ancestors, in first-reference order.
    pub fn captured(&self) -> &NameSet {
        &self.captured
    }

    /// Whether the name is local or already captured here.
    #[inline]
    pub fn has_in_scope(&self, name: &str) -> bool {
        self.locals.contains(name) || self.captured.contains(name)
    }
}

/// Outcome of resolving a variable reference.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Resolution {
    /// Declared in the resolving scope.
    Local,
    /// Found `depth` parents up; captured by every scope in between.
    Inherited { depth: usize },
    /// Not declared anywhere. The name has been declared in the root scope
    /// and captured along the chain so building can continue.
    Undeclared,
}

/// Arena of scopes plus a cursor on the scope currently being built.
#[derive(Clone, Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Environment {
    /// Create an environment holding only the root scope.
    pub fn new(root_name: impl Into<String>) -> Self {
        Environment {
            scopes: vec![Scope {
                name: root_name.into(),
                is_root: true,
                parent: None,
                params: Vec::new(),
                locals: NameSet::default(),
                captured: NameSet::default(),
            }],
            current: ScopeId::ROOT,
        }
    }

    /// The scope currently being built.
    #[inline]
    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn current_scope(&self) -> &Scope {
        self.scope(self.current)
    }

    /// Number of scopes ever created (popped ones included).
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Enter a new child of the current scope.
    ///
    /// The child's locals are seeded with `$this` and its parameters.
    pub fn push_child(
        &mut self,
        name: impl Into<String>,
        params: &[String],
    ) -> Result<ScopeId, ScopeError> {
        if params.iter().any(|p| p.trim().is_empty()) {
            return Err(ScopeError::BlankName);
        }
        let mut locals = NameSet::default();
        locals.insert(THIS_VAR);
        for param in params {
            locals.insert(param);
        }
        let index = u32::try_from(self.scopes.len()).map_err(|_| ScopeError::TooManyScopes)?;
        let id = ScopeId(index);
        self.scopes.push(Scope {
            name: name.into(),
            is_root: false,
            parent: Some(self.current),
            params: params.to_vec(),
            locals,
            captured: NameSet::default(),
        });
        self.current = id;
        Ok(id)
    }

    /// Leave the current scope, returning its id.
    pub fn pop(&mut self) -> Result<ScopeId, ScopeError> {
        let popped = self.current;
        self.current = self.scope(popped).parent.ok_or(ScopeError::PopRoot)?;
        Ok(popped)
    }

    /// Whether the name is local to, or captured by, the current scope.
    pub fn has_in_scope(&self, name: &str) -> bool {
        self.current_scope().has_in_scope(name)
    }

    /// Declare a variable in the current scope unless it already resolves.
    ///
    /// An existing ancestor variable is inherited (captured) instead, so
    /// writes inside nested blocks update the outer variable.
    pub fn declare_or_inherit(&mut self, name: &str) -> Result<(), ScopeError> {
        if name.trim().is_empty() {
            return Err(ScopeError::BlankName);
        }
        if self.lookup(self.current, name).is_none() {
            self.scopes[self.current.index()].locals.insert(name);
        }
        Ok(())
    }

    /// Resolve a variable reference from the current scope.
    pub fn resolve(&mut self, name: &str) -> Resolution {
        self.resolve_in(self.current, name)
    }

    /// Resolve a variable reference from `scope`.
    pub fn resolve_in(&mut self, scope: ScopeId, name: &str) -> Resolution {
        if let Some(resolution) = self.lookup(scope, name) {
            return resolution;
        }
        self.scopes[ScopeId::ROOT.index()].locals.insert(name);
        if scope != ScopeId::ROOT {
            self.capture_along(scope, ScopeId::ROOT, name);
        }
        tracing::debug!(
            scope = self.scope(scope).name(),
            var = name,
            "undeclared variable declared in root scope"
        );
        Resolution::Undeclared
    }

    /// Parameter list of the function generated for `scope`: declared
    /// parameters followed by captured names.
    pub fn parameters(&self, scope: ScopeId) -> Vec<String> {
        let scope = self.scope(scope);
        scope
            .params
            .iter()
            .chain(scope.captured.as_slice())
            .cloned()
            .collect()
    }

    /// Resolve `name` as local to `from`, or find the closest ancestor that
    /// has it in scope and record the capture in every scope below it.
    fn lookup(&mut self, from: ScopeId, name: &str) -> Option<Resolution> {
        if self.scope(from).locals.contains(name) {
            return Some(Resolution::Local);
        }
        let mut depth = 1;
        let mut cursor = self.scope(from).parent?;
        while !self.scope(cursor).has_in_scope(name) {
            cursor = self.scope(cursor).parent?;
            depth += 1;
        }
        self.capture_along(from, cursor, name);
        tracing::trace!(
            scope = self.scope(from).name(),
            var = name,
            depth,
            "captured variable"
        );
        Some(Resolution::Inherited { depth })
    }

    /// Add `name` to the captured set of `from` and each ancestor up to,
    /// but excluding, `owner`.
    fn capture_along(&mut self, from: ScopeId, owner: ScopeId, name: &str) {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            if id == owner {
                break;
            }
            let scope = &mut self.scopes[id.index()];
            scope.captured.insert(name);
            cursor = scope.parent;
        }
    }
}
