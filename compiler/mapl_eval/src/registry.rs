//! Function registry: package -> name -> overloads.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use mapl_ir::{FunctionReference, BUILTINS_PACKAGE, WILDCARD_PACKAGE};

use crate::function::CallableFunction;
use crate::suggest::similar_functions;

type Overloads = Vec<Arc<dyn CallableFunction>>;

/// Every callable function the runtime knows, grouped by package and name.
/// Overloads keep their registration order.
#[derive(Default)]
pub struct FunctionRegistry {
    packages: FxHashMap<String, FxHashMap<String, Overloads>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an overload under its signature's package and name.
    pub fn register(&mut self, function: Arc<dyn CallableFunction>) {
        let signature = function.signature();
        let package = signature.package.clone();
        let name = signature.name.clone();
        self.packages
            .entry(package)
            .or_default()
            .entry(name)
            .or_default()
            .push(function);
    }

    pub fn overloads(&self, package: &str, name: &str) -> &[Arc<dyn CallableFunction>] {
        self.packages
            .get(package)
            .and_then(|names| names.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Registered package names, sorted.
    pub fn packages(&self) -> Vec<&str> {
        let mut packages: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        packages.sort_unstable();
        packages
    }

    pub fn contains_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Number of registered overloads across all packages.
    pub fn len(&self) -> usize {
        self.packages
            .values()
            .flat_map(FxHashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages searched for `reference` from code running in `current`.
    ///
    /// An explicit package is searched alone, the wildcard searches every
    /// registered package, and an unqualified name searches the current
    /// package, the builtins and the aliased packages, in that order.
    pub fn search_packages(
        &self,
        reference: &FunctionReference,
        current: &str,
        aliases: &[String],
    ) -> Vec<String> {
        match reference.package.as_deref() {
            Some(WILDCARD_PACKAGE) => self.packages().into_iter().map(str::to_string).collect(),
            Some(package) => vec![package.to_string()],
            None => {
                let mut packages = vec![current.to_string()];
                let implicit = std::iter::once(BUILTINS_PACKAGE).chain(aliases.iter().map(String::as_str));
                for package in implicit {
                    if !packages.iter().any(|p| p == package) {
                        packages.push(package.to_string());
                    }
                }
                packages
            }
        }
    }

    /// Every overload of `reference.name` across the searched packages.
    pub fn lookup(
        &self,
        reference: &FunctionReference,
        current: &str,
        aliases: &[String],
    ) -> Vec<Arc<dyn CallableFunction>> {
        self.search_packages(reference, current, aliases)
            .iter()
            .flat_map(|package| self.overloads(package, &reference.name))
            .cloned()
            .collect()
    }

    /// Names close to `reference.name` in the searched packages.
    pub fn suggestions(
        &self,
        reference: &FunctionReference,
        current: &str,
        aliases: &[String],
    ) -> Vec<String> {
        let searched = self.search_packages(reference, current, aliases);
        let candidates = searched.iter().filter_map(|package| {
            self.packages
                .get_key_value(package.as_str())
                .map(|(package, names)| (package.as_str(), names))
        });
        similar_functions(
            &reference.name,
            candidates.flat_map(|(package, names)| {
                names.keys().map(move |name| (package, name.as_str()))
            }),
        )
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for package in self.packages() {
            let count: usize = self.packages[package].values().map(Vec::len).sum();
            map.entry(&package, &count);
        }
        map.finish()
    }
}
