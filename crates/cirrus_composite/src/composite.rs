//! The generic composite container and its builder.
//!
//! A [`Composite`] records which children a composite unit declared (in
//! declaration order) and the curated mapping of public outputs it exposes.
//! The output key set is fixed by the composite author at build time and is
//! independent of input values; internal draft-merging state is never part
//! of the surface.

use std::sync::Arc;

use hashbrown::HashMap;

use cirrus_resource::node::ResourceId;
use cirrus_value::Deferred;

/// A built composite unit: named children plus public outputs.
#[derive(Debug)]
pub struct Composite {
    name: Arc<str>,
    children: Vec<ResourceId>,
    outputs: HashMap<&'static str, Deferred<String>>,
}

impl Composite {
    /// Starts building a composite with the given logical name.
    #[must_use]
    pub fn builder(name: impl Into<Arc<str>>) -> CompositeBuilder {
        CompositeBuilder {
            name: name.into(),
            children: Vec::new(),
            outputs: HashMap::new(),
        }
    }

    /// Returns the composite's logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The children declared by this composite, in declaration order.
    #[must_use]
    pub fn children(&self) -> &[ResourceId] {
        &self.children
    }

    /// Looks up a public output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Deferred<String>> {
        self.outputs.get(name)
    }

    /// The public output names, sorted.
    #[must_use]
    pub fn output_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.outputs.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Builder for [`Composite`].
#[derive(Debug)]
pub struct CompositeBuilder {
    name: Arc<str>,
    children: Vec<ResourceId>,
    outputs: HashMap<&'static str, Deferred<String>>,
}

impl CompositeBuilder {
    /// Appends a child identity.
    #[must_use]
    pub fn child(mut self, id: ResourceId) -> Self {
        self.children.push(id);
        self
    }

    /// Publishes one output under a fixed name.
    #[must_use]
    pub fn output(mut self, name: &'static str, value: Deferred<String>) -> Self {
        self.outputs.insert(name, value);
        self
    }

    /// Finishes the composite.
    #[must_use]
    pub fn finish(self) -> Composite {
        Composite {
            name: self.name,
            children: self.children,
            outputs: self.outputs,
        }
    }
}
