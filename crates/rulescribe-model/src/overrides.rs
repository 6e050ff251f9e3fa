//! Hand-written sentences that replace a generic template for one exact,
//! known construct.
//!
//! Each analyzer owns a table keyed on its own context type and consults it
//! before falling back to the generic template in [`crate::describe`].

use std::fmt;

type Matcher<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

struct Override<C> {
    name: &'static str,
    matches: Matcher<C>,
    sentence: String,
}

/// Ordered `(pattern) -> fixed sentence` entries; the first match wins.
pub struct OverrideTable<C> {
    entries: Vec<Override<C>>,
}

impl<C> OverrideTable<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. `name` only shows up in diagnostics.
    pub fn with(
        mut self,
        name: &'static str,
        matches: impl Fn(&C) -> bool + Send + Sync + 'static,
        sentence: impl Into<String>,
    ) -> Self {
        self.entries.push(Override {
            name,
            matches: Box::new(matches),
            sentence: sentence.into(),
        });
        self
    }

    /// Return the sentence of the first entry matching `context`.
    pub fn lookup(&self, context: &C) -> Option<&str> {
        let hit = self.entries.iter().find(|entry| (entry.matches)(context))?;
        tracing::debug!(entry = hit.name, "description override applied");
        Some(hit.sentence.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for OverrideTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for OverrideTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.name))
            .finish()
    }
}
