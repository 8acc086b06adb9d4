//! Catalog of provisioning modules available in the modules directory.

use std::collections::BTreeSet;

/// Names of the provisioning modules a service key may refer to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: BTreeSet<String>,
}

impl ModuleCatalog {
    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ModuleCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().map(Into::into).collect(),
        }
    }
}
