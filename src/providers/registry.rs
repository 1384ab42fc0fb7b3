use std::collections::HashMap;
use std::sync::Arc;

use super::Provider;
use crate::error::{GatewayError, Result};

/// Name-keyed providers plus the configured active key. Built once in
/// `main` and handed to the HTTP state.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    active: String,
}

impl ProviderRegistry {
    pub fn new(active: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            active: active.into(),
        }
    }

    // 同名覆盖（后注册者生效）
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve_active(&self) -> Result<Arc<dyn Provider>> {
        self.providers.get(&self.active).cloned().ok_or_else(|| {
            GatewayError::Config(format!(
                "Provider '{}' not found. Registered: {:?}",
                self.active,
                self.names()
            ))
        })
    }
}
