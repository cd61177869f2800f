//! Decorative Modules
//!
//! Animation and canvas flourishes re-initialized after every swap. A
//! failing module is logged and skipped; it never fails a navigation.

/// Page the modules are entering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub path: String,
    pub title: String,
    /// Inner markup of the content region, `None` after a whole-document swap
    pub content: Option<String>,
}

/// A visual module with idempotent page lifecycle hooks
///
/// `enter` must be a no-op when the module's target nodes are absent.
pub trait DecorativeModule {
    fn name(&self) -> &str;

    /// `page-enter`: (re)initialize against the new content
    fn enter(&mut self, page: &PageContext) -> anyhow::Result<()>;

    /// `page-leave`: release listeners and animation frames
    fn leave(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Registered modules, driven through the page lifecycle
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn DecorativeModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Box<dyn DecorativeModule>) {
        tracing::debug!("Registered decorative module {}", module.name());
        self.modules.push(module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Deliver `page-enter` to every module, returning the failure count
    pub fn enter_all(&mut self, page: &PageContext) -> usize {
        let mut failures = 0;
        for module in &mut self.modules {
            if let Err(e) = module.enter(page) {
                tracing::warn!("Module {} failed to enter {}: {:#}", module.name(), page.path, e);
                failures += 1;
            }
        }
        failures
    }

    /// Deliver `page-leave` to every module, returning the failure count
    pub fn leave_all(&mut self) -> usize {
        let mut failures = 0;
        for module in &mut self.modules {
            if let Err(e) = module.leave() {
                tracing::warn!("Module {} failed to leave: {:#}", module.name(), e);
                failures += 1;
            }
        }
        failures
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.name()))
            .finish()
    }
}
