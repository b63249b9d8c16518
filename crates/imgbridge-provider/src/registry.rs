use crate::provider::ImageProvider;

/// Lookup point the editor uses to obtain its image provider.
///
/// Only one provider is ever registered, so every name resolves to it.
pub struct ProviderRegistry {
    provider: Box<dyn ImageProvider>,
}

impl ProviderRegistry {
    pub fn new(provider: impl ImageProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    /// Resolve a provider by name. `name` is accepted for compatibility and ignored.
    pub fn load(&mut self, name: &str) -> &mut dyn ImageProvider {
        log::trace!("resolving image provider {name:?}");
        self.provider.as_mut()
    }
}
