//! Secure transport (TLS) bootstrap.
//!
//! The TLS subsystem is represented by an owned [`SecureTransportContext`].
//! A context exists only between a successful [`SecureTransport::initialize`]
//! and its shutdown, so every TLS-dependent operation (methods on the
//! context) is ordered after initialization and before teardown.
//!
//! # Lifecycle
//!
//! ```text
//! SecureTransport (registry, mutex-guarded)
//! ├── initialize() ──> SecureTransportContext (generation N)
//! │                     ├── client_config(roots)
//! │                     └── shutdown() / Drop ──> registry released
//! └── shutdown()       (releases whichever context is live)
//! ```
//!
//! Double initialization fails with [`InitError::AlreadyInitialized`].
//! Shutdown without a live context fails with [`ShutdownError::NotInitialized`]
//! and leaves the registry untouched.
//!
//! The process-wide registry ([`SecureTransport::process_wide`]) also installs
//! its provider as the rustls process default. That default cannot be
//! uninstalled, so shutdown releases the registry state but leaves the
//! installed provider in place for any later initialize to reuse.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info, warn};

use crate::errors::{InitError, ShutdownError, TransportError};

/// Number of random bytes drawn during the startup self check.
const RANDOM_PROBE_LEN: usize = 32;

/// Builds the crypto provider a registry hands to its contexts.
pub type ProviderFactory = fn() -> CryptoProvider;

static PROCESS_WIDE: OnceLock<SecureTransport> = OnceLock::new();

#[derive(Debug)]
struct LiveContext {
    generation: u64,
    provider: Arc<CryptoProvider>,
}

#[derive(Debug, Default)]
struct TransportState {
    live: Option<LiveContext>,
    next_generation: u64,
}

/// Registry for secure transport state.
///
/// Initialize and shutdown are serialized by an internal mutex, so at most
/// one context is live per registry.
#[derive(Debug)]
pub struct SecureTransport {
    state: Mutex<TransportState>,
    provider_factory: ProviderFactory,
    install_process_default: bool,
}

impl Default for SecureTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTransport {
    /// Create a private registry backed by the ring provider.
    ///
    /// Private registries never touch the rustls process default.
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider_factory(rustls::crypto::ring::default_provider)
    }

    /// Create a private registry with a custom provider factory.
    #[must_use]
    pub fn with_provider_factory(provider_factory: ProviderFactory) -> Self {
        Self {
            state: Mutex::new(TransportState::default()),
            provider_factory,
            install_process_default: false,
        }
    }

    /// The process-wide registry used by [`initialize_secure_transport`] and
    /// [`shutdown_secure_transport`].
    pub fn process_wide() -> &'static SecureTransport {
        PROCESS_WIDE.get_or_init(|| SecureTransport {
            state: Mutex::new(TransportState::default()),
            provider_factory: rustls::crypto::ring::default_provider,
            install_process_default: true,
        })
    }

    /// Initialize the secure transport subsystem.
    ///
    /// # Errors
    ///
    /// - [`InitError::AlreadyInitialized`] if a context is already live.
    /// - [`InitError::Transport`] if the provider fails its self check.
    pub fn initialize(&self) -> Result<SecureTransportContext<'_>, InitError> {
        let mut state = self.lock_state();

        if let Some(live) = &state.live {
            warn!(
                generation = live.generation,
                "Secure transport initialize called while a context is live"
            );
            return Err(InitError::AlreadyInitialized);
        }

        let provider = self.resolve_provider();
        self_check(&provider)?;

        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);
        state.live = Some(LiveContext {
            generation,
            provider: Arc::clone(&provider),
        });

        info!(
            generation,
            cipher_suites = provider.cipher_suites.len(),
            kx_groups = provider.kx_groups.len(),
            "Secure transport initialized"
        );

        Ok(SecureTransportContext {
            transport: self,
            generation,
            provider,
            armed: true,
        })
    }

    /// Release whichever context is live.
    ///
    /// A context outstanding after this call is inert: its methods fail and
    /// its own shutdown reports [`ShutdownError::NotInitialized`].
    ///
    /// # Errors
    ///
    /// [`ShutdownError::NotInitialized`] if no context is live. The registry
    /// is left unchanged.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        let mut state = self.lock_state();
        let live = state.live.take().ok_or(ShutdownError::NotInitialized)?;
        info!(generation = live.generation, "Secure transport shut down");
        Ok(())
    }

    /// Whether a context is currently live.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock_state().live.is_some()
    }

    fn release(&self, generation: u64) -> Result<(), ShutdownError> {
        let mut state = self.lock_state();
        let is_live = state
            .live
            .as_ref()
            .is_some_and(|live| live.generation == generation);
        if !is_live {
            return Err(ShutdownError::NotInitialized);
        }
        state.live = None;
        info!(generation, "Secure transport shut down");
        Ok(())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock_state()
            .live
            .as_ref()
            .is_some_and(|live| live.generation == generation)
    }

    fn resolve_provider(&self) -> Arc<CryptoProvider> {
        if !self.install_process_default {
            return Arc::new((self.provider_factory)());
        }

        if let Some(existing) = CryptoProvider::get_default() {
            debug!("Reusing installed rustls process-default provider");
            return Arc::clone(existing);
        }

        let provider = (self.provider_factory)();
        if provider.clone().install_default().is_err() {
            // Lost a race with another installer; theirs is now the default.
            debug!("rustls process-default provider installed concurrently");
        }
        CryptoProvider::get_default().map_or_else(|| Arc::new(provider), Arc::clone)
    }

    fn lock_state(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that the secure transport subsystem is initialized.
///
/// Dropping a live context shuts it down, so teardown happens on normal
/// return, early `?` return, and unwinding alike.
#[derive(Debug)]
#[must_use = "dropping the context shuts the secure transport down"]
pub struct SecureTransportContext<'a> {
    transport: &'a SecureTransport,
    generation: u64,
    provider: Arc<CryptoProvider>,
    armed: bool,
}

impl SecureTransportContext<'_> {
    /// Shut the secure transport down.
    ///
    /// # Errors
    ///
    /// [`ShutdownError::NotInitialized`] if the registry was already shut
    /// down behind this context's back.
    pub fn shutdown(mut self) -> Result<(), ShutdownError> {
        self.armed = false;
        self.transport.release(self.generation)
    }

    /// Generation number of this context within its registry.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The crypto provider backing this context.
    #[must_use]
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    /// Build a TLS client configuration trusting `roots`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::ContextReleased`] if the registry was shut down.
    /// - [`TransportError::Tls`] if rustls rejects the provider.
    pub fn client_config(&self, roots: RootCertStore) -> Result<Arc<ClientConfig>, TransportError> {
        if !self.transport.is_current(self.generation) {
            return Err(TransportError::ContextReleased);
        }

        let config = ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Arc::new(config))
    }

    /// Keep the subsystem initialized until [`shutdown_secure_transport`].
    fn detach(mut self) {
        self.armed = false;
    }
}

impl Drop for SecureTransportContext<'_> {
    fn drop(&mut self) {
        if self.armed && self.transport.release(self.generation).is_ok() {
            debug!(generation = self.generation, "Secure transport released on drop");
        }
    }
}

/// Draw from the provider's random source and confirm rustls accepts the
/// provider with its safe default protocol versions.
fn self_check(provider: &Arc<CryptoProvider>) -> Result<(), TransportError> {
    let mut probe = [0u8; RANDOM_PROBE_LEN];
    provider.secure_random.fill(&mut probe)?;

    let _versions = ClientConfig::builder_with_provider(Arc::clone(provider))
        .with_safe_default_protocol_versions()?;

    Ok(())
}

/// Initialize the process-wide secure transport subsystem.
///
/// Manual-pairing form: the subsystem stays initialized until
/// [`shutdown_secure_transport`]. Prefer [`SecureTransport::initialize`] on
/// [`SecureTransport::process_wide`] for scoped release.
///
/// # Errors
///
/// See [`SecureTransport::initialize`].
pub fn initialize_secure_transport() -> Result<(), InitError> {
    SecureTransport::process_wide().initialize()?.detach();
    Ok(())
}

/// Shut down the process-wide secure transport subsystem.
///
/// # Errors
///
/// [`ShutdownError::NotInitialized`] if it was not initialized.
pub fn shutdown_secure_transport() -> Result<(), ShutdownError> {
    SecureTransport::process_wide().shutdown()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn provider_without_suites() -> CryptoProvider {
        CryptoProvider {
            cipher_suites: Vec::new(),
            ..rustls::crypto::ring::default_provider()
        }
    }

    #[test]
    fn test_initialize_then_shutdown() {
        let transport = SecureTransport::new();
        assert!(!transport.is_initialized());

        let context = transport.initialize().expect("initialize should succeed");
        assert!(transport.is_initialized());
        assert!(!context.provider().cipher_suites.is_empty());

        context.shutdown().expect("shutdown should succeed");
        assert!(!transport.is_initialized());
    }

    #[test]
    fn test_double_initialize_fails() {
        let transport = SecureTransport::new();
        let context = transport.initialize().unwrap();

        let second = transport.initialize();
        assert!(matches!(second, Err(InitError::AlreadyInitialized)));

        // The first context is unaffected by the rejected attempt
        assert!(transport.is_initialized());
        context.shutdown().unwrap();
    }

    #[test]
    fn test_reinitialize_after_shutdown() {
        let transport = SecureTransport::new();

        let first = transport.initialize().unwrap();
        let first_generation = first.generation();
        first.shutdown().unwrap();

        let second = transport.initialize().unwrap();
        assert!(second.generation() > first_generation);
        second.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_without_initialize_fails_without_side_effect() {
        let transport = SecureTransport::new();

        assert_eq!(transport.shutdown(), Err(ShutdownError::NotInitialized));
        assert!(!transport.is_initialized());

        // Registry still initializes normally afterwards
        let context = transport.initialize().unwrap();
        context.shutdown().unwrap();
    }

    #[test]
    fn test_drop_releases_context() {
        let transport = SecureTransport::new();
        {
            let _context = transport.initialize().unwrap();
            assert!(transport.is_initialized());
        }
        assert!(!transport.is_initialized());
    }

    #[test]
    fn test_early_return_releases_context() {
        fn failing_step() -> Result<(), ShutdownError> {
            Err(ShutdownError::NotInitialized)
        }

        fn bootstrap(transport: &SecureTransport) -> Result<(), ShutdownError> {
            let _context = transport.initialize().expect("initialize should succeed");
            failing_step()?;
            Ok(())
        }

        let transport = SecureTransport::new();
        assert!(bootstrap(&transport).is_err());
        assert!(!transport.is_initialized());
    }

    #[test]
    fn test_registry_shutdown_invalidates_context() {
        let transport = SecureTransport::new();
        let context = transport.initialize().unwrap();

        transport.shutdown().unwrap();

        assert!(matches!(
            context.client_config(RootCertStore::empty()),
            Err(TransportError::ContextReleased)
        ));
        assert_eq!(context.shutdown(), Err(ShutdownError::NotInitialized));
    }

    #[test]
    fn test_stale_context_drop_does_not_release_newer_context() {
        let transport = SecureTransport::new();
        let stale = transport.initialize().unwrap();
        transport.shutdown().unwrap();

        let current = transport.initialize().unwrap();
        drop(stale);

        assert!(transport.is_initialized());
        current.shutdown().unwrap();
    }

    #[test]
    fn test_client_config_uses_context_provider() {
        let transport = SecureTransport::new();
        let context = transport.initialize().unwrap();

        let config = context
            .client_config(RootCertStore::empty())
            .expect("client config should build");
        assert!(Arc::ptr_eq(config.crypto_provider(), context.provider()));

        context.shutdown().unwrap();
    }

    #[test]
    fn test_self_check_failure_surfaces_transport_error() {
        let transport = SecureTransport::with_provider_factory(provider_without_suites);

        let result = transport.initialize();
        assert!(matches!(
            result,
            Err(InitError::Transport(TransportError::Tls(_)))
        ));
        assert!(!transport.is_initialized());
    }
}
