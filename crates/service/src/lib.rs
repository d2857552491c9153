/**
 * Injectable time source so moderation windows
 *  and rate limits are deterministic under test.
 */
pub mod clock;
/**
 * Process configuration: backend credentials,
 *  repository coordinates, cache location.
 * Fails fast when a required value is absent.
 */
pub mod config;
/**
 * Device-bound encrypted cache of content
 *  passwords, with consent gating and the
 *  bulk-revoke kill switch.
 */
pub mod credentials;
/**
 * The service error taxonomy and its mapping
 *  to user-facing messages.
 */
pub mod error;
/**
 * Domain operations: folder, email, version and
 *  share-link lifecycles plus the moderation
 *  state machine.
 */
pub mod lifecycle;
/**
 * Abuse control: sliding-window rate limiter,
 *  suspicious-activity reports and the
 *  persistent blacklist.
 */
pub mod security;
/**
 * Wires a configured backend, security manager
 *  and lifecycle together.
 */
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use credentials::{CredentialCache, FileStore, KillSwitchReport, LocalStore, MemoryStore};
pub use error::ServiceError;
pub use lifecycle::Lifecycle;
pub use security::{Action, RateLimiter, SecurityManager};
pub use state::{State, StateSetupError};
