//! isvpc state management
//!
//! Persists what `apply` created so later runs can diff against it and
//! `destroy` knows which backend identifiers to delete.
//!
//! - **StateFile**: every managed resource with its backend identifier
//! - **StateBackend**: storage trait; the local JSON file is the only backend
//! - **LockInfo**: advisory lock held for the duration of a mutating run
//!
//! ```ignore
//! use isvpc_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("isvpc.state.json")).await?;
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... apply effects, upserting resources ...
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::create_backend;
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
