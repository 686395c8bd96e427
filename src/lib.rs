//! # Borg (Monostate) Pattern
//!
//! Many instances, one state. Every [`Borg`] handle has its own identity but
//! reads and writes a single attribute namespace shared by its whole family.
//!
//! ## Pieces
//! - [`SharedState`]: the family store (`Arc<Mutex<HashMap>>`), one per family
//! - [`Borg`]: a handle aliasing a store, with the canonical `state` attribute
//! - [`scenario`]: TOML-described, self-verifying demonstrations
//!
//! Run the built-in demonstration with:
//! ```bash
//! cargo run --bin borg_demo
//! ```

pub mod borg;
pub mod error;
pub mod scenario;
pub mod shared_state;

pub use borg::{Borg, DEFAULT_STATE, STATE_KEY};
pub use error::BorgError;
pub use shared_state::SharedState;
