//! Single-elimination brackets for the esports platform.
//!
//! The core of the crate is the [`bracket`] engine: it builds a bracket from any number of
//! participants (handing out byes when the count is not a power of two), advances winners into
//! the next round and resolves bye matches on its own. Everything around it mirrors the state the
//! REST backend owns:
//!
//! - [`api`]: the backend client
//! - [`store`]: a shared cache of backend data with explicit invalidation
//! - [`sync`]: optimistic result reporting with rollback on rejection
//! - [`tournament`]: starting tournaments and reporting results end to end
//!
//! ## Example
//!
//! ```
//! use esports_bracket::bracket::{build_bracket, report_match_winner, MatchId, Participant, Seeding};
//!
//! let participants = vec![
//!     Participant::new("a", "Alpha"),
//!     Participant::new("b", "Bravo"),
//!     Participant::new("c", "Charlie"),
//! ];
//! let matches = build_bracket(participants, &Seeding::AsGiven).unwrap();
//! let matches = report_match_winner(&matches, MatchId::new(1, 0), &"a".into()).unwrap();
//! assert!(matches.iter().any(|m| m.round == 2 && m.is_ready()));
//! ```

/// Client for the tournament backend.
pub mod api;
/// Bracket generation, winner advancement and bye resolution.
pub mod bracket;
/// Settings loaded from the environment.
pub mod config;
/// Contains functions for logging.
pub mod log;
/// Tables for displaying brackets.
pub mod render;
pub mod store;
pub mod sync;
pub mod tournament;

/// A thread-safe Error type used outside the bracket engine.
pub type AppError = anyhow::Error;
