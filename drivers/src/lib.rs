//! Database drivers and execution helpers
//!
//! The crate turns generated SQL into work against a live engine:
//!
//! - [`Connection`] - synchronous execution, implemented for
//!   `rusqlite::Connection` and `postgres::Client`
//! - [`AsyncConnection`] / [`RowCursor`] - asynchronous execution with
//!   forward-only cursors, implemented for `tokio_postgres::Client`
//! - [`gateway`] - one entry point dispatching to scalar, cursor or
//!   affected-row outcomes
//! - [`lob`] - large-object stores
//! - [`session`] - script execution, best-effort drops, identity-aware inserts
//!
//! # Features
//!
//! | Feature          | Driver                     |
//! |------------------|----------------------------|
//! | `rusqlite`       | `rusqlite` (default)       |
//! | `postgres-sync`  | `postgres`                 |
//! | `tokio-postgres` | `tokio-postgres`           |
//! | `tracing`        | statement/transaction logs |

#[cfg(feature = "tokio-postgres")]
mod async_postgres;
mod asynchronous;
mod connection;
pub mod gateway;
pub mod lob;
mod open;
pub mod params;
pub mod session;

#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
pub mod pg;
#[cfg(feature = "postgres-sync")]
mod postgres_sync;
#[cfg(feature = "rusqlite")]
pub mod sqlite;

pub use asynchronous::{AsyncConnection, CursorBehavior, RowCursor, VecCursor};
pub use connection::{Connection, Param};
pub use gateway::{Expect, Outcome};
pub use lob::{BufferedLobStore, LobId, LobStore, NativeLobStore, SideTableLobStore, lob_store};
#[cfg(feature = "tokio-postgres")]
pub use async_postgres::PgCursor;
#[cfg(feature = "postgres-sync")]
pub use open::open_postgres;
#[cfg(feature = "rusqlite")]
pub use open::open_sqlite;
#[cfg(feature = "tokio-postgres")]
pub use open::connect_tokio_postgres;
