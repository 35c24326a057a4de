//! # brasa-db: Database Layer for Brasa
//!
//! This crate provides database access for the Brasa back-office.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Brasa Data Flow                                 │
//! │                                                                         │
//! │  API handler (complete_order)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     brasa-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │(ingredient.rs)│    │  (embedded)  │  │   │
//! │  │   │               │    │ (product.rs)  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ (order.rs)    │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ calls pure engines            │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                    │
//! │                         brasa-core (no I/O)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Stock Contract
//!
//! brasa-core's deduction engine is pure; this crate owns the two
//! guarantees the engine asks of its caller:
//!
//! - **Atomicity**: each deduction pass (all ingredients of one order)
//!   runs inside a single transaction, so concurrent completions cannot
//!   interleave stale reads with writes.
//! - **Idempotence**: order completion is gated on
//!   `UPDATE … WHERE status = 'open'`, so the open→completed edge - the
//!   only edge that deducts - fires exactly once per order.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per entity

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::fixed_cost::FixedCostRepository;
pub use repository::ingredient::IngredientRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;
