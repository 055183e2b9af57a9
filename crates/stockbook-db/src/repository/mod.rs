//! # Repository Module
//!
//! Database repository implementations for Stockbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / posting engine                                         │
//! │       │                                                                 │
//! │       │  db.products().find_active(business, id)                       │
//! │       ▼                                                                 │
//! │  ProductRepository / ContactRepository / TransactionRepository         │
//! │  ├── pool-backed methods        (reads, inserts, soft delete)          │
//! │  └── pub(crate) connection fns  (run inside the engine's transaction)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every query takes `business_id`; there is no unscoped lookup.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, low stock, CAS stock write
//! - [`ContactRepository`](contact::ContactRepository) - Directory reads, CAS balance write
//! - [`TransactionRepository`](transaction::TransactionRepository) - Ledger reads, range query, summary

pub mod contact;
pub mod product;
pub mod transaction;
