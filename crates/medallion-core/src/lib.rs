//! # medallion-core
//!
//! Namespace provisioning for a medallion-style lakehouse: one catalog with
//! bronze, silver and gold schemas, created through idempotent DDL.
//!
//! - **Names**: validated catalog and schema identifiers
//! - **Layout**: the catalog and ordered schemas to provision
//! - **Plan**: the exact DDL statements, in execution order
//! - **Platform**: the async seam to a SQL engine, plus an in-memory engine
//! - **Provisioner**: executes a plan and verifies the result
//!
//! ## Example
//!
//! ```rust
//! use medallion_core::prelude::*;
//!
//! let plan = ProvisionPlan::from_layout(&NamespaceLayout::default());
//! assert_eq!(plan.statements()[0].sql(), "CREATE CATALOG IF NOT EXISTS fmcg;");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod layout;
pub mod memory;
pub mod name;
pub mod observability;
pub mod plan;
pub mod platform;
pub mod provisioner;
pub mod statement;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::layout::{DataScope, NamespaceLayout, SchemaSpec, Tier};
    pub use crate::memory::{InMemoryPlatform, Privilege};
    pub use crate::name::{CatalogName, SchemaName, SchemaRef};
    pub use crate::plan::ProvisionPlan;
    pub use crate::platform::{NamespaceListing, Platform};
    pub use crate::provisioner::{
        ProvisionError, ProvisionReport, Provisioner, StepOutcome, Verification,
    };
    pub use crate::statement::Statement;
}

pub use error::{Error, ErrorKind, Result};
pub use layout::{NamespaceLayout, SchemaSpec, Tier};
pub use memory::InMemoryPlatform;
pub use name::{CatalogName, SchemaName, SchemaRef};
pub use observability::{LogFormat, init_logging};
pub use plan::ProvisionPlan;
pub use platform::{NamespaceListing, Platform};
pub use provisioner::{ProvisionError, ProvisionReport, Provisioner, Verification};
pub use statement::Statement;
