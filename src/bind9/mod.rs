// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Collaborators that talk to BIND9 and the DNS.
//!
//! Every interaction with the outside world goes through one of three narrow
//! traits, so the pipeline and the monitor can be driven by in-memory fakes in
//! tests:
//!
//! - [`ZoneChecker`] - validates a staged zone file (`named-checkzone`)
//! - [`ServiceController`] - asks the name server to reload (`systemctl reload bind9`)
//! - [`Resolver`] - issues live forward and reverse queries (hickory-client over UDP)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use zonekeeper::bind9::{NamedCheckzone, ZoneChecker};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let checker = NamedCheckzone::new("named-checkzone", Duration::from_secs(10));
//! let result = checker
//!     .check_zone("devops.lab", std::path::Path::new("/etc/bind/zones/db.devops.lab"))
//!     .await?;
//! println!("passed: {}", result.passed);
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod resolver;
pub mod service;

pub use checker::{validate_staged, CheckResult, NamedCheckzone, ZoneChecker};
pub use resolver::{reverse_name, HickoryResolver, Resolver};
pub use service::{CommandServiceController, ServiceController};
