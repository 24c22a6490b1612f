// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # VESTA Assistant Core
//!
//! Scoped execution and isolation core for the VESTA family assistant:
//! several independent child profiles live inside one process, and every
//! operation performed on a child's behalf runs inside an execution scope
//! that owns that child's identity exclusively.
//!
//! The core guarantees that work done for profile A can never read, mutate
//! or leak into profile B's state, even under concurrent execution, while
//! enforcing per-operation permissions, per-(profile, operation) rate
//! limits and an append-only audit trail.
//!
//! # Architecture
//!
//! - **domain** — identity, context lifecycle, validation, permission
//!   catalog, audit contract, capability contracts, sanitization, config
//! - **application** — the secure pipeline, the capability surfaces, scope
//!   factory/lifecycle and the multi-profile coordinator
//! - **infrastructure** — in-memory audit log, rate limiter, event bus and
//!   offline capability adapters

pub mod application;
pub mod domain;
pub mod infrastructure;
