// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: the secure pipeline, capability surfaces, scope
//! lifecycle and the multi-profile coordinator.

pub mod assist_service;
pub mod coordinator;
pub mod letter_service;
pub mod pipeline;
pub mod portal_service;
pub mod scope;
