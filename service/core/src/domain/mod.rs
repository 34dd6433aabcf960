// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Value types, error taxonomy and the collaborator traits the core depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identities, diagram sources, artifact addressing and service config

pub mod identity;
pub mod diagram;
pub mod artifact;
pub mod validation;
pub mod service_config;
