// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `diagram-service-core`
//!
//! Token-gated diagram rendering with owner-partitioned artifact storage.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | identities, diagram types, artifact keys, collaborator traits, config |
//! | [`application`] | Application | `TokenAuthenticator`, `DiagramRenderer`, `RequestDispatcher` |
//! | [`infrastructure`] | Infrastructure | token store, artifact store and rendering backend adapters |
//! | [`presentation`] | Presentation | Axum router for the Generate / Fetch endpoints |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
