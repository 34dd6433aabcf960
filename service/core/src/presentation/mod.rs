// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`diagram-service-core`)
//!
//! HTTP surface that translates requests into [`RequestDispatcher`] calls and
//! maps the error taxonomy onto status codes. No business logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Generate, Fetch and health endpoints |
//!
//! [`RequestDispatcher`]: crate::application::RequestDispatcher

pub mod api;
