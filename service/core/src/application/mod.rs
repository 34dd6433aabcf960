// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod authenticator;
pub mod renderer;
pub mod dispatcher;

// Re-export use cases for convenience
pub use authenticator::TokenAuthenticator;
pub use renderer::DiagramRenderer;
pub use dispatcher::{DispatchError, FetchedArtifact, GeneratedArtifact, RequestDispatcher};
