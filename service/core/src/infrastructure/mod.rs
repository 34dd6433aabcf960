// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod token_store;
pub mod storage;
pub mod rendering;
