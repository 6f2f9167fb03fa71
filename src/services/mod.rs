// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod diet;
pub mod history;
pub mod session;

pub use session::{ExecutionSession, SessionRegistry, SetToggle};
