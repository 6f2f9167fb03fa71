// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rest timing: the foreground countdown and the background notifier.

pub mod alerts;
pub mod clock;
pub mod controller;
pub mod notifier;

pub use alerts::{AlertError, AlertSink, Notification, NotificationSink, Permission, REST_TIMER_TAG};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{PollOutcome, RestTimer};
pub use notifier::{BackgroundNotifier, NotifierHandle, NotifierMessage, NotifierSettings, NotifierTask};
