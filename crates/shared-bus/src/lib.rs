//! # Shared Bus - In-Process Event Bus
//!
//! Carries the notifications the kernel emits after block processing:
//! `BlockAccepted` for every executed block, `BestChainFound` when the best
//! chain pointer advances, and `BlockRejected` when a block is discarded.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Chain Manager│                    │  Observers   │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Publishing is fire-and-forget: the publisher never waits for observers
//! and an event with no subscriber is dropped.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BlockchainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
