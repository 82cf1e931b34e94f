//! Upstream source adapters - normalize third-party services into typed records.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`listenbrainz/dto.rs`, `musicbrainz/dto.rs`, ...) - Exact API response shapes
//! - **Clients** - HTTP clients for external APIs, one per upstream, each with
//!   its own connection pool and fallback/retry policy
//! - **Traits** (`traits.rs`) - Seams for dependency injection and mocking in tests
//!
//! This decoupling means:
//! 1. API changes don't ripple through our codebase
//! 2. We can test API contracts independently
//! 3. The resolvers (genre, artwork, listen time) never see upstream JSON
//!
//! # Failure policy
//!
//! The statistics service is primary data: its errors propagate as typed
//! [`domain::StatsError`] values. Every other adapter is best-effort and
//! degrades to `None`/empty instead of failing, because genre and image
//! resolution are best-effort by design.

pub mod coverart;
pub mod domain;
pub mod lastfm;
pub mod listenbrainz;
pub mod musicbrainz;
pub mod traits;
pub mod wikidata;
