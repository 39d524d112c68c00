//! Logic Module - Pipeline stages
//!
//! Chứa các stage xử lý theo thứ tự của một poll cycle:
//! - `source/`    - Raw source adapters (REST, document, realtime, file, upload, push, mock)
//! - `normalize/` - Schema normalizer (aliases, unit stripping, coercion)
//! - `window`     - Time window + split by event type
//! - `fallback`   - Nominal / Degraded / Unavailable policy
//! - `poll/`      - Scheduler with in-flight guard
//! - `report`     - CSV export of the committed view

// Shared types
pub mod config;
pub mod error;
pub mod types;

// Pipeline stages
pub mod source;
pub mod normalize;
pub mod window;
pub mod fallback;
pub mod poll;
pub mod report;
