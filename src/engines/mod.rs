//! Search engine parsers
//!
//! Engines are supplied to the crawler through the
//! [`SearchParser`](crate::crawler::SearchParser) trait. This module ships a
//! generic selector-driven implementation with built-in layouts for
//! DuckDuckGo and Bing.

mod selector;

pub use selector::{EngineLayout, SelectorParser};
