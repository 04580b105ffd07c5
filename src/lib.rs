#![doc(html_root_url = "https://docs.rs/reconcile-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! A minimal virtual DOM reconciler.
//!
//! A [`Reconciler`] mutates a live DOM subtree in place so that it matches a forest of [`VNode`]s,
//! preserving the identity of keyed nodes and of nodes that are matched by position.
//! The engine is generic over a [`Dom`]: [`web::WebDom`] drives the browser DOM,
//! [`memory::MemoryDom`] is an in-process document.
//!
//! # Features
//!
//! ## `"dangerous-logging"`
//!
//! Includes text content and attribute values in trace output.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod attributes;
mod diff;
mod materialize;
mod meta;

pub mod component;
pub mod dom;
pub mod error;
pub mod load;
pub mod memory;
pub mod options;
pub mod vdom;
pub mod web;

pub use attributes::RESERVED_PROPS;
pub use diff::Reconciler;
pub use dom::Dom;
pub use error::Error;
pub use options::Options;
pub use vdom::{Element, Forest, Key, Listener, Primitive, PropValue, Props, Ref, RefBox, VNode};
