//! The composition engine: builds invocable classes from a base definition
//! plus an ordered list of mixin sources, merging members under a
//! first-registered-wins policy while keeping every contributing blueprint
//! on a parent chain for the per-instance initializer cascade.

pub(crate) mod base;
pub mod class;
