//! Satellite pass prediction: rise, culmination and set events of a
//! satellite over ground observers within a bounded look-ahead window.

pub mod config;
pub mod predict;
