//! A terminal calendar that keeps its events in local key-value storage.
//!
//! [`calendar::EventStore`] owns the event list and writes it through a
//! [`calendar::StorageAdapter`] on every change. The UI in [`app`] and
//! [`components`] only reads the list and calls the store's mutations.

pub mod app;
pub mod calendar;
pub mod components;
pub mod config;
pub mod event;
pub mod logging;
pub mod theme;
pub mod tui;
