//! Normalized application state, one slice per concern.
//!
//! Every asynchronous operation is a three-phase action: `Pending` sets
//! `loading` and clears `error`, `Fulfilled` merges the payload, and
//! `Rejected` stores a human-readable message. Reducers are pure; the
//! dispatch helpers perform the gateway call between the phases.
//!
//! Known hazard, kept deliberately: there is no request fencing or
//! cancellation. Two in-flight operations on the same slice race, and
//! whichever resolves last wins the state write. There is also no timeout
//! anywhere — a hung request leaves `loading` set until the process ends.

pub mod auth;
pub mod channel;
pub mod video;

/// The three phases of an asynchronous operation.
#[derive(Debug, Clone)]
pub enum Phase<T> {
    Pending,
    Fulfilled(T),
    Rejected(String),
}
