pub mod client;

pub use client::{API_TIMEOUT, MonzoClient};
