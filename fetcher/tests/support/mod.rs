//! Test support utilities for fetcher integration and behavioural tests.

pub mod http_server;
