//! Binaries around `RagService`: the `docqa` CLI and the `docqa-server` HTTP API.

pub mod corpus;
pub mod http;
pub mod logging;
