//! Network implementations of the collaborator traits.
//!
//! | Module | Collaborator |
//! |--------|--------------|
//! | [`http`] | [`CellBackend`](crate::backend::CellBackend) over `reqwest` |
//! | [`ws`] | [`Realtime`](crate::backend::Realtime) over `tokio-tungstenite` |
//! | [`parse`] | Frame ⇄ event mapping shared by the socket client |

pub mod http;
pub mod parse;
pub mod ws;

pub use http::HttpCellBackend;
pub use ws::WsRealtime;
