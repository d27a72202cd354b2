//! # Handler Framework
//!
//! A small server skeleton that feeds wire traffic through a
//! [`Dispatch`](crate::dispatch::Dispatch) and routes every decoded record
//! to a user handler, over TCP or UDP:
//!
//! ```no_run
//! use binframe::dispatch::Dispatch;
//! use binframe::net::{Router, TcpServer};
//! # use binframe::schema::{Codec, RecordSchema};
//!
//! # let ping = RecordSchema::builder("Ping")
//! #     .field("code", Codec::u16().always(1u16))
//! #     .build()?;
//! let dispatch = Dispatch::new([ping.clone()])?;
//! let router = Router::new().on("ping", move |msg, replies| {
//!     replies.reply(msg.clone());
//!     Ok(())
//! });
//! TcpServer::bind("127.0.0.1:7357".parse().unwrap(), dispatch, router)?.run()?;
//! # Ok::<(), binframe::FrameError>(())
//! ```
//!
//! Handlers are registered under the underscorized form of the record type
//! name (`NamedPoint` registers as `named_point`). A handler replies with a
//! record (serialized by the engine) or raw octets (sent verbatim); pushing
//! several replies is fine. Traffic in both directions lands on the wire-log
//! streams.

pub mod connection;
pub mod router;
pub mod server;

pub use router::{Outgoing, Replies, Router};
pub use server::{TcpServer, UdpServer};
