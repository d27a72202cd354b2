//! # Handler Routing
//!
//! The [`Router`] maps underscorized record names to handler closures. The
//! server hands it every [`Parsed`] outcome; handlers push zero or more
//! replies into a [`Replies`] sink, which the server serializes and writes
//! back to the peer.

use hashbrown::HashMap;

use crate::dispatch::Parsed;
use crate::error::Result;
use crate::names::underscorize;
use crate::schema::Record;
use crate::wirelog;

/// One outbound reply: a record the engine serializes, or raw octets sent
/// verbatim.
#[derive(Debug)]
pub enum Outgoing {
    Message(Record),
    Raw(Vec<u8>),
}

impl From<Record> for Outgoing {
    fn from(r: Record) -> Self {
        Outgoing::Message(r)
    }
}

impl From<Vec<u8>> for Outgoing {
    fn from(b: Vec<u8>) -> Self {
        Outgoing::Raw(b)
    }
}

impl From<&[u8]> for Outgoing {
    fn from(b: &[u8]) -> Self {
        Outgoing::Raw(b.to_vec())
    }
}

/// Reply sink handed to handlers; supports any number of replies per
/// message.
#[derive(Debug, Default)]
pub struct Replies {
    out: Vec<Outgoing>,
}

impl Replies {
    pub fn reply(&mut self, outgoing: impl Into<Outgoing>) {
        self.out.push(outgoing.into());
    }

    pub(crate) fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.out)
    }
}

type Handler = Box<dyn FnMut(&Record, &mut Replies) -> Result<()> + Send>;
type RawHandler = Box<dyn FnMut(&[u8], &mut Replies) -> Result<()> + Send>;

#[derive(Default)]
pub struct Router {
    handlers: HashMap<String, Handler>,
    raw: Option<RawHandler>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Registers a handler for a record type by its underscorized name.
    pub fn on(
        mut self,
        name: impl Into<String>,
        handler: impl FnMut(&Record, &mut Replies) -> Result<()> + Send + 'static,
    ) -> Self {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Registers the handler for unrecognized payloads. Without one, such
    /// payloads are logged to the error stream and dropped.
    pub fn on_raw(
        mut self,
        handler: impl FnMut(&[u8], &mut Replies) -> Result<()> + Send + 'static,
    ) -> Self {
        self.raw = Some(Box::new(handler));
        self
    }

    /// Routes one parse outcome. Handler errors land on the stack stream;
    /// the connection keeps running.
    pub(crate) fn dispatch(&mut self, parsed: &Parsed, replies: &mut Replies) {
        match parsed {
            Parsed::Message(record) => {
                let key = underscorize(record.schema().name());
                match self.handlers.get_mut(&key) {
                    Some(handler) => {
                        if let Err(e) = handler(record, replies) {
                            wirelog::log_stack(&e);
                        }
                    }
                    None => wirelog::log_error(&format!("{key} handler not defined")),
                }
            }
            Parsed::Unrecognized(data) => match &mut self.raw {
                Some(handler) => {
                    if let Err(e) = handler(data, replies) {
                        wirelog::log_stack(&e);
                    }
                }
                None => {
                    if !data.is_empty() {
                        wirelog::log_error(&format!(
                            "unable to resolve {} to a record",
                            crate::value::Value::Bytes(data.clone())
                        ));
                    }
                }
            },
            Parsed::Empty | Parsed::Incomplete { .. } => {}
        }
    }
}
