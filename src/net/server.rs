//! # Event-Driven Servers
//!
//! TCP and UDP servers built on a mio poll loop. Each readable connection is
//! drained into its buffer, the dispatcher cuts complete messages out, and
//! the router's replies are serialized, logged, and written back.
//!
//! An `Incomplete` outcome on a live TCP connection just means the rest of
//! the message is still in flight, so the buffered bytes stay untouched
//! until more arrive; leftovers at connection close are parsed one last
//! time with error logging enabled.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use mio::net::{TcpListener, UdpSocket};
use mio::{Events, Interest, Poll, Token};

use crate::dispatch::{Dispatch, Parsed};
use crate::error::Result;
use crate::net::connection::Connection;
use crate::net::router::{Outgoing, Replies, Router};
use crate::wirelog::{self, Direction};

const LISTENER: Token = Token(0);
const EVENTS_CAPACITY: usize = 256;
const MAX_CONNECTIONS: usize = 1024;
const UDP_DATAGRAM_MAX: usize = 65536;

pub struct TcpServer {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    dispatch: Arc<Dispatch>,
    router: Router,
}

impl TcpServer {
    pub fn bind(addr: SocketAddr, dispatch: Dispatch, router: Router) -> Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        Ok(TcpServer {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: 1,
            dispatch: Arc::new(dispatch),
            router,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the event loop until an unrecoverable I/O error.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.poll_once(Some(Duration::from_millis(100)))?;
        }
    }

    /// Processes one batch of readiness events. Exposed so callers can drive
    /// the loop themselves (tests, embedding in a larger poll loop).
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        match self.poll.poll(&mut events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        for event in events.iter() {
            match event.token() {
                LISTENER => self.accept()?,
                token => {
                    if event.is_readable() {
                        self.service_read(token)?;
                    }
                    if event.is_writable() {
                        if let Some(conn) = self.connections.get_mut(&token) {
                            conn.flush()?;
                        }
                    }
                    if self
                        .connections
                        .get(&token)
                        .is_some_and(Connection::is_closed)
                    {
                        self.close(token)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn accept(&mut self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    if self.connections.len() >= MAX_CONNECTIONS {
                        continue;
                    }
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    let mut conn = Connection::new(stream);
                    self.poll.registry().register(
                        conn.stream_mut(),
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    )?;
                    self.connections.insert(token, conn);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn service_read(&mut self, token: Token) -> Result<()> {
        let Some(conn) = self.connections.get_mut(&token) else {
            return Ok(());
        };
        conn.fill()?;
        let at_eof = conn.is_closed();

        loop {
            let Some(conn) = self.connections.get_mut(&token) else {
                return Ok(());
            };
            let buffered = conn.readable().to_vec();
            if buffered.is_empty() {
                break;
            }

            let mut cursor = Cursor::new(&buffered[..]);
            let parsed = self.dispatch.parse_impl(&mut cursor, at_eof)?;
            let consumed = cursor.position() as usize;
            match &parsed {
                Parsed::Empty => break,
                Parsed::Incomplete { .. } => {
                    if at_eof {
                        // Final fragment, already logged; nothing more will
                        // arrive for it.
                        if let Some(conn) = self.connections.get_mut(&token) {
                            conn.consume(consumed);
                        }
                    }
                    break;
                }
                Parsed::Message(_) | Parsed::Unrecognized(_) => {
                    if let Some(conn) = self.connections.get_mut(&token) {
                        conn.consume(consumed);
                    }
                    let mut replies = Replies::default();
                    self.router.dispatch(&parsed, &mut replies);
                    self.send_replies(token, replies)?;
                }
            }
        }
        Ok(())
    }

    fn send_replies(&mut self, token: Token, mut replies: Replies) -> Result<()> {
        for outgoing in replies.drain() {
            let bytes = match outgoing {
                Outgoing::Message(record) => {
                    wirelog::log_message(Direction::Sending, &record);
                    record.serialize()?
                }
                Outgoing::Raw(bytes) => bytes,
            };
            wirelog::log_binary(Direction::Sending, &bytes);
            if let Some(conn) = self.connections.get_mut(&token) {
                conn.queue_write(&bytes)?;
            }
        }
        Ok(())
    }

    fn close(&mut self, token: Token) -> Result<()> {
        if let Some(mut conn) = self.connections.remove(&token) {
            let leftover = conn.readable().to_vec();
            if !leftover.is_empty() {
                let mut cursor = Cursor::new(&leftover[..]);
                let parsed = self.dispatch.parse(&mut cursor)?;
                let mut replies = Replies::default();
                self.router.dispatch(&parsed, &mut replies);
            }
            // deregister errors on a dead peer are ignored
            let _ = self.poll.registry().deregister(conn.stream_mut());
        }
        Ok(())
    }
}

/// Datagram service: every datagram is a self-contained buffer that may
/// carry several messages; replies go back to the sender.
pub struct UdpServer {
    poll: Poll,
    socket: UdpSocket,
    dispatch: Arc<Dispatch>,
    router: Router,
}

impl UdpServer {
    pub fn bind(addr: SocketAddr, dispatch: Dispatch, router: Router) -> Result<Self> {
        let poll = Poll::new()?;
        let mut socket = UdpSocket::bind(addr)?;
        poll.registry()
            .register(&mut socket, LISTENER, Interest::READABLE)?;
        Ok(UdpServer {
            poll,
            socket,
            dispatch: Arc::new(dispatch),
            router,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            self.poll_once(Some(Duration::from_millis(100)))?;
        }
    }

    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        match self.poll.poll(&mut events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let mut buf = [0u8; UDP_DATAGRAM_MAX];
        for event in events.iter() {
            if event.token() != LISTENER || !event.is_readable() {
                continue;
            }
            loop {
                match self.socket.recv_from(&mut buf) {
                    Ok((len, peer)) => self.service_datagram(&buf[..len], peer)?,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    fn service_datagram(&mut self, datagram: &[u8], peer: SocketAddr) -> Result<()> {
        let mut cursor = Cursor::new(datagram);
        loop {
            let parsed = self.dispatch.parse(&mut cursor)?;
            if matches!(parsed, Parsed::Empty) {
                break;
            }
            let done = matches!(&parsed, Parsed::Incomplete { .. } | Parsed::Unrecognized(_));
            let mut replies = Replies::default();
            self.router.dispatch(&parsed, &mut replies);
            for outgoing in replies.drain() {
                let bytes = match outgoing {
                    Outgoing::Message(record) => {
                        wirelog::log_message(Direction::Sending, &record);
                        record.serialize()?
                    }
                    Outgoing::Raw(bytes) => bytes,
                };
                wirelog::log_binary(Direction::Sending, &bytes);
                match self.socket.send_to(&bytes, peer) {
                    Ok(_) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        wirelog::log_error("udp reply dropped: socket not writable");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if done {
                break;
            }
        }
        Ok(())
    }
}
