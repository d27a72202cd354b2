//! # Handler Framework Loopback Tests
//!
//! Spins the mio servers on an ephemeral local port and drives them from a
//! plain blocking client in the same thread, alternating client I/O with
//! `poll_once` so no background thread is needed.

use std::io::{Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use binframe::net::{Router, TcpServer, UdpServer};
use binframe::schema::{Codec, RecordSchema};
use binframe::Dispatch;

fn ping() -> Arc<RecordSchema> {
    RecordSchema::builder("Ping")
        .field("code", Codec::u16().always(1u16))
        .field("n", Codec::u32())
        .build()
        .unwrap()
}

fn pong() -> Arc<RecordSchema> {
    RecordSchema::builder("Pong")
        .field("code", Codec::u16().always(2u16))
        .field("n", Codec::u32())
        .build()
        .unwrap()
}

fn dispatch() -> Dispatch {
    Dispatch::new([ping(), pong()]).unwrap()
}

/// Pumps the server until `want` bytes arrive on the client socket or the
/// attempt budget runs out.
fn pump_tcp(server: &mut TcpServer, client: &mut TcpStream, want: usize) -> Vec<u8> {
    let mut out = vec![0u8; want];
    let mut got = 0;
    for _ in 0..100 {
        server.poll_once(Some(Duration::from_millis(5))).unwrap();
        if got >= want {
            break;
        }
        match client.read(&mut out[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => panic!("client read failed: {e}"),
        }
    }
    out.truncate(got);
    out
}

#[test]
fn tcp_record_reply() {
    let pong_schema = pong();
    let router = Router::new().on("ping", move |msg, replies| {
        let n = msg.uint("n")?;
        let reply = pong_schema.instance_with([("n", n * 2)])?;
        replies.reply(reply);
        Ok(())
    });
    let mut server =
        TcpServer::bind("127.0.0.1:0".parse().unwrap(), dispatch(), router).unwrap();
    let addr = server.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_millis(20)))
        .unwrap();
    client.write_all(b"\x00\x01\x00\x00\x00\x15").unwrap();

    let reply = pump_tcp(&mut server, &mut client, 6);
    assert_eq!(reply, b"\x00\x02\x00\x00\x00\x2a");
}

#[test]
fn tcp_raw_reply_and_split_writes() {
    let router = Router::new().on("ping", |_msg, replies| {
        replies.reply(b"Hello World!\n".as_slice());
        Ok(())
    });
    let mut server =
        TcpServer::bind("127.0.0.1:0".parse().unwrap(), dispatch(), router).unwrap();
    let addr = server.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_millis(20)))
        .unwrap();

    // A message split across two writes must be reassembled, not treated as
    // two short frames.
    client.write_all(b"\x00\x01\x00\x00").unwrap();
    for _ in 0..5 {
        server.poll_once(Some(Duration::from_millis(5))).unwrap();
    }
    client.write_all(b"\x00\x15").unwrap();

    let reply = pump_tcp(&mut server, &mut client, 13);
    assert_eq!(reply, b"Hello World!\n");
}

#[test]
fn tcp_multiple_messages_in_one_write() {
    let router = Router::new().on("ping", |msg, replies| {
        replies.reply(msg.clone());
        Ok(())
    });
    let mut server =
        TcpServer::bind("127.0.0.1:0".parse().unwrap(), dispatch(), router).unwrap();
    let addr = server.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_millis(20)))
        .unwrap();
    client
        .write_all(b"\x00\x01\x00\x00\x00\x01\x00\x01\x00\x00\x00\x02")
        .unwrap();

    let reply = pump_tcp(&mut server, &mut client, 12);
    assert_eq!(reply, b"\x00\x01\x00\x00\x00\x01\x00\x01\x00\x00\x00\x02");
}

#[test]
fn udp_datagram_reply() {
    let router = Router::new().on("ping", |msg, replies| {
        replies.reply(msg.clone());
        Ok(())
    });
    let mut server =
        UdpServer::bind("127.0.0.1:0".parse().unwrap(), dispatch(), router).unwrap();
    let addr = server.local_addr().unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .set_read_timeout(Some(Duration::from_millis(20)))
        .unwrap();
    client.send_to(b"\x00\x01\x00\x00\x00\x07", addr).unwrap();

    let mut buf = [0u8; 64];
    let mut got = 0;
    for _ in 0..100 {
        server.poll_once(Some(Duration::from_millis(5))).unwrap();
        match client.recv(&mut buf) {
            Ok(n) => {
                got = n;
                break;
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => panic!("client recv failed: {e}"),
        }
    }
    assert_eq!(&buf[..got], b"\x00\x01\x00\x00\x00\x07");
}
