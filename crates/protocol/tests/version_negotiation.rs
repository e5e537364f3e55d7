//! End-to-end version-negotiation scenarios driven through the public
//! `Engine`/`Dispatched` API, as a real client would see them.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use protocol::codec::{Reader, Writer};
use protocol::convert::Utf8Passthrough;
use protocol::handler::CommandEntry;
use protocol::packet;
use protocol::tables::{ProtocolTable, TableSet};
use protocol::{Dispatched, Engine, Job, Status};

fn no_entries() -> &'static [CommandEntry] {
    &[]
}

fn engine() -> (Engine, Receiver<Job>) {
    let tables = TableSet::new(
        ProtocolTable::new(3, no_entries()),
        ProtocolTable::new(4, no_entries()),
        ProtocolTable::new(5, no_entries()),
        ProtocolTable::new(6, no_entries()),
    );
    let (tx, rx) = mpsc::channel();
    (Engine::new(tables, Arc::new(Utf8Passthrough), 2, tx, false), rx)
}

fn init_packet(version: u32) -> Vec<u8> {
    let mut out = Writer::new();
    out.write_u8(packet::SSH_FXP_INIT);
    out.write_u32(version);
    out.into_vec()
}

/// INIT itself always answers inline (no table is active yet to own a
/// pool); any other response is already inline before negotiation, then
/// queued to the worker pool once a version settles.
fn inline(dispatched: Dispatched) -> Vec<u8> {
    match dispatched {
        Dispatched::Inline(bytes) => bytes,
        Dispatched::Queued => panic!("expected an inline response"),
    }
}

/// Resolves a post-init dispatch to its response bytes whether the engine
/// answered it inline or handed it to the pool.
fn resolve(dispatched: Dispatched, rx: &Receiver<Job>) -> Vec<u8> {
    match dispatched {
        Dispatched::Inline(bytes) => bytes,
        Dispatched::Queued => rx.recv_timeout(Duration::from_secs(5)).unwrap().into_response(),
    }
}

/// Scenario 1: a v3 client's VERSION response carries only the v3-era
/// extension set, no `newline` and no `supported` block.
#[test]
fn v3_init_response_has_no_v4_extensions() {
    let (mut engine, _rx) = engine();
    let response = inline(engine.dispatch(&init_packet(3)).unwrap());

    assert_eq!(response[0], packet::SSH_FXP_VERSION);
    let mut reader = Reader::new(&response[1..]);
    assert_eq!(reader.read_u32().unwrap(), 3);

    let mut names = Vec::new();
    while !reader.is_empty() {
        names.push(reader.read_string().unwrap().to_vec());
        // Every extension in this server's VERSION response is itself a
        // string payload; skip it without caring about its structure.
        let _ = reader.read_string().unwrap();
    }

    assert!(names.iter().any(|n| n == b"vendor-id"));
    assert!(names.iter().any(|n| n == b"symlink-order@openssh.com"));
    assert!(!names.iter().any(|n| n == b"newline"));
    assert!(!names.iter().any(|n| n == b"supported"));
    assert!(!names.iter().any(|n| n == b"supported2"));
}

/// Scenario 4: a message type absent from v3's table gets STATUS
/// OP_UNSUPPORTED, id echoed from the request.
#[test]
fn unknown_message_type_yields_op_unsupported_with_matching_id() {
    let (mut engine, rx) = engine();
    engine.dispatch(&init_packet(3)).unwrap();

    let mut packet = Vec::new();
    packet.push(99);
    packet.extend_from_slice(&42u32.to_be_bytes());
    let response = resolve(engine.dispatch(&packet).unwrap(), &rx);

    assert_eq!(response[0], packet::SSH_FXP_STATUS);
    let id = u32::from_be_bytes([response[1], response[2], response[3], response[4]]);
    assert_eq!(id, 42);
    let code = u32::from_be_bytes([response[5], response[6], response[7], response[8]]);
    assert_eq!(code, Status::OpUnsupported.code());
}

/// Every non-INIT response echoes the request id it answered, across a
/// run of several distinct requests on an already-negotiated connection.
#[test]
fn responses_echo_the_requesting_id() {
    let (mut engine, rx) = engine();
    engine.dispatch(&init_packet(3)).unwrap();

    for id in [1u32, 2, 100, u32::MAX] {
        let mut packet = Vec::new();
        packet.push(packet::SSH_FXP_REMOVE);
        packet.extend_from_slice(&id.to_be_bytes());
        packet.extend_from_slice(&0u32.to_be_bytes()); // empty path string
        let response = resolve(engine.dispatch(&packet).unwrap(), &rx);
        assert_eq!(response[0], packet::SSH_FXP_STATUS);
        let echoed = u32::from_be_bytes([response[1], response[2], response[3], response[4]]);
        assert_eq!(echoed, id);
    }
}

/// A client offering a version below 3 is refused before any table is
/// selected; the connection stays open for a fresh INIT attempt.
#[test]
fn pre_sftp3_client_is_refused_without_consuming_init() {
    let (mut engine, _rx) = engine();
    let response = inline(engine.dispatch(&init_packet(1)).unwrap());
    assert_eq!(response[0], packet::SSH_FXP_STATUS);

    // A second INIT is still legal: the state machine never left PreInit.
    let response = inline(engine.dispatch(&init_packet(3)).unwrap());
    assert_eq!(response[0], packet::SSH_FXP_VERSION);
}
