//! Drives the whole `Engine` + worker-pool pipeline with a real multi-worker
//! pool and checks the one invariant that matters across a parallel
//! dispatch: same-handle requests complete in the order they were
//! submitted, while requests against a different handle are free to land
//! anywhere relative to them.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use protocol::codec::Writer;
use protocol::convert::Utf8Passthrough;
use protocol::handler::{CommandEntry, HandlerContext, Outcome};
use protocol::packet;
use protocol::status::Status;
use protocol::tables::{ProtocolTable, TableSet};
use protocol::{Dispatched, Engine, Job};

fn log() -> &'static Mutex<Vec<(Vec<u8>, u32)>> {
    static LOG: OnceLock<Mutex<Vec<(Vec<u8>, u32)>>> = OnceLock::new();
    LOG.get_or_init(|| Mutex::new(Vec::new()))
}

/// Reads a handle, sleeps briefly to widen the race window, then records
/// `(handle, id)` in arrival order.
fn slow_write(ctx: &mut HandlerContext<'_>) -> Outcome {
    let handle = ctx.body.read_handle().unwrap().to_vec();
    thread::sleep(Duration::from_millis(5));
    log().lock().unwrap().push((handle, ctx.id));
    Outcome::Status(Status::Ok)
}

const ENTRIES: &[CommandEntry] = &[CommandEntry::new(packet::SSH_FXP_WRITE, "write", slow_write)];

fn write_packet(id: u32, handle: &[u8]) -> Vec<u8> {
    let mut out = Writer::new();
    out.write_u8(packet::SSH_FXP_WRITE);
    out.write_u32(id);
    out.write_handle(handle);
    out.into_vec()
}

#[test]
fn same_handle_requests_complete_in_submission_order() {
    log().lock().unwrap().clear();

    let tables = TableSet::new(
        ProtocolTable::new(3, ENTRIES),
        ProtocolTable::new(4, ENTRIES),
        ProtocolTable::new(5, ENTRIES),
        ProtocolTable::new(6, ENTRIES),
    );
    let (results_tx, results_rx) = mpsc::channel::<Job>();
    let mut engine = Engine::new(tables, Arc::new(Utf8Passthrough), 4, results_tx, false);

    let mut init = Writer::new();
    init.write_u8(packet::SSH_FXP_INIT);
    init.write_u32(3);
    engine.dispatch(&init.into_vec()).unwrap();

    let mut queued = 0;
    for (id, handle) in [(7u32, &b"H"[..]), (8, b"H"), (9, b"K")] {
        match engine.dispatch(&write_packet(id, handle)).unwrap() {
            Dispatched::Queued => queued += 1,
            Dispatched::Inline(_) => panic!("expected the pool to take this job"),
        }
    }

    for _ in 0..queued {
        results_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    let entries = log().lock().unwrap().clone();
    let h_order: Vec<u32> = entries
        .iter()
        .filter(|(h, _)| h == b"H")
        .map(|(_, id)| *id)
        .collect();
    assert_eq!(h_order, vec![7, 8]);
    assert!(entries.iter().any(|(h, id)| h == b"K" && *id == 9));
}
