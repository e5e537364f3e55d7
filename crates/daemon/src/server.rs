//! The per-connection service loop: frames in, dispatches through
//! [`protocol::Engine`], frames responses back out.
//!
//! Three threads cooperate on one connection: the caller's thread reads
//! framed requests and feeds [`protocol::Engine::dispatch`]; a collector
//! thread drains the worker pool's result channel; a writer thread owns the
//! transport's write half and serializes every outgoing packet, whether it
//! came back inline (pre-pool requests, or the pool's channel closing
//! under it) or from the pool.

use std::io::{Read, Write};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use protocol::framer::{PacketReader, PacketWriter};
use protocol::{Dispatched, Engine, Job};

use crate::config::RuntimeOptions;
use crate::error::DaemonError;
use crate::tables;

/// Runs the SFTP service loop to completion: until the reader sees a clean
/// EOF or a fatal protocol error occurs.
pub fn serve<R, W>(input: R, output: W, options: &RuntimeOptions) -> Result<(), DaemonError>
where
    R: Read,
    W: Write + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>();
    let writer_handle = thread::spawn(move || {
        let mut framer = PacketWriter::new(output);
        for bytes in out_rx {
            if framer.write_packet(&bytes).is_err() {
                break;
            }
        }
    });

    let (results_tx, results_rx) = mpsc::channel::<Job>();
    let collector_tx = out_tx.clone();
    let collector_handle = thread::spawn(move || {
        for job in results_rx {
            if collector_tx.send(job.into_response()).is_err() {
                break;
            }
        }
    });

    let table_set = tables::build();
    let mut engine = Engine::new(
        table_set,
        Arc::clone(&options.converter),
        options.workers,
        results_tx,
        options.readonly,
    );
    let mut reader = PacketReader::new(input);

    let run_result = (|| -> Result<(), DaemonError> {
        while let Some(raw) = reader.read_packet()? {
            match engine.dispatch(&raw)? {
                Dispatched::Inline(bytes) => {
                    if out_tx.send(bytes).is_err() {
                        break;
                    }
                }
                Dispatched::Queued => {}
            }
        }
        Ok(())
    })();

    drop(out_tx);
    drop(engine);
    let _ = collector_handle.join();
    let _ = writer_handle.join();

    run_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeOptions;
    use protocol::convert::Utf8Passthrough;
    use std::sync::Arc;

    fn options() -> RuntimeOptions {
        RuntimeOptions {
            readonly: false,
            chroot: None,
            user: None,
            listen: None,
            host: None,
            background: false,
            workers: 2,
            converter: Arc::new(Utf8Passthrough),
        }
    }

    #[test]
    fn init_handshake_produces_a_version_response() {
        let mut request = Vec::new();
        let mut init = Vec::new();
        init.push(protocol::packet::SSH_FXP_INIT);
        init.extend_from_slice(&3u32.to_be_bytes());
        request.extend_from_slice(&(init.len() as u32).to_be_bytes());
        request.extend_from_slice(&init);

        let output = Arc::new(std::sync::Mutex::new(Vec::new()));
        let output_clone = Arc::clone(&output);

        struct SharedWriter(Arc<std::sync::Mutex<Vec<u8>>>);
        impl Write for SharedWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        serve(request.as_slice(), SharedWriter(output_clone), &options()).unwrap();

        let bytes = output.lock().unwrap().clone();
        assert!(bytes.len() > 4);
        assert_eq!(bytes[4], protocol::packet::SSH_FXP_VERSION);
    }
}
