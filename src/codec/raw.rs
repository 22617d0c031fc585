use std::io::{self, Read};

use super::{PersistError, dequantize, percent, quantize};
use crate::config::IMPORT_PROGRESS_STRIDE;
use crate::engine::LoopEngine;
use crate::feedback::{Feedback, hold, ms};
use crate::storage::StorageFile;

/// Stream `samples` as little-endian i16, one `scratch`-sized chunk at a
/// time. Each chunk must go down in a single complete write.
pub(super) fn write_raw(
    file: &mut dyn StorageFile,
    name: &str,
    samples: &[f32],
    scratch: &mut [u8],
    feedback: &mut dyn Feedback,
) -> Result<(), PersistError> {
    let chunk_samples = scratch.len() / 2;
    let mut done = 0;

    for chunk in samples.chunks(chunk_samples) {
        let bytes = &mut scratch[..chunk.len() * 2];
        for (pair, sample) in bytes.chunks_exact_mut(2).zip(chunk) {
            pair.copy_from_slice(&quantize(*sample).to_le_bytes());
        }

        match file.write(bytes) {
            Ok(written) if written == bytes.len() => {}
            Ok(written) => {
                return Err(PersistError::ShortWrite {
                    name: name.to_string(),
                    written,
                    expected: bytes.len(),
                });
            }
            Err(source) => {
                return Err(PersistError::Write {
                    name: name.to_string(),
                    source,
                });
            }
        }

        done += chunk.len();
        feedback.message(
            &format!("Writing: {}%", percent(done, samples.len())),
            ms(hold::PROGRESS),
        );
    }

    file.sync().map_err(|source| PersistError::Write {
        name: name.to_string(),
        source,
    })
}

/// Read up to `count` samples into the engine starting at index 0.
/// Returns how many arrived before end of data or the first read error.
pub(super) fn read_raw(
    reader: &mut dyn Read,
    count: usize,
    engine: &mut LoopEngine,
    scratch: &mut [u8],
    feedback: &mut dyn Feedback,
) -> usize {
    let chunk_samples = scratch.len() / 2;
    let mut total = 0;
    let mut reported_tail = false;

    while total < count {
        let want = (count - total).min(chunk_samples);
        let bytes = &mut scratch[..want * 2];
        let got = match fill(reader, bytes) {
            Ok(filled) => filled / 2,
            Err(e) => {
                log::warn!("read stopped after {total} samples: {e}");
                break;
            }
        };
        if got == 0 {
            break;
        }

        for (offset, pair) in bytes[..got * 2].chunks_exact(2).enumerate() {
            engine.load_sample(total + offset, dequantize(i16::from_le_bytes([pair[0], pair[1]])));
        }
        total += got;

        let near_end = total * 10 >= count * 9;
        if total % IMPORT_PROGRESS_STRIDE == 0 || (near_end && !reported_tail) {
            reported_tail |= near_end;
            log::debug!("import progress {total}/{count}");
            feedback.message(
                &format!("Load: {}%", percent(total, count)),
                ms(hold::LOAD_PROGRESS),
            );
        }
    }
    total
}

/// Read until `buf` is full or the stream ends. An error after some bytes
/// already arrived ends the fill early; the next call reports it.
fn fill(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) if filled > 0 => break,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
