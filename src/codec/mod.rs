//! Streaming the loop to and from storage.
//!
//! Two formats share one numeric contract: samples are clamped, scaled by
//! 32767 and rounded to the nearest `i16`; the way back divides by 32767.
//! Every operation reports to the operator through [`Feedback`] and also
//! returns a [`Result`] so callers can branch on the outcome.

mod raw;
mod wav;

use std::io;

use crate::config::{IMPORT_CHUNK_SAMPLES, MAX_SAVES, RAW_CHUNK_SAMPLES};
use crate::engine::LoopEngine;
use crate::feedback::{Feedback, hold, ms};
use crate::storage::Storage;

const SCALE: f32 = 32767.0;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("loop is empty")]
    NoData,
    #[error("already saved {limit} files of this format")]
    MaxFiles { limit: u32 },
    #[error("failed to create {name}")]
    Create {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open {name}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {name}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("short write to {name}: {written} of {expected} bytes")]
    ShortWrite {
        name: String,
        written: usize,
        expected: usize,
    },
    #[error("WAV encoding failed")]
    Wav(#[from] hound::Error),
}

impl PersistError {
    /// Text shown on the device for this failure.
    pub fn notice(&self) -> String {
        match self {
            PersistError::NoData => "No data".to_string(),
            PersistError::MaxFiles { limit } => format!("Max files ({limit})"),
            PersistError::Create { .. } => "Create failed".to_string(),
            PersistError::Open { .. } => "Open failed".to_string(),
            PersistError::Write { .. } | PersistError::ShortWrite { .. } | PersistError::Wav(_) => {
                "Write error".to_string()
            }
        }
    }

    fn hold_ms(&self) -> u64 {
        match self {
            PersistError::NoData => hold::NORMAL,
            PersistError::MaxFiles { .. } => hold::LONG,
            _ => hold::ERROR,
        }
    }
}

/// Outcome of a raw import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub samples: usize,
    pub truncated: bool,
}

#[inline]
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * SCALE).round() as i16
}

#[inline]
pub fn dequantize(value: i16) -> f32 {
    (value as f32 / SCALE).clamp(-1.0, 1.0)
}

/// Per-session save counters plus the fixed transfer buffers.
pub struct PersistenceCodec {
    next_wav: u32,
    next_raw: u32,
    raw_chunk: [u8; RAW_CHUNK_SAMPLES * 2],
    import_chunk: [u8; IMPORT_CHUNK_SAMPLES * 2],
}

impl Default for PersistenceCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceCodec {
    pub fn new() -> Self {
        PersistenceCodec {
            next_wav: 1,
            next_raw: 1,
            raw_chunk: [0; RAW_CHUNK_SAMPLES * 2],
            import_chunk: [0; IMPORT_CHUNK_SAMPLES * 2],
        }
    }

    /// Number the next WAV save would get.
    pub fn next_wav_index(&self) -> u32 {
        self.next_wav
    }

    pub fn next_raw_index(&self) -> u32 {
        self.next_raw
    }

    /// Write the loop as `LOOP<n>.WAV`. Returns the file name.
    pub fn export_wav(
        &mut self,
        engine: &LoopEngine,
        storage: &dyn Storage,
        feedback: &mut dyn Feedback,
    ) -> Result<String, PersistError> {
        let result = check_export(self.next_wav, engine).and_then(|()| {
            let name = format!("LOOP{}.WAV", self.next_wav);
            feedback.message("Creating WAV...", ms(hold::SHORT));
            wav::write_wav(storage, &name, engine.buffer().active(), feedback)?;
            Ok(name)
        });
        let name = finish(result, feedback)?;
        self.next_wav += 1;
        Ok(name)
    }

    /// Write the loop as headerless `LOOP<n>.BIN`. Returns the file name.
    ///
    /// A failed write leaves the partial file on the medium.
    pub fn export_raw(
        &mut self,
        engine: &LoopEngine,
        storage: &dyn Storage,
        feedback: &mut dyn Feedback,
    ) -> Result<String, PersistError> {
        let result = check_export(self.next_raw, engine).and_then(|()| {
            let name = format!("LOOP{}.BIN", self.next_raw);
            feedback.message("Creating BIN...", ms(hold::SHORT));
            let mut file = storage.create(&name).map_err(|source| PersistError::Create {
                name: name.clone(),
                source,
            })?;
            raw::write_raw(
                file.as_mut(),
                &name,
                engine.buffer().active(),
                &mut self.raw_chunk,
                feedback,
            )?;
            Ok(name)
        });
        let name = finish(result, feedback)?;
        self.next_raw += 1;
        Ok(name)
    }

    /// Replace the loop with the contents of a raw file.
    ///
    /// The current loop is erased before reading starts. A read error part
    /// way through ends the import with whatever arrived until then.
    pub fn import_raw(
        &mut self,
        name: &str,
        engine: &mut LoopEngine,
        storage: &dyn Storage,
        feedback: &mut dyn Feedback,
    ) -> Result<ImportReport, PersistError> {
        let source = match storage.open(name) {
            Ok(source) => source,
            Err(source) => {
                let err = PersistError::Open {
                    name: name.to_string(),
                    source,
                };
                return Err(report(err, feedback));
            }
        };

        let available = usize::try_from(source.size / 2).unwrap_or(usize::MAX);
        let truncated = available > engine.capacity();
        let count = available.min(engine.capacity());
        if truncated {
            log::warn!(
                "{name} holds {available} samples, keeping the first {}",
                engine.capacity()
            );
            feedback.message("Truncated", ms(hold::SHORT));
        }

        engine.reset();
        feedback.reset_flash();

        let mut reader = source.reader;
        let total = raw::read_raw(reader.as_mut(), count, engine, &mut self.import_chunk, feedback);
        engine.finish_load(total);

        log::info!("loaded {total} samples from {name}");
        feedback.message(&format!("Loaded {total} smp"), ms(hold::LONG));
        feedback.transport(&engine.status());
        Ok(ImportReport {
            samples: total,
            truncated,
        })
    }
}

fn check_export(next_index: u32, engine: &LoopEngine) -> Result<(), PersistError> {
    if next_index > MAX_SAVES {
        return Err(PersistError::MaxFiles { limit: MAX_SAVES });
    }
    if engine.is_empty() {
        return Err(PersistError::NoData);
    }
    Ok(())
}

fn finish(
    result: Result<String, PersistError>,
    feedback: &mut dyn Feedback,
) -> Result<String, PersistError> {
    match result {
        Ok(name) => {
            log::info!("saved {name}");
            feedback.message(&format!("Saved {name}"), ms(hold::LONG));
            Ok(name)
        }
        Err(err) => Err(report(err, feedback)),
    }
}

fn report(err: PersistError, feedback: &mut dyn Feedback) -> PersistError {
    log::warn!("persistence aborted: {err}");
    feedback.message(&err.notice(), ms(err.hold_ms()));
    err
}

fn percent(done: usize, total: usize) -> usize {
    if total == 0 { 100 } else { done * 100 / total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use crate::feedback::recording::RecordingFeedback;
    use crate::storage::memory::MemoryStorage;

    fn loop_of(samples: &[f32], capacity: usize) -> LoopEngine {
        let mut engine = LoopEngine::new(capacity);
        engine.toggle_record();
        for sample in samples {
            engine.process(*sample);
        }
        engine.toggle_record();
        engine
    }

    fn raw_bytes(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn quantization_rounds_and_clamps() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(3.0), 32767);
        assert_eq!(quantize(0.5), 16384);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(dequantize(-32768), -1.0);
        for step in -100..=100 {
            let v = step as f32 / 100.0;
            assert!((v - dequantize(quantize(v))).abs() <= 1.0 / 32767.0);
        }
    }

    #[test]
    fn raw_round_trip_preserves_length_and_content() {
        let input: Vec<f32> = (0..40).map(|i| if i % 2 == 0 { 0.75 } else { -0.3 }).collect();
        let engine = loop_of(&input, 100);
        let storage = MemoryStorage::default();
        let mut feedback = RecordingFeedback::default();
        let mut codec = PersistenceCodec::new();

        let name = codec.export_raw(&engine, &storage, &mut feedback).unwrap();
        assert_eq!(name, "LOOP1.BIN");
        assert_eq!(storage.file("LOOP1.BIN").unwrap().len(), 80);
        assert!(feedback.saw("Saved LOOP1.BIN"));

        let mut restored = LoopEngine::new(100);
        let report = codec
            .import_raw("LOOP1.BIN", &mut restored, &storage, &mut feedback)
            .unwrap();
        assert_eq!(
            report,
            ImportReport {
                samples: 40,
                truncated: false,
            }
        );
        assert_eq!(restored.len(), 40);
        assert_eq!(restored.mode(), Mode::Looping);
        assert!(restored.is_playing());
        for (i, original) in input.iter().enumerate() {
            assert!((restored.buffer().get(i) - original).abs() <= 1.0 / 32767.0);
        }
        assert!(feedback.saw("Loaded 40 smp"));
    }

    #[test]
    fn raw_export_spans_several_chunks() {
        let input: Vec<f32> = (0..2500).map(|i| (i as f32 / 2500.0) - 0.5).collect();
        let engine = loop_of(&input, 4096);
        let storage = MemoryStorage::default();
        let mut feedback = RecordingFeedback::default();

        PersistenceCodec::new()
            .export_raw(&engine, &storage, &mut feedback)
            .unwrap();

        let bytes = storage.file("LOOP1.BIN").unwrap();
        assert_eq!(bytes.len(), 5000);
        let last = i16::from_le_bytes([bytes[4998], bytes[4999]]);
        assert_eq!(last, quantize(input[2499]));
        assert!(feedback.saw("Writing: 40%"));
        assert!(feedback.saw("Writing: 100%"));
    }

    #[test]
    fn empty_loop_is_not_saved() {
        let engine = LoopEngine::new(100);
        let storage = MemoryStorage::default();
        let mut feedback = RecordingFeedback::default();
        let mut codec = PersistenceCodec::new();

        assert!(matches!(
            codec.export_raw(&engine, &storage, &mut feedback),
            Err(PersistError::NoData)
        ));
        assert!(matches!(
            codec.export_wav(&engine, &storage, &mut feedback),
            Err(PersistError::NoData)
        ));
        assert!(feedback.saw("No data"));
        assert!(storage.files.borrow().is_empty());
        assert_eq!(codec.next_raw_index(), 1);
        assert_eq!(codec.next_wav_index(), 1);
    }

    #[test]
    fn eleventh_save_is_rejected_without_advancing() {
        let engine = loop_of(&[0.1; 8], 100);
        let storage = MemoryStorage::default();
        let mut feedback = RecordingFeedback::default();
        let mut codec = PersistenceCodec::new();

        for n in 1..=10 {
            assert_eq!(
                codec.export_raw(&engine, &storage, &mut feedback).unwrap(),
                format!("LOOP{n}.BIN")
            );
        }
        assert_eq!(codec.next_raw_index(), 11);
        assert!(matches!(
            codec.export_raw(&engine, &storage, &mut feedback),
            Err(PersistError::MaxFiles { limit: 10 })
        ));
        assert_eq!(codec.next_raw_index(), 11);
        assert!(feedback.saw("Max files (10)"));
        assert!(storage.file("LOOP11.BIN").is_none());

        // The other format keeps its own counter.
        assert_eq!(
            codec.export_wav(&engine, &storage, &mut feedback).unwrap(),
            "LOOP1.WAV"
        );
    }

    #[test]
    fn create_failure_is_reported() {
        let engine = loop_of(&[0.1; 8], 100);
        let storage = MemoryStorage {
            fail_create: true,
            ..Default::default()
        };
        let mut feedback = RecordingFeedback::default();
        let mut codec = PersistenceCodec::new();

        assert!(matches!(
            codec.export_raw(&engine, &storage, &mut feedback),
            Err(PersistError::Create { .. })
        ));
        assert!(matches!(
            codec.export_wav(&engine, &storage, &mut feedback),
            Err(PersistError::Create { .. })
        ));
        assert!(feedback.saw("Create failed"));
        assert_eq!(codec.next_raw_index(), 1);
        assert_eq!(codec.next_wav_index(), 1);
    }

    #[test]
    fn short_write_aborts_and_leaves_partial_file() {
        let engine = loop_of(&vec![0.2; 3000], 4096);
        let storage = MemoryStorage {
            fail_writes_after: Some(3000),
            ..Default::default()
        };
        let mut feedback = RecordingFeedback::default();
        let mut codec = PersistenceCodec::new();

        let err = codec.export_raw(&engine, &storage, &mut feedback).unwrap_err();
        assert!(matches!(
            err,
            PersistError::ShortWrite {
                written: 952,
                expected: 2048,
                ..
            }
        ));
        assert!(feedback.saw("Write error"));
        assert_eq!(storage.file("LOOP1.BIN").unwrap().len(), 3000);
        assert_eq!(codec.next_raw_index(), 1);
    }

    #[test]
    fn import_truncates_to_capacity() {
        let storage = MemoryStorage::default();
        storage.insert("BIG.BIN", raw_bytes(&[1000; 150]));
        let mut engine = LoopEngine::new(100);
        let mut feedback = RecordingFeedback::default();

        let report = PersistenceCodec::new()
            .import_raw("BIG.BIN", &mut engine, &storage, &mut feedback)
            .unwrap();
        assert_eq!(
            report,
            ImportReport {
                samples: 100,
                truncated: true,
            }
        );
        assert_eq!(engine.len(), 100);
        assert!(feedback.saw("Truncated"));
    }

    #[test]
    fn import_discards_previous_loop() {
        let storage = MemoryStorage::default();
        storage.insert("SHORT.BIN", raw_bytes(&[16384, -16384]));
        let mut engine = loop_of(&[0.9; 10], 100);
        let mut feedback = RecordingFeedback::default();

        PersistenceCodec::new()
            .import_raw("SHORT.BIN", &mut engine, &storage, &mut feedback)
            .unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.buffer().get(2), 0.0);
        assert_eq!(feedback.flashes, 1);
        assert!(feedback.transports.last().unwrap().playing);
    }

    #[test]
    fn read_error_keeps_partial_import() {
        let storage = MemoryStorage {
            fail_reads_after: Some(1200),
            ..Default::default()
        };
        storage.insert("FLAKY.BIN", raw_bytes(&[8000; 1000]));
        let mut engine = LoopEngine::new(2000);
        let mut feedback = RecordingFeedback::default();

        let report = PersistenceCodec::new()
            .import_raw("FLAKY.BIN", &mut engine, &storage, &mut feedback)
            .unwrap();
        assert_eq!(report.samples, 600);
        assert_eq!(engine.len(), 600);
        assert_eq!(engine.mode(), Mode::Looping);
    }

    #[test]
    fn empty_file_leaves_loop_empty() {
        let storage = MemoryStorage::default();
        storage.insert("NONE.BIN", Vec::new());
        let mut engine = loop_of(&[0.5; 4], 100);
        let mut feedback = RecordingFeedback::default();

        let report = PersistenceCodec::new()
            .import_raw("NONE.BIN", &mut engine, &storage, &mut feedback)
            .unwrap();
        assert_eq!(report.samples, 0);
        assert_eq!(engine.mode(), Mode::Empty);
        assert!(!engine.is_playing());
        assert!(feedback.saw("Loaded 0 smp"));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let storage = MemoryStorage::default();
        let mut engine = loop_of(&[0.5; 4], 100);
        let mut feedback = RecordingFeedback::default();

        let err = PersistenceCodec::new()
            .import_raw("GONE.BIN", &mut engine, &storage, &mut feedback)
            .unwrap_err();
        assert!(matches!(err, PersistError::Open { .. }));
        assert!(feedback.saw("Open failed"));
        // Nothing was touched.
        assert_eq!(engine.len(), 4);
    }
}
