use std::io::{BufWriter, Write};

use super::{PersistError, percent, quantize};
use crate::config::{SAMPLE_RATE, WAV_PROGRESS_STRIDE, WAV_TRANSFER_SIZE};
use crate::feedback::{Feedback, hold, ms};
use crate::storage::Storage;

fn spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Open, stream, finalize. The RIFF and data sizes are only known once the
/// last sample is out, so hound patches the header in `finalize`.
pub(super) fn write_wav(
    storage: &dyn Storage,
    name: &str,
    samples: &[f32],
    feedback: &mut dyn Feedback,
) -> Result<(), PersistError> {
    let write_error = |source| PersistError::Write {
        name: name.to_string(),
        source,
    };

    let file = storage.create(name).map_err(|source| PersistError::Create {
        name: name.to_string(),
        source,
    })?;
    let mut out = BufWriter::with_capacity(WAV_TRANSFER_SIZE, file);
    let mut writer = hound::WavWriter::new(&mut out, spec())?;
    feedback.message("Writing...", ms(hold::BRIEF));

    for (index, sample) in samples.iter().enumerate() {
        writer.write_sample(quantize(*sample))?;
        if index % WAV_PROGRESS_STRIDE == 0 {
            feedback.message(
                &format!("Writing: {}%", percent(index, samples.len())),
                ms(hold::PROGRESS),
            );
        }
    }

    feedback.message("Finalizing...", ms(hold::SHORT));
    writer.finalize()?;
    out.flush().map_err(write_error)?;
    out.get_mut().sync().map_err(write_error)
}
