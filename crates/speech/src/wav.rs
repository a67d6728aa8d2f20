//! WAV codec for mono clips
//!
//! Only single-channel input is accepted. Integer samples of any width are
//! rescaled to 16 bits; float samples are clamped to [-1, 1] first.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use postal_assistant_core::AudioClip;

use crate::SpeechError;

pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip, SpeechError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(SpeechError::InvalidAudio(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.into_samples::<i16>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits) if bits <= 32 => {
            let shift = i32::from(bits) - 16;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|s| {
                        if shift >= 0 {
                            (s >> shift) as i16
                        } else {
                            (s << -shift) as i16
                        }
                    })
                })
                .collect::<Result<_, _>>()?
        },
        (SampleFormat::Float, _) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
            .collect::<Result<_, _>>()?,
        (_, bits) => {
            return Err(SpeechError::InvalidAudio(format!(
                "unsupported sample width: {} bits",
                bits
            )))
        },
    };

    Ok(AudioClip::new(samples, spec.sample_rate))
}

/// Mono 16-bit PCM WAV bytes
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>, SpeechError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + clip.samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in &clip.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_wav() -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..20 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_encoded_clip_decodes_back() {
        let clip = AudioClip::new(vec![0, 1200, -1200, i16::MAX, i16::MIN], 22_050);
        let bytes = encode_wav(&clip).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(decode_wav(&bytes).unwrap(), clip);
    }

    #[test]
    fn test_stereo_rejected() {
        let err = decode_wav(&stereo_wav()).unwrap_err();
        assert!(matches!(err, SpeechError::InvalidAudio(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, SpeechError::InvalidAudio(_)));
    }

    #[test]
    fn test_float_samples_rescaled() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-2.0f32).unwrap();
            writer.finalize().unwrap();
        }

        let clip = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(clip.samples, vec![16383, -32767]);
        assert_eq!(clip.sample_rate, 8_000);
    }
}
