use std::path::Path;

use anyhow::Context;

// Load a WAV file from disk as mono samples at its own rate
pub fn read_wav_mono(path: &Path) -> anyhow::Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("could not open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader // float, just pass it through
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => { // int, scale into [-1, 1]
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // average interleaved channels down to one
    let mono = samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok(mono)
}

// Load a WAV and stretch it to exactly `len` samples so it fills the loop
pub fn load_loop(path: &Path, len: usize) -> anyhow::Result<Vec<f32>> {
    let mono = read_wav_mono(path)?;
    if mono.is_empty() {
        anyhow::bail!("{} contains no samples", path.display());
    }
    log::info!(
        "imported {} ({} samples, resampled to {})",
        path.display(),
        mono.len(),
        len
    );
    Ok(resample_linear(&mono, len))
}

// Stretch or squeeze a mono clip onto exactly `out_len` points
pub fn resample_linear(src: &[f32], out_len: usize) -> Vec<f32> {
    if src.len() == out_len {
        return src.to_vec();
    }
    if src.is_empty() {
        return vec![0.0; out_len];
    }
    let step = src.len() as f64 / out_len as f64;
    let last = src.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let lo = pos.floor() as usize;
            if lo >= last {
                // past the final source sample, hold it
                return src[last];
            }
            let t = (pos - lo as f64) as f32;
            src[lo] + (src[lo + 1] - src[lo]) * t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wavepaint-import-{}-{}.wav", name, std::process::id()))
    }

    #[test]
    fn stereo_int_file_is_mixed_and_scaled() {
        let path = scratch_file("stereo");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mono = read_wav_mono(&path).unwrap();
        assert_eq!(mono.len(), 4);
        assert!(mono.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_loop_stretches_to_requested_length() {
        let path = scratch_file("stretch");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.0f32, 0.1, 0.2, 0.3] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let samples = load_loop(&path, 8).unwrap();
        assert_eq!(samples.len(), 8);
        assert!((samples[1] - 0.05).abs() < 1e-6);
        assert!((samples[2] - 0.1).abs() < 1e-6);
        // the tail past the last source sample holds it
        assert_eq!(samples[7], 0.3);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_loop(Path::new("/definitely/not/here.wav"), 16).is_err());
    }

    #[test]
    fn resample_same_length_is_copy() {
        let src = [0.1, -0.2, 0.3];
        assert_eq!(resample_linear(&src, 3), src.to_vec());
        assert_eq!(resample_linear(&[], 2), vec![0.0, 0.0]);
    }
}
