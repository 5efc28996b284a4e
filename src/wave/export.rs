// Lossless export of the loop buffer: mono, 32-bit IEEE float WAV.
//
// The header is written by hand because the layout is fixed to the canonical
// 44-byte form (16-byte fmt chunk, format tag 3); the samples are the raw
// little-endian bits of the buffer.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;
const BYTES_PER_SAMPLE: u32 = 4;
const HEADER_LEN: usize = 44;
const MAX_TEMP_ATTEMPTS: u32 = 16;

/// Serialise `samples` as a complete WAV file image.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_size = samples.len() as u32 * BYTES_PER_SAMPLE;
    let mut out = Vec::with_capacity(HEADER_LEN + data_size as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAVE_FORMAT_IEEE_FLOAT.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * BYTES_PER_SAMPLE).to_le_bytes()); // byte rate
    out.extend_from_slice(&(BYTES_PER_SAMPLE as u16).to_le_bytes()); // block align
    out.extend_from_slice(&32u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Writes numbered exports (`<prefix>001.wav`, `<prefix>002.wav`, ...) into a
/// directory, never overwriting an existing file.
#[derive(Clone, Debug)]
pub struct WavExporter {
    dir: PathBuf,
    prefix: String,
    sample_rate: u32,
    counter: u32,
}

impl WavExporter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            sample_rate,
            counter: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, n: u32) -> String {
        format!("{}{:03}.wav", self.prefix, n)
    }

    // Advance the counter past every name already on disk.
    fn next_free_path(&mut self) -> PathBuf {
        loop {
            self.counter += 1;
            let path = self.dir.join(self.file_name(self.counter));
            if !path.exists() {
                return path;
            }
        }
    }

    /// Export `samples` and return the path written. The file is assembled
    /// under a hidden temporary name and renamed into place once it is fully
    /// on disk, so a failure never leaves a partial WAV under a final name.
    pub fn export(&mut self, samples: &[f32]) -> anyhow::Result<PathBuf> {
        let bytes = encode_wav(samples, self.sample_rate);
        let counter_before = self.counter;
        let target = self.next_free_path();
        let (tmp, file) = match create_temp(&self.dir, &target) {
            Ok(created) => created,
            Err(e) => {
                self.counter = counter_before;
                return Err(e);
            }
        };

        // only a temp file this call created is ever removed
        if let Err(e) = write_synced(file, &tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            self.counter = counter_before;
            return Err(e);
        }

        // someone may have claimed the name while we were writing
        let mut target = target;
        while target.exists() {
            target = self.next_free_path();
        }
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            self.counter = counter_before;
            return Err(e).with_context(|| format!("could not move export into {}", target.display()));
        }

        log::info!("exported {} samples to {}", samples.len(), target.display());
        Ok(target)
    }
}

// Hidden temp file next to `target`. A leftover temp from an earlier crash or
// another instance is left alone and a suffixed name is tried instead.
fn create_temp(dir: &Path, target: &Path) -> anyhow::Result<(PathBuf, File)> {
    let name = target.file_name().and_then(|n| n.to_str()).unwrap_or("export");
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let tmp = if attempt == 0 {
            dir.join(format!(".{name}.partial"))
        } else {
            dir.join(format!(".{name}.{}-{attempt}.partial", std::process::id()))
        };
        match OpenOptions::new().write(true).create_new(true).open(&tmp) {
            Ok(file) => return Ok((tmp, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("could not open {} for writing", tmp.display()));
            }
        }
    }
    anyhow::bail!("no free temporary name for {} in {}", name, dir.display())
}

fn write_synced(file: File, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .with_context(|| format!("could not write {}", path.display()))?;
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("could not flush {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("could not sync {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavepaint-export-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn header_layout_for_silent_loop() {
        let samples = vec![0.0f32; 96_000];
        let bytes = encode_wav(&samples, 48_000);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 96_000 * 4);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 3);
        assert_eq!(u16_at(&bytes, 22), 1);
        assert_eq!(u32_at(&bytes, 24), 48_000);
        assert_eq!(u32_at(&bytes, 28), 192_000);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 32);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 96_000 * 4);
        assert_eq!(bytes.len(), 44 + 96_000 * 4);
        assert!(bytes[44..].iter().all(|&b| b == 0));
    }

    #[test]
    fn exported_samples_read_back_bit_exact() {
        let dir = scratch_dir("roundtrip");
        let samples: Vec<f32> = (0..1000)
            .map(|i| ((i as f32) * 0.013).sin() * 0.35 + f32::EPSILON * i as f32)
            .collect();
        let mut exporter = WavExporter::new(&dir, "waveform_", 48_000);
        let path = exporter.export(&samples).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let back: Vec<f32> = reader.samples::<f32>().collect::<Result<_, _>>().unwrap();
        assert_eq!(back.len(), samples.len());
        for (a, b) in samples.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn picks_first_unused_name() {
        let dir = scratch_dir("names");
        fs::write(dir.join("waveform_001.wav"), b"taken").unwrap();
        fs::write(dir.join("waveform_002.wav"), b"taken").unwrap();

        let mut exporter = WavExporter::new(&dir, "waveform_", 48_000);
        let first = exporter.export(&[0.1, 0.2]).unwrap();
        assert_eq!(first.file_name().unwrap(), "waveform_003.wav");
        let second = exporter.export(&[0.1, 0.2]).unwrap();
        assert_eq!(second.file_name().unwrap(), "waveform_004.wav");

        assert_eq!(fs::read(dir.join("waveform_001.wav")).unwrap(), b"taken");
        // no temporary files left behind
        let leftovers = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_temp_file_is_left_alone() {
        let dir = scratch_dir("stale");
        let stale = dir.join(".waveform_001.wav.partial");
        fs::write(&stale, b"crashed").unwrap();

        let mut exporter = WavExporter::new(&dir, "waveform_", 48_000);
        let path = exporter.export(&[0.25, -0.25]).unwrap();
        assert_eq!(path.file_name().unwrap(), "waveform_001.wav");
        assert_eq!(fs::read(&stale).unwrap(), b"crashed");

        let mut reader = hound::WavReader::open(&path).unwrap();
        let back: Vec<f32> = reader.samples::<f32>().collect::<Result<_, _>>().unwrap();
        assert_eq!(back, vec![0.25, -0.25]);

        // only the stale file remains as a temp
        let temps = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(temps, 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_directory_reports_error() {
        let dir = std::env::temp_dir().join(format!("wavepaint-export-missing-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let mut exporter = WavExporter::new(&dir, "waveform_", 48_000);
        assert!(exporter.export(&[0.0; 16]).is_err());
        assert!(!dir.exists());

        // a failed export doesn't use up a number
        fs::create_dir_all(&dir).unwrap();
        let path = exporter.export(&[0.0; 16]).unwrap();
        assert_eq!(path.file_name().unwrap(), "waveform_001.wav");
        let _ = fs::remove_dir_all(&dir);
    }
}
