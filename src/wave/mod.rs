// The loop buffer and everything that writes or serialises it.
// Nothing in here touches the audio device; the resampler only sees snapshots.

mod buffer;
pub mod edit;
mod export;
mod generator;
mod import;

pub use buffer::WaveformBuffer;
pub use edit::{Anchor, BlendMode, BrushOp, SmearDrag};
pub use export::WavExporter;
pub use generator::{WaveformKind, generate};
pub use import::load_loop;
