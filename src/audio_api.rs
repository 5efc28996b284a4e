// Control messages from the UI thread to the audio callback. Buffer contents
// never travel through here; they are published as snapshots (see audio::LoopShared).

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioCommand {
    // Entering Playing always restarts from the loop start
    SetPlaying(bool),

    // Jump back to the loop start without changing play state, sent after a
    // regenerate so the new waveform starts in phase
    Restart,
}
