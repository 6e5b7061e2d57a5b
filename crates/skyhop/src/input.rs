//! # Input
//!
//! The simulation never polls a device. Once per rendered frame the loop
//! captures an [`InputSnapshot`] from whatever [`InputSource`] the host
//! provides; every tick drained in that frame sees the same snapshot.

/// Keys the control law reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    /// Yaw left.
    Left = 0,
    /// Yaw right.
    Right = 1,
    /// Accelerate along the facing direction.
    Forward = 2,
    /// Accelerate against the facing direction.
    Back = 3,
    /// Jump (only while grounded).
    Jump = 4,
}

impl Key {
    /// Every key, in bit order.
    pub const ALL: [Self; 5] = [Self::Left, Self::Right, Self::Forward, Self::Back, Self::Jump];

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Anything that can report whether a key is held right now.
pub trait InputSource {
    /// Checks if `key` is currently pressed.
    fn is_pressed(&self, key: Key) -> bool;
}

/// Immutable key state for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    bits: u8,
}

impl InputSnapshot {
    /// Nothing pressed.
    pub const NONE: Self = Self { bits: 0 };

    /// Polls every key of `source` once.
    #[must_use]
    pub fn capture(source: &dyn InputSource) -> Self {
        Key::ALL
            .into_iter()
            .filter(|key| source.is_pressed(*key))
            .fold(Self::NONE, Self::with)
    }

    /// Snapshot with exactly the given keys pressed.
    #[must_use]
    pub fn from_keys(keys: &[Key]) -> Self {
        keys.iter().copied().fold(Self::NONE, Self::with)
    }

    /// Returns this snapshot with `key` pressed as well.
    #[inline]
    #[must_use]
    pub const fn with(self, key: Key) -> Self {
        Self {
            bits: self.bits | key.bit(),
        }
    }

    /// Checks if `key` was pressed when the snapshot was taken.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, key: Key) -> bool {
        self.bits & key.bit() != 0
    }
}

impl InputSource for InputSnapshot {
    fn is_pressed(&self, key: Key) -> bool {
        InputSnapshot::is_pressed(*self, key)
    }
}

/// One step of a scripted session: hold `keys` for `frames` frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptStep {
    /// Frames this step lasts.
    pub frames: u32,
    /// Keys held throughout.
    pub keys: Vec<Key>,
}

/// Canned input for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Creates an empty script (nothing pressed, ever).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    #[must_use]
    pub fn then(mut self, frames: u32, keys: &[Key]) -> Self {
        self.steps.push(ScriptStep {
            frames,
            keys: keys.to_vec(),
        });
        self
    }

    /// Total frames covered by the script.
    #[must_use]
    pub fn len_frames(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.frames)).sum()
    }

    /// Key state on `frame`. Past the end, nothing is pressed.
    #[must_use]
    pub fn snapshot_at(&self, frame: u64) -> InputSnapshot {
        let mut start = 0u64;
        for step in &self.steps {
            let end = start + u64::from(step.frames);
            if frame < end {
                return InputSnapshot::from_keys(&step.keys);
            }
            start = end;
        }
        InputSnapshot::NONE
    }
}
