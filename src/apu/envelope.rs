//! Envelope, note-length counter and output decay shared by the pulse and
//! noise channels.

use super::tables::ApuTables;

/// Envelope clocks per frame (240 Hz envelope / 60 Hz frame)
const ENVELOPE_STEP: i32 = 4;

/// Pull a held output level one step toward zero.
///
/// Loses 1/128 of the level plus one unit per tick, so a silenced channel
/// fades geometrically and lands exactly on zero instead of parking on a
/// small residue.
#[inline]
pub fn decay(level: i32) -> i32 {
    level - level / 128 - level.signum()
}

/// Volume envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope {
    /// Fixed volume / envelope period index (bits 0-3)
    pub volume: u8,
    /// Envelope reload period in ticks
    pub delay: i32,
    phase: i32,
    /// Decay counter, 0 (loud) to 15 (silent)
    level: u8,
    /// Bit 4: constant volume
    pub fixed: bool,
    /// Bit 5: length halt / envelope loop
    pub hold: bool,
}

impl Envelope {
    /// Apply a control register write (`$4000`/`$4004`/`$400C`)
    pub fn write_control(&mut self, value: u8, tables: &ApuTables) {
        self.volume = value & 0x0F;
        self.delay = tables.decay[(value & 0x0F) as usize];
        self.hold = value & 0x20 != 0;
        self.fixed = value & 0x10 != 0;
    }

    /// Restart the decay from full volume
    #[inline]
    pub fn restart(&mut self) {
        self.level = 0;
    }

    /// Advance by one tick
    #[inline]
    pub fn clock(&mut self) {
        if self.delay <= 0 {
            return;
        }
        self.phase -= ENVELOPE_STEP;
        while self.phase < 0 {
            self.phase += self.delay;
            if self.hold {
                self.level = (self.level + 1) & 0x0F;
            } else if self.level < 0x0F {
                self.level += 1;
            }
        }
    }

    /// Current decay counter (0-15)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Signed amplitude of one waveform step
    #[inline]
    pub fn amplitude(&self) -> i32 {
        if self.fixed {
            i32::from(self.volume) << 8
        } else {
            i32::from(self.level ^ 0x0F) << 8
        }
    }
}

/// Note-length ("vbl") counter in output ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthCounter {
    remaining: i32,
}

impl LengthCounter {
    /// Reload from a length/frequency-high register value
    #[inline]
    pub fn load(&mut self, register: u8, tables: &ApuTables) {
        self.remaining = tables.note_length(register);
    }

    /// Count down one tick unless held
    #[inline]
    pub fn clock(&mut self, hold: bool) {
        if !hold && self.remaining > 0 {
            self.remaining -= 1;
        }
    }

    /// Zero the counter (channel disabled)
    #[inline]
    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Ticks left
    #[inline]
    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Whether the note is still sounding
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_reaches_zero_from_both_sides() {
        for start in [15 << 8, -(15 << 8), 1, -1, 127, -128] {
            let mut level = start;
            let mut steps = 0;
            while level != 0 {
                let next = decay(level);
                assert!(next.abs() < level.abs(), "decay must shrink {level}");
                assert!(next.signum() * level.signum() >= 0, "no overshoot past zero");
                level = next;
                steps += 1;
                assert!(steps < 10_000);
            }
        }
        assert_eq!(decay(0), 0);
    }

    #[test]
    fn test_envelope_counts_toward_silence() {
        let tables = ApuTables::build(10);
        let mut env = Envelope::default();
        env.write_control(0x00, &tables); // period index 0 -> reload 10 ticks
        env.restart();
        assert_eq!(env.amplitude(), 15 << 8);

        // 4 per tick against a 10 tick reload: the first tick underflows once
        env.clock();
        assert_eq!(env.level(), 1);
        for _ in 0..1000 {
            env.clock();
        }
        assert_eq!(env.level(), 15);
        assert_eq!(env.amplitude(), 0);
    }

    #[test]
    fn test_envelope_loops_when_held() {
        let tables = ApuTables::build(1);
        let mut env = Envelope::default();
        env.write_control(0x20, &tables); // hold, delay 1 -> 4 steps per tick
        env.restart();
        for _ in 0..4 {
            env.clock();
        }
        // 16 increments wrap back to 0
        assert_eq!(env.level(), 0);
    }

    #[test]
    fn test_fixed_volume_amplitude() {
        let tables = ApuTables::build(10);
        let mut env = Envelope::default();
        env.write_control(0x1A, &tables);
        assert!(env.fixed);
        assert_eq!(env.amplitude(), 0x0A << 8);
    }

    #[test]
    fn test_length_counter_holds_and_clamps() {
        let tables = ApuTables::build(2);
        let mut length = LengthCounter::default();
        length.load(0x18, &tables); // index 3 -> 1 frame
        assert_eq!(length.remaining(), 2);

        length.clock(true);
        assert_eq!(length.remaining(), 2);

        length.clock(false);
        length.clock(false);
        length.clock(false);
        assert_eq!(length.remaining(), 0);
        assert!(!length.is_active());
    }
}
