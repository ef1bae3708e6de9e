/// conventional rate at which the host ticks the timers
pub const TIMER_HZ: u32 = 60;

/// The delay and sound timers. Both count down towards zero, once per tick,
/// and stop there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// the buzzer is on for as long as the sound timer is non-zero
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}
