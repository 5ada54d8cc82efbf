/// Plays the Chip-8 tone.
///
/// The machine only knows whether the tone should be sounding; whatever makes
/// the noise (a speaker, a rumble motor, nothing at all) sits behind this trait.
pub trait Buzzer: Send {
    /// Called whenever the tone turns on or off.
    fn set_tone(&mut self, active: bool);
}

/// A buzzer that makes no sound, for headless runs and tests.
#[derive(Debug, Default)]
pub struct Silent;

impl Buzzer for Silent {
    fn set_tone(&mut self, _active: bool) {}
}

impl<F> Buzzer for F
where
    F: FnMut(bool) + Send,
{
    fn set_tone(&mut self, active: bool) {
        self(active)
    }
}
