//! Voice trait for sound generators

/// A sounding note owned by the engine until it finishes
pub trait Voice: Send {
    /// Generate the next sample
    fn process(&mut self) -> f64;

    /// Check if the voice still produces sound
    fn is_active(&self) -> bool;
}
