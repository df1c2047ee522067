//! Opener and closer phrases picked at random for each caption.
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{AppError, AppResult};

pub const DEFAULT_OPENERS: [&str; 6] = [
    "✨ Check this out!",
    "🔥 Just created something amazing!",
    "💫 Excited to share this with you all!",
    "🌈 New day, new creation!",
    "🎨 Art in motion...",
    "👀 Take a look at my latest work!",
];

pub const DEFAULT_CLOSERS: [&str; 6] = [
    "What do you think?",
    "Let me know your thoughts in the comments!",
    "Double tap if you love it!",
    "Share if this resonates with you!",
    "Tag someone who needs to see this!",
    "Save for inspiration later!",
];

pub struct PhrasePicker {
    openers: Vec<String>,
    closers: Vec<String>,
    rng: Mutex<StdRng>,
}

impl PhrasePicker {
    /// Both lists must be non-empty.
    pub fn new(openers: Vec<String>, closers: Vec<String>, rng: StdRng) -> AppResult<Self> {
        if openers.is_empty() || closers.is_empty() {
            return Err(AppError::InvalidInput(
                "opener and closer phrase lists must not be empty".to_string(),
            ));
        }
        Ok(PhrasePicker { openers, closers, rng: Mutex::new(rng) })
    }

    /// Built-in phrases with an OS-seeded RNG.
    pub fn with_defaults() -> Self {
        PhrasePicker {
            openers: DEFAULT_OPENERS.iter().map(|s| s.to_string()).collect(),
            closers: DEFAULT_CLOSERS.iter().map(|s| s.to_string()).collect(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn openers(&self) -> &[String] {
        &self.openers
    }

    pub fn closers(&self) -> &[String] {
        &self.closers
    }

    pub fn opener(&self) -> String {
        self.pick(&self.openers)
    }

    pub fn closer(&self) -> String {
        self.pick(&self.closers)
    }

    fn pick(&self, phrases: &[String]) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        phrases.choose(&mut *rng).cloned().unwrap_or_default()
    }
}
