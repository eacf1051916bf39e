pub mod elevenlabs;
pub mod gemini;
pub mod pexels;

#[cfg(test)]
mod elevenlabs_tests;
#[cfg(test)]
mod pexels_tests;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use gemini::GeminiScriptGenerator;
pub use pexels::PexelsFootageSource;
