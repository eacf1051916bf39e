use crate::footage::DownloadedClip;
use thiserror::Error;

/// Shortest time a clip stays on screen.
pub const MIN_CLIP_SECONDS: f64 = 3.0;
/// The walk over the pool stops after this many passes per clip.
pub const MAX_CYCLES_PER_CLIP: usize = 3;
/// Remainders below this are treated as covered.
const COVERAGE_EPSILON: f64 = 1e-3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("cannot plan a clip sequence from an empty clip pool")]
    InsufficientClips,
    #[error("narration duration must be a positive number of seconds (got {0})")]
    InvalidTarget(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipSequenceEntry {
    pub clip: DownloadedClip,
    pub display_duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipSequence {
    pub entries: Vec<ClipSequenceEntry>,
    /// Shown without a duration after the last entry, held until the stream ends.
    pub hold: DownloadedClip,
    pub target_duration: f64,
}

impl ClipSequence {
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.display_duration).sum()
    }

    /// Seconds of narration not covered by timed entries. Non-zero only when the
    /// cycle cap stopped the walk early; the hold entry then fills the gap.
    pub fn shortfall(&self) -> f64 {
        (self.target_duration - self.total_duration()).max(0.0)
    }
}

/// Builds the ordered clip sequence covering `target_duration` seconds.
pub fn plan(clips: &[DownloadedClip], target_duration: f64) -> Result<ClipSequence, PlanError> {
    let Some(last) = clips.last() else {
        return Err(PlanError::InsufficientClips);
    };
    if !target_duration.is_finite() || target_duration <= 0.0 {
        return Err(PlanError::InvalidTarget(target_duration));
    }

    let per_clip = (target_duration / clips.len() as f64).max(MIN_CLIP_SECONDS);
    let max_entries = clips.len() * MAX_CYCLES_PER_CLIP;

    let mut entries = Vec::new();
    let mut total = 0.0;
    let mut index = 0;
    while target_duration - total > COVERAGE_EPSILON && index < max_entries {
        let remaining = target_duration - total;
        let display_duration = per_clip.min(remaining).max(MIN_CLIP_SECONDS);
        entries.push(ClipSequenceEntry {
            clip: clips[index % clips.len()].clone(),
            display_duration,
        });
        total += display_duration;
        index += 1;
    }

    Ok(ClipSequence {
        entries,
        hold: last.clone(),
        target_duration,
    })
}
