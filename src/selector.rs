use crate::footage::VideoFileDescriptor;

/// Full-HD width that is preferred when the file is cheap enough to fetch.
pub const TARGET_WIDTH: u32 = 1920;
/// Quality floor for the fallback pass.
pub const MIN_ACCEPTABLE_WIDTH: u32 = 1280;
pub const MAX_PREFERRED_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    /// 1920 wide and under the size cap.
    Optimal,
    /// At least 1280 wide.
    QualityFloor,
    /// Nothing qualified; smallest file.
    Smallest,
}

#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub file: &'a VideoFileDescriptor,
    pub tier: SelectionTier,
}

fn size_key(file: &VideoFileDescriptor) -> u64 {
    file.file_size.unwrap_or(u64::MAX)
}

pub fn select(candidates: &[VideoFileDescriptor]) -> Option<Selection<'_>> {
    let mut sorted: Vec<&VideoFileDescriptor> = candidates.iter().collect();
    sorted.sort_by_key(|f| size_key(f));

    // An unreported size sorts last but still counts as under the cap here.
    if let Some(file) = sorted.iter().copied().find(|f| {
        f.width == TARGET_WIDTH && f.file_size.unwrap_or(0) < MAX_PREFERRED_BYTES
    }) {
        return Some(Selection {
            file,
            tier: SelectionTier::Optimal,
        });
    }

    if let Some(file) = sorted.iter().copied().find(|f| f.width >= MIN_ACCEPTABLE_WIDTH) {
        return Some(Selection {
            file,
            tier: SelectionTier::QualityFloor,
        });
    }

    sorted.first().map(|&file| Selection {
        file,
        tier: SelectionTier::Smallest,
    })
}

pub fn select_best(candidates: &[VideoFileDescriptor]) -> Option<&str> {
    select(candidates).map(|s| s.file.url.as_str())
}
