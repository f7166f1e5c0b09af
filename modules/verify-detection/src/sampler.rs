/// Most frames pulled from any one video.
pub const MAX_SAMPLED_FRAMES: u64 = 8;

/// Evenly spaced frame indices: stride `max(1, total / cap)`, at most
/// `min(cap, total)` of them, all below `total` and strictly increasing.
pub fn frame_positions(total_frames: u64, cap: u64) -> Vec<u64> {
    let count = cap.min(total_frames);
    if count == 0 {
        return Vec::new();
    }
    let stride = (total_frames / cap).max(1);
    (0..count).map(|i| i * stride).collect()
}
