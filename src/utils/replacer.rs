use crate::buffer::buffer_pool_manager::FrameId;
use crate::buffer::frame::FrameDesc;
use crate::storage::errors::{StorageError, StorageResult};

/// Outcome of a victim search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Victim {
    /// The frame holds no page; reuse it directly.
    Free(FrameId),

    /// The frame holds a resident page the caller must evict first,
    /// writing it back if dirty.
    Evict(FrameId),
}

pub trait Replacer {
    fn pick_victim(&mut self, frames: &mut [FrameDesc]) -> StorageResult<Victim>;
}

/// Clock (second-chance) replacement. A rotating hand sweeps the frame
/// table; a set reference bit buys a frame one more lap before it becomes
/// a candidate, approximating LRU without any per-access bookkeeping.
pub struct ClockReplacer {
    hand: usize,
}

impl ClockReplacer {
    pub fn new(num_frames: usize) -> Self {
        // One step behind frame 0, so the first sweep starts there.
        ClockReplacer {
            hand: num_frames.saturating_sub(1),
        }
    }

    fn advance(&mut self, num_frames: usize) -> usize {
        self.hand = (self.hand + 1) % num_frames;
        self.hand
    }
}

impl Replacer for ClockReplacer {
    /// At each visited frame: a free frame is taken immediately; a set
    /// reference bit is cleared and the frame skipped; a pinned frame is
    /// counted and skipped; anything else is the victim. Among equally
    /// eligible frames the first one in sweep order wins.
    ///
    /// A call sweeps at most two laps of exactly one frame count each,
    /// resetting the pinned counter at each lap boundary: the first lap
    /// may spend itself clearing reference bits, the second then reaches
    /// whatever the first unreferenced. A lap that finds every frame
    /// pinned, or running out of laps, means nothing can be freed.
    fn pick_victim(&mut self, frames: &mut [FrameDesc]) -> StorageResult<Victim> {
        let num_frames = frames.len();
        if num_frames == 0 {
            return Err(StorageError::BufferExceeded);
        }

        for _lap in 0..2 {
            let mut pinned = 0;

            for _ in 0..num_frames {
                let desc = &mut frames[self.advance(num_frames)];

                if !desc.valid {
                    return Ok(Victim::Free(desc.frame_id));
                }

                if desc.ref_bit {
                    // Second chance: candidate again next lap.
                    desc.ref_bit = false;
                    continue;
                }

                if desc.pin_count > 0 {
                    pinned += 1;
                    if pinned == num_frames {
                        return Err(StorageError::BufferExceeded);
                    }
                    continue;
                }

                return Ok(Victim::Evict(desc.frame_id));
            }
        }

        // Two full laps and only pinned frames remained.
        Err(StorageError::BufferExceeded)
    }
}

#[cfg(test)]
pub mod test {
    use super::{ClockReplacer, Replacer, Victim};
    use crate::buffer::frame::FrameDesc;
    use crate::storage::errors::StorageError;

    fn frame_table(n: usize) -> Vec<FrameDesc> {
        (0..n).map(|i| FrameDesc::new(i as u32)).collect()
    }

    fn resident(desc: &mut FrameDesc, file_id: u64, page_id: u32) {
        desc.set(file_id, page_id);
        desc.pin_count = 0;
        desc.ref_bit = false;
    }

    #[test]
    fn free_frames_are_taken_in_sweep_order() {
        let mut frames = frame_table(3);
        let mut replacer = ClockReplacer::new(3);

        assert_eq!(Victim::Free(0), replacer.pick_victim(&mut frames).unwrap());
        resident(&mut frames[0], 1, 0);

        assert_eq!(Victim::Free(1), replacer.pick_victim(&mut frames).unwrap());
        resident(&mut frames[1], 1, 1);

        assert_eq!(Victim::Free(2), replacer.pick_victim(&mut frames).unwrap());
    }

    #[test]
    fn reference_bit_buys_one_lap() {
        let mut frames = frame_table(2);
        let mut replacer = ClockReplacer::new(2);

        resident(&mut frames[0], 1, 0);
        resident(&mut frames[1], 1, 1);
        frames[0].ref_bit = true;

        // Frame 0 is referenced, so the sweep clears its bit and settles
        // on frame 1 even though frame 0 comes first.
        assert_eq!(Victim::Evict(1), replacer.pick_victim(&mut frames).unwrap());
        assert!(!frames[0].ref_bit);
    }

    #[test]
    fn all_referenced_falls_back_to_second_lap() {
        let mut frames = frame_table(3);
        let mut replacer = ClockReplacer::new(3);

        for i in 0..3 {
            resident(&mut frames[i], 1, i as u32);
            frames[i].ref_bit = true;
        }

        // First lap only clears bits; the second lap picks frame 0.
        assert_eq!(Victim::Evict(0), replacer.pick_victim(&mut frames).unwrap());
    }

    #[test]
    fn pinned_frames_are_never_victims() {
        let mut frames = frame_table(3);
        let mut replacer = ClockReplacer::new(3);

        for i in 0..3 {
            resident(&mut frames[i], 1, i as u32);
        }
        frames[0].pin_count = 1;
        frames[1].pin_count = 2;

        assert_eq!(Victim::Evict(2), replacer.pick_victim(&mut frames).unwrap());
    }

    #[test]
    fn full_pool_pinned_is_capacity_exceeded() {
        let mut frames = frame_table(2);
        let mut replacer = ClockReplacer::new(2);

        for i in 0..2 {
            resident(&mut frames[i], 1, i as u32);
            frames[i].pin_count = 1;
        }

        let err = replacer.pick_victim(&mut frames).unwrap_err();
        assert!(matches!(err, StorageError::BufferExceeded));
    }

    #[test]
    fn pinned_and_referenced_pool_is_capacity_exceeded() {
        let mut frames = frame_table(2);
        let mut replacer = ClockReplacer::new(2);

        for i in 0..2 {
            resident(&mut frames[i], 1, i as u32);
            frames[i].pin_count = 1;
            frames[i].ref_bit = true;
        }

        // The first lap clears reference bits, the second finds every
        // frame still pinned.
        let err = replacer.pick_victim(&mut frames).unwrap_err();
        assert!(matches!(err, StorageError::BufferExceeded));
    }

    #[test]
    fn hand_resumes_where_it_stopped() {
        let mut frames = frame_table(3);
        let mut replacer = ClockReplacer::new(3);

        for i in 0..3 {
            resident(&mut frames[i], 1, i as u32);
        }

        assert_eq!(Victim::Evict(0), replacer.pick_victim(&mut frames).unwrap());
        resident(&mut frames[0], 1, 10);
        frames[0].ref_bit = false;

        // The hand moved past frame 0, so frame 1 goes next.
        assert_eq!(Victim::Evict(1), replacer.pick_victim(&mut frames).unwrap());
    }
}
