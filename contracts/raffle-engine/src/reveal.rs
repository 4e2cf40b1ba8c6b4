//! "Decrypt" text effect shown while a winner field is revealed: each frame
//! fixes one more leading character and scrambles the rest with `A`–`Z`.

use std::time::Duration;

use rand::Rng;

pub struct DecryptFrames<R> {
    target: Vec<char>,
    position: usize,
    finished: bool,
    rng: R,
}

pub fn decrypt<R: Rng>(text: &str, rng: R) -> DecryptFrames<R> {
    DecryptFrames {
        target: text.chars().collect(),
        position: 0,
        finished: false,
        rng,
    }
}

impl<R> DecryptFrames<R> {
    /// Frames produced for the whole effect, final plain frame included.
    pub fn frame_count(&self) -> usize {
        self.target.len() + 1
    }

    /// On-screen duration when frames are `interval` apart.
    pub fn duration(&self, interval: Duration) -> Duration {
        interval * self.frame_count() as u32
    }
}

impl<R: Rng> Iterator for DecryptFrames<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.position >= self.target.len() {
            self.finished = true;
            return Some(self.target.iter().collect());
        }

        let fixed = self.position;
        let rng = &mut self.rng;
        let frame = self
            .target
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if i <= fixed {
                    c
                } else {
                    char::from(rng.gen_range(b'A'..=b'Z'))
                }
            })
            .collect();
        self.position += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_frames_converge_to_text() {
        let frames: Vec<String> = decrypt("Maria S.", StdRng::seed_from_u64(7)).collect();
        assert_eq!(frames.len(), 9);
        assert_eq!(frames.last().map(String::as_str), Some("Maria S."));

        for (i, frame) in frames.iter().enumerate() {
            let chars: Vec<char> = frame.chars().collect();
            assert_eq!(chars.len(), 8);
            let fixed = (i + 1).min(8);
            assert_eq!(chars[..fixed].iter().collect::<String>(), "Maria S."[..fixed]);
            assert!(chars[fixed..].iter().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_empty_text_has_single_frame() {
        let frames: Vec<String> = decrypt("", StdRng::seed_from_u64(1)).collect();
        assert_eq!(frames, vec![String::new()]);
    }

    #[test]
    fn test_duration() {
        let frames = decrypt("123456", StdRng::seed_from_u64(1));
        assert_eq!(frames.frame_count(), 7);
        assert_eq!(frames.duration(Duration::from_millis(160)), Duration::from_millis(1120));
    }
}
