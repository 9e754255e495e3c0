//! Rate limiting for repetitive wait-loop logging.

/// Decides whether a recurring error message is worth logging.
///
/// Messages are compared by their signature, the text after the last `:`.
/// A message is logged the first time its signature is seen, whenever the
/// signature changes, and after every `every` identical repeats.
#[derive(Debug, Clone)]
pub struct LogDownsampler {
    every: u32,
    remaining: u32,
    previous: Option<String>,
}

impl LogDownsampler {
    /// Creates a downsampler that logs every `every`th identical message.
    pub fn new(every: u32) -> Self {
        let every = every.max(1);
        Self {
            every,
            remaining: every,
            previous: None,
        }
    }

    /// Records one occurrence of `message` and returns whether to log it.
    pub fn should_log(&mut self, message: &str) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        let signature = signature(message);
        if self.previous.as_deref() != Some(signature) {
            self.previous = Some(signature.to_string());
            self.remaining = self.every;
            return true;
        }
        if self.remaining == 0 {
            self.remaining = self.every;
            return true;
        }
        false
    }

    /// Forgets the previous signature.
    pub fn reset(&mut self) {
        self.previous = None;
        self.remaining = self.every;
    }
}

fn signature(message: &str) -> &str {
    message.rsplit(':').next().unwrap_or(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_is_logged() {
        let mut sampler = LogDownsampler::new(15);
        assert!(sampler.should_log("dial tcp 10.0.0.1:6443: connection refused"));
    }

    #[test]
    fn repeats_are_logged_every_nth_time() {
        let mut sampler = LogDownsampler::new(3);
        let logged: Vec<bool> = (0..7)
            .map(|_| sampler.should_log("get version: connection refused"))
            .collect();
        assert_eq!(logged, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn signature_change_is_logged() {
        let mut sampler = LogDownsampler::new(15);
        assert!(sampler.should_log("dial tcp 10.0.0.1:6443: connection refused"));
        // Same suffix, different prefix: still the same signature.
        assert!(!sampler.should_log("dial tcp 10.0.0.2:6443: connection refused"));
        assert!(sampler.should_log("dial tcp 10.0.0.1:6443: i/o timeout"));
    }

    #[test]
    fn reset_forgets_signature() {
        let mut sampler = LogDownsampler::new(15);
        assert!(sampler.should_log("x: y"));
        sampler.reset();
        assert!(sampler.should_log("x: y"));
    }

    #[test]
    fn zero_is_treated_as_one() {
        let mut sampler = LogDownsampler::new(0);
        assert!(sampler.should_log("a"));
        assert!(sampler.should_log("a"));
    }
}
