//! Size-targeted quality search.
//!
//! The search walks quality downwards in fixed steps and accepts the first
//! encoding that fits the budget. Encoder output size is not reliably
//! monotonic in quality, so a descending sweep is used rather than a
//! bisection: the accepted quality is always the highest one in the sweep
//! that fits.

use crate::codec::ImageCodec;
use crate::constants::{
    DEFAULT_MIN_QUALITY, DEFAULT_QUALITY_STEP, DEFAULT_START_QUALITY, MAX_QUALITY, MIN_QUALITY,
};
use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use crate::utils::{bytes_to_kb, fits_target};
use image::DynamicImage;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub start_quality: u8,
    pub min_quality: u8,
    pub step: u8,
}

impl SearchParams {
    pub fn new(start_quality: u8, min_quality: u8, step: u8) -> Result<Self> {
        for quality in [start_quality, min_quality] {
            if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
                return Err(CompressionError::InvalidQuality(quality));
            }
        }
        if step == 0 || min_quality > start_quality {
            return Err(CompressionError::InvalidSearchRange {
                start: start_quality,
                min: min_quality,
                step,
            });
        }

        Ok(Self {
            start_quality,
            min_quality,
            step,
        })
    }

    /// Upper bound on the number of encodes a single search performs.
    pub fn max_attempts(&self) -> usize {
        ((self.start_quality - self.min_quality) / self.step) as usize + 1
    }

    /// Quality levels in the order they are tried.
    pub fn qualities(&self) -> impl Iterator<Item = u8> {
        let min = self.min_quality;
        let step = self.step;
        std::iter::successors(Some(self.start_quality), move |&q| {
            q.checked_sub(step).filter(|&next| next >= min)
        })
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            start_quality: DEFAULT_START_QUALITY,
            min_quality: DEFAULT_MIN_QUALITY,
            step: DEFAULT_QUALITY_STEP,
        }
    }
}

/// One encode performed during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingAttempt {
    pub quality: u8,
    pub size_bytes: u64,
}

/// The accepted encoding plus the attempts that led to it.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub attempts: Vec<EncodingAttempt>,
    /// Quality of the accepted (last) attempt.
    pub quality: u8,
    /// Encoded bytes of the accepted attempt, not yet written anywhere.
    pub bytes: Vec<u8>,
    /// False when the quality range ran out before the budget was met.
    pub reached_target: bool,
}

impl SearchResult {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub struct SizeTargetedEncoder<'a, C: ImageCodec + ?Sized> {
    codec: &'a C,
    params: SearchParams,
}

impl<'a, C: ImageCodec + ?Sized> SizeTargetedEncoder<'a, C> {
    pub fn new(codec: &'a C, params: SearchParams) -> Self {
        Self { codec, params }
    }

    pub fn params(&self) -> SearchParams {
        self.params
    }

    /// Finds the highest quality in the sweep whose encoding fits `target_kb`.
    ///
    /// The best attempt is held in memory; nothing touches the filesystem.
    /// When no quality fits, the `min_quality` side of the sweep is accepted
    /// as a best effort and `reached_target` is false.
    pub fn search(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        target_kb: u64,
    ) -> Result<SearchResult> {
        let mut attempts = Vec::with_capacity(self.params.max_attempts());
        let mut accepted: Option<(u8, Vec<u8>)> = None;

        for quality in self.params.qualities() {
            let bytes = self.codec.encode(img, format, quality)?;
            let size_bytes = bytes.len() as u64;
            attempts.push(EncodingAttempt {
                quality,
                size_bytes,
            });
            debug!(
                quality,
                size_kb = bytes_to_kb(size_bytes),
                target_kb,
                "encoded attempt"
            );

            let fits = fits_target(size_bytes, target_kb);
            accepted = Some((quality, bytes));
            if fits {
                break;
            }
        }

        // The sweep always yields at least the start quality.
        let (quality, bytes) = accepted.ok_or(CompressionError::InvalidSearchRange {
            start: self.params.start_quality,
            min: self.params.min_quality,
            step: self.params.step,
        })?;
        let reached_target = fits_target(bytes.len() as u64, target_kb);

        Ok(SearchResult {
            attempts,
            quality,
            bytes,
            reached_target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Produces `size_for(quality)` bytes per encode and records every call.
    struct SizedCodec<F: Fn(u8) -> usize> {
        size_for: F,
        calls: RefCell<Vec<u8>>,
    }

    impl<F: Fn(u8) -> usize> SizedCodec<F> {
        fn new(size_for: F) -> Self {
            Self {
                size_for,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl<F: Fn(u8) -> usize> ImageCodec for SizedCodec<F> {
        fn encode(&self, _img: &DynamicImage, _format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(quality);
            Ok(vec![0u8; (self.size_for)(quality)])
        }

        fn decode(&self, _bytes: &[u8]) -> Result<DynamicImage> {
            Err(CompressionError::Encode("not decodable".to_string()))
        }
    }

    fn img() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_search_params_validation() {
        assert!(SearchParams::new(95, 10, 5).is_ok());
        assert!(matches!(
            SearchParams::new(0, 10, 5),
            Err(CompressionError::InvalidQuality(0))
        ));
        assert!(matches!(
            SearchParams::new(95, 101, 5),
            Err(CompressionError::InvalidQuality(101))
        ));
        assert!(matches!(
            SearchParams::new(95, 10, 0),
            Err(CompressionError::InvalidSearchRange { .. })
        ));
        assert!(matches!(
            SearchParams::new(10, 95, 5),
            Err(CompressionError::InvalidSearchRange { .. })
        ));
    }

    #[test]
    fn test_default_sweep() {
        let params = SearchParams::default();
        let qualities: Vec<u8> = params.qualities().collect();
        assert_eq!(qualities.first(), Some(&95));
        assert_eq!(qualities.last(), Some(&10));
        assert_eq!(qualities.len(), 18);
        assert_eq!(params.max_attempts(), 18);
    }

    #[test]
    fn test_sweep_stops_above_min_when_step_overshoots() {
        let params = SearchParams::new(95, 12, 5).unwrap();
        let qualities: Vec<u8> = params.qualities().collect();
        assert_eq!(qualities.last(), Some(&15));
        assert_eq!(qualities.len(), params.max_attempts());
    }

    #[test]
    fn test_small_source_accepted_on_first_attempt() {
        let codec = SizedCodec::new(|_| 10 * 1024);
        let encoder = SizeTargetedEncoder::new(&codec, SearchParams::default());

        let result = encoder.search(&img(), OutputFormat::Jpeg, 250).unwrap();

        assert_eq!(result.quality, 95);
        assert!(result.reached_target);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(*codec.calls.borrow(), vec![95]);
    }

    #[test]
    fn test_accepts_highest_fitting_quality() {
        // 5 KB per quality point: 95 -> 475 KB, 50 -> 250 KB.
        let codec = SizedCodec::new(|q| q as usize * 5 * 1024);
        let encoder = SizeTargetedEncoder::new(&codec, SearchParams::default());

        let result = encoder.search(&img(), OutputFormat::Jpeg, 250).unwrap();

        assert_eq!(result.quality, 50);
        assert!(result.reached_target);
        assert_eq!(result.size_bytes(), 250 * 1024);
        assert_eq!(result.attempts.len(), 10);
        assert!(result.attempts[..9]
            .iter()
            .all(|attempt| attempt.size_bytes > 250 * 1024));
    }

    #[test]
    fn test_non_monotonic_sizes_take_first_fit() {
        // Quality 80 fits, 75 does not, 70 fits again.
        let codec = SizedCodec::new(|q| match q {
            80 | 70 => 100 * 1024,
            _ => 300 * 1024,
        });
        let encoder = SizeTargetedEncoder::new(&codec, SearchParams::default());

        let result = encoder.search(&img(), OutputFormat::WebP, 250).unwrap();
        assert_eq!(result.quality, 80);
    }

    #[test]
    fn test_exhausted_range_is_best_effort() {
        let codec = SizedCodec::new(|q| 1000 * 1024 + q as usize);
        let encoder = SizeTargetedEncoder::new(&codec, SearchParams::default());

        let result = encoder.search(&img(), OutputFormat::Jpeg, 250).unwrap();

        assert!(!result.reached_target);
        assert_eq!(result.quality, 10);
        assert_eq!(result.size_bytes(), 1000 * 1024 + 10);
        assert_eq!(result.attempts.len(), 18);
    }

    #[test]
    fn test_encode_error_propagates() {
        struct Broken;
        impl ImageCodec for Broken {
            fn encode(&self, _: &DynamicImage, _: OutputFormat, _: u8) -> Result<Vec<u8>> {
                Err(CompressionError::Encode("codec exploded".to_string()))
            }
            fn decode(&self, _: &[u8]) -> Result<DynamicImage> {
                unreachable!()
            }
        }

        let encoder = SizeTargetedEncoder::new(&Broken, SearchParams::default());
        let result = encoder.search(&img(), OutputFormat::Jpeg, 250);
        assert!(matches!(result, Err(CompressionError::Encode(_))));
    }
}
