use std::{f32::consts::PI, fmt, sync::Arc, time::Duration};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{
    effects::{ScheduledTone, SoundKind},
    Result, ShowcaseError,
};

/// Spectral summary of a rendered tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub samples: usize,
    pub rms: f32,
    pub peak: f32,
    /// Centre frequency of the strongest bin, in Hz.
    pub dominant_hz: f32,
    pub spectral_centroid_hz: f32,
}

/// FFT-backed analyser that reuses its plan across equally sized buffers.
pub struct ToneAnalyzer {
    sample_rate: u32,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl ToneAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn analyse(&mut self, samples: &[f32]) -> Result<ToneAnalysis> {
        if samples.len() < 2 {
            return Err(ShowcaseError::InvalidInput(
                "analysis requires blocks with at least two samples",
            ));
        }

        let len = samples.len();
        let bin_hz = self.sample_rate as f32 / len as f32;
        let fft = self.prepare_fft(len);

        for (index, value) in samples.iter().enumerate() {
            fft.input[index] = *value * hann_value(index, len);
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let mut magnitude_sum = 0.0;
        let mut weighted_sum = 0.0;
        let mut strongest = (0_usize, 0.0_f32);
        for (i, bin) in fft.spectrum.iter().enumerate() {
            let magnitude = bin.norm();
            magnitude_sum += magnitude;
            weighted_sum += magnitude * (i as f32 * bin_hz);
            if magnitude > strongest.1 {
                strongest = (i, magnitude);
            }
        }

        let spectral_centroid_hz = if magnitude_sum <= f32::EPSILON {
            0.0
        } else {
            weighted_sum / magnitude_sum
        };

        Ok(ToneAnalysis {
            samples: len,
            rms: compute_rms(samples),
            peak: samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs())),
            dominant_hz: strongest.0 as f32 * bin_hz,
            spectral_centroid_hz,
        })
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        let rebuild = self
            .fft
            .as_ref()
            .map(|fft| fft.size != size)
            .unwrap_or(true);
        if rebuild {
            self.fft = None;
        }

        let planner = &mut self.fft_planner;
        self.fft.get_or_insert_with(|| {
            let plan = planner.plan_fft_forward(size);
            FftResources {
                size,
                scratch: plan.make_scratch_vec(),
                spectrum: plan.make_output_vec(),
                input: plan.make_input_vec(),
                plan,
            }
        })
    }
}

/// Renders `kind` offline with the given attack and analyses the result.
pub fn analyse_tone(kind: SoundKind, attack: Duration, sample_rate: u32) -> Result<ToneAnalysis> {
    let samples = ScheduledTone::new(kind, 0.0, attack).render(sample_rate);
    ToneAnalyzer::new(sample_rate).analyse(&samples)
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for ToneAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToneAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_no_energy() {
        let mut analyzer = ToneAnalyzer::new(48_000);
        let analysis = analyzer.analyse(&[0.0; 1024]).unwrap();

        assert_eq!(analysis.rms, 0.0);
        assert_eq!(analysis.peak, 0.0);
        assert_eq!(analysis.spectral_centroid_hz, 0.0);
    }

    #[test]
    fn rejects_tiny_blocks() {
        let mut analyzer = ToneAnalyzer::new(48_000);
        assert!(analyzer.analyse(&[0.5]).is_err());
    }

    #[test]
    fn rendered_presets_peak_at_their_frequency() {
        let mut analyzer = ToneAnalyzer::new(48_000);
        for kind in [SoundKind::Click, SoundKind::Transition, SoundKind::Success] {
            let samples =
                ScheduledTone::new(kind, 0.0, Duration::from_millis(10)).render(48_000);
            let analysis = analyzer.analyse(&samples).unwrap();
            let bin_hz = 48_000.0 / samples.len() as f32;

            let expected = kind.config().frequency;
            assert!(
                (analysis.dominant_hz - expected).abs() <= bin_hz,
                "{} peaked at {} Hz",
                kind.name(),
                analysis.dominant_hz
            );
            assert!(analysis.peak <= kind.config().volume + 1e-6);
        }
    }

    #[test]
    fn sawtooth_is_brighter_than_sine() {
        let attack = Duration::from_millis(10);
        let error = analyse_tone(SoundKind::Error, attack, 48_000).unwrap();
        let click = analyse_tone(SoundKind::Click, attack, 48_000).unwrap();

        assert!(error.spectral_centroid_hz / 400.0 > click.spectral_centroid_hz / 800.0);
        assert!(error.rms > 0.0);
    }
}
