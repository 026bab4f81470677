//! Cosmetic progress for a waiting UI.
//!
//! The pipeline reports no real progress while the model is generating, so
//! the UI animates an estimate. It creeps toward a 90% ceiling and only
//! reaches 100% on [`ProgressEstimator::finish`]. It never gates completion;
//! that is signalled by the request reaching a terminal [`Stage`](crate::Stage).

const CEILING: f32 = 90.0;

#[derive(Debug, Clone, Default)]
pub struct ProgressEstimator {
    percent: f32,
    finished: bool,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick. Steps shrink as the ceiling approaches.
    pub fn tick(&mut self) -> f32 {
        if !self.finished && self.percent < CEILING {
            let step = ((CEILING - self.percent) * 0.12).max(0.5);
            self.percent = (self.percent + step).min(CEILING);
        }
        self.percent
    }

    pub fn finish(&mut self) {
        self.finished = true;
        self.percent = 100.0;
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Phase label the UI shows under the bar.
    pub fn label(&self) -> &'static str {
        match self.percent {
            p if p < 30.0 => "Extraindo texto do documento...",
            p if p < 60.0 => "Identificando cláusulas relevantes...",
            p if p < CEILING => "Analisando conformidade legal com IA...",
            _ => "Finalizando análise...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_passes_ceiling_while_running() {
        let mut progress = ProgressEstimator::new();
        let mut last = 0.0;
        for _ in 0..1_000 {
            let now = progress.tick();
            assert!(now >= last);
            assert!(now <= CEILING);
            last = now;
        }
        assert_eq!(progress.percent(), CEILING);
        assert_eq!(progress.label(), "Finalizando análise...");
    }

    #[test]
    fn finish_jumps_to_complete() {
        let mut progress = ProgressEstimator::new();
        progress.tick();
        progress.finish();
        assert_eq!(progress.percent(), 100.0);
        assert_eq!(progress.tick(), 100.0);
    }

    #[test]
    fn labels_follow_phases() {
        let mut progress = ProgressEstimator::new();
        assert_eq!(progress.label(), "Extraindo texto do documento...");
        while progress.percent() < 30.0 {
            progress.tick();
        }
        assert_eq!(progress.label(), "Identificando cláusulas relevantes...");
    }
}
