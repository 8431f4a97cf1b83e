use super::detector::Detector;
use super::events::{TallyEvent, TallySink};
use super::input::{DetectorError, DetectorInput};
use super::result::DetectorResult;
use std::collections::{BTreeMap, HashSet};

/// The detectors owned by one worker, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct DetectorSet {
    detectors: Vec<Detector>,
}

impl DetectorSet {
    pub fn new(inputs: &[DetectorInput]) -> Result<Self, DetectorError> {
        let mut seen = HashSet::new();
        let detectors = inputs
            .iter()
            .map(|input| {
                if !seen.insert(input.name.as_str()) {
                    return Err(DetectorError::DuplicateName(input.name.clone()));
                }
                Detector::new(input.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { detectors })
    }

    /// A fresh set with the same configuration and zeroed accumulators.
    pub fn empty_like(&self) -> Self {
        Self {
            detectors: self.detectors.iter().map(Detector::empty_like).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Detector> {
        self.detectors.iter().find(|d| d.name() == name)
    }

    pub fn end_history(&mut self) {
        self.detectors.iter_mut().for_each(Detector::end_history);
    }

    pub fn abandon_history(&mut self) {
        self.detectors.iter_mut().for_each(Detector::abandon_history);
    }

    pub fn merge(&mut self, other: &DetectorSet) -> Result<(), DetectorError> {
        if self.detectors.len() != other.detectors.len() {
            return Err(DetectorError::MergeMismatch {
                name: format!("{} detectors", self.detectors.len()),
                other: format!("{} detectors", other.detectors.len()),
            });
        }
        for (mine, theirs) in self.detectors.iter_mut().zip(&other.detectors) {
            mine.merge(theirs)?;
        }
        Ok(())
    }

    pub fn finalize(&self, photon_count: u64) -> BTreeMap<String, DetectorResult> {
        self.detectors
            .iter()
            .map(|d| (d.name().to_string(), d.finalize(photon_count)))
            .collect()
    }
}

impl TallySink for DetectorSet {
    fn record(&mut self, event: &TallyEvent) {
        for detector in &mut self.detectors {
            detector.tally(event);
        }
    }
}
