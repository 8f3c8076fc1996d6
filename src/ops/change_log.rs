// ============================================================================
// CHANGE LOG: last-applied value per adjustment key for one image layer
// ============================================================================
//
// One slot per key, so a key can never hold two values: writing a slot
// overwrites it. Replay order is fixed (preset first, then the sliders in
// `AdjustmentKind::ALL` order) no matter in which order slots were written.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::ops::adjustments::{AdjustmentKind, FilterError, gamma_correction};
use crate::ops::filters::Preset;

/// Addresses one slot of the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKey {
    /// The reserved preset slot.
    Filter,
    Adjustment(AdjustmentKind),
}

impl From<AdjustmentKind> for ChangeKey {
    fn from(kind: AdjustmentKind) -> Self {
        ChangeKey::Adjustment(kind)
    }
}

/// One recorded entry, as yielded during replay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Change {
    Preset(Preset),
    Adjustment(AdjustmentKind, f64),
}

impl Change {
    pub fn key(&self) -> ChangeKey {
        match self {
            Change::Preset(_) => ChangeKey::Filter,
            Change::Adjustment(kind, _) => ChangeKey::Adjustment(*kind),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    filter: Option<Preset>,
    brightness: Option<f64>,
    contrast: Option<f64>,
    saturation: Option<f64>,
    gamma: Option<f64>,
    temperature: Option<f64>,
    vibrance: Option<f64>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: AdjustmentKind) -> &Option<f64> {
        match kind {
            AdjustmentKind::Brightness  => &self.brightness,
            AdjustmentKind::Contrast    => &self.contrast,
            AdjustmentKind::Saturation  => &self.saturation,
            AdjustmentKind::Gamma       => &self.gamma,
            AdjustmentKind::Temperature => &self.temperature,
            AdjustmentKind::Vibrance    => &self.vibrance,
        }
    }

    fn slot_mut(&mut self, kind: AdjustmentKind) -> &mut Option<f64> {
        match kind {
            AdjustmentKind::Brightness  => &mut self.brightness,
            AdjustmentKind::Contrast    => &mut self.contrast,
            AdjustmentKind::Saturation  => &mut self.saturation,
            AdjustmentKind::Gamma       => &mut self.gamma,
            AdjustmentKind::Temperature => &mut self.temperature,
            AdjustmentKind::Vibrance    => &mut self.vibrance,
        }
    }

    pub fn preset(&self) -> Option<Preset> {
        self.filter
    }

    pub fn get(&self, kind: AdjustmentKind) -> Option<f64> {
        *self.slot(kind)
    }

    pub fn record_preset(&mut self, preset: Preset) {
        self.filter = Some(preset);
    }

    pub fn record_adjustment(&mut self, kind: AdjustmentKind, value: f64) {
        *self.slot_mut(kind) = Some(value);
    }

    pub fn record(&mut self, change: Change) {
        match change {
            Change::Preset(preset) => self.record_preset(preset),
            Change::Adjustment(kind, value) => self.record_adjustment(kind, value),
        }
    }

    pub fn contains(&self, key: ChangeKey) -> bool {
        match key {
            ChangeKey::Filter => self.filter.is_some(),
            ChangeKey::Adjustment(kind) => self.slot(kind).is_some(),
        }
    }

    /// Drop every slot, sliders included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.replay_order().count()
    }

    /// Recorded entries in canonical replay order.
    pub fn replay_order(&self) -> impl Iterator<Item = Change> + '_ {
        let preset = self.filter.map(Change::Preset);
        let sliders = AdjustmentKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|v| Change::Adjustment(kind, v)));
        preset.into_iter().chain(sliders)
    }

    /// Slider values as `(kind, value)` pairs in replay order.
    pub fn values(&self) -> Vec<(AdjustmentKind, f64)> {
        AdjustmentKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|v| (kind, v)))
            .collect()
    }

    /// Check every recorded slider against its domain. Used for logs that
    /// did not go through the engine (e.g. loaded from a recipe file).
    pub fn validate(&self) -> Result<(), FilterError> {
        for (kind, value) in self.values() {
            kind.validate(value)?;
            if kind == AdjustmentKind::Gamma {
                gamma_correction(value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_log_is_empty() {
        let log = ChangeLog::new();
        assert!(log.is_empty());
        assert_eq!(log.replay_order().count(), 0);
    }

    #[test]
    fn writes_overwrite_the_slot() {
        let mut log = ChangeLog::new();
        log.record_adjustment(AdjustmentKind::Brightness, 5.0);
        log.record_adjustment(AdjustmentKind::Brightness, -3.0);
        assert_eq!(log.get(AdjustmentKind::Brightness), Some(-3.0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn replay_order_is_fixed_regardless_of_recording_order() {
        let mut log = ChangeLog::new();
        log.record_adjustment(AdjustmentKind::Vibrance, 10.0);
        log.record_adjustment(AdjustmentKind::Contrast, 2.0);
        log.record_preset(Preset::Sepia);
        log.record_adjustment(AdjustmentKind::Brightness, 1.0);

        let order: Vec<ChangeKey> = log.replay_order().map(|c| c.key()).collect();
        assert_eq!(
            order,
            vec![
                ChangeKey::Filter,
                ChangeKey::Adjustment(AdjustmentKind::Brightness),
                ChangeKey::Adjustment(AdjustmentKind::Contrast),
                ChangeKey::Adjustment(AdjustmentKind::Vibrance),
            ]
        );
    }

    #[test]
    fn clear_drops_everything() {
        let mut log = ChangeLog::new();
        log.record(Change::Preset(Preset::Moon));
        log.record(Change::Adjustment(AdjustmentKind::Gamma, 120.0));
        log.clear();
        assert!(log.is_empty());
        assert!(!log.contains(ChangeKey::Filter));
    }

    #[test]
    fn validate_catches_out_of_domain_and_gamma_zero() {
        let mut log = ChangeLog::new();
        log.record_adjustment(AdjustmentKind::Saturation, 1.5);
        assert!(log.validate().is_ok());

        log.record_adjustment(AdjustmentKind::Temperature, 99.0);
        assert!(matches!(log.validate(), Err(FilterError::InvalidParameter { .. })));

        log.record_adjustment(AdjustmentKind::Temperature, 0.0);
        log.record_adjustment(AdjustmentKind::Gamma, 0.0);
        assert_eq!(log.validate(), Err(FilterError::DivisionSingularity));
    }
}
