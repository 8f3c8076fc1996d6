// ============================================================================
// FILTER ENGINE: non-destructive replay of a layer's ChangeLog
// ============================================================================
//
// Every request rebuilds from the untouched source: copy, replay the log in
// canonical order (optionally skipping the key being dragged), then apply the
// new value on top. The log is written only after the computation succeeded,
// so a rejected value leaves the layer exactly as it was.
// ============================================================================

use crate::buffer::PixelBuffer;
use crate::ops::adjustments::{AdjustmentKind, FilterError};
use crate::ops::change_log::{Change, ChangeKey, ChangeLog};
use crate::ops::filters::Preset;

/// Per-layer edit state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    /// Nothing recorded; output equals the source.
    Pristine,
    Edited,
}

#[derive(Clone, Debug)]
pub struct FilterEngine {
    source: PixelBuffer,
    log: ChangeLog,
}

impl FilterEngine {
    pub fn new(source: PixelBuffer) -> Self {
        Self { source, log: ChangeLog::new() }
    }

    /// Rebuild an engine around a previously saved log.
    pub fn with_log(source: PixelBuffer, log: ChangeLog) -> Result<Self, FilterError> {
        log.validate()?;
        Ok(Self { source, log })
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    /// Swap the source (after crop / rotate / flip). The log is kept and
    /// replays onto the new geometry.
    pub fn replace_source(&mut self, source: PixelBuffer) {
        self.source = source;
    }

    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    pub fn state(&self) -> EditState {
        if self.log.is_empty() { EditState::Pristine } else { EditState::Edited }
    }

    /// Current pixels: source + every recorded change except `skip`.
    pub fn adjusted_buffer(&self, skip: Option<ChangeKey>) -> Result<PixelBuffer, FilterError> {
        replay(&self.source, &self.log, skip)
    }

    /// Preview `kind` at `value` on top of everything else, then commit it.
    pub fn apply_adjustment(
        &mut self,
        kind: AdjustmentKind,
        value: f64,
    ) -> Result<PixelBuffer, FilterError> {
        kind.validate(value)?;
        let mut out = self.adjusted_buffer(Some(kind.into()))?;
        kind.apply(&mut out, value)?;
        self.log.record_adjustment(kind, value);
        log::debug!("adjustment {} = {}", kind, value);
        Ok(out)
    }

    /// Same as [`apply_adjustment`](Self::apply_adjustment) keyed by slider name.
    pub fn apply_adjustment_named(
        &mut self,
        name: &str,
        value: f64,
    ) -> Result<PixelBuffer, FilterError> {
        let kind: AdjustmentKind = name.parse()?;
        self.apply_adjustment(kind, value)
    }

    /// Select a preset. `Original` means "start over": the whole log is
    /// cleared, sliders included.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<PixelBuffer, FilterError> {
        if preset.is_original() {
            self.reset();
            return Ok(self.source.clone());
        }
        let mut out = self.adjusted_buffer(Some(ChangeKey::Filter))?;
        preset.apply(&mut out)?;
        self.log.record_preset(preset);
        log::debug!("preset {}", preset);
        Ok(out)
    }

    /// Preset applied to a throwaway copy of the source. The log is not read
    /// or written.
    pub fn preview_thumbnail(&self, preset: Preset) -> Result<PixelBuffer, FilterError> {
        preset.render(&self.source)
    }

    /// Back to `Pristine`.
    pub fn reset(&mut self) {
        if !self.log.is_empty() {
            log::info!("change log cleared ({} entries)", self.log.len());
        }
        self.log.clear();
    }
}

/// Copy `source` and replay `log` onto it in canonical order.
pub fn replay(
    source: &PixelBuffer,
    log: &ChangeLog,
    skip: Option<ChangeKey>,
) -> Result<PixelBuffer, FilterError> {
    let mut out = source.clone();
    for change in log.replay_order() {
        if Some(change.key()) == skip {
            continue;
        }
        match change {
            Change::Preset(preset) => preset.apply(&mut out)?,
            Change::Adjustment(kind, value) => kind.apply(&mut out, value)?,
        }
    }
    Ok(out)
}
