//! Auto-mode alternation (§4.6): after 3 consecutive `fix` cycles
//! without a solved constraint, prefer `build`; after a `build` cycle
//! that produced specs, prefer `fix`; any high-severity defect always
//! forces `fix`.

use crate::constraint::{EngineLog, EngineMode};

const FIX_STREAK_BEFORE_BUILD: u32 = 3;

#[must_use]
pub fn select_mode(log: &EngineLog, any_high_severity_defect: bool) -> EngineMode {
    if let Some(mode) = log.mode_override {
        return mode;
    }
    if any_high_severity_defect {
        return EngineMode::Fix;
    }
    match log.last_mode {
        Some(EngineMode::Build) if log.last_mode_result.as_deref() == Some("produced-specs") => {
            EngineMode::Fix
        }
        _ if log.consecutive_fix_cycles >= FIX_STREAK_BEFORE_BUILD => EngineMode::Build,
        _ => EngineMode::Fix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_severity_defect_always_forces_fix() {
        let mut log = EngineLog::default();
        log.consecutive_fix_cycles = 10;
        assert_eq!(select_mode(&log, true), EngineMode::Fix);
    }

    #[test]
    fn explicit_override_wins_over_everything() {
        let mut log = EngineLog::default();
        log.mode_override = Some(EngineMode::Build);
        assert_eq!(select_mode(&log, true), EngineMode::Build);
    }

    #[test]
    fn three_fix_cycles_without_progress_prefers_build() {
        let mut log = EngineLog::default();
        log.consecutive_fix_cycles = 3;
        assert_eq!(select_mode(&log, false), EngineMode::Build);
    }

    #[test]
    fn build_cycle_that_produced_specs_prefers_fix_next() {
        let mut log = EngineLog::default();
        log.last_mode = Some(EngineMode::Build);
        log.last_mode_result = Some("produced-specs".to_string());
        assert_eq!(select_mode(&log, false), EngineMode::Fix);
    }

    #[test]
    fn default_is_fix() {
        let log = EngineLog::default();
        assert_eq!(select_mode(&log, false), EngineMode::Fix);
    }
}
