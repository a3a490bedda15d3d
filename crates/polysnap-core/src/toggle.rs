//! User-facing enable switch.

/// Process-wide snapping switch. Written only by the user's toggle
/// control, read by the engine once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableToggle {
    enabled: bool,
}

impl Default for EnableToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl EnableToggle {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the flag. Returns true if the value changed.
    pub fn set(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    /// Label for the toggle control.
    pub fn label(&self) -> &'static str {
        if self.enabled { "ON" } else { "OFF" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let mut toggle = EnableToggle::new(true);
        assert_eq!(toggle.label(), "ON");
        toggle.set(false);
        assert!(!toggle.is_enabled());
        assert_eq!(toggle.label(), "OFF");
    }

    #[test]
    fn test_set_reports_change() {
        let mut toggle = EnableToggle::default();
        assert!(!toggle.set(true));
        assert!(toggle.set(false));
        assert!(!toggle.is_enabled());
    }
}
