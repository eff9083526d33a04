//! crates/logging/src/config.rs
//! Verbosity configuration derived from the command-line `-v` count.

/// Verbosity requested by the user.
///
/// Level `0` only reports warnings and errors. Each additional `-v` lowers the
/// threshold for the `rexec` targets by one step until `trace` is reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerbosityConfig {
    level: u8,
}

impl VerbosityConfig {
    /// Creates a configuration from a verbose level. Values above `3` saturate.
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        let level = if level > 3 { 3 } else { level };
        Self { level }
    }

    /// Returns the normalised verbose level (`0..=3`).
    #[must_use]
    pub const fn level(self) -> u8 {
        self.level
    }

    /// Returns the `EnvFilter` directive for this level.
    #[must_use]
    pub fn directive(self) -> String {
        match self.level {
            0 => "warn".to_owned(),
            1 => "warn,rexec=info".to_owned(),
            2 => "warn,rexec=debug".to_owned(),
            _ => "info,rexec=trace".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_above_three_saturate() {
        assert_eq!(VerbosityConfig::from_verbose_level(9).level(), 3);
        assert_eq!(
            VerbosityConfig::from_verbose_level(9),
            VerbosityConfig::from_verbose_level(3)
        );
    }

    #[test]
    fn default_is_quiet() {
        assert_eq!(VerbosityConfig::default().directive(), "warn");
    }
}
