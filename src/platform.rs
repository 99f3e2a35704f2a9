//! Host platform detection.
use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Any Unix-like host (development and CI machines).
    Unix,
    /// Windows, the provisioning target.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: if cfg!(windows) { Os::Windows } else { Os::Unix },
        }
    }

    /// Create a platform with an explicit OS (for testing).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether this is a Windows host.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Whether package managers (winget, choco, scoop) can be used here.
    #[must_use]
    pub fn supports_packages(&self) -> bool {
        self.is_windows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detect_matches_cfg() {
        let p = Platform::detect();
        assert_eq!(p.is_windows(), cfg!(windows));
    }

    #[test]
    fn packages_only_on_windows() {
        assert!(Platform::new(Os::Windows).supports_packages());
        assert!(!Platform::new(Os::Unix).supports_packages());
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Unix.to_string(), "unix");
        assert_eq!(Os::Windows.to_string(), "windows");
    }
}
