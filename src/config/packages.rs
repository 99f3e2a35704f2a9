//! `[[packages]]` validation.
use crate::resources::package::PackageSpec;

/// Describe the first unusable package entry, if any.
#[must_use]
pub fn validate(packages: &[PackageSpec]) -> Option<String> {
    packages.iter().enumerate().find_map(|(i, p)| {
        if p.id.trim().is_empty() {
            Some(format!("packages[{i}]: id must not be empty"))
        } else if p.id.contains(char::is_whitespace) {
            Some(format!("packages[{i}]: id '{}' contains whitespace", p.id))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ids() {
        assert_eq!(
            validate(&[PackageSpec::winget("Git.Git"), PackageSpec::winget("7zip.7zip")]),
            None
        );
    }

    #[test]
    fn rejects_empty_and_spaced_ids() {
        assert_eq!(
            validate(&[PackageSpec::winget("")]).as_deref(),
            Some("packages[0]: id must not be empty")
        );
        assert_eq!(
            validate(&[PackageSpec::winget("ok"), PackageSpec::winget("Git Git")]).as_deref(),
            Some("packages[1]: id 'Git Git' contains whitespace")
        );
    }
}
