//! Environment-variable expansion for configured paths.
//!
//! Paths in `provision.toml` are written the way they would be typed in a
//! Windows shell (`%LOCALAPPDATA%\nvim`) or a Unix one (`$HOME/.config`,
//! `~/.gitconfig`).  [`Environment`] expands all three forms against an
//! explicit snapshot of variables so the engines never read process state
//! ad hoc.
use std::collections::HashMap;
use std::path::PathBuf;

/// A snapshot of environment variables used for path expansion.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs (used by tests and callers
    /// that need full control over expansion).
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable.
    ///
    /// An exact match wins; otherwise names are compared ASCII
    /// case-insensitively, as Windows does.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).or_else(|| {
            self.vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// The user's home directory: `HOME`, then `USERPROFILE`.
    #[must_use]
    pub fn home(&self) -> Option<PathBuf> {
        self.home_str().map(PathBuf::from)
    }

    fn home_str(&self) -> Option<&str> {
        self.lookup("HOME").or_else(|| self.lookup("USERPROFILE"))
    }

    /// Like [`Environment::get`], but a variable set to an empty string
    /// counts as unset.
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Expand `%NAME%`, `$NAME`, `${NAME}` and a leading `~`.
    ///
    /// Unknown and empty variables are left verbatim so the resulting path
    /// fails visibly instead of silently collapsing to an unrelated location
    /// such as the drive root.
    #[must_use]
    pub fn expand(&self, input: &str) -> String {
        let percent = self.expand_percent(input);
        let dollar = shellexpand::env_with_context_no_errors(&percent, |name| self.lookup(name));
        shellexpand::tilde_with_context(&*dollar, || self.home_str()).into_owned()
    }

    /// Expand `input` and convert it to a path.
    #[must_use]
    pub fn expand_path(&self, input: &str) -> PathBuf {
        PathBuf::from(self.expand(input))
    }

    /// Expand `cmd.exe`-style `%NAME%` references.
    fn expand_percent(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find('%') {
            let (before, after) = rest.split_at(start);
            out.push_str(before);
            let after = after.get(1..).unwrap_or_default();
            match after.find('%') {
                Some(end) => {
                    let name = after.get(..end).unwrap_or_default();
                    let tail = after.get(end + 1..).unwrap_or_default();
                    match self.lookup(name).filter(|_| is_var_name(name)) {
                        Some(value) => {
                            out.push_str(value);
                            rest = tail;
                        }
                        None => {
                            // Keep the opening `%` and rescan from the closing
                            // one: it may start a real reference (`50%%TEMP%`).
                            out.push('%');
                            rest = after;
                        }
                    }
                }
                None => {
                    out.push('%');
                    out.push_str(after);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '(' | ')' | '-' | '.'))
}
