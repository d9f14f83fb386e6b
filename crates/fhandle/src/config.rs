use std::fs::OpenOptions;

use serde::Deserialize;

use crate::{Error, HandleResult};

/// Options used by [`OsHandle::open_with`](crate::OsHandle::open_with).
///
/// Deserializable so test fixtures and tools can describe how a handle should
/// be opened in TOML:
///
/// ```
/// use fhandle::OpenConfig;
///
/// let config = OpenConfig::from_toml_str("write = true\ncreate = true\nmode = 0o600").unwrap();
/// assert!(config.write && config.create);
/// assert_eq!(config.mode, Some(0o600));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenConfig {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
    /// Permission bits for newly created files. Ignored on non-unix targets.
    pub mode: Option<u32>,
}

impl OpenConfig {
    /// Open an existing file for reading only.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Open for reading and writing, creating or truncating the file.
    pub fn read_write_create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            truncate: true,
            mode: Some(0o666),
            ..Self::default()
        }
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> HandleResult<Self> {
        toml::from_str(source).map_err(|e| {
            Box::new(Error::message(format!(
                "Invalid open configuration: {}",
                e.message()
            )))
        })
    }

    pub(crate) fn to_open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.read)
            .write(self.write)
            .append(self.append)
            .truncate(self.truncate)
            .create(self.create)
            .create_new(self.create_new);
        #[cfg(unix)]
        if let Some(mode) = self.mode {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_all_off() {
        let config = OpenConfig::from_toml_str("").unwrap();
        assert_eq!(config, OpenConfig::default());
        assert!(!config.read);
        assert_eq!(config.mode, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = OpenConfig::from_toml_str(
            r#"
            read = true
            write = true
            append = true
            create_new = true
            mode = 420
            "#,
        )
        .unwrap();
        assert!(config.read && config.write && config.append && config.create_new);
        assert!(!config.truncate);
        assert_eq!(config.mode, Some(0o644));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = OpenConfig::from_toml_str("exclusive = true").unwrap_err();
        assert!(err.to_string().starts_with("Invalid open configuration"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(OpenConfig::from_toml_str("read = \"yes\"").is_err());
    }

    #[test]
    fn test_presets() {
        let ro = OpenConfig::read_only();
        assert!(ro.read && !ro.write && !ro.create);

        let rw = OpenConfig::read_write_create();
        assert!(rw.read && rw.write && rw.create && rw.truncate);
        assert_eq!(rw.mode, Some(0o666));
    }
}
