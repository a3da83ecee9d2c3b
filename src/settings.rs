use std::path::Path;

use anyhow::{
    ensure,
    Context,
};
use figment::{
    Figment,
    providers::{
        Serialized,
        Toml,
        Format,
    },
};
use serde::{
    Serialize,
    Deserialize,
};

use crate::{
    types::Result,
    mesh::{
        GridSpacing,
        FftSize,
    },
};


/// Parameters of a real-space calculation. Missing keys fall back to [`Settings::default`].
///
/// ```toml
/// dr       = [0.3, 0.3, 0.3]
/// eext     = [1.0, 1.0, 1.0]
/// fft_size = "smooth"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Grid spacing in Bohr.
    pub dr:       [f64; 3],
    /// Excitation direction, normalized before use.
    pub eext:     [f64; 3],
    pub fft_size: FftSize,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            dr:       [0.3, 0.3, 0.3],
            eext:     [1.0, 1.0, 1.0],
            fft_size: FftSize::default(),
        }
    }
}


impl Settings {
    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = Self::figment()
            .merge(Toml::string(s))
            .extract()
            .context("[SETTINGS]: Failed to parse settings.")?;
        settings.check()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure!(path.is_file(), "[SETTINGS]: {:?} is not a file.", path);
        let settings: Self = Self::figment()
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("[SETTINGS]: Failed to parse settings from {:?}.", path))?;
        settings.check()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn spacing(&self) -> Result<GridSpacing> {
        GridSpacing::new(self.dr)
    }

    fn check(&self) -> Result<()> {
        self.spacing()?;
        ensure!(self.eext.iter().all(|x| x.is_finite()),
            "[SETTINGS]: Excitation direction must be finite, got {:?}.", self.eext);
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.spacing().unwrap().as_array(), [0.3; 3]);
    }

    #[test]
    fn test_partial_override() {
        let s = Settings::from_toml_str(r#"
            dr = [0.2, 0.25, 0.5]
            fft_size = "power_of_two"
            "#).unwrap();
        assert_eq!(s.dr, [0.2, 0.25, 0.5]);
        assert_eq!(s.eext, [1.0; 3]);
        assert_eq!(s.fft_size, FftSize::PowerOfTwo);
    }

    #[test]
    fn test_invalid() {
        assert!(Settings::from_toml_str("dr = [0.3, 0.3]").is_err());
        assert!(Settings::from_toml_str("dr = [0.3, -0.3, 0.3]").is_err());
        assert!(Settings::from_toml_str(r#"fft_size = "prime""#).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new("rsfield_settings").unwrap();
        let path = dir.path().join("settings.toml");
        let s = Settings { dr: [0.15, 0.15, 0.2], eext: [0.0, 0.0, 1.0], fft_size: FftSize::PowerOfTwo };
        fs::write(&path, s.to_toml_string().unwrap()).unwrap();

        assert_eq!(Settings::from_file(&path).unwrap(), s);
        assert!(Settings::from_file(dir.path().join("missing.toml")).is_err());
    }
}
