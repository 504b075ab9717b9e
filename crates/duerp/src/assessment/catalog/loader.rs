use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use super::CatalogError;

/// One of the JSON tables the engine is configured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFile {
    Risks,
    Actions,
    Obligations,
    Sectors,
    Rules,
    Scoring,
}

impl CatalogFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            CatalogFile::Risks => "risks.json",
            CatalogFile::Actions => "actions.json",
            CatalogFile::Obligations => "obligations.json",
            CatalogFile::Sectors => "sectors.json",
            CatalogFile::Rules => "rules.json",
            CatalogFile::Scoring => "scoring.json",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            CatalogFile::Risks => include_str!("../../../config/risks.json"),
            CatalogFile::Actions => include_str!("../../../config/actions.json"),
            CatalogFile::Obligations => include_str!("../../../config/obligations.json"),
            CatalogFile::Sectors => include_str!("../../../config/sectors.json"),
            CatalogFile::Rules => include_str!("../../../config/rules.json"),
            CatalogFile::Scoring => include_str!("../../../config/scoring.json"),
        }
    }
}

/// Where catalog tables are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Tables compiled into the crate from `crates/duerp/config/`.
    #[default]
    Embedded,
    /// A directory holding files with the same names.
    Directory(PathBuf),
}

impl ConfigSource {
    pub fn read(&self, file: CatalogFile) -> Result<Cow<'static, str>, CatalogError> {
        match self {
            ConfigSource::Embedded => Ok(Cow::Borrowed(file.embedded())),
            ConfigSource::Directory(dir) => {
                let path = dir.join(file.file_name());
                fs::read_to_string(&path)
                    .map(Cow::Owned)
                    .map_err(|source| CatalogError::Io { path, source })
            }
        }
    }

    pub fn parse<T>(&self, file: CatalogFile) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let raw = self.read(file)?;
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            file: file.file_name(),
            source,
        })
    }

    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Embedded => "embedded".to_string(),
            ConfigSource::Directory(dir) => dir.display().to_string(),
        }
    }
}
