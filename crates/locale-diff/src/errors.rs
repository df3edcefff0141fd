use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Configuration file error: {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check locale-diff.toml for syntax errors or unknown keys")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid locale configuration: {message}")]
    #[diagnostic(
        code(config::invalid_locales),
        help("Set `locales` to exactly two different tags, e.g. [\"enUS\", \"zhCN\"]")
    )]
    InvalidLocales { message: String },

    #[error("Could not determine the current build")]
    #[diagnostic(
        code(build::version_lookup),
        help("Check network access and the `product`, `region` and `version_url` settings")
    )]
    VersionLookup {
        #[source]
        source: ld_extract::Error,
    },

    #[error("Extraction failed")]
    #[diagnostic(code(extract::failed))]
    Extraction {
        #[source]
        source: ld_extract::Error,
    },

    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: Utf8PathBuf },

    #[error("Failed to convert {path}")]
    #[diagnostic(
        code(image::convert_failed),
        help("Only BLP2 textures with palettised, DXT or raw BGRA content are supported")
    )]
    ConvertFailed {
        path: Utf8PathBuf,
        #[source]
        source: ld_image::ImageError,
    },

    #[error("Failed to write CI output to {path}")]
    #[diagnostic(code(ci::output_failed))]
    CiOutput {
        path: Utf8PathBuf,
        #[source]
        source: ld_extract::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config_parse_error(
        path: Utf8PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConfigParseError { path, source }
    }

    pub fn invalid_locales(message: impl Into<String>) -> Self {
        Self::InvalidLocales {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: Utf8PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn convert_failed(path: Utf8PathBuf, source: ld_image::ImageError) -> Self {
        Self::ConvertFailed { path, source }
    }
}

impl From<ld_extract::Error> for CliError {
    fn from(source: ld_extract::Error) -> Self {
        match source {
            ld_extract::Error::Http(_)
            | ld_extract::Error::VersionsFormat(_)
            | ld_extract::Error::RegionNotFound(_) => Self::VersionLookup { source },
            source => Self::Extraction { source },
        }
    }
}
