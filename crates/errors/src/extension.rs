//! Extension configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ExtensionError {
    #[error("Unable to invoke pkg-config.")]
    PkgConfigUnavailable { message: String },

    #[error("{package} is not installed or not in path.")]
    PackageNotFound { package: String },

    #[error("Bad or incomplete result returned from pkg-config.")]
    IncompleteResult,

    #[error("unable to locate lxml include directories: {message}")]
    XmlTreeIncludeUnavailable { message: String },
}

impl UserFacingError for ExtensionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PkgConfigUnavailable { .. } => {
                Some("Install pkg-config or set XSDEPS_STATIC_DEPS=1 to build dependencies from source.")
            }
            Self::PackageNotFound { .. } | Self::IncompleteResult => {
                Some("Install the xmlsec1 development package or set XSDEPS_STATIC_DEPS=1.")
            }
            Self::XmlTreeIncludeUnavailable { .. } => {
                Some("Install lxml for the configured Python interpreter or set XSDEPS_LXML_INCLUDE.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::PkgConfigUnavailable { .. } => "extension.pkg_config_unavailable",
            Self::PackageNotFound { .. } => "extension.package_not_found",
            Self::IncompleteResult => "extension.incomplete_result",
            Self::XmlTreeIncludeUnavailable { .. } => "extension.xml_tree_include_unavailable",
        };
        Some(code)
    }
}
