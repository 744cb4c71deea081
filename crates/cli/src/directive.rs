//! Typed form of the AppImage update-information string.
//!
//! The string is a single pipe-delimited line embedded in the AppImage (or
//! passed on the command line). Its first field selects the update method;
//! the remaining fields are method-specific. Parsing happens exactly once,
//! up front, so the rest of the program works with a tagged value instead of
//! re-splitting strings.

use thiserror::Error;

/// Errors raised while parsing an update-information string.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DirectiveError {
    /// The string was empty.
    #[error("update information is empty")]
    Empty,

    /// The method field named no known update method.
    #[error("unknown update method `{0}`")]
    UnknownMethod(String),

    /// The method is known but the field count is wrong.
    #[error("invalid `{method}` update information, expected: {expected}")]
    Fields {
        /// The method field as parsed.
        method: &'static str,
        /// The expected shape, shown to the user.
        expected: &'static str,
    },
}

/// One parsed update-information string.
///
/// Only [`UpdateDirective::Zsync`] can be executed directly; the GitHub and
/// OCS variants name release catalogues that an external resolver must first
/// turn into a concrete `.zsync` URL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UpdateDirective {
    /// `zsync|<control file url>`
    Zsync {
        /// URL of the `.zsync` control file.
        url: String,
    },
    /// `gh-releases-zsync|<username>|<repository>|<tag>|<filename glob>`
    GhReleasesZsync {
        /// GitHub account owning the repository.
        username: String,
        /// Repository publishing the releases.
        repository: String,
        /// Release tag, or `latest`.
        tag: String,
        /// `fnmatch`-style glob selecting the `.zsync` asset.
        filename_glob: String,
    },
    /// `gh-releases-direct|<username>|<repository>|<tag>|<filename glob>`
    GhReleasesDirect {
        /// GitHub account owning the repository.
        username: String,
        /// Repository publishing the releases.
        repository: String,
        /// Release tag, or `latest`.
        tag: String,
        /// `fnmatch`-style glob selecting the asset.
        filename_glob: String,
    },
    /// `ocs-v1-appimagehub-zsync|<api url>|<content id>|<filename pattern>`
    OcsAppImageHubZsync {
        /// OCS v1 API host.
        api_url: String,
        /// Content id inside the hub.
        content_id: String,
        /// Pattern selecting the download.
        pattern: String,
    },
    /// `ocs-v1-appimagehub-direct|<api url>|<content id>|<filename pattern>`
    OcsAppImageHubDirect {
        /// OCS v1 API host.
        api_url: String,
        /// Content id inside the hub.
        content_id: String,
        /// Pattern selecting the download.
        pattern: String,
    },
}

impl UpdateDirective {
    /// Parses a raw update-information string.
    pub fn parse(info: &str) -> Result<Self, DirectiveError> {
        let info = info.trim();
        if info.is_empty() {
            return Err(DirectiveError::Empty);
        }

        let fields: Vec<&str> = info.split('|').collect();
        match fields[0] {
            "zsync" => match fields.as_slice() {
                [_, url] => Ok(Self::Zsync {
                    url: (*url).to_owned(),
                }),
                _ => Err(fields_error("zsync", "zsync|<url>")),
            },
            "gh-releases-zsync" => match fields.as_slice() {
                [_, username, repository, tag, glob] => Ok(Self::GhReleasesZsync {
                    username: (*username).to_owned(),
                    repository: (*repository).to_owned(),
                    tag: (*tag).to_owned(),
                    filename_glob: (*glob).to_owned(),
                }),
                _ => Err(fields_error(
                    "gh-releases-zsync",
                    "gh-releases-zsync|<username>|<repository>|<tag>|<filename glob>",
                )),
            },
            "gh-releases-direct" => match fields.as_slice() {
                [_, username, repository, tag, glob] => Ok(Self::GhReleasesDirect {
                    username: (*username).to_owned(),
                    repository: (*repository).to_owned(),
                    tag: (*tag).to_owned(),
                    filename_glob: (*glob).to_owned(),
                }),
                _ => Err(fields_error(
                    "gh-releases-direct",
                    "gh-releases-direct|<username>|<repository>|<tag>|<filename glob>",
                )),
            },
            "ocs-v1-appimagehub-zsync" => match fields.as_slice() {
                [_, api_url, content_id, pattern] => Ok(Self::OcsAppImageHubZsync {
                    api_url: (*api_url).to_owned(),
                    content_id: (*content_id).to_owned(),
                    pattern: (*pattern).to_owned(),
                }),
                _ => Err(fields_error(
                    "ocs-v1-appimagehub-zsync",
                    "ocs-v1-appimagehub-zsync|<api url>|<content id>|<pattern>",
                )),
            },
            "ocs-v1-appimagehub-direct" => match fields.as_slice() {
                [_, api_url, content_id, pattern] => Ok(Self::OcsAppImageHubDirect {
                    api_url: (*api_url).to_owned(),
                    content_id: (*content_id).to_owned(),
                    pattern: (*pattern).to_owned(),
                }),
                _ => Err(fields_error(
                    "ocs-v1-appimagehub-direct",
                    "ocs-v1-appimagehub-direct|<api url>|<content id>|<pattern>",
                )),
            },
            other => Err(DirectiveError::UnknownMethod(other.to_owned())),
        }
    }

    /// Canonical method name, as it appears in the update-information string.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Zsync { .. } => "zsync",
            Self::GhReleasesZsync { .. } => "gh-releases-zsync",
            Self::GhReleasesDirect { .. } => "gh-releases-direct",
            Self::OcsAppImageHubZsync { .. } => "ocs-v1-appimagehub-zsync",
            Self::OcsAppImageHubDirect { .. } => "ocs-v1-appimagehub-direct",
        }
    }
}

const fn fields_error(method: &'static str, expected: &'static str) -> DirectiveError {
    DirectiveError::Fields { method, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zsync() {
        let directive =
            UpdateDirective::parse("zsync|https://example.org/app.AppImage.zsync").unwrap();
        assert_eq!(
            directive,
            UpdateDirective::Zsync {
                url: "https://example.org/app.AppImage.zsync".to_owned(),
            }
        );
        assert_eq!(directive.method(), "zsync");
    }

    #[test]
    fn parses_gh_releases_zsync() {
        let directive =
            UpdateDirective::parse("gh-releases-zsync|probono|AppImages|latest|Subsurface-*x86_64.AppImage.zsync")
                .unwrap();
        assert_eq!(
            directive,
            UpdateDirective::GhReleasesZsync {
                username: "probono".to_owned(),
                repository: "AppImages".to_owned(),
                tag: "latest".to_owned(),
                filename_glob: "Subsurface-*x86_64.AppImage.zsync".to_owned(),
            }
        );
    }

    #[test]
    fn parses_ocs_direct() {
        let directive =
            UpdateDirective::parse("ocs-v1-appimagehub-direct|api.appimagehub.com|1234|*.AppImage")
                .unwrap();
        assert_eq!(directive.method(), "ocs-v1-appimagehub-direct");
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = UpdateDirective::parse("zsync").unwrap_err();
        assert!(matches!(err, DirectiveError::Fields { method: "zsync", .. }));

        let err = UpdateDirective::parse("gh-releases-zsync|user|repo|latest").unwrap_err();
        assert!(matches!(
            err,
            DirectiveError::Fields {
                method: "gh-releases-zsync",
                ..
            }
        ));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = UpdateDirective::parse("bintray-zsync|x|y|z").unwrap_err();
        assert_eq!(err, DirectiveError::UnknownMethod("bintray-zsync".to_owned()));
    }

    #[test]
    fn empty_string_is_rejected() {
        assert_eq!(UpdateDirective::parse("  "), Err(DirectiveError::Empty));
    }
}
