//! Miette diagnostics for configuration files.
//!
//! The struct fields are read by miette's derive macros when the error is
//! rendered.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(questboard::config))]
pub struct ConfigDiagnostic {
    pub message: String,

    #[source_code]
    pub src: String,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        src: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            src: src.into(),
            span: (offset, len).into(),
            help: None,
        }
    }

    /// Point at the span a TOML parse error reports, or at the start of
    /// the file when it reports none.
    #[must_use]
    pub fn from_toml(src: &str, error: &toml::de::Error) -> Self {
        let (offset, len) = error
            .span()
            .map_or((0, 0), |span| (span.start, span.end.saturating_sub(span.start)));
        Self::new(error.message(), src, offset, len)
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_error_span_is_carried_over() {
        let src = "[store]\nbase_url = \n";
        let error = toml::from_str::<toml::Value>(src).unwrap_err();

        let diagnostic = ConfigDiagnostic::from_toml(src, &error);

        assert!(diagnostic.span.offset() >= "[store]\n".len());
        assert_eq!(diagnostic.src, src);
    }
}
