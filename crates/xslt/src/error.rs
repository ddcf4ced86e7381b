use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<roxmltree::TextPos> for Location {
    fn from(pos: roxmltree::TextPos) -> Self {
        Location {
            line: pos.row as usize,
            col: pos.col as usize,
        }
    }
}

#[derive(Error, Debug)]
pub enum XsltError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("Output write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template structure error at {location}: {message}")]
    TemplateStructure { message: String, location: Location },

    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
