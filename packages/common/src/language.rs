use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the judge accepts.
///
/// Each variant is backed by one runner script; nothing outside the executor
/// branches on the variant beyond picking that script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Java,
    Python,
}

impl Language {
    /// All supported languages.
    pub const ALL: &'static [Language] = &[Self::C, Self::Cpp, Self::Java, Self::Python];

    /// Returns the canonical lowercase token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::Python => "python",
        }
    }

    /// File name the source code is written to inside the working directory.
    ///
    /// Java requires the public class to be named `Main`.
    pub fn source_file_name(&self) -> &'static str {
        match self {
            Self::C => "main.c",
            Self::Cpp => "main.cpp",
            Self::Java => "Main.java",
            Self::Python => "main.py",
        }
    }

    /// Returns true if a separate compile phase runs before execution.
    pub fn is_compiled(&self) -> bool {
        !matches!(self, Self::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unsupported language token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    invalid: String,
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported language '{}'. Valid values: {}",
            self.invalid,
            Language::ALL
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Self::C),
            "cpp" | "c++" => Ok(Self::Cpp),
            "java" => Ok(Self::Java),
            "python" | "python3" | "py" => Ok(Self::Python),
            _ => Err(ParseLanguageError {
                invalid: s.to_string(),
            }),
        }
    }
}
