use std::path::Path;

use analysis_core::AnalysisError;
use serde::Serialize;

/// Ordered list of symbols to evaluate.
///
/// Order is preserved and drives the order of the alert report. Duplicates are
/// kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new(symbols: Vec<String>) -> Result<Self, AnalysisError> {
        if symbols.is_empty() {
            return Err(AnalysisError::Configuration("watchlist is empty".to_string()));
        }

        let mut cleaned = Vec::with_capacity(symbols.len());
        for (idx, symbol) in symbols.into_iter().enumerate() {
            let trimmed = symbol.trim();
            if trimmed.is_empty() {
                return Err(AnalysisError::Configuration(format!(
                    "watchlist entry {} is blank",
                    idx
                )));
            }
            cleaned.push(trimmed.to_string());
        }

        Ok(Self { symbols: cleaned })
    }

    /// Parse a JSON array of symbol strings, e.g. `["AAPL", "MSFT"]`.
    pub fn from_json_str(raw: &str) -> Result<Self, AnalysisError> {
        let symbols: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| AnalysisError::Configuration(format!("invalid watchlist: {}", e)))?;
        Self::new(symbols)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let watchlist = Self::from_json_str(&raw)?;
        tracing::info!("Loaded {} symbols from {}", watchlist.len(), path.display());
        Ok(watchlist)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let watchlist = Watchlist::from_json_str(r#"["MSFT", " aapl ", "MSFT"]"#).unwrap();
        assert_eq!(watchlist.symbols(), &["MSFT", "aapl", "MSFT"]);
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(Watchlist::from_json_str("[]").unwrap_err().is_fatal());
        assert!(Watchlist::from_json_str(r#"["AAPL", "  "]"#).is_err());
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(Watchlist::from_json_str(r#"{"symbols": ["AAPL"]}"#).is_err());
        assert!(Watchlist::from_json_str(r#"["AAPL", 42]"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["NVDA", "AMD"]"#).unwrap();

        let watchlist = Watchlist::load(file.path()).unwrap();
        assert_eq!(watchlist.iter().collect::<Vec<_>>(), vec!["NVDA", "AMD"]);
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let err = Watchlist::load("/nonexistent/stocks.json").unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }
}
