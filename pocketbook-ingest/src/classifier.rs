//! Pick the institution for an uploaded document.
//!
//! Identification always reads the file with OCR, whatever method is later used
//! for parsing. Profiles are tried in configured order and the first whose
//! identifiers all appear wins.

use chrono::NaiveDate;
use pocketbook_core::{Config, ExtractionConfig};
use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::institution::InstitutionProfile;
use crate::source::read_text;
use crate::statement::Statement;
use crate::types::ExtractionMethod;

pub struct Classifier {
    profiles: Vec<InstitutionProfile>,
}

/// A recognised document that has not been parsed yet.
#[derive(Debug, Clone)]
pub struct StatementUpload {
    pub path: PathBuf,
    pub method: ExtractionMethod,
    pub profile: InstitutionProfile,
    /// Anchor date found in the identification text, if any
    pub anchor_hint: Option<NaiveDate>,
}

impl StatementUpload {
    /// Extract text with the chosen method and parse it.
    pub fn read(&self, cfg: &ExtractionConfig) -> Result<Statement, IngestError> {
        Statement::read(&self.path, self.method, self.profile.institution, cfg)
    }
}

impl Classifier {
    pub fn new(profiles: Vec<InstitutionProfile>) -> Self {
        Self { profiles }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, IngestError> {
        let profiles = cfg
            .institutions
            .iter()
            .map(InstitutionProfile::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(profiles))
    }

    pub fn profiles(&self) -> &[InstitutionProfile] {
        &self.profiles
    }

    /// First profile whose identifiers all occur in `text`.
    pub fn match_text(&self, text: &str) -> Option<&InstitutionProfile> {
        self.profiles.iter().find(|p| p.matches(text))
    }

    /// Classify already-extracted identification text.
    pub fn classify_text(
        &self,
        path: &Path,
        text: &str,
        method: ExtractionMethod,
    ) -> Result<StatementUpload, IngestError> {
        let profile = self
            .match_text(text)
            .ok_or_else(|| IngestError::ClassificationMiss {
                path: path.to_path_buf(),
            })?;
        let anchor_hint = profile
            .institution
            .parser()?
            .statement_date(text);

        log::info!("{} identified as {}", path.display(), profile.institution);
        Ok(StatementUpload {
            path: path.to_path_buf(),
            method,
            profile: profile.clone(),
            anchor_hint,
        })
    }

    /// Read `path` with OCR and classify it.
    pub fn classify(
        &self,
        path: &Path,
        method: ExtractionMethod,
        cfg: &ExtractionConfig,
    ) -> Result<StatementUpload, IngestError> {
        let text = read_text(path, ExtractionMethod::Ocr, cfg)?;
        self.classify_text(path, &text, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::institution::Institution;

    fn profile(inst: Institution, ids: &[&str]) -> InstitutionProfile {
        InstitutionProfile {
            institution: inst,
            identifiers: ids.iter().map(|s| s.to_string()).collect(),
            tab: "Singapore".to_string(),
            folder: inst.tag().to_string(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let c = Classifier::new(vec![
            profile(Institution::StandardChartered, &["JANE DOE", "-2340"]),
            profile(Institution::Hsbc, &["JANE DOE"]),
        ]);
        let both = "JANE DOE card -2340\nStatement Date: 15 Jan 2024";
        assert_eq!(c.match_text(both).unwrap().institution, Institution::StandardChartered);

        let hsbc = "JANE DOE card -2726";
        assert_eq!(c.match_text(hsbc).unwrap().institution, Institution::Hsbc);
    }

    #[test]
    fn test_miss_and_anchor_hint() {
        let c = Classifier::new(vec![profile(Institution::StandardChartered, &["-2340"])]);
        let path = Path::new("upload.pdf");

        let err = c.classify_text(path, "nothing here", ExtractionMethod::Ocr).unwrap_err();
        assert!(matches!(err, IngestError::ClassificationMiss { .. }));

        let up = c
            .classify_text(path, "-2340\nStatement Date: 15 Jan 2024", ExtractionMethod::Markdown)
            .unwrap();
        assert_eq!(up.method, ExtractionMethod::Markdown);
        assert_eq!(up.anchor_hint, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_from_config_keeps_order() {
        let mut cfg = Config::example("/tmp/pb");
        for (inst, ids) in [("IBKR", "U1234567"), ("HSBC", "-2726")] {
            cfg.institutions.push(pocketbook_core::InstitutionConfig {
                institution: inst.to_string(),
                tab: "United States".to_string(),
                folder: None,
                identifiers: vec![ids.to_string()],
            });
        }
        let c = Classifier::from_config(&cfg).unwrap();
        let order: Vec<_> = c.profiles().iter().map(|p| p.institution).collect();
        assert_eq!(order, vec![Institution::InteractiveBrokers, Institution::Hsbc]);
    }
}
