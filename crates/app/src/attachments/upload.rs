use snafu::Snafu;

use crate::notice::Notice;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "xls", "xlsx", "txt"];

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UploadRejection {
    #[snafu(display("{file_name} is not a supported file type"))]
    UnsupportedFileType {
        stage: &'static str,
        file_name: String,
        extension: Option<String>,
    },
}

impl UploadRejection {
    pub fn file_name(&self) -> &str {
        match self {
            Self::UnsupportedFileType { file_name, .. } => file_name,
        }
    }
}

/// Outcome of validating one batch of selected files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<UploadRejection>,
}

impl UploadReport {
    pub fn rejected_names(&self) -> Vec<&str> {
        self.rejected.iter().map(UploadRejection::file_name).collect()
    }

    /// At most one error notice and one success notice for the whole batch.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if !self.rejected.is_empty() {
            notices.push(Notice::error(
                "Unsupported file type",
                format!(
                    "{}. Only PDF, Word, Excel and text files are accepted.",
                    self.rejected_names().join(", ")
                ),
            ));
        }
        if !self.accepted.is_empty() {
            notices.push(Notice::success(
                format!("Uploaded {} file(s)", self.accepted.len()),
                self.accepted.join(", "),
            ));
        }
        notices
    }
}

pub fn is_supported(file_name: &str) -> bool {
    file_extension(file_name).is_some_and(|extension| ALLOWED_EXTENSIONS.contains(&extension.as_str()))
}

/// Splits a batch by extension. Only names are checked; no bytes are read.
pub fn validate_batch<I, S>(file_names: I) -> UploadReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = UploadReport::default();
    for file_name in file_names {
        let file_name = file_name.as_ref();
        if is_supported(file_name) {
            report.accepted.push(file_name.to_string());
        } else {
            report.rejected.push(UploadRejection::UnsupportedFileType {
                stage: "upload-validate-extension",
                file_name: file_name.to_string(),
                extension: file_extension(file_name),
            });
        }
    }

    tracing::debug!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "upload batch validated"
    );
    report
}

/// Text after the last `.`, lowercased. A bare dotfile such as `.txt` counts.
fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;

    #[test]
    fn batch_is_split_in_one_pass() {
        let report = validate_batch(["a.pdf", "b.exe", "c.docx"]);

        assert_eq!(report.accepted, vec!["a.pdf", "c.docx"]);
        assert_eq!(report.rejected_names(), vec!["b.exe"]);

        let notices = report.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("b.exe"));
        assert_eq!(notices[1].level, NoticeLevel::Success);
        assert_eq!(notices[1].message, "a.pdf, c.docx");
    }

    #[test]
    fn extensions_are_case_insensitive_and_required() {
        assert!(is_supported("REPORT.XLSX"));
        assert!(!is_supported("README"));
        assert!(!is_supported("archive."));
        assert!(is_supported("lecture.v2.PDF"));
    }

    #[test]
    fn bare_dotfile_is_judged_by_its_extension() {
        let report = validate_batch([".txt", "notes.txt", ".bashrc"]);

        assert_eq!(report.accepted, vec![".txt", "notes.txt"]);
        assert_eq!(report.rejected_names(), vec![".bashrc"]);
        assert_eq!(
            report.rejected[0],
            UploadRejection::UnsupportedFileType {
                stage: "upload-validate-extension",
                file_name: ".bashrc".to_string(),
                extension: Some("bashrc".to_string()),
            }
        );
    }

    #[test]
    fn all_valid_batch_has_only_a_success_notice() {
        let notices = validate_batch(vec!["notes.txt".to_string()]).notices();

        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
    }
}
