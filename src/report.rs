//! Per-target results and the end-of-run summary.

use std::fmt::Write as _;
use std::path::PathBuf;

/// How a single target went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    /// Image written to `path`
    Captured { path: PathBuf, bytes: usize },
    /// Capture failed; `message` is the underlying error text
    Failed { message: String },
}

/// Outcome for one configured target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub id: String,
    pub description: String,
    pub status: CaptureStatus,
}

impl CaptureResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, CaptureStatus::Captured { .. })
    }

    fn marker(&self) -> &'static str {
        if self.is_success() {
            "✅"
        } else {
            "❌"
        }
    }
}

/// Results of a completed run, in configured order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub results: Vec<CaptureResult>,
    pub output_dir: PathBuf,
}

impl Summary {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.successes() == self.total()
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaptureResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Human-readable summary block.
    pub fn render(&self) -> String {
        let mut out = String::from("📊 Results:\n");
        for r in &self.results {
            let _ = writeln!(out, "   {} {}", r.marker(), r.description);
        }
        let _ = writeln!(
            out,
            "\n🎉 Done! Captured {}/{} diagrams",
            self.successes(),
            self.total()
        );
        let _ = write!(out, "📁 Output directory: {}", self.output_dir.display());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(desc: &str) -> CaptureResult {
        CaptureResult {
            id: desc.to_lowercase(),
            description: desc.to_string(),
            status: CaptureStatus::Captured {
                path: PathBuf::from(format!("{}.png", desc)),
                bytes: 10,
            },
        }
    }

    fn failed(desc: &str) -> CaptureResult {
        CaptureResult {
            id: desc.to_lowercase(),
            description: desc.to_string(),
            status: CaptureStatus::Failed {
                message: "Element not found: #x".into(),
            },
        }
    }

    #[test]
    fn all_success_exits_zero() {
        let s = Summary {
            results: vec![ok("A"), ok("B"), ok("C"), ok("D")],
            output_dir: PathBuf::from("images"),
        };
        assert_eq!(s.successes(), 4);
        assert_eq!(s.exit_code(), 0);
        let text = s.render();
        assert_eq!(text.matches("✅").count(), 4);
        assert!(text.contains("4/4"));
        assert!(text.contains("images"));
    }

    #[test]
    fn one_failure_exits_one() {
        let s = Summary {
            results: vec![ok("A"), failed("B"), ok("C"), ok("D")],
            output_dir: PathBuf::from("images"),
        };
        assert_eq!(s.exit_code(), 1);
        assert_eq!(s.failures().count(), 1);
        let text = s.render();
        assert!(text.contains("❌ B"));
        assert!(text.contains("3/4"));
    }

    #[test]
    fn lines_follow_configured_order() {
        let s = Summary {
            results: vec![failed("Zeta"), ok("Alpha")],
            output_dir: PathBuf::new(),
        };
        let text = s.render();
        let zeta = text.find("Zeta").unwrap();
        let alpha = text.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }
}
