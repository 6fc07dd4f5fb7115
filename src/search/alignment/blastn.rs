//! NCBI BLAST+ backend.
//!
//! The query is written to a FASTA file in a fresh temporary directory, a
//! nucleotide database is built from it with `makeblastdb`, and `blastn` is
//! run on the minus strand only. The directory is removed afterwards unless
//! it was asked to be kept.
//!
//! Executables default to `blastn` and `makeblastdb` on `PATH` and can be
//! overridden with [`BLASTN_ENV_BIN`] and [`MAKEBLASTDB_ENV_BIN`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{AlignmentBackend, AlignmentError, AlignmentHit, AlignmentRequest};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};

pub const BLASTN_ENV_BIN: &str = "PALINDROME_BLASTN_BIN";
pub const MAKEBLASTDB_ENV_BIN: &str = "PALINDROME_MAKEBLASTDB_BIN";
const DEFAULT_BLASTN_BIN: &str = "blastn";
const DEFAULT_MAKEBLASTDB_BIN: &str = "makeblastdb";

const OUTPUT_FORMAT: &str = "6 qstart qend sstart send qseq sseq length nident gaps";
const OUTPUT_FIELDS: usize = 9;
const EVALUE: &str = "10";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlastnAligner {
    blastn: String,
    makeblastdb: String,
    keep_temp: bool,
    /// Parent of the per-search temporary directories; the system default
    /// when unset
    temp_root: Option<PathBuf>,
}

impl BlastnAligner {
    pub fn new(blastn: impl Into<String>, makeblastdb: impl Into<String>, keep_temp: bool) -> Self {
        Self {
            blastn: blastn.into(),
            makeblastdb: makeblastdb.into(),
            keep_temp,
            temp_root: None,
        }
    }

    /// Create temporary directories under `root`
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Resolve executables from the environment, falling back to `PATH`
    pub fn from_env(keep_temp: bool) -> Self {
        Self::new(
            executable_from_env(BLASTN_ENV_BIN, DEFAULT_BLASTN_BIN),
            executable_from_env(MAKEBLASTDB_ENV_BIN, DEFAULT_MAKEBLASTDB_BIN),
            keep_temp,
        )
    }

    fn run_in(
        &self,
        dir: &Path,
        request: &AlignmentRequest<'_>,
    ) -> Result<Vec<AlignmentHit>, AlignmentError> {
        let fasta = dir.join("sequence.fa");
        let db = dir.join("sequence");
        let hits = dir.join("hits.tsv");

        let mut contents = Vec::with_capacity(request.query.len() + 16);
        contents.extend_from_slice(b">sequence\n");
        contents.extend_from_slice(request.query);
        contents.push(b'\n');
        fs::write(&fasta, contents)?;

        let db_args = vec![
            "-in".to_string(),
            fasta.display().to_string(),
            "-dbtype".to_string(),
            "nucl".to_string(),
            "-out".to_string(),
            db.display().to_string(),
        ];
        run_tool(&self.makeblastdb, &db_args, MAKEBLASTDB_ENV_BIN)?;

        let search_args = vec![
            "-query".to_string(),
            fasta.display().to_string(),
            "-db".to_string(),
            db.display().to_string(),
            "-out".to_string(),
            hits.display().to_string(),
            "-outfmt".to_string(),
            OUTPUT_FORMAT.to_string(),
            "-strand".to_string(),
            "minus".to_string(),
            "-evalue".to_string(),
            EVALUE.to_string(),
            "-word_size".to_string(),
            request.word_size.to_string(),
            "-perc_identity".to_string(),
            request.min_percent_identity.to_string(),
            "-num_threads".to_string(),
            request.num_threads.max(1).to_string(),
        ];
        run_tool(&self.blastn, &search_args, BLASTN_ENV_BIN)?;

        parse_tabular(&fs::read_to_string(&hits)?)
    }
}

impl AlignmentBackend for BlastnAligner {
    fn name(&self) -> &'static str {
        "blastn"
    }

    fn search(
        &self,
        request: &AlignmentRequest<'_>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Vec<AlignmentHit>, AlignmentError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("palindrome-blastn-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let result = self.run_in(dir.path(), request);

        // dropping `dir` removes it on both paths
        if self.keep_temp {
            let path = dir.keep();
            diagnostics.emit(DiagnosticEvent::TemporaryDirectoryKept { path });
        }

        result
    }
}

fn executable_from_env(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn run_tool(
    executable: &str,
    args: &[String],
    env_var: &'static str,
) -> Result<Output, AlignmentError> {
    let output = Command::new(executable).args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AlignmentError::ToolNotFound {
                executable: executable.to_string(),
                env_var,
            }
        } else {
            AlignmentError::Io(e)
        }
    })?;

    if !output.status.success() {
        return Err(AlignmentError::ToolFailed {
            executable: executable.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Parse `blastn` tabular output in the layout requested by
/// [`OUTPUT_FORMAT`]. Blank lines and `#` comments are skipped.
pub fn parse_tabular(text: &str) -> Result<Vec<AlignmentHit>, AlignmentError> {
    let mut hits = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != OUTPUT_FIELDS {
            return Err(AlignmentError::MalformedOutput {
                line: line_num,
                reason: format!("expected {OUTPUT_FIELDS} fields, found {}", fields.len()),
            });
        }

        let number = |idx: usize, name: &str| -> Result<usize, AlignmentError> {
            fields[idx]
                .parse()
                .map_err(|_| AlignmentError::MalformedOutput {
                    line: line_num,
                    reason: format!("invalid {name} '{}'", fields[idx]),
                })
        };

        let hit = AlignmentHit {
            query_from: number(0, "qstart")?,
            query_to: number(1, "qend")?,
            hit_from: number(2, "sstart")?,
            hit_to: number(3, "send")?,
            query_aligned: fields[4].to_ascii_uppercase(),
            hit_aligned: fields[5].to_ascii_uppercase(),
            align_len: number(6, "length")?,
            identity: number(7, "nident")?,
            gaps: number(8, "gaps")?,
        };

        if hit.query_aligned.len() != hit.hit_aligned.len() {
            return Err(AlignmentError::MalformedOutput {
                line: line_num,
                reason: "aligned sequences differ in length".to_string(),
            });
        }
        if hit.query_from == 0 || hit.hit_to == 0 {
            return Err(AlignmentError::MalformedOutput {
                line: line_num,
                reason: "coordinates are 1-based".to_string(),
            });
        }

        hits.push(hit);
    }

    Ok(hits)
}
