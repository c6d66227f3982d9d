//! XYZ snapshot format.
//!
//! ```text
//! <particle count>
//! <comment line>
//! <label> <x> <y> <z>
//! ...
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::SimConfig;
use crate::core::vector::Vec3;
use crate::error::{Error, Result};

/// One particle line of an XYZ file.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzRecord {
    pub label: String,
    pub pos: Vec3,
}

/// A parsed XYZ snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzFrame {
    pub comment: String,
    pub records: Vec<XyzRecord>,
}

/// Serialize `records` with `precision` decimals per coordinate.
///
/// Line breaks in `comment` are replaced by spaces so the header stays two lines.
pub fn write_xyz<W: Write>(
    w: &mut W,
    records: &[XyzRecord],
    comment: &str,
    precision: usize,
) -> std::io::Result<()> {
    writeln!(w, "{}", records.len())?;
    writeln!(w, "{}", comment.replace(['\r', '\n'], " "))?;
    for rec in records {
        let [x, y, z] = rec.pos;
        writeln!(
            w,
            "{} {:.p$} {:.p$} {:.p$}",
            rec.label,
            x,
            y,
            z,
            p = precision
        )?;
    }
    Ok(())
}

/// Parse a single XYZ snapshot.
pub fn read_xyz<R: BufRead>(reader: R) -> Result<XyzFrame> {
    let mut lines = reader.lines().enumerate();

    let (_, first) = lines.next().ok_or_else(|| Error::Parse {
        line: 1,
        msg: "empty input".into(),
    })?;
    let first = first?;
    let count: usize = first.trim().parse().map_err(|_| Error::Parse {
        line: 1,
        msg: format!("expected particle count, found {first:?}"),
    })?;

    let comment = match lines.next() {
        Some((_, line)) => line?,
        None => {
            return Err(Error::Parse {
                line: 2,
                msg: "missing comment line".into(),
            })
        }
    };

    // The header is untrusted; grow as records are actually read.
    let mut records = Vec::new();
    for (idx, line) in lines {
        if records.len() == count {
            break;
        }
        let line = line?;
        let lineno = idx + 1;
        let mut fields = line.split_whitespace();
        let label = fields.next().ok_or_else(|| Error::Parse {
            line: lineno,
            msg: "missing label".into(),
        })?;
        let mut pos = [0.0_f64; 3];
        for c in pos.iter_mut() {
            let tok = fields.next().ok_or_else(|| Error::Parse {
                line: lineno,
                msg: "expected three coordinates".into(),
            })?;
            *c = tok.parse().map_err(|_| Error::Parse {
                line: lineno,
                msg: format!("invalid coordinate {tok:?}"),
            })?;
        }
        records.push(XyzRecord {
            label: label.to_string(),
            pos,
        });
    }

    if records.len() != count {
        return Err(Error::Parse {
            line: records.len() + 3,
            msg: format!("expected {count} records, found {}", records.len()),
        });
    }
    Ok(XyzFrame { comment, records })
}

/// Writes snapshot files into a directory with a fixed naming scheme.
///
/// - periodic snapshots: `<dir>/<stem>_<step>.xyz`
/// - final snapshot: `<dir>/<stem>_<label>_<n>.xyz`
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    pub directory: PathBuf,
    pub stem: String,
    pub precision: usize,
}

impl SnapshotWriter {
    pub fn new(directory: impl Into<PathBuf>, stem: impl Into<String>, precision: usize) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
            precision,
        }
    }

    pub fn from_config(cfg: &SimConfig) -> Self {
        Self::new(
            cfg.output.directory.clone(),
            cfg.output.stem.clone(),
            cfg.output.precision,
        )
    }

    pub fn interval_path(&self, step: u64) -> PathBuf {
        self.directory.join(format!("{}_{}.xyz", self.stem, step))
    }

    pub fn final_path(&self, label: &str, n: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{}_{}.xyz", self.stem, label, n))
    }

    /// Write one snapshot to `path`, creating the directory if needed.
    pub fn write(&self, path: &Path, records: &[XyzRecord], comment: &str) -> Result<()> {
        let export_err = |source| Error::Export {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(export_err)?;
        }
        let file = File::create(path).map_err(export_err)?;
        let mut w = BufWriter::new(file);
        write_xyz(&mut w, records, comment, self.precision).map_err(export_err)?;
        w.flush().map_err(export_err)?;
        log::info!("wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records() -> Vec<XyzRecord> {
        vec![
            XyzRecord {
                label: "Pt".into(),
                pos: [1.234_567, -0.5, 3.0],
            },
            XyzRecord {
                label: "Pt".into(),
                pos: [-7.0, 0.000_04, 2.5],
            },
        ]
    }

    #[test]
    fn writes_expected_layout() -> Result<()> {
        let mut buf = Vec::new();
        write_xyz(&mut buf, &records(), "two atoms", 4)?;
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "two atoms");
        assert_eq!(lines[2], "Pt 1.2346 -0.5000 3.0000");
        assert_eq!(lines[3], "Pt -7.0000 0.0000 2.5000");
        Ok(())
    }

    #[test]
    fn multiline_comment_is_flattened() -> Result<()> {
        let mut buf = Vec::new();
        write_xyz(&mut buf, &records(), "a\nb", 2)?;
        let frame = read_xyz(Cursor::new(buf))?;
        assert_eq!(frame.comment, "a b");
        assert_eq!(frame.records.len(), 2);
        Ok(())
    }

    #[test]
    fn read_back_matches_to_precision() -> Result<()> {
        let mut buf = Vec::new();
        write_xyz(&mut buf, &records(), "", 6)?;
        let frame = read_xyz(Cursor::new(buf))?;
        for (a, b) in frame.records.iter().zip(records()) {
            assert_eq!(a.label, b.label);
            for k in 0..3 {
                assert!((a.pos[k] - b.pos[k]).abs() <= 0.5e-6 + 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn bad_count_is_a_parse_error() {
        let err = read_xyz(Cursor::new("two\ncomment\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn truncated_file_is_a_parse_error() {
        let err = read_xyz(Cursor::new("3\ncomment\nPt 0 0 0\n")).unwrap_err();
        assert!(err.to_string().contains("expected 3 records"));
    }

    #[test]
    fn oversized_count_is_a_parse_error() {
        let err = read_xyz(Cursor::new("18446744073709551615\nc\nPt 0 0 0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn bad_coordinate_reports_line() {
        let err = read_xyz(Cursor::new("1\nc\nPt 0 zero 0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn snapshot_paths() {
        let w = SnapshotWriter::new("out", "config", 4);
        assert_eq!(w.interval_path(100), PathBuf::from("out/config_100.xyz"));
        assert_eq!(w.final_path("Cd", 6), PathBuf::from("out/config_Cd_6.xyz"));
    }
}
