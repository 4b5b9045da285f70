use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, In, Tag, Value};
use log::debug;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

use crate::utils::run_capture;

/// Layouts accepted once the EXIF date separators have been normalized.
const CAPTURE_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// exiftool renders the encoded date with this layout when asked via -d
const ENCODED_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub timestamp: NaiveDateTime,
    pub camera_model: Option<String>,
}

/// A way of reading capture metadata for a single file.
///
/// Any error means "this source has nothing usable", the caller decides
/// whether another source is worth trying.
pub trait MetadataSource {
    fn capture_metadata(&self, path: &Path) -> Result<CaptureMetadata>;
}

/// Reads DateTimeOriginal (36867) and Model (272) from the embedded EXIF block.
pub struct ExifTags;

impl MetadataSource for ExifTags {
    fn capture_metadata(&self, path: &Path) -> Result<CaptureMetadata> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        read_capture_metadata(&mut BufReader::new(&file))
            .with_context(|| format!("No usable EXIF date in {:?}", path))
    }
}

/// Media "date encoded" property, queried through exiftool.
/// Never reports a camera model.
pub struct EncodedDate;

impl MetadataSource for EncodedDate {
    fn capture_metadata(&self, path: &Path) -> Result<CaptureMetadata> {
        let path_str = path.to_str().context("Path not UTF-8")?;
        let output = run_capture(
            "exiftool",
            &[
                "-s3",
                "-d",
                ENCODED_DATE_FORMAT,
                "-api",
                "QuickTimeUTC",
                "-MediaCreateDate",
                path_str,
            ],
        )?;
        Ok(CaptureMetadata {
            timestamp: parse_encoded_date(&output)?,
            camera_model: None,
        })
    }
}

/// Primary source first, fallback on any primary error.
pub struct Resolver<P, F> {
    primary: P,
    fallback: F,
}

impl Resolver<ExifTags, EncodedDate> {
    pub fn system() -> Self {
        Self::new(ExifTags, EncodedDate)
    }
}

impl<P: MetadataSource, F: MetadataSource> Resolver<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    /// Returns `None` when neither source knows when the file was captured.
    pub fn resolve(&self, path: &Path) -> Option<CaptureMetadata> {
        match self.primary.capture_metadata(path) {
            Ok(metadata) => return Some(metadata),
            Err(e) => debug!("{:?}: {:#}, trying encoded date", path, e),
        }

        match self.fallback.capture_metadata(path) {
            Ok(metadata) => Some(CaptureMetadata {
                camera_model: None,
                ..metadata
            }),
            Err(e) => {
                debug!("{:?}: no encoded date either: {:#}", path, e);
                None
            }
        }
    }
}

fn read_capture_metadata<R: BufRead + Seek>(reader: &mut R) -> Result<CaptureMetadata> {
    let exif = exif::Reader::new()
        .read_from_container(reader)
        .map_err(|e| anyhow!("Failed to read EXIF: {}", e))?;

    let date = ascii_field(&exif, Tag::DateTimeOriginal).context("DateTimeOriginal missing")?;
    let timestamp = parse_capture_date(&date)?;
    let camera_model = ascii_field(&exif, Tag::Model).and_then(|model| clean_camera_model(&model));

    Ok(CaptureMetadata {
        timestamp,
        camera_model,
    })
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(ref strings) => strings
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Parse an EXIF date ("YYYY:MM:DD HH:MM:SS").
/// Only the two date separators become hyphens, the time keeps its colons.
pub fn parse_capture_date(text: &str) -> Result<NaiveDateTime> {
    let normalized = text
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .replacen(':', "-", 2);

    for format in CAPTURE_DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Unparseable capture date {:?}", text))
}

fn clean_camera_model(raw: &str) -> Option<String> {
    let model = raw.trim_end_matches('\0').trim();
    if model.is_empty() {
        None
    } else {
        Some(model.to_string())
    }
}

/// Parse the first line of exiftool output. A zeroed date counts as absent.
pub fn parse_encoded_date(output: &str) -> Result<NaiveDateTime> {
    let date_re = Regex::new(r"^(\d{4}):(\d{2}):(\d{2}) (\d{2}):(\d{2}):(\d{2})")?;

    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("No encoded date")?;
    let caps = date_re
        .captures(line)
        .with_context(|| format!("Unrecognised encoded date {:?}", line))?;

    let year: i32 = caps[1].parse()?;
    let num = |i: usize| caps[i].parse::<u32>().unwrap_or(0);

    NaiveDate::from_ymd_opt(year, num(2), num(3))
        .and_then(|d| d.and_hms_opt(num(4), num(5), num(6)))
        .with_context(|| format!("Invalid encoded date {:?}", line))
}
