//! Reading and writing GFF3 and GTF feature lines.
//!
//! GFF3 attributes are `key=v1,v2` pairs separated by `;` with identifiers in `ID`/`Parent`.
//! GTF attributes are `key "value";` pairs; identifiers come from `gene_id`/`transcript_id`,
//! which the GTF writer recomputes from the record a feature is written in.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::errors::UtrError;
use crate::feature::{Dialect, Feature, FeatureTypes, Position, Strand};

const GENE_ID: &str = "gene_id";
const TRANSCRIPT_ID: &str = "transcript_id";

/// Reads every feature line, assigning `{featuretype}_{n}` identifiers to features without one.
///
/// Lines with an unstranded (`.`/`?`) strand are skipped.
pub fn read_features<R: BufRead>(
    reader: R,
    dialect: Dialect,
    source: &str,
) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    let mut autoincrement: AHashMap<String, usize> = AHashMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {source}"))?;
        let line = line.trim_end_matches(['\n', '\r']);
        if line.starts_with("##FASTA") {
            break;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = parse_line(line, dialect).map_err(|reason| UtrError::InvalidFileFormat {
            file_type: dialect_name(dialect).to_string(),
            path: source.to_string(),
            reason: format!("line {}: {reason}", i + 1),
        })?;
        let Some(mut feature) = parsed else {
            log::debug!("Skipping unstranded feature on line {} of {source}", i + 1);
            continue;
        };
        if feature.id.is_empty() {
            let n = autoincrement.entry(feature.featuretype.clone()).or_insert(0);
            *n += 1;
            feature.id = format!("{}_{n}", feature.featuretype);
        }
        features.push(feature);
    }
    Ok(features)
}

/// Reads every feature from a GFF3 or GTF file.
pub fn read_features_from_path<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Vec<Feature>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open annotation: {}", path.display()))?;
    read_features(BufReader::new(file), dialect, &path.display().to_string())
}

fn dialect_name(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Gff3 => "GFF3",
        Dialect::Gtf => "GTF",
    }
}

/// Parses one feature line; `None` for unstranded features.
///
/// The returned feature's `id` is empty when the line carries no identifier.
pub fn parse_line(line: &str, dialect: Dialect) -> std::result::Result<Option<Feature>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(format!("expected at least 8 tab-separated columns, found {}", fields.len()));
    }
    let strand = match fields[6] {
        "." | "?" => return Ok(None),
        s => s.parse::<Strand>().map_err(|e| e.to_string())?,
    };
    let start: Position =
        fields[3].parse().map_err(|_| format!("invalid start '{}'", fields[3]))?;
    let end: Position = fields[4].parse().map_err(|_| format!("invalid end '{}'", fields[4]))?;
    let attributes = fields.get(8).copied().unwrap_or("");

    let mut feature = Feature::new(String::new(), fields[0], fields[2], start, end, strand)
        .with_source(fields[1])
        .with_dialect(dialect);
    feature.score = fields[5].to_string();
    feature.phase = fields[7].to_string();

    match dialect {
        Dialect::Gff3 => {
            for (key, values) in parse_gff3_attributes(attributes) {
                match key.as_str() {
                    "ID" => feature.id = values.into_iter().next().unwrap_or_default(),
                    "Parent" => feature.parent = values.into_iter().next(),
                    _ => feature.attributes.push((key, values)),
                }
            }
        }
        Dialect::Gtf => {
            feature.attributes = parse_gtf_attributes(attributes);
            let gene_id = feature.attribute(GENE_ID).map(str::to_string);
            let transcript_id = feature.attribute(TRANSCRIPT_ID).map(str::to_string);
            if feature.is_type(FeatureTypes::GENE) {
                feature.id = gene_id.unwrap_or_default();
            } else if feature.is_type(FeatureTypes::GTF_TRANSCRIPT) {
                feature.id = transcript_id.unwrap_or_default();
                feature.parent = gene_id;
            } else {
                feature.parent = transcript_id.or(gene_id);
            }
        }
    }
    Ok(Some(feature))
}

fn parse_gff3_attributes(field: &str) -> Vec<(String, Vec<String>)> {
    field
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty() && *pair != ".")
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => {
                (key.to_string(), value.split(',').map(str::to_string).collect())
            }
            None => (pair.to_string(), Vec::new()),
        })
        .collect()
}

fn parse_gtf_attributes(field: &str) -> Vec<(String, Vec<String>)> {
    let mut attributes: Vec<(String, Vec<String>)> = Vec::new();
    for pair in field.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once(' ').unwrap_or((pair, ""));
        let value = value.trim().trim_matches('"').to_string();
        match attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value),
            None => attributes.push((key.to_string(), vec![value])),
        }
    }
    attributes
}

fn columns(feature: &Feature, featuretype: &str) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        feature.seqid,
        feature.source,
        featuretype,
        feature.start,
        feature.end,
        feature.score,
        feature.strand,
        feature.phase
    )
}

/// Formats `feature` as a GFF3 line (without newline).
///
/// GTF `transcript` features become `mRNA`; their `gene_id`/`transcript_id` attributes are
/// replaced by `ID`/`Parent`.
#[must_use]
pub fn format_gff3(feature: &Feature) -> String {
    let featuretype = match (feature.dialect, feature.featuretype.as_str()) {
        (Dialect::Gtf, "transcript") => "mRNA",
        (_, other) => other,
    };
    let mut attributes = vec![format!("ID={}", feature.id)];
    if let Some(parent) = &feature.parent {
        attributes.push(format!("Parent={parent}"));
    }
    for (key, values) in &feature.attributes {
        if feature.dialect == Dialect::Gtf && (key == GENE_ID || key == TRANSCRIPT_ID) {
            continue;
        }
        if values.is_empty() {
            attributes.push(key.clone());
        } else {
            attributes.push(format!("{key}={}", values.join(",")));
        }
    }
    format!("{}\t{}", columns(feature, featuretype), attributes.join(";"))
}

/// Formats `feature` as a GTF line (without newline) within gene `gene_id`.
///
/// `mRNA` features become `transcript`.
#[must_use]
pub fn format_gtf(feature: &Feature, gene_id: &str, transcript_id: Option<&str>) -> String {
    let featuretype = match feature.featuretype.as_str() {
        "mRNA" => "transcript",
        other => other,
    };
    let mut attributes = vec![format!("{GENE_ID} \"{gene_id}\";")];
    if let Some(transcript_id) = transcript_id {
        attributes.push(format!("{TRANSCRIPT_ID} \"{transcript_id}\";"));
    }
    for (key, values) in &feature.attributes {
        if key == GENE_ID || key == TRANSCRIPT_ID {
            continue;
        }
        for value in values {
            attributes.push(format!("{key} \"{value}\";"));
        }
    }
    format!("{}\t{}", columns(feature, featuretype), attributes.join(" "))
}

/// The `transcript_id` a feature belongs to when written inside gene `gene_id`.
#[must_use]
pub fn transcript_id_of<'a>(feature: &'a Feature, gene_id: &str) -> Option<&'a str> {
    if feature.is_type(FeatureTypes::GFF_TRANSCRIPT) {
        Some(feature.id.as_str())
    } else {
        feature.parent.as_deref().filter(|parent| *parent != gene_id)
    }
}

/// Formats the features of one gene in the requested output dialect.
///
/// GTF output omits gene lines, since genes are implied by `gene_id`.
#[must_use]
pub fn format_gene_lines<'a, I>(gene_id: &str, features: I, dialect: Dialect) -> Vec<String>
where
    I: IntoIterator<Item = &'a Feature>,
{
    features
        .into_iter()
        .filter_map(|feature| match dialect {
            Dialect::Gff3 => Some(format_gff3(feature)),
            Dialect::Gtf if feature.is_type(FeatureTypes::GENE) => None,
            Dialect::Gtf => Some(format_gtf(feature, gene_id, transcript_id_of(feature, gene_id))),
        })
        .collect()
}
