use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use csv::{Reader, ReaderBuilder};
use serde::{Deserialize, Serialize};

use crate::args::InputArgs;
use crate::error::PedError;
use crate::multipedigree::Multipedigree;
use crate::pedigree::Pedigree;
use crate::structs::SexCode;

#[allow(clippy::upper_case_acronyms)]
pub enum FileType {
    CSV,
    TSV,
}

impl FileType {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension: &str = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| eyre!("No filetype in path"))?;

        let extension = match extension {
            "gz" | "bgz" => return_double_extension_filetype(path, extension)?,
            _ => extension.to_string(),
        };

        Ok(match extension.as_str() {
            "csv.gz" | "csv" => Self::CSV,
            "tsv.gz" | "tsv" | "txt.gz" | "txt" => Self::TSV,
            _ => return Err(eyre!("File extension: {extension} is not supported")),
        })
    }
}

pub fn return_double_extension_filetype(path: &Path, e1: &str) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no stem"))?;
    let e2 = Path::new(&stem)
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no other filetype"))?;
    Ok(format!("{e2}.{e1}"))
}

pub fn get_tsv_reader<R: io::Read>(input: R, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(input)
}

pub fn get_csv_reader<R: io::Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(input)
}

pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => {
                        let msg = format!("failed to open \"{name}\": {err}");
                        return Err(eyre!(msg))?;
                    }
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write>> {
    let output: Box<dyn io::Write> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                match std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                {
                    Ok(x) => x,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}"))?,
                },
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

/// Write `value` as pretty printed JSON
pub fn write_json<T: Serialize>(output: Option<PathBuf>, value: &T) -> Result<()> {
    let mut writer = get_output(output)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// One row of an assertion log
#[derive(Debug, Clone, Deserialize)]
pub struct AssertionRecord {
    pub pedigree: String,
    pub relation: String,
    pub first: Option<String>,
    pub second: Option<String>,
    pub third: Option<String>,
}

/// A single builder call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Member { name: String, sex: SexCode },
    Lineage { child: String, parent: String },
    FullLineage { child: String, parent1: String, parent2: String },
    Marriage { mate1: String, mate2: String },
    Sibship { sib1: String, sib2: String },
}

impl Assertion {
    /// Convert a log row. `row` is only used in error messages.
    pub fn from_record(row: usize, record: AssertionRecord) -> Result<Self, PedError> {
        let required = |field: Option<String>, name: &str| {
            field.ok_or_else(|| PedError::MissingFieldError((row, name.to_string())))
        };

        Ok(match record.relation.to_lowercase().as_str() {
            "member" => Self::Member {
                name: required(record.first, "first")?,
                sex: match record.second {
                    Some(code) => code.parse()?,
                    None => SexCode::Missing,
                },
            },
            "lineage" => {
                let child = required(record.first, "first")?;
                let parent = required(record.second, "second")?;
                match record.third {
                    Some(parent2) => Self::FullLineage {
                        child,
                        parent1: parent,
                        parent2,
                    },
                    None => Self::Lineage { child, parent },
                }
            }
            "marriage" => Self::Marriage {
                mate1: required(record.first, "first")?,
                mate2: required(record.second, "second")?,
            },
            "sibship" => Self::Sibship {
                sib1: required(record.first, "first")?,
                sib2: required(record.second, "second")?,
            },
            _ => return Err(PedError::RelationParseError(record.relation)),
        })
    }

    /// Forward the assertion to the pedigree. Returns false if it was rejected.
    pub fn apply(&self, ped: &mut Pedigree) -> bool {
        match self {
            Self::Member { name, sex } => ped.add_member(name, *sex).is_some(),
            Self::Lineage { child, parent } => ped.add_lineage(child, parent),
            Self::FullLineage {
                child,
                parent1,
                parent2,
            } => ped.add_full_lineage(child, parent1, parent2),
            Self::Marriage { mate1, mate2 } => ped.add_marriage(mate1, mate2),
            Self::Sibship { sib1, sib2 } => ped.add_sibship(sib1, sib2),
        }
    }
}

/// Read an assertion log into (pedigree name, assertion) pairs
pub fn read_assertions(path: &Path) -> Result<Vec<(String, Assertion)>> {
    let input = get_input(Some(path.to_path_buf()))?;

    let mut rdr = match FileType::from_path(path)? {
        FileType::CSV => get_csv_reader(input),
        FileType::TSV => get_tsv_reader(input, true),
    };

    let mut assertions = vec![];
    for (i, result) in rdr.deserialize().enumerate() {
        let record: AssertionRecord =
            result.wrap_err_with(|| format!("Failed to read row {} of {path:?}", i + 1))?;
        let pedigree = record.pedigree.clone();
        let assertion = Assertion::from_record(i + 1, record)?;
        assertions.push((pedigree, assertion));
    }

    tracing::info!("Read {} assertions from {path:?}", assertions.len());
    Ok(assertions)
}

/// Read an assertion log and build every selected pedigree in it
pub fn read_multipedigree(args: &InputArgs) -> Result<Multipedigree> {
    let mut mp = Multipedigree::new();
    let mut rejected = 0;

    for (pedigree, assertion) in read_assertions(&args.file)? {
        if !args.wants(&pedigree) {
            continue;
        }
        if !assertion.apply(mp.add_pedigree(&pedigree)) {
            rejected += 1;
        }
    }

    if rejected > 0 {
        tracing::warn!("{rejected} assertions were rejected");
    }

    mp.build();
    tracing::info!(
        "Built {} pedigrees with {} errors and {} warnings",
        mp.pedigree_count(),
        mp.error_count(),
        mp.warning_count()
    );
    Ok(mp)
}
