#![allow(dead_code)]
use std::path::PathBuf;

use pedtk::{args::InputArgs, MemberId, Pedigree};

#[cfg(feature = "clap")]
use pedtk::clap::LogAndVerbosity;

pub const TEST_LOG: &str = "tests/data/families.csv";
pub const TEST_LOG_GZ: &str = "tests/data/families.tsv.gz";
pub const BAD_RELATION_LOG: &str = "tests/data/bad_relation.csv";
pub const OUTDIR: &str = "tests/results";

pub fn input_args(file: &str, output: &str) -> InputArgs {
    std::fs::create_dir_all(OUTDIR).unwrap();
    InputArgs {
        file: PathBuf::from(file),
        output: Some(PathBuf::from(OUTDIR).join(output)),
        ..Default::default()
    }
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> LogAndVerbosity {
    LogAndVerbosity {
        verbosity: 0,
        log_file: None,
        silent: true,
    }
}

pub fn id(ped: &Pedigree, name: &str) -> MemberId {
    ped.lookup_member(name).unwrap()
}

pub fn sorted_names(ped: &Pedigree, ids: &[MemberId]) -> Vec<String> {
    let mut names: Vec<String> = ids
        .iter()
        .map(|&m| ped.member(m).name().to_string())
        .collect();
    names.sort();
    names
}
