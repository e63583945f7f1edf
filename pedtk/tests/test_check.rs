mod common;

use std::path::PathBuf;

use color_eyre::Result;

use pedtk::{
    io::{read_assertions, read_multipedigree},
    subcommands::{check, summary},
    DiagnosticKind,
};

use crate::common::{input_args, BAD_RELATION_LOG, TEST_LOG, TEST_LOG_GZ};

#[test]
fn read_assertion_log() -> Result<()> {
    let assertions = read_assertions(&PathBuf::from(TEST_LOG))?;
    assert_eq!(assertions.len(), 11);
    assert_eq!(assertions[0].0, "F1");

    let gz = read_assertions(&PathBuf::from(TEST_LOG_GZ))?;
    assert_eq!(assertions, gz);
    Ok(())
}

#[test]
fn unknown_relation_is_an_error() {
    let res = read_assertions(&PathBuf::from(BAD_RELATION_LOG));
    assert!(res.is_err());
}

#[test]
fn multipedigree_from_log() -> Result<()> {
    let mp = read_multipedigree(&input_args(TEST_LOG, "unused.json"))?;
    assert_eq!(mp.pedigree_count(), 2);

    let f1 = mp.try_pedigree("F1")?;
    assert_eq!(f1.member_count(), 6);
    assert_eq!(f1.family_count(), 2);
    assert_eq!(f1.subpedigree_count(), 1);
    assert_eq!(f1.unconnected_count(), 1);
    assert_eq!(f1.diagnostics().count(DiagnosticKind::NoSexParents), 1);

    let f2 = mp.try_pedigree("F2")?;
    assert_eq!(f2.member_count(), 3);
    assert_eq!(f2.diagnostics().count(DiagnosticKind::BadMarriageLoop), 1);
    assert_eq!(f2.diagnostics().count(DiagnosticKind::BadLineage), 1);
    assert_eq!(f2.error_count(), 5);
    Ok(())
}

#[test]
fn selected_pedigrees_only() -> Result<()> {
    let mut args = input_args(TEST_LOG, "unused.json");
    args.pedigrees = Some(vec![String::from("F2")]);
    let mp = read_multipedigree(&args)?;
    assert_eq!(mp.pedigree_count(), 1);
    assert!(mp.pedigree("F1").is_none());
    Ok(())
}

#[test]
fn check_subcommand() -> Result<()> {
    check::run(input_args(TEST_LOG, "check.json"), false)?;

    let report: serde_json::Value =
        serde_json::from_reader(std::fs::File::open("tests/results/check.json")?)?;
    assert_eq!(report[0]["pedigree"], "F1");
    assert_eq!(report[0]["errors"][0]["kind"], "no_sex_parents");
    assert_eq!(report[1]["errors"].as_array().unwrap().len(), 5);

    assert!(check::run(input_args(TEST_LOG, "check_strict.json"), true).is_err());
    Ok(())
}

#[test]
fn summary_subcommand() -> Result<()> {
    let args = input_args(TEST_LOG_GZ, "summary.json");
    let mp = read_multipedigree(&args)?;
    let report = summary::structure_report(&mp, true);

    assert_eq!(report[0].members, 6);
    assert_eq!(report[0].max_sibship_size, 2);
    assert_eq!(report[0].unconnected_members, Some(vec![String::from("X")]));
    assert!(!report[0].subpedigree_summaries[0].chains);
    assert!(report[1].subpedigree_summaries[0].loops);
    assert!(report[1].subpedigree_summaries[0].chains);

    summary::run(args, false)?;
    Ok(())
}

#[test]
#[cfg(feature = "clap")]
fn run_check_command() {
    let cmd = pedtk::clap::SubCommand::Check {
        args: input_args(TEST_LOG, "check_cmd.json"),
        log_and_verbosity: crate::common::silent_verbosity(),
        threads: 1,
        strict: false,
    };
    pedtk::clap::run_cmd(cmd).unwrap();
}
