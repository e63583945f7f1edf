use color_eyre::{eyre::ensure, Result};
use serde::Serialize;

use crate::args::InputArgs;
use crate::diagnostics::Diagnostic;
use crate::io::{read_multipedigree, write_json};
use crate::multipedigree::Multipedigree;

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport<'a> {
    pub pedigree: &'a str,
    pub errors: Vec<&'a Diagnostic>,
    pub warnings: Vec<&'a Diagnostic>,
}

pub fn diagnostics_report(mp: &Multipedigree) -> Vec<DiagnosticsReport<'_>> {
    mp.pedigrees()
        .map(|ped| DiagnosticsReport {
            pedigree: ped.name(),
            errors: ped.diagnostics().errors().collect(),
            warnings: ped.diagnostics().warnings().collect(),
        })
        .collect()
}

pub fn run(args: InputArgs, strict: bool) -> Result<()> {
    let mp = read_multipedigree(&args)?;

    for ped in mp.pedigrees() {
        for error in ped.diagnostics().errors() {
            tracing::warn!("{}: {error}", ped.name());
        }
    }

    write_json(args.output.clone(), &diagnostics_report(&mp))?;

    if strict {
        ensure!(
            mp.error_count() == 0,
            "{} errors in {:?}",
            mp.error_count(),
            args.file
        );
    }
    Ok(())
}
