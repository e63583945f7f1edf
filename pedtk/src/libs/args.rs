use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct InputArgs {
    /// Assertion log with the columns pedigree, relation, first, second and third (csv, tsv or txt, optionally gzipped)
    pub file: PathBuf,

    /// Output file (defaults to stdout)
    #[cfg_attr(feature = "clap", arg(short = 'o', long, value_hint = clap::ValueHint::FilePath))]
    pub output: Option<PathBuf>,

    /// Only build the pedigrees with these names
    #[cfg_attr(feature = "clap", arg(short = 'P', long, value_delimiter = ' ', num_args = 1.. ))]
    pub pedigrees: Option<Vec<String>>,
}

impl InputArgs {
    pub fn wants(&self, pedigree: &str) -> bool {
        match &self.pedigrees {
            Some(names) => names.iter().any(|n| n == pedigree),
            None => true,
        }
    }
}
