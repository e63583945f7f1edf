/// Report the errors and warnings of every pedigree in an assertion log
pub mod check;

/// Report the structure of every pedigree in an assertion log
pub mod summary;
