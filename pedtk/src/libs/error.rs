#[derive(Debug)]
pub enum PedError {
    SexParseError(String),
    RelationParseError(String),
    MissingFieldError((usize, String)),
    UnknownPedigreeError(String),
}

impl std::fmt::Display for PedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SexParseError(code) => write!(f, "Failed to parse sex code: {code:?}"),
            Self::RelationParseError(relation) => write!(
                f,
                "Unknown relation {relation:?}. Expected one of member, lineage, marriage or sibship"
            ),
            Self::MissingFieldError((row, field)) => {
                write!(f, "Row {row} is missing the required field {field:?}")
            }
            Self::UnknownPedigreeError(name) => {
                write!(f, "No pedigree named {name:?} has been added")
            }
        }
    }
}

impl std::error::Error for PedError {}
