use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcfError {
    /// A referenced input file does not exist
    InputNotFound(PathBuf),
    /// The output file is already present and would be overwritten
    OutputExists(PathBuf),
    /// Fixed leading columns differ between merge inputs
    SchemaMismatch {
        /// The input whose column line disagrees
        path: PathBuf,
        /// Fixed columns of the first input
        expected: String,
        /// Fixed columns found in `path`
        found: String,
    },
    /// Merge was called without any input
    NoInputs,
    /// Chunk size must hold at least one record
    InvalidChunkSize,
}

impl fmt::Display for VcfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcfError::InputNotFound(path) => {
                write!(f, "Input file not found: {}", path.display())
            }
            VcfError::OutputExists(path) => {
                write!(f, "Output file already exists: {}", path.display())
            }
            VcfError::SchemaMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "Fixed columns of {} differ from the first input:\nexpected: {}\nfound:    {}",
                path.display(),
                expected,
                found
            ),
            VcfError::NoInputs => write!(f, "No input files given"),
            VcfError::InvalidChunkSize => write!(f, "Chunk size must be at least 1"),
        }
    }
}

impl std::error::Error for VcfError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = VcfError::InputNotFound(PathBuf::from("a.vcf"));
        assert_eq!(err.to_string(), "Input file not found: a.vcf");

        let err = VcfError::OutputExists(PathBuf::from("out.vcf"));
        assert_eq!(err.to_string(), "Output file already exists: out.vcf");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = VcfError::NoInputs.into();
        assert_eq!(err.downcast_ref::<VcfError>(), Some(&VcfError::NoInputs));
    }
}
