use crate::libs::error::VcfError;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn is_gz_path(path: &Path) -> bool {
    path.extension() == Some(std::ffi::OsStr::new("gz"))
}

/// Opens `stdin` or a file, decoding gzip when the file name ends in `.gz` or
/// the content starts with the gzip magic bytes.
///
/// ```
/// use std::io::BufRead;
/// let reader = vcftk::reader("tests/vcf/unsorted.vcf").unwrap();
/// let lines: Vec<_> = reader.lines().collect();
/// assert_eq!(lines.len(), 9);
/// ```
pub fn reader(input: &str) -> io::Result<Box<dyn BufRead>> {
    if input == "stdin" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        open_path(Path::new(input))
    }
}

/// Like [`reader`], but `path` is always a file, even one named `stdin`.
pub fn open_path(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|why| {
        io::Error::new(why.kind(), format!("could not open {}: {}", path.display(), why))
    })?;

    let mut buffered = BufReader::new(file);
    let magic = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
    let reader: Box<dyn BufRead> = if is_gz_path(path) || magic {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(buffered)))
    } else {
        Box::new(buffered)
    };

    Ok(reader)
}

/// Creates the staging file in `dir`.
///
/// `NamedTempFile` defaults to mode 0600; ask for 0666 instead so the umask
/// decides, as it does for `File::create`.
fn stage_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".vcftk_out_");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

pub fn writer(output: &str) -> io::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let path = Path::new(output);
        let file = File::create(path)?;
        if is_gz_path(path) {
            Box::new(BufWriter::new(flate2::write::GzEncoder::new(
                file,
                flate2::Compression::default(),
            )))
        } else {
            Box::new(BufWriter::new(file))
        }
    };

    Ok(writer)
}

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gz(BufWriter<flate2::write::GzEncoder<NamedTempFile>>),
    Stdout(BufWriter<io::Stdout>),
}

/// Output that only appears at its final path after [`StagedOutput::finish`].
///
/// Data is written to a temporary file next to the destination and renamed
/// into place on success. Dropping it unfinished removes the temporary file,
/// so a failed run never leaves a truncated output behind.
pub struct StagedOutput {
    sink: Sink,
    target: Option<std::path::PathBuf>,
    clobber: bool,
}

impl StagedOutput {
    /// Stages `output`, replacing any file already there on finish.
    pub fn create(output: &str) -> anyhow::Result<Self> {
        Self::open(output, true)
    }

    /// Stages `output`; [`finish`](Self::finish) fails with
    /// [`VcfError::OutputExists`] if the target appeared in the meantime.
    pub fn create_new(output: &str) -> anyhow::Result<Self> {
        Self::open(output, false)
    }

    fn open(output: &str, clobber: bool) -> anyhow::Result<Self> {
        if output == "stdout" {
            return Ok(StagedOutput {
                sink: Sink::Stdout(BufWriter::new(io::stdout())),
                target: None,
                clobber,
            });
        }

        let target = Path::new(output).to_path_buf();
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        let tmp = stage_in(&dir)
            .with_context(|| format!("could not stage output in {}", dir.display()))?;

        let sink = if is_gz_path(&target) {
            Sink::Gz(BufWriter::new(flate2::write::GzEncoder::new(
                tmp,
                flate2::Compression::default(),
            )))
        } else {
            Sink::Plain(BufWriter::new(tmp))
        };

        Ok(StagedOutput {
            sink,
            target: Some(target),
            clobber,
        })
    }

    /// Flushes everything and moves the staged file to its destination.
    pub fn finish(self) -> anyhow::Result<()> {
        let tmp = match self.sink {
            Sink::Stdout(mut w) => {
                w.flush()?;
                return Ok(());
            }
            Sink::Plain(w) => w.into_inner().map_err(|e| e.into_error())?,
            Sink::Gz(w) => w.into_inner().map_err(|e| e.into_error())?.finish()?,
        };

        let Some(target) = self.target else {
            return Ok(());
        };
        if self.clobber {
            tmp.persist(&target)
                .with_context(|| format!("could not write {}", target.display()))?;
        } else {
            match tmp.persist_noclobber(&target) {
                Ok(_) => {}
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    return Err(VcfError::OutputExists(target).into());
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e.error)
                        .context(format!("could not write {}", target.display())));
                }
            }
        }
        Ok(())
    }
}

impl Write for StagedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            Sink::Gz(w) => w.write(buf),
            Sink::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            Sink::Gz(w) => w.flush(),
            Sink::Stdout(w) => w.flush(),
        }
    }
}
