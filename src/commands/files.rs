use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use glob::glob;
use std::fs::File;
use std::io::{self, stdout, BufRead, BufReader, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use crate::error::{LognormError, LognormResult};

/// Expand glob patterns; plain paths pass through untouched
pub fn expand_globs(patterns: &[PathBuf]) -> LognormResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') || pattern_str.contains('[') {
            let entries = glob(&pattern_str).map_err(|err| LognormError::Configuration {
                parameter: "files".to_string(),
                message: format!("bad pattern {pattern_str}: {err}"),
            })?;
            for entry in entries {
                files.push(entry.map_err(|err| LognormError::Io(err.into_error()))?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Buffered reader over `path`, decompressing `.gz` files
pub fn open_input(path: &Path) -> LognormResult<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Where a command writes its results
pub enum OutputSink {
    File(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Stdout(Stdout),
}

impl OutputSink {
    pub fn create(path: Option<&Path>) -> LognormResult<Self> {
        match path {
            Some(path) => {
                let file = BufWriter::new(File::create(path)?);
                if is_gzip(path) {
                    Ok(OutputSink::Gzip(GzEncoder::new(file, Compression::default())))
                } else {
                    Ok(OutputSink::File(file))
                }
            }
            None => Ok(OutputSink::Stdout(stdout())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputSink::Stdout(_))
    }

    /// Flush everything and write the gzip trailer; errors surface here rather than on drop
    pub fn finish(self) -> LognormResult<()> {
        match self {
            OutputSink::File(mut writer) => writer.flush()?,
            OutputSink::Gzip(encoder) => encoder.finish()?.flush()?,
            OutputSink::Stdout(mut writer) => writer.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::File(writer) => writer.write(buf),
            OutputSink::Gzip(writer) => writer.write(buf),
            OutputSink::Stdout(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::File(writer) => writer.flush(),
            OutputSink::Gzip(writer) => writer.flush(),
            OutputSink::Stdout(writer) => writer.flush(),
        }
    }
}
