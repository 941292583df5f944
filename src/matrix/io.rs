//! Matrix files.
//!
//! A matrix file starts with a header of three little-endian `u32` words
//! (field order, number of rows, number of columns) followed by the packed
//! rows. [`MatrixWriter`] streams rows into a file whose final row count is
//! not known in advance and patches the header when it is finished.

use super::Matrix;
use crate::conversions::{pack_row, row_size_io, unpack_row};
use crate::error::{ResolutionError, Result};
use crate::field::{FieldElement, FieldProperties, PrimeField};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of the file header in bytes.
pub const HEADER_SIZE: u64 = 12;

/// The three header words of a matrix file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixHeader {
    /// Order of the field the entries live in.
    pub field_order: u64,
    /// Number of rows.
    pub nor: usize,
    /// Number of columns.
    pub noc: usize,
}

fn header_word(path: &Path, what: &str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ResolutionError::format(path, format!("{} {} does not fit into a header word", what, value))
    })
}

fn write_header(out: &mut impl Write, header: &MatrixHeader, path: &Path) -> Result<()> {
    let words = [
        header_word(path, "field order", header.field_order)?,
        header_word(path, "row count", header.nor as u64)?,
        header_word(path, "column count", header.noc as u64)?,
    ];
    for word in words {
        out.write_u32::<LittleEndian>(word)
            .map_err(|e| ResolutionError::io(path, e))?;
    }
    Ok(())
}

fn parse_header(input: &mut impl Read) -> std::io::Result<MatrixHeader> {
    let field_order = input.read_u32::<LittleEndian>()? as u64;
    let nor = input.read_u32::<LittleEndian>()? as usize;
    let noc = input.read_u32::<LittleEndian>()? as usize;
    Ok(MatrixHeader {
        field_order,
        nor,
        noc,
    })
}

/// Read only the header of a matrix file.
pub fn read_header(path: impl AsRef<Path>) -> Result<MatrixHeader> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| ResolutionError::io(path, e))?;
    parse_header(&mut file).map_err(|e| ResolutionError::io(path, e))
}

/// Number of rows a matrix file holds, according to its header.
pub fn number_of_rows_stored(path: impl AsRef<Path>) -> Result<usize> {
    Ok(read_header(path)?.nor)
}

/// Streaming writer for matrix files of initially unknown length.
pub struct MatrixWriter {
    path: PathBuf,
    out: BufWriter<File>,
    field: PrimeField,
    noc: usize,
    rows_written: usize,
    buffer: Vec<u8>,
}

impl MatrixWriter {
    /// Create (or truncate) `path` and write a header announcing zero rows.
    pub fn create(path: impl AsRef<Path>, field: &PrimeField, noc: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| ResolutionError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        let header = MatrixHeader {
            field_order: field.characteristic(),
            nor: 0,
            noc,
        };
        write_header(&mut out, &header, &path)?;
        Ok(MatrixWriter {
            path,
            out,
            field: field.clone(),
            noc,
            rows_written: 0,
            buffer: Vec::with_capacity(row_size_io(field, noc)),
        })
    }

    /// Append rows stored contiguously in `rows`.
    pub fn write_rows(&mut self, rows: &[FieldElement]) -> Result<()> {
        if self.noc == 0 {
            return Ok(());
        }
        if rows.len() % self.noc != 0 {
            return Err(ResolutionError::BadArgument(format!(
                "{} entries are not a whole number of rows of width {}",
                rows.len(),
                self.noc
            )));
        }
        for row in rows.chunks(self.noc) {
            self.buffer.clear();
            pack_row(&self.field, row, &mut self.buffer);
            self.out
                .write_all(&self.buffer)
                .map_err(|e| ResolutionError::io(&self.path, e))?;
            self.rows_written += 1;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush, patch the row count in the header and close the file.
    pub fn finish(self) -> Result<usize> {
        let MatrixWriter {
            path,
            out,
            field,
            noc,
            rows_written,
            ..
        } = self;
        let mut file = out
            .into_inner()
            .map_err(|e| ResolutionError::io(&path, e.into_error()))?;
        let header = MatrixHeader {
            field_order: field.characteristic(),
            nor: rows_written,
            noc,
        };
        file.seek(SeekFrom::Start(0))
            .map_err(|e| ResolutionError::io(&path, e))?;
        write_header(&mut file, &header, &path)?;
        file.flush().map_err(|e| ResolutionError::io(&path, e))?;
        Ok(rows_written)
    }
}

/// Random access reader for matrix files.
pub struct MatrixReader {
    path: PathBuf,
    input: BufReader<File>,
    field: PrimeField,
    header: MatrixHeader,
    buffer: Vec<u8>,
}

impl MatrixReader {
    /// Open `path` and check that it was written over `field`.
    pub fn open(path: impl AsRef<Path>, field: &PrimeField) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| ResolutionError::io(&path, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| ResolutionError::io(&path, e))?
            .len();
        let mut input = BufReader::new(file);
        let header = parse_header(&mut input).map_err(|e| ResolutionError::io(&path, e))?;
        if header.field_order != field.characteristic() {
            return Err(ResolutionError::format(
                &path,
                format!(
                    "written over GF({}), expected GF({})",
                    header.field_order,
                    field.characteristic()
                ),
            ));
        }
        let row_size = row_size_io(field, header.noc);
        let needed = (header.nor as u64)
            .checked_mul(row_size as u64)
            .and_then(|body| body.checked_add(HEADER_SIZE));
        if needed.map_or(true, |needed| needed > file_len) {
            return Err(ResolutionError::format(
                &path,
                format!(
                    "header announces {} rows of {} columns, but the file has only {} bytes",
                    header.nor, header.noc, file_len
                ),
            ));
        }
        Ok(MatrixReader {
            buffer: vec![0; row_size],
            path,
            input,
            field: field.clone(),
            header,
        })
    }

    pub fn header(&self) -> &MatrixHeader {
        &self.header
    }

    /// Position the reader in front of row `row`.
    pub fn seek_row(&mut self, row: usize) -> Result<()> {
        if row > self.header.nor {
            return Err(ResolutionError::format(
                &self.path,
                format!("cannot seek to row {} of {}", row, self.header.nor),
            ));
        }
        let offset = HEADER_SIZE + (row * self.buffer.len()) as u64;
        self.input
            .seek(SeekFrom::Start(offset))
            .map_err(|e| ResolutionError::io(&self.path, e))?;
        Ok(())
    }

    /// Fill `out` with the next `out.len() / noc` rows.
    pub fn read_rows(&mut self, out: &mut [FieldElement]) -> Result<()> {
        let noc = self.header.noc;
        if noc == 0 {
            return Ok(());
        }
        for row in out.chunks_mut(noc) {
            self.input
                .read_exact(&mut self.buffer)
                .map_err(|e| ResolutionError::io(&self.path, e))?;
            unpack_row(&self.field, &self.buffer, row)
                .ok_or_else(|| ResolutionError::format(&self.path, "invalid packed entry"))?;
        }
        Ok(())
    }
}

/// Write `matrix` to `path`.
pub fn save(matrix: &Matrix, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = MatrixWriter::create(path, matrix.field(), matrix.noc())?;
    writer.write_rows(matrix.data())?;
    if matrix.noc() == 0 {
        writer.rows_written = matrix.nor();
    }
    writer.finish()?;
    Ok(())
}

/// Read a whole matrix file.
pub fn load(path: impl AsRef<Path>, field: &PrimeField) -> Result<Matrix> {
    let mut reader = MatrixReader::open(path, field)?;
    let header = *reader.header();
    let mut data = field.zeros(header.nor * header.noc);
    reader.read_rows(&mut data)?;
    Matrix::from_data(field, header.nor, header.noc, data)
}
