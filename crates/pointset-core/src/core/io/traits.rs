use super::binary::StreamError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

/// Defines the interface for writing a point-set handle to the binary stream
/// format and reading it back.
///
/// Every implementor is stored as a whole collection: a single set or array
/// is written as a one-element collection, so streams written from any of
/// the handle types can be read back as a collection.
pub trait BinaryFormat: Sized {
    /// Writes `self` to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), StreamError>;

    /// Reads a value from a reader.
    ///
    /// The read is all-or-nothing: no value is produced from a partial or
    /// inconsistent stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is short, corrupt, of an unsupported
    /// version, or shaped differently from `Self`.
    fn read_from(reader: &mut impl Read) -> Result<Self, StreamError>;

    /// Writes `self` to the file at `path`, replacing it if it exists.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), StreamError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a value from the file at `path`.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, StreamError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a value that must span all of `bytes`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`read_from`](Self::read_from), returns
    /// [`StreamError::Corrupt`] if bytes are left over after the value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, StreamError> {
        let mut cursor = Cursor::new(bytes);
        let value = Self::read_from(&mut cursor)?;
        let consumed = cursor.position();
        if consumed != bytes.len() as u64 {
            return Err(StreamError::Corrupt(format!(
                "{} trailing byte(s) after the collection",
                bytes.len() as u64 - consumed
            )));
        }
        Ok(value)
    }
}
