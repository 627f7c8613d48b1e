use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::{Error, Result};

/// Read exactly `length` bytes starting at `offset`.
///
/// A missing file is [`Error::NotFound`]; a range past the end of the file is
/// [`Error::OutOfRange`], never a short read.
pub fn read_range(path: impl AsRef<Path>, offset: u64, length: u64) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let read_err = |e: std::io::Error| Error::Read {
        path:   path.to_path_buf(),
        source: e,
    };

    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => read_err(e),
    })?;

    let size = file.metadata().map_err(read_err)?.len();
    let in_range = offset.checked_add(length).is_some_and(|end| end <= size);
    if !in_range {
        return Err(Error::OutOfRange {
            path: path.to_path_buf(),
            offset,
            length,
            size,
        });
    }

    let length = usize::try_from(length).map_err(|_| Error::OutOfRange {
        path: path.to_path_buf(),
        offset,
        length,
        size,
    })?;
    let mut buffer = vec![0u8; length];
    file.seek(SeekFrom::Start(offset)).map_err(read_err)?;
    file.read_exact(&mut buffer).map_err(read_err)?;
    Ok(buffer)
}
